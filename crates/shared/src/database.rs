//! 数据库连接管理
//!
//! 服务启动时统一走 [`Database::open`]：建立连接池并执行迁移，
//! 迁移失败直接返回错误，不会带着旧表结构继续运行。

use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, instrument};

use crate::config::DatabaseConfig;
use crate::error::Result;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 建立连接池并执行迁移
    ///
    /// `migrate!` 宏在编译期定位迁移目录，所以由持有迁移文件的 crate 传入 `Migrator`。
    #[instrument(skip_all, fields(max_connections = config.max_connections))]
    pub async fn open(config: &DatabaseConfig, migrator: &Migrator) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await?;
        info!("数据库连接池已创建");

        migrator.run(&pool).await?;
        info!(migrations = migrator.iter().count(), "数据库迁移已应用");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("数据库连接池已关闭");
    }
}
