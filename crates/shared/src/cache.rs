//! Redis 缓存管理模块
//!
//! 提供 Redis 连接管理和读穿透缓存封装。

use crate::config::RedisConfig;
use crate::error::{Result, SharedError};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{info, instrument};

/// Redis 缓存客户端
#[derive(Clone)]
pub struct Cache {
    client: Client,
}

impl Cache {
    /// 创建 Redis 客户端
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        info!("Redis client created");
        Ok(Self { client })
    }

    async fn get_conn(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(SharedError::from)
    }

    /// 连通性检查，`new` 只创建客户端不会建立连接
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.get_conn().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(SharedError::from)
    }

    /// 获取值
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn.get(key).await?;

        value
            .map(|v| {
                serde_json::from_str(&v).map_err(|e| SharedError::CacheSerialization(e.to_string()))
            })
            .transpose()
    }

    /// 设置值
    #[instrument(skip(self, value))]
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let mut conn = self.get_conn().await?;
        let serialized = serde_json::to_string(value)
            .map_err(|e| SharedError::CacheSerialization(e.to_string()))?;

        let _: () = conn.set_ex(key, serialized, ttl.as_secs()).await?;
        Ok(())
    }

    /// 批量删除（按模式）
    #[instrument(skip(self))]
    pub async fn delete_pattern(&self, pattern: &str) -> Result<u64> {
        let mut conn = self.get_conn().await?;
        let keys: Vec<String> = conn.keys(pattern).await?;

        if keys.is_empty() {
            return Ok(0);
        }

        let count: u64 = conn.del(keys).await?;
        Ok(count)
    }

    /// 获取或设置
    ///
    /// loader 的错误类型由调用方决定，只要能从 `SharedError` 转换即可，
    /// 这样业务服务可以直接传入返回自身错误类型的闭包。
    #[instrument(skip(self, loader))]
    pub async fn get_or_set<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<SharedError>,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, E>>,
    {
        if let Some(cached) = self.get::<T>(key).await? {
            return Ok(cached);
        }

        let value = loader().await?;
        self.set(key, &value, ttl).await?;

        Ok(value)
    }
}

/// 缓存键生成器
pub struct CacheKey;

impl CacheKey {
    /// 模板分页列表
    pub fn pattern_page(offset: i64, limit: i64) -> String {
        format!("patterns:page:{}:{}", offset, limit)
    }

    /// 所有模板分页列表的通配符，模板变更时整体失效
    pub fn pattern_pages() -> &'static str {
        "patterns:page:*"
    }
}
