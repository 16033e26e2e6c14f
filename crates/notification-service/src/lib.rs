//! 通知服务（生产端）
//!
//! 负责把模板和接收人转换成待投递的通知，并把通知 id 投递到队列。
//!
//! ## 核心功能
//!
//! - **模板渲染**：`{name}` / `{city}` 占位符替换
//! - **通知生成**：每个接收人一条 NotSent 通知，逐条持久化
//! - **队列桥接**：通知 id 经 Kafka（或内存队列）交给投递 worker
//! - **接收人与模板管理**：导入去重、模板标题唯一、接收人关联
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `template`: 模板渲染
//! - `factory`: 通知生成
//! - `repository`: 数据仓储层（Postgres + 内存）
//! - `queue`: 队列桥接（Kafka + 内存）
//! - `service`: 业务服务层
//! - `cli`: 生产端命令行

pub mod cli;
pub mod error;
pub mod factory;
pub mod models;
pub mod queue;
pub mod repository;
pub mod service;
pub mod template;

use sqlx::migrate::Migrator;

pub use error::{NotificationError, Result};
pub use factory::{FactoryReport, NotificationFactory, RecipientFailure};
pub use models::*;
pub use queue::{Delivery, NotificationPublisher, NotificationSubscription};
pub use repository::{NotificationStore, PatternRepository, PersonRepository};
pub use service::{PatternService, PersonService};

/// 通知库表迁移，worker 与 CLI 启动时执行
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");
