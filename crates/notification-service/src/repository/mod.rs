//! 数据仓储层
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，不包含业务逻辑
//! - Postgres 实现使用 SQLx，内存实现使用 DashMap
//! - 定义 trait 接口以支持 mock 测试和实现替换

mod memory;
mod notification_repo;
mod pattern_repo;
mod person_repo;
mod traits;

pub use memory::{MemoryNotificationStore, MemoryPatternRepository, MemoryPersonRepository};
pub use notification_repo::PgNotificationStore;
pub use pattern_repo::PgPatternRepository;
pub use person_repo::PgPersonRepository;
pub use traits::*;
