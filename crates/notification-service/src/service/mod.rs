//! 业务服务层
//!
//! - `PersonService`: 接收人导入、分页、更新、删除
//! - `PatternService`: 模板管理与按标题发送

mod pattern_service;
mod person_service;

pub use pattern_service::PatternService;
pub use person_service::PersonService;
