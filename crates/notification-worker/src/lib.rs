//! 通知投递 worker
//!
//! 从队列消费通知 id，经路由选择邮件或短信渠道投递，
//! 投递成功后把通知标记为已发送。补偿扫描定期重试所有未发送的通知，
//! 覆盖先确认后处理带来的丢失窗口。
//!
//! ## 模块结构
//!
//! - `channels`: 渠道适配器（SMTP 邮件、签名 HTTP 短信）
//! - `router`: 按渠道分发并更新状态
//! - `consumer`: 队列消费循环
//! - `sweeper`: 补偿扫描
//! - `error`: 错误类型定义

pub mod channels;
pub mod consumer;
pub mod error;
pub mod router;
pub mod sweeper;

pub use consumer::NotificationConsumer;
pub use error::{DeliveryError, Result, WorkerError};
pub use router::{DispatchOutcome, DispatchRouter};
pub use sweeper::{RetrySweeper, SweepReport};
