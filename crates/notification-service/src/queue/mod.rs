//! 通知队列桥接
//!
//! 生产端在通知落库后投递其 id，消费端逐条取出、先确认再处理。
//! 队列只保证至少一次投递，确认之后处理失败的通知由补偿扫描兜底。

mod kafka;
mod memory;

pub use kafka::{KafkaNotificationPublisher, KafkaNotificationSubscription};
pub use memory::{MemoryPublisher, MemorySubscription, memory_queue};

use async_trait::async_trait;

use crate::error::Result;

/// 取出的一条通知 id 及其确认凭据
#[derive(Debug, Clone)]
pub struct Delivery {
    pub notification_id: i64,
    receipt: Receipt,
}

#[derive(Debug, Clone)]
enum Receipt {
    Memory,
    Kafka(alert_shared::kafka::ConsumerMessage),
}

impl Delivery {
    /// 内存队列的投递，确认为空操作
    pub fn detached(notification_id: i64) -> Self {
        Self {
            notification_id,
            receipt: Receipt::Memory,
        }
    }
}

/// 通知 id 生产者
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn publish(&self, notification_id: i64) -> Result<()>;
}

/// 通知 id 订阅者
#[async_trait]
pub trait NotificationSubscription: Send {
    /// 等待下一条投递，队列关闭时返回 None
    async fn next(&mut self) -> Option<Result<Delivery>>;

    /// 确认投递，之后该条不会再被重新投递
    async fn ack(&mut self, delivery: &Delivery) -> Result<()>;
}
