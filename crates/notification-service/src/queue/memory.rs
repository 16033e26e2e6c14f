//! 内存队列实现
//!
//! 基于 tokio 无界 mpsc 通道，用于本地运行和测试。所有发布端关闭后订阅端返回 None。

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{Delivery, NotificationPublisher, NotificationSubscription};
use crate::error::{NotificationError, Result};

/// 创建一对内存队列端点
pub fn memory_queue() -> (MemoryPublisher, MemorySubscription) {
    let (tx, rx) = mpsc::unbounded_channel();
    let acked = Arc::new(AtomicUsize::new(0));
    (MemoryPublisher { tx }, MemorySubscription { rx, acked })
}

/// 内存通知 id 生产者
#[derive(Clone)]
pub struct MemoryPublisher {
    tx: mpsc::UnboundedSender<i64>,
}

#[async_trait]
impl NotificationPublisher for MemoryPublisher {
    async fn publish(&self, notification_id: i64) -> Result<()> {
        self.tx
            .send(notification_id)
            .map_err(|_| NotificationError::Queue("内存队列已关闭".to_string()))
    }
}

/// 内存通知 id 订阅者
pub struct MemorySubscription {
    rx: mpsc::UnboundedReceiver<i64>,
    acked: Arc<AtomicUsize>,
}

impl MemorySubscription {
    /// 确认计数句柄，可在订阅者被移交给消费循环后继续观察
    pub fn ack_counter(&self) -> Arc<AtomicUsize> {
        self.acked.clone()
    }
}

#[async_trait]
impl NotificationSubscription for MemorySubscription {
    async fn next(&mut self) -> Option<Result<Delivery>> {
        self.rx.recv().await.map(|id| Ok(Delivery::detached(id)))
    }

    async fn ack(&mut self, _delivery: &Delivery) -> Result<()> {
        self.acked.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_queue_fifo() {
        let (publisher, mut subscription) = memory_queue();
        publisher.publish(1).await.unwrap();
        publisher.publish(2).await.unwrap();
        drop(publisher);

        let first = subscription.next().await.unwrap().unwrap();
        assert_eq!(first.notification_id, 1);
        subscription.ack(&first).await.unwrap();

        let second = subscription.next().await.unwrap().unwrap();
        assert_eq!(second.notification_id, 2);

        assert!(subscription.next().await.is_none());
        assert_eq!(subscription.ack_counter().load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_publish_after_close_fails() {
        let (publisher, subscription) = memory_queue();
        drop(subscription);

        let err = publisher.publish(1).await.unwrap_err();
        assert!(matches!(err, NotificationError::Queue(_)));
    }
}
