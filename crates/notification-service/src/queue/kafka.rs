//! Kafka 队列实现
//!
//! topic 中每条消息的 key 和 payload 都是通知 id（JSON 数字）。

use async_trait::async_trait;
use tracing::{debug, warn};

use alert_shared::config::KafkaConfig;
use alert_shared::kafka::{KafkaConsumer, KafkaProducer};

use super::{Delivery, NotificationPublisher, NotificationSubscription, Receipt};
use crate::error::{NotificationError, Result};

/// Kafka 通知 id 生产者
#[derive(Clone)]
pub struct KafkaNotificationPublisher {
    producer: KafkaProducer,
    topic: String,
}

impl KafkaNotificationPublisher {
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        Ok(Self {
            producer: KafkaProducer::new(config)?,
            topic: config.notification_topic.clone(),
        })
    }
}

#[async_trait]
impl NotificationPublisher for KafkaNotificationPublisher {
    async fn publish(&self, notification_id: i64) -> Result<()> {
        let (partition, offset) = self
            .producer
            .send_json(&self.topic, &notification_id.to_string(), &notification_id)
            .await?;

        debug!(notification_id, partition, offset, "通知 id 已入队");
        Ok(())
    }
}

/// Kafka 通知 id 订阅者
///
/// 位点手动提交，`ack` 即提交 offset + 1
pub struct KafkaNotificationSubscription {
    consumer: KafkaConsumer,
}

impl KafkaNotificationSubscription {
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        let consumer = KafkaConsumer::new(config, None)?;
        consumer.subscribe(&[config.notification_topic.as_str()])?;
        Ok(Self { consumer })
    }
}

#[async_trait]
impl NotificationSubscription for KafkaNotificationSubscription {
    async fn next(&mut self) -> Option<Result<Delivery>> {
        loop {
            let msg = match self.consumer.recv().await {
                Ok(msg) => msg,
                Err(e) => return Some(Err(e.into())),
            };

            match msg.deserialize_payload::<i64>() {
                Ok(notification_id) => {
                    return Some(Ok(Delivery {
                        notification_id,
                        receipt: Receipt::Kafka(msg),
                    }));
                }
                Err(e) => {
                    // 无法解析的消息直接提交跳过，避免阻塞分区
                    warn!(
                        error = %e,
                        topic = %msg.topic,
                        partition = msg.partition,
                        offset = msg.offset,
                        "通知 id 消息格式非法，已跳过"
                    );
                    if let Err(e) = self.consumer.commit(&msg) {
                        return Some(Err(e.into()));
                    }
                }
            }
        }
    }

    async fn ack(&mut self, delivery: &Delivery) -> Result<()> {
        match &delivery.receipt {
            Receipt::Kafka(msg) => Ok(self.consumer.commit(msg)?),
            Receipt::Memory => Err(NotificationError::Queue(
                "内存投递不能在 Kafka 订阅上确认".to_string(),
            )),
        }
    }
}
