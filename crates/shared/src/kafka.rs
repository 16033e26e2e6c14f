//! Kafka 基础设施封装
//!
//! 将 rdkafka 的底层 API 封装为业务友好的 Producer/Consumer 抽象，
//! 统一消息序列化、错误映射和手动提交语义，避免各服务重复编写样板代码。

use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::{Offset, TopicPartitionList};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::KafkaConfig;
use crate::error::SharedError;

// ---------------------------------------------------------------------------
// ConsumerMessage
// ---------------------------------------------------------------------------

/// 拥有所有权的消费消息
///
/// 保留提交位点所需的 topic/partition/offset，确认时原样交回 [`KafkaConsumer::commit`]。
#[derive(Debug, Clone)]
pub struct ConsumerMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<String>,
    pub payload: Vec<u8>,
}

impl ConsumerMessage {
    fn from_borrowed(msg: &BorrowedMessage<'_>) -> Self {
        Self {
            topic: msg.topic().to_string(),
            partition: msg.partition(),
            offset: msg.offset(),
            key: msg
                .key()
                .and_then(|k| std::str::from_utf8(k).ok())
                .map(String::from),
            payload: msg.payload().map(<[u8]>::to_vec).unwrap_or_default(),
        }
    }

    /// JSON 负载反序列化
    pub fn deserialize_payload<T: DeserializeOwned>(&self) -> Result<T, SharedError> {
        serde_json::from_slice(&self.payload)
            .map_err(|e| SharedError::Kafka(format!("负载反序列化失败: {e}")))
    }
}

// ---------------------------------------------------------------------------
// KafkaProducer
// ---------------------------------------------------------------------------

/// 面向业务的 Kafka 生产者
///
/// 封装 `FutureProducer` 并提供类型安全的 JSON 发送方法，
/// 内部已派生 Clone（`FutureProducer` 本身是 Arc 包装的）。
#[derive(Clone)]
pub struct KafkaProducer {
    producer: FutureProducer,
}

impl KafkaProducer {
    /// 根据配置创建生产者
    ///
    /// `message.timeout.ms` 设为 5 秒，超时的投递交由补偿扫描兜底。
    pub fn new(config: &KafkaConfig) -> Result<Self, SharedError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| SharedError::Kafka(format!("创建生产者失败: {e}")))?;

        info!(brokers = %config.brokers, "Kafka 生产者已初始化");
        Ok(Self { producer })
    }

    /// 发送原始字节消息
    pub async fn send(
        &self,
        topic: &str,
        key: &str,
        payload: &[u8],
    ) -> Result<(i32, i64), SharedError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        // rdkafka 0.39+ 返回 Delivery 结构体而非元组
        let delivery = self
            .producer
            .send(record, Duration::from_secs(5))
            .await
            .map_err(|(e, _)| SharedError::Kafka(format!("发送消息失败: {e}")))?;

        debug!(
            topic,
            key,
            partition = delivery.partition,
            offset = delivery.offset,
            "消息已发送"
        );
        Ok((delivery.partition, delivery.offset))
    }

    /// 将值序列化为 JSON 后发送
    pub async fn send_json<T: Serialize>(
        &self,
        topic: &str,
        key: &str,
        value: &T,
    ) -> Result<(i32, i64), SharedError> {
        let payload = serde_json::to_vec(value)
            .map_err(|e| SharedError::Kafka(format!("序列化失败: {e}")))?;

        self.send(topic, key, &payload).await
    }
}

// ---------------------------------------------------------------------------
// KafkaConsumer
// ---------------------------------------------------------------------------

/// 面向业务的 Kafka 消费者
///
/// 关闭自动提交，由调用方在合适的时机通过 [`KafkaConsumer::commit`] 确认消息。
/// 通知 worker 在投递之前就提交位点（先确认后处理），丢失窗口由补偿扫描覆盖。
pub struct KafkaConsumer {
    consumer: StreamConsumer,
}

impl KafkaConsumer {
    /// 创建消费者
    ///
    /// `group_id_suffix` 允许同一服务内不同消费逻辑使用独立的消费组。
    pub fn new(config: &KafkaConfig, group_id_suffix: Option<&str>) -> Result<Self, SharedError> {
        let group_id = match group_id_suffix {
            Some(suffix) => format!("{}.{}", config.consumer_group, suffix),
            None => config.consumer_group.clone(),
        };

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &group_id)
            .set("auto.offset.reset", &config.auto_offset_reset)
            .set("enable.auto.commit", "false")
            .create()
            .map_err(|e| SharedError::Kafka(format!("创建消费者失败: {e}")))?;

        info!(brokers = %config.brokers, group_id, "Kafka 消费者已初始化");
        Ok(Self { consumer })
    }

    /// 订阅指定的 topic 列表
    pub fn subscribe(&self, topics: &[&str]) -> Result<(), SharedError> {
        self.consumer
            .subscribe(topics)
            .map_err(|e| SharedError::Kafka(format!("订阅 topic 失败: {e}")))?;

        info!(?topics, "已订阅 Kafka topics");
        Ok(())
    }

    /// 拉取下一条消息，阻塞直到有消息或出错
    pub async fn recv(&self) -> Result<ConsumerMessage, SharedError> {
        let borrowed = self
            .consumer
            .recv()
            .await
            .map_err(|e| SharedError::Kafka(format!("接收消息失败: {e}")))?;

        let msg = ConsumerMessage::from_borrowed(&borrowed);
        debug!(
            topic = %msg.topic,
            partition = msg.partition,
            offset = msg.offset,
            "收到 Kafka 消息"
        );
        Ok(msg)
    }

    /// 提交该消息的位点（offset + 1），之后该消息不会再被重新投递
    pub fn commit(&self, msg: &ConsumerMessage) -> Result<(), SharedError> {
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(&msg.topic, msg.partition, Offset::Offset(msg.offset + 1))
            .map_err(|e| SharedError::Kafka(format!("构造提交位点失败: {e}")))?;

        self.consumer
            .commit(&tpl, CommitMode::Async)
            .map_err(|e| SharedError::Kafka(format!("提交位点失败: {e}")))?;

        debug!(
            topic = %msg.topic,
            partition = msg.partition,
            offset = msg.offset,
            "已提交 Kafka 位点"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 测试
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_message(payload: &[u8]) -> ConsumerMessage {
        ConsumerMessage {
            topic: "notification.ids".to_string(),
            partition: 0,
            offset: 42,
            key: Some("7".to_string()),
            payload: payload.to_vec(),
        }
    }

    #[test]
    fn test_consumer_message_deserialize_id() {
        let msg = make_message(b"7");
        let id: i64 = msg.deserialize_payload().unwrap();
        assert_eq!(id, 7);
    }

    #[test]
    fn test_consumer_message_deserialize_invalid_json() {
        let msg = make_message(b"not json");
        let result: Result<i64, _> = msg.deserialize_payload();
        assert!(result.is_err());
    }
}
