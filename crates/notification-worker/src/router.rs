//! 投递路由
//!
//! 按通知的渠道标签选择适配器，投递成功后以条件更新把状态改为 Sent。
//! 未知渠道直接返回错误且不触碰存储，投递失败保持 NotSent 留给补偿扫描。

use std::collections::HashMap;
use std::sync::Arc;

use alert_shared::observability::metrics;
use notification_service::{Channel, Notification, NotificationStore};
use tracing::{debug, info, instrument, warn};

use crate::channels::ChannelAdapter;
use crate::error::{Result, WorkerError};

/// 单次投递的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 本次投递完成
    Sent,
    /// 通知已是 Sent，未调用渠道
    AlreadySent,
}

/// 无法识别的渠道统一使用的指标标签
pub const UNKNOWN_CHANNEL_LABEL: &str = "unknown";

pub struct DispatchRouter {
    store: Arc<dyn NotificationStore>,
    adapters: HashMap<Channel, Arc<dyn ChannelAdapter>>,
    /// 调用渠道前重新读取状态，缩小并发重复投递的窗口
    verify_before_send: bool,
}

impl DispatchRouter {
    pub fn new(store: Arc<dyn NotificationStore>, verify_before_send: bool) -> Self {
        Self {
            store,
            adapters: HashMap::new(),
            verify_before_send,
        }
    }

    /// 注册渠道适配器，同一渠道后注册的覆盖先注册的
    pub fn with_adapter(mut self, adapter: Arc<dyn ChannelAdapter>) -> Self {
        self.adapters.insert(adapter.channel(), adapter);
        self
    }

    pub fn store(&self) -> &Arc<dyn NotificationStore> {
        &self.store
    }

    fn resolve(&self, notification: &Notification) -> Result<&Arc<dyn ChannelAdapter>> {
        notification
            .channel()
            .ok()
            .and_then(|channel| self.adapters.get(&channel))
            .ok_or_else(|| WorkerError::UnknownChannel(notification.channel.clone()))
    }

    /// 投递一条通知
    #[instrument(skip(self, notification), fields(id = notification.id, channel = %notification.channel))]
    pub async fn dispatch(&self, notification: &Notification) -> Result<DispatchOutcome> {
        let adapter = match self.resolve(notification) {
            Ok(adapter) => adapter,
            Err(e) => {
                metrics::record_dispatch(UNKNOWN_CHANNEL_LABEL, "unknown_channel");
                warn!(tag = %notification.channel, "通知渠道无法识别，跳过");
                return Err(e);
            }
        };
        let channel = adapter.channel();

        if notification.is_sent() {
            metrics::record_dispatch(channel.as_str(), "already_sent");
            return Ok(DispatchOutcome::AlreadySent);
        }

        if self.verify_before_send {
            let current = self
                .store
                .find_by_id(notification.id)
                .await?
                .ok_or(WorkerError::NotificationNotFound(notification.id))?;
            if current.is_sent() {
                debug!("通知已被其他执行者发送");
                metrics::record_dispatch(channel.as_str(), "already_sent");
                return Ok(DispatchOutcome::AlreadySent);
            }
        }

        if let Err(source) = adapter.send(notification).await {
            metrics::record_dispatch(channel.as_str(), "failed");
            warn!(error = %source, "通知投递失败，等待补偿扫描重试");
            return Err(WorkerError::Delivery {
                channel: channel.to_string(),
                source,
            });
        }

        if !self.store.mark_sent(notification.id).await? {
            // 条件更新未命中：并发执行者先一步完成了状态切换
            debug!("通知状态已由并发投递更新");
        }

        metrics::record_dispatch(channel.as_str(), "sent");
        info!("通知已发送");
        Ok(DispatchOutcome::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::MockChannelAdapter;
    use crate::error::DeliveryError;
    use notification_service::NotificationStatus;
    use notification_service::repository::MemoryNotificationStore;
    use notification_service::NewNotification;

    fn new_notification(channel: &str) -> NewNotification {
        NewNotification {
            title: "Flood".to_string(),
            text: "Dear Ann, evacuate Riverton!".to_string(),
            destination: "ann@example.com".to_string(),
            channel: channel.to_string(),
        }
    }

    fn email_adapter(times: usize, ok: bool) -> Arc<dyn ChannelAdapter> {
        let mut adapter = MockChannelAdapter::new();
        adapter.expect_channel().return_const(Channel::Email);
        adapter.expect_send().times(times).returning(move |_| {
            if ok {
                Ok(())
            } else {
                Err(DeliveryError::Transport("smtp down".to_string()))
            }
        });
        Arc::new(adapter)
    }

    #[tokio::test]
    async fn test_dispatch_marks_sent() {
        let store = Arc::new(MemoryNotificationStore::new());
        let created = store.create(&new_notification("EMAIL")).await.unwrap();

        let router = DispatchRouter::new(store.clone(), true).with_adapter(email_adapter(1, true));
        let outcome = router.dispatch(&created).await.unwrap();

        assert_eq!(outcome, DispatchOutcome::Sent);
        let stored = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored.status, NotificationStatus::Sent);
    }

    #[tokio::test]
    async fn test_dispatch_failure_keeps_not_sent() {
        let store = Arc::new(MemoryNotificationStore::new());
        let created = store.create(&new_notification("EMAIL")).await.unwrap();

        let router = DispatchRouter::new(store.clone(), true).with_adapter(email_adapter(1, false));
        let err = router.dispatch(&created).await.unwrap_err();

        assert!(matches!(err, WorkerError::Delivery { .. }));
        assert!(err.is_retryable());
        let stored = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored.status, NotificationStatus::NotSent);
    }

    #[tokio::test]
    async fn test_already_sent_snapshot_skips_adapter() {
        let store = Arc::new(MemoryNotificationStore::new());
        let created = store.create(&new_notification("EMAIL")).await.unwrap();
        store.mark_sent(created.id).await.unwrap();
        let snapshot = store.find_by_id(created.id).await.unwrap().unwrap();

        let router = DispatchRouter::new(store.clone(), false).with_adapter(email_adapter(0, true));
        assert_eq!(
            router.dispatch(&snapshot).await.unwrap(),
            DispatchOutcome::AlreadySent
        );
    }

    #[tokio::test]
    async fn test_stale_snapshot_rechecked_before_send() {
        let store = Arc::new(MemoryNotificationStore::new());
        let stale = store.create(&new_notification("EMAIL")).await.unwrap();
        store.mark_sent(stale.id).await.unwrap();

        let router = DispatchRouter::new(store.clone(), true).with_adapter(email_adapter(0, true));
        assert_eq!(
            router.dispatch(&stale).await.unwrap(),
            DispatchOutcome::AlreadySent
        );
    }

    #[tokio::test]
    async fn test_unknown_channel_leaves_store_untouched() {
        let store = Arc::new(MemoryNotificationStore::new());
        let created = store.create(&new_notification("FAX")).await.unwrap();

        let router = DispatchRouter::new(store.clone(), true).with_adapter(email_adapter(0, true));
        let err = router.dispatch(&created).await.unwrap_err();

        assert!(matches!(err, WorkerError::UnknownChannel(ref tag) if tag == "FAX"));
        let stored = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored.status, NotificationStatus::NotSent);
    }

    #[tokio::test]
    async fn test_unregistered_channel_is_unknown() {
        let store = Arc::new(MemoryNotificationStore::new());
        let created = store.create(&new_notification("SMS")).await.unwrap();

        let router = DispatchRouter::new(store, true).with_adapter(email_adapter(0, true));
        let err = router.dispatch(&created).await.unwrap_err();
        assert!(matches!(err, WorkerError::UnknownChannel(ref tag) if tag == "SMS"));
    }

    #[test]
    fn test_unknown_tags_share_one_metric_label() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        ::metrics::with_local_recorder(&recorder, || {
            tokio_test::block_on(async {
                let store = Arc::new(MemoryNotificationStore::new());
                let router = DispatchRouter::new(store.clone(), true);
                for tag in ["FAX", "PAGER", "PIGEON"] {
                    let created = store.create(&new_notification(tag)).await.unwrap();
                    assert!(router.dispatch(&created).await.is_err());
                }
            })
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"channel="unknown""#));
        assert!(!rendered.contains("FAX"));
        assert!(!rendered.contains("PIGEON"));
    }
}
