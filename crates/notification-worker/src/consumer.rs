//! 通知消费者
//!
//! 从队列逐条取出通知 id，先确认再处理：读取当前通知并交给路由投递。
//! 确认之后的失败不会重新入队，而是由每次消费后触发的补偿扫描兜底。

use std::sync::Arc;
use std::time::Duration;

use notification_service::{Delivery, NotificationSubscription};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::router::{DispatchOutcome, DispatchRouter};
use crate::sweeper::RetrySweeper;

/// 队列出错后的退避时间，避免 broker 不可用时空转
const RECV_ERROR_BACKOFF: Duration = Duration::from_secs(1);

pub struct NotificationConsumer<S> {
    subscription: S,
    router: Arc<DispatchRouter>,
    sweeper: Option<Arc<RetrySweeper>>,
}

impl<S: NotificationSubscription> NotificationConsumer<S> {
    pub fn new(subscription: S, router: Arc<DispatchRouter>) -> Self {
        Self {
            subscription,
            router,
            sweeper: None,
        }
    }

    /// 每处理一条后触发一次补偿扫描
    pub fn with_sweeper(mut self, sweeper: Arc<RetrySweeper>) -> Self {
        self.sweeper = Some(sweeper);
        self
    }

    /// 启动消费循环，直到队列关闭或收到 shutdown 信号
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("通知消费者已启动");

        loop {
            let next = tokio::select! {
                next = self.subscription.next() => next,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            };

            match next {
                Some(Ok(delivery)) => {
                    if let Err(e) = self.handle_delivery(&delivery).await {
                        error!(
                            notification_id = delivery.notification_id,
                            error = %e,
                            "处理通知失败"
                        );
                    }
                }
                Some(Err(e)) => {
                    error!(error = %e, "读取队列失败");
                    tokio::time::sleep(RECV_ERROR_BACKOFF).await;
                }
                None => {
                    info!("通知队列已关闭");
                    break;
                }
            }
        }

        info!("通知消费者已停止");
    }

    /// 处理一条投递
    ///
    /// 通知不存在时返回 `Ok(None)`。无论投递结果如何都会触发补偿扫描。
    pub async fn handle_delivery(&mut self, delivery: &Delivery) -> Result<Option<DispatchOutcome>> {
        if let Err(e) = self.subscription.ack(delivery).await {
            // 未确认的消息会被重新投递，路由对已发送通知是幂等的
            warn!(notification_id = delivery.notification_id, error = %e, "确认投递失败");
        }

        let result = self.dispatch_by_id(delivery.notification_id).await;

        if let Some(sweeper) = &self.sweeper {
            sweeper.trigger();
        }

        result
    }

    async fn dispatch_by_id(&self, id: i64) -> Result<Option<DispatchOutcome>> {
        let Some(notification) = self.router.store().find_by_id(id).await? else {
            warn!(notification_id = id, "队列中的通知不存在，忽略");
            return Ok(None);
        };

        self.router.dispatch(&notification).await.map(Some)
    }
}
