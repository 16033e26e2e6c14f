//! 投递渠道适配器
//!
//! 每种渠道一个适配器，路由按通知的渠道标签选择。
//! 适配器只负责把一条通知送达外部系统，不读写通知状态。

mod email;
mod sms;

pub use email::{EmailAdapter, MailTransport, SmtpMailTransport};
pub use sms::{HttpSmsGateway, SmsAdapter, SmsGateway, SmsPayload, SmsRecipient, SmsSigner};

use async_trait::async_trait;
use notification_service::{Channel, Notification};

use crate::error::DeliveryError;

/// 渠道适配器接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// 适配器负责的渠道
    fn channel(&self) -> Channel;

    /// 投递一条通知，返回 Ok 即视为外部系统已接收
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError>;
}
