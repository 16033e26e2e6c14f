//! 邮件渠道
//!
//! 通过 SMTP 发送纯文本邮件，标题即邮件主题，正文即渲染后的通知文本。

use std::time::Duration;

use alert_shared::config::MailConfig;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use notification_service::{Channel, Notification};
use tracing::{debug, info};

use super::ChannelAdapter;
use crate::error::{DeliveryError, WorkerError};

/// 邮件传输接口，隔离 SMTP 便于测试
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send_mail(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError>;
}

/// 基于 lettre 的 SMTP 传输
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    pub fn new(config: &MailConfig) -> Result<Self, WorkerError> {
        let mut builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| WorkerError::Config(format!("SMTP relay 配置失败: {e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_seconds)));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        info!(host = %config.host, port = config.port, tls = config.use_tls, "SMTP 传输已初始化");
        Ok(Self {
            transport: builder.build(),
        })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address
        .trim()
        .parse()
        .map_err(|e| DeliveryError::InvalidDestination(format!("{address}: {e}")))
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send_mail(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        let message = Message::builder()
            .from(parse_mailbox(from)?)
            .to(parse_mailbox(to)?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| DeliveryError::Transport(format!("构造邮件失败: {e}")))?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        debug!(code = %response.code(), "SMTP 已接收邮件");
        Ok(())
    }
}

/// 邮件渠道适配器
pub struct EmailAdapter<T> {
    sender: String,
    transport: T,
}

impl<T: MailTransport> EmailAdapter<T> {
    pub fn new(sender: impl Into<String>, transport: T) -> Self {
        Self {
            sender: sender.into(),
            transport,
        }
    }
}

impl EmailAdapter<SmtpMailTransport> {
    pub fn from_config(config: &MailConfig) -> Result<Self, WorkerError> {
        Ok(Self::new(config.sender.clone(), SmtpMailTransport::new(config)?))
    }
}

#[async_trait]
impl<T: MailTransport> ChannelAdapter for EmailAdapter<T> {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        self.transport
            .send_mail(
                &self.sender,
                &notification.destination,
                &notification.title,
                &notification.text,
            )
            .await
    }
}
