//! 短信渠道
//!
//! 请求体为 JSON：`{sender, message, recipients: [{msisdn}]}`，
//! 用 HS256 JWT 签名后以 Bearer 头提交给短信网关。签名声明中携带请求体摘要，
//! 网关据此校验请求体未被篡改。

use std::time::Duration;

use alert_shared::config::SmsConfig;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use notification_service::{Channel, Notification};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::ChannelAdapter;
use crate::error::{DeliveryError, WorkerError};

/// 短信网关请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsPayload {
    pub sender: String,
    pub message: String,
    pub recipients: Vec<SmsRecipient>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsRecipient {
    pub msisdn: i64,
}

impl SmsPayload {
    /// 由通知构造请求体，目的地必须是纯数字手机号（允许前导 +）
    pub fn from_notification(notification: &Notification) -> Result<Self, DeliveryError> {
        let raw = notification.destination.trim();
        let digits = raw.strip_prefix('+').unwrap_or(raw);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DeliveryError::InvalidDestination(raw.to_string()));
        }
        let msisdn = digits
            .parse::<i64>()
            .map_err(|_| DeliveryError::InvalidDestination(raw.to_string()))?;

        Ok(Self {
            sender: notification.title.clone(),
            message: notification.text.clone(),
            recipients: vec![SmsRecipient { msisdn }],
        })
    }
}

/// 签名声明
#[derive(Debug, Serialize, Deserialize)]
struct SmsClaims {
    iss: String,
    iat: i64,
    /// 请求体 SHA-256 摘要（base64）
    body_sha256: String,
}

/// 请求签名器
#[derive(Clone)]
pub struct SmsSigner {
    key: String,
    secret: String,
}

impl SmsSigner {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }

    pub fn body_digest(body: &[u8]) -> String {
        STANDARD.encode(Sha256::digest(body))
    }

    /// 为请求体签发 token
    pub fn sign(&self, body: &[u8]) -> Result<String, DeliveryError> {
        if self.secret.is_empty() {
            return Err(DeliveryError::Signing("未配置短信签名密钥".to_string()));
        }

        let claims = SmsClaims {
            iss: self.key.clone(),
            iat: Utc::now().timestamp(),
            body_sha256: Self::body_digest(body),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| DeliveryError::Signing(e.to_string()))
    }
}

/// 短信网关接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn submit(&self, payload: &SmsPayload) -> Result<(), DeliveryError>;
}

/// 基于 reqwest 的 HTTP 短信网关
pub struct HttpSmsGateway {
    client: reqwest::Client,
    endpoint: String,
    signer: SmsSigner,
}

impl HttpSmsGateway {
    pub fn new(config: &SmsConfig) -> Result<Self, WorkerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| WorkerError::Config(format!("HTTP 客户端创建失败: {e}")))?;

        info!(endpoint = %config.endpoint, "短信网关已初始化");
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            signer: SmsSigner::new(config.key.clone(), config.secret.clone()),
        })
    }
}

#[async_trait]
impl SmsGateway for HttpSmsGateway {
    async fn submit(&self, payload: &SmsPayload) -> Result<(), DeliveryError> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| DeliveryError::Transport(format!("序列化请求体失败: {e}")))?;
        let token = self.signer.sign(&body)?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/json; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), "短信网关已接收");
        Ok(())
    }
}

/// 短信渠道适配器
pub struct SmsAdapter<G> {
    gateway: G,
}

impl<G: SmsGateway> SmsAdapter<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }
}

impl SmsAdapter<HttpSmsGateway> {
    pub fn from_config(config: &SmsConfig) -> Result<Self, WorkerError> {
        Ok(Self::new(HttpSmsGateway::new(config)?))
    }
}

#[async_trait]
impl<G: SmsGateway> ChannelAdapter for SmsAdapter<G> {
    fn channel(&self) -> Channel {
        Channel::Sms
    }

    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let payload = SmsPayload::from_notification(notification)?;
        self.gateway.submit(&payload).await
    }
}
