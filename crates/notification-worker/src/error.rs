//! 投递 worker 错误类型
//!
//! 区分渠道投递失败、未知渠道和存储错误，
//! 便于路由与补偿扫描决定记录指标后继续还是中止。

use thiserror::Error;

use alert_shared::error::SharedError;
use notification_service::NotificationError;

/// 单次渠道投递失败的原因
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("目的地非法: {0}")]
    InvalidDestination(String),

    #[error("请求签名失败: {0}")]
    Signing(String),

    #[error("传输失败: {0}")]
    Transport(String),

    #[error("网关拒绝: status={status}, body={body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("未知的通知渠道: {0}")]
    UnknownChannel(String),

    #[error("通知发送失败: 渠道={channel}, 原因={source}")]
    Delivery {
        channel: String,
        #[source]
        source: DeliveryError,
    },

    #[error("通知不存在: {0}")]
    NotificationNotFound(i64),

    #[error("配置错误: {0}")]
    Config(String),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error(transparent)]
    Shared(#[from] SharedError),
}

pub type Result<T> = std::result::Result<T, WorkerError>;

impl WorkerError {
    /// 渠道失败或存储暂时不可用的通知会在下一轮补偿扫描中重试
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Delivery { .. } => true,
            Self::Notification(e) => e.is_retryable(),
            Self::Shared(e) => e.is_retryable(),
            _ => false,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownChannel(_) => "UNKNOWN_CHANNEL",
            Self::Delivery { .. } => "DELIVERY_FAILED",
            Self::NotificationNotFound(_) => "NOTIFICATION_NOT_FOUND",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Notification(e) => e.error_code(),
            Self::Shared(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WorkerError::Delivery {
            channel: "SMS".to_string(),
            source: DeliveryError::Rejected {
                status: 401,
                body: "unauthorized".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "通知发送失败: 渠道=SMS, 原因=网关拒绝: status=401, body=unauthorized"
        );

        let err = WorkerError::UnknownChannel("FAX".to_string());
        assert_eq!(err.to_string(), "未知的通知渠道: FAX");
    }

    #[test]
    fn test_retryable() {
        let delivery = WorkerError::Delivery {
            channel: "EMAIL".to_string(),
            source: DeliveryError::Transport("timeout".to_string()),
        };
        assert!(delivery.is_retryable());
        assert!(!WorkerError::UnknownChannel("FAX".to_string()).is_retryable());
        assert_eq!(
            WorkerError::NotificationNotFound(1).error_code(),
            "NOTIFICATION_NOT_FOUND"
        );
    }
}
