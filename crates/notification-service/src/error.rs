//! 通知领域错误类型
//!
//! 区分校验、资源缺失、重复等业务错误与数据库、队列等系统错误，
//! 调用方据此决定立即返回还是交给补偿扫描处理。

use alert_shared::error::SharedError;
use thiserror::Error;

/// 通知领域错误
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("{entity} 不存在: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} 已存在: {key}")]
    AlreadyExists { entity: &'static str, key: String },

    #[error("未知的通知渠道: {0}")]
    UnknownChannel(String),

    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("队列错误: {0}")]
    Queue(String),

    #[error(transparent)]
    Shared(#[from] SharedError),
}

/// 通知领域 Result 类型别名
pub type Result<T> = std::result::Result<T, NotificationError>;

impl NotificationError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn already_exists(entity: &'static str, key: impl ToString) -> Self {
        Self::AlreadyExists {
            entity,
            key: key.to_string(),
        }
    }

    /// 检查是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Database(_) | Self::Queue(_) => true,
            Self::Shared(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// 获取错误码
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AlreadyExists { .. } => "ALREADY_EXISTS",
            Self::UnknownChannel(_) => "UNKNOWN_CHANNEL",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Queue(_) => "QUEUE_ERROR",
            Self::Shared(e) => e.code(),
        }
    }
}

impl From<validator::ValidationErrors> for NotificationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            NotificationError::not_found("pattern", "fire").error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            NotificationError::UnknownChannel("FAX".to_string()).error_code(),
            "UNKNOWN_CHANNEL"
        );
        assert_eq!(
            NotificationError::Shared(SharedError::Kafka("down".to_string())).error_code(),
            "KAFKA_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        let err = NotificationError::already_exists("pattern", "flood");
        assert_eq!(err.to_string(), "pattern 已存在: flood");
    }

    #[test]
    fn test_is_retryable() {
        assert!(NotificationError::Queue("closed".to_string()).is_retryable());
        assert!(!NotificationError::Validation("bad".to_string()).is_retryable());
        assert!(!NotificationError::UnknownChannel("FAX".to_string()).is_retryable());
    }
}
