//! 通知领域枚举类型
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化，存储为大写下划线字符串

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NotificationError;

/// 通知渠道
///
/// 一个接收人只绑定一种渠道，决定通知的目的地取邮箱还是手机号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    Email,
    Sms,
}

impl Channel {
    /// 渠道标签，与通知记录中保存的字符串一致
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "EMAIL",
            Self::Sms => "SMS",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = NotificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            tag if tag.eq_ignore_ascii_case("EMAIL") => Ok(Self::Email),
            tag if tag.eq_ignore_ascii_case("SMS") => Ok(Self::Sms),
            other => Err(NotificationError::UnknownChannel(other.to_string())),
        }
    }
}

/// 通知投递状态
///
/// 只允许 NotSent -> Sent 单向流转
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    /// 未发送 - 初始状态，等待队列消费或补偿扫描
    #[default]
    NotSent,
    /// 已发送 - 渠道确认接收，终态
    Sent,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotSent => "NOT_SENT",
            Self::Sent => "SENT",
        }
    }
}
