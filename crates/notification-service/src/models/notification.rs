//! 通知实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{Channel, NotificationStatus};
use crate::error::Result;

/// 通知
///
/// 每个（模板, 接收人）在发送时生成一条。除状态外不可变，状态只会从 NotSent 变为 Sent。
/// 渠道以字符串标签保存，投递时才解析，未知标签不会阻止记录落库
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub destination: String,
    pub channel: String,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// 解析渠道标签
    pub fn channel(&self) -> Result<Channel> {
        self.channel.parse()
    }

    pub fn is_sent(&self) -> bool {
        self.status == NotificationStatus::Sent
    }
}

/// 待持久化的通知，id 由存储分配
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
    pub title: String,
    pub text: String,
    pub destination: String,
    pub channel: String,
}

impl NewNotification {
    /// 生成初始状态（NotSent）的通知
    pub fn into_notification(self, id: i64) -> Notification {
        let now = Utc::now();
        Notification {
            id,
            title: self.title,
            text: self.text,
            destination: self.destination,
            channel: self.channel,
            status: NotificationStatus::NotSent,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotificationError;

    fn new_notification(channel: &str) -> NewNotification {
        NewNotification {
            title: "Flood".to_string(),
            text: "Dear Ann Lee, evacuate Riverton!".to_string(),
            destination: "ann@example.com".to_string(),
            channel: channel.to_string(),
        }
    }

    #[test]
    fn test_new_notification_starts_not_sent() {
        let notification = new_notification("EMAIL").into_notification(7);
        assert_eq!(notification.id, 7);
        assert_eq!(notification.status, NotificationStatus::NotSent);
        assert!(!notification.is_sent());
        assert_eq!(notification.channel().unwrap(), Channel::Email);
    }

    #[test]
    fn test_unknown_channel_tag_is_kept() {
        let notification = new_notification("FAX").into_notification(1);
        assert_eq!(notification.channel, "FAX");
        assert!(matches!(
            notification.channel(),
            Err(NotificationError::UnknownChannel(_))
        ));
    }
}
