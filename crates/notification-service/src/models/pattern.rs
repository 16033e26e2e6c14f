//! 通知模板实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::person::Person;
use crate::error::{NotificationError, Result};
use crate::template;

/// 模板标题最大字符数，短信渠道把标题作为发送方名称
pub const MAX_TITLE_CHARS: usize = 10;

/// 通知模板
///
/// 标题全局唯一。接收人与模板多对多关联，接收人的生命周期独立于模板
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub recipients: Vec<Person>,
    pub created_at: DateTime<Utc>,
}

/// 模板表行（不含接收人）
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PatternRow {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl PatternRow {
    pub fn into_pattern(self, recipients: Vec<Person>) -> Pattern {
        Pattern {
            id: self.id,
            title: self.title,
            body: self.body,
            recipients,
            created_at: self.created_at,
        }
    }
}

/// 新建模板请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPattern {
    pub title: String,
    pub body: String,
}

impl NewPattern {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// 校验标题长度和正文占位符
    pub fn validate(&self) -> Result<()> {
        let chars = self.title.chars().count();
        if self.title.trim().is_empty() || chars > MAX_TITLE_CHARS {
            return Err(NotificationError::Validation(format!(
                "模板标题长度必须在 1-{MAX_TITLE_CHARS} 个字符之间，当前 {chars}"
            )));
        }
        template::validate_body(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_pattern() {
        assert!(NewPattern::new("Flood", "Dear {name}, evacuate {city}!").validate().is_ok());
    }

    #[test]
    fn test_title_length_counts_chars() {
        assert!(NewPattern::new("Пожар-2024", "{name} {city}").validate().is_ok());
        assert!(NewPattern::new("Earthquake!", "{name} {city}").validate().is_err());
        assert!(NewPattern::new("", "{name} {city}").validate().is_err());
    }

    #[test]
    fn test_missing_placeholder_rejected() {
        let err = NewPattern::new("Fire", "Dear {name}, leave now")
            .validate()
            .unwrap_err();
        assert!(matches!(err, NotificationError::Validation(_)));
    }
}
