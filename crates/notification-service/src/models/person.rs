//! 接收人实体定义

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::enums::Channel;
use crate::error::{NotificationError, Result};

/// 手机号只允许可选的 `+` 前缀加数字，短信网关要求号码可解析为整数
static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9]{5,15}$").expect("手机号正则非法")
});

/// 接收人
///
/// 只绑定一种渠道。去重身份为（姓名、渠道、城市），与自增 id 无关
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: i64,
    pub full_name: String,
    pub channel: Channel,
    #[sqlx(default)]
    pub email: Option<String>,
    #[sqlx(default)]
    pub phone: Option<String>,
    pub city: String,
    pub created_at: DateTime<Utc>,
}

impl Person {
    pub fn identity(&self) -> PersonIdentity {
        PersonIdentity::new(&self.full_name, self.channel, &self.city)
    }

    /// 按渠道选择投递目的地，缺少对应字段时返回 None
    pub fn destination(&self) -> Option<&str> {
        let value = match self.channel {
            Channel::Email => self.email.as_deref(),
            Channel::Sms => self.phone.as_deref(),
        };
        value.filter(|v| !v.trim().is_empty())
    }
}

/// 接收人去重身份
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PersonIdentity {
    pub full_name: String,
    pub channel: Channel,
    pub city: String,
}

impl PersonIdentity {
    pub fn new(full_name: &str, channel: Channel, city: &str) -> Self {
        Self {
            full_name: full_name.to_string(),
            channel,
            city: city.to_string(),
        }
    }
}

/// 新建或更新接收人的请求
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_contact"))]
pub struct NewPerson {
    #[validate(custom(function = "not_blank"))]
    pub full_name: String,
    pub channel: Channel,
    #[validate(email(message = "邮箱格式非法"))]
    pub email: Option<String>,
    #[validate(regex(path = *PHONE_REGEX, message = "手机号格式非法"))]
    pub phone: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub city: String,
}

impl NewPerson {
    pub fn identity(&self) -> PersonIdentity {
        PersonIdentity::new(&self.full_name, self.channel, &self.city)
    }

    /// 校验字段并转为领域错误
    pub fn check(&self) -> Result<()> {
        self.validate().map_err(NotificationError::from)
    }
}

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("不能为空".into()));
    }
    Ok(())
}

/// 渠道对应的联系方式必须存在
fn validate_contact(person: &NewPerson) -> std::result::Result<(), ValidationError> {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());

    match person.channel {
        Channel::Email if !present(&person.email) => {
            Err(ValidationError::new("missing_email").with_message("EMAIL 渠道必须提供邮箱".into()))
        }
        Channel::Sms if !present(&person.phone) => {
            Err(ValidationError::new("missing_phone").with_message("SMS 渠道必须提供手机号".into()))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email_person(name: &str) -> NewPerson {
        NewPerson {
            full_name: name.to_string(),
            channel: Channel::Email,
            email: Some("ann@example.com".to_string()),
            phone: None,
            city: "Riverton".to_string(),
        }
    }

    #[test]
    fn test_valid_person() {
        assert!(email_person("Ann Lee").check().is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = email_person("   ").check().unwrap_err();
        assert!(matches!(err, NotificationError::Validation(_)));
    }

    #[test]
    fn test_channel_requires_contact() {
        let mut person = email_person("Ann Lee");
        person.email = None;
        assert!(person.check().is_err());

        person.channel = Channel::Sms;
        person.phone = Some("4512345678".to_string());
        assert!(person.check().is_ok());
    }

    #[test]
    fn test_malformed_contacts_rejected() {
        let mut person = email_person("Ann Lee");
        person.email = Some("not-an-email".to_string());
        assert!(person.check().is_err());

        let mut person = email_person("Ann Lee");
        person.phone = Some("call me".to_string());
        assert!(person.check().is_err());
    }

    #[test]
    fn test_destination_by_channel() {
        let person = Person {
            id: 1,
            full_name: "Bo Chen".to_string(),
            channel: Channel::Sms,
            email: Some("bo@example.com".to_string()),
            phone: Some("4512345678".to_string()),
            city: "Lakeside".to_string(),
            created_at: Utc::now(),
        };
        assert_eq!(person.destination(), Some("4512345678"));

        let person = Person {
            channel: Channel::Email,
            email: None,
            ..person
        };
        assert_eq!(person.destination(), None);
    }

    #[test]
    fn test_identity_ignores_id_and_contacts() {
        let a = email_person("Ann Lee").identity();
        let mut other = email_person("Ann Lee");
        other.email = Some("lee@example.com".to_string());
        assert_eq!(a, other.identity());

        other.city = "Lakeside".to_string();
        assert_ne!(a, other.identity());
    }
}
