//! 通知领域模型
//!
//! 包含模板、接收人、通知三类实体及其枚举

pub mod enums;
pub mod notification;
pub mod pattern;
pub mod person;

pub use enums::{Channel, NotificationStatus};
pub use notification::{NewNotification, Notification};
pub use pattern::{MAX_TITLE_CHARS, NewPattern, Pattern, PatternRow};
pub use person::{NewPerson, Person, PersonIdentity};

use serde::{Deserialize, Serialize};

/// 分页请求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: i64,
    pub limit: i64,
}

impl PageRequest {
    pub const DEFAULT_SIZE: i64 = 20;
    pub const MAX_SIZE: i64 = 200;

    /// 按页码（从 0 开始）和页大小构造，页大小限制在 1..=MAX_SIZE
    pub fn new(page: i64, size: i64) -> Self {
        let limit = size.clamp(1, Self::MAX_SIZE);
        Self {
            offset: page.max(0).saturating_mul(limit),
            limit,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_bounds() {
        assert_eq!(PageRequest::new(2, 10), PageRequest { offset: 20, limit: 10 });
        assert_eq!(PageRequest::new(-1, 0), PageRequest { offset: 0, limit: 1 });
        assert_eq!(PageRequest::new(0, 10_000).limit, PageRequest::MAX_SIZE);
        assert_eq!(PageRequest::new(i64::MAX, 20).offset, i64::MAX);
        assert_eq!(
            PageRequest::new(461_168_601_842_738_791, 20),
            PageRequest { offset: i64::MAX, limit: 20 }
        );
    }
}
