//! 通知工厂
//!
//! 按模板为每个接收人渲染并持久化一条通知。
//!
//! ## 处理流程
//!
//! 1. 校验模板正文占位符 -> 2. 校验每个接收人都有对应渠道的联系方式
//!    -> 3. 逐个渲染并持久化（单个失败记录到报告，不回滚、不中断）

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use alert_shared::observability::metrics;

use crate::error::{NotificationError, Result};
use crate::models::{NewNotification, Notification, Pattern, Person};
use crate::repository::NotificationStore;
use crate::template;

/// 单个接收人持久化失败的记录
#[derive(Debug, Clone, Serialize)]
pub struct RecipientFailure {
    pub person_id: i64,
    pub full_name: String,
    pub reason: String,
}

/// 一次生成的结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct FactoryReport {
    pub created: Vec<Notification>,
    pub failures: Vec<RecipientFailure>,
}

impl FactoryReport {
    pub fn ids(&self) -> Vec<i64> {
        self.created.iter().map(|n| n.id).collect()
    }
}

/// 通知工厂
#[derive(Clone)]
pub struct NotificationFactory {
    store: Arc<dyn NotificationStore>,
}

impl NotificationFactory {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// 为模板的每个接收人生成一条 NotSent 通知
    ///
    /// 模板或任一接收人不合法时返回 Validation，不持久化任何记录
    #[instrument(skip(self, pattern), fields(title = %pattern.title, recipients = pattern.recipients.len()))]
    pub async fn create_notifications(&self, pattern: &Pattern) -> Result<FactoryReport> {
        template::validate_body(&pattern.body)?;

        let drafts = pattern
            .recipients
            .iter()
            .map(|person| draft(pattern, person).map(|d| (person, d)))
            .collect::<Result<Vec<_>>>()?;

        let mut report = FactoryReport::default();
        for (person, new_notification) in drafts {
            match self.store.create(&new_notification).await {
                Ok(notification) => report.created.push(notification),
                Err(e) => {
                    warn!(
                        person_id = person.id,
                        error = %e,
                        "通知持久化失败，继续处理后续接收人"
                    );
                    report.failures.push(RecipientFailure {
                        person_id: person.id,
                        full_name: person.full_name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        metrics::record_notifications_created(report.created.len() as u64);
        info!(
            created = report.created.len(),
            failed = report.failures.len(),
            "模板通知生成完成"
        );
        Ok(report)
    }
}

fn draft(pattern: &Pattern, person: &Person) -> Result<NewNotification> {
    let destination = person.destination().ok_or_else(|| {
        NotificationError::Validation(format!(
            "接收人 {} 缺少 {} 渠道的联系方式",
            person.full_name, person.channel
        ))
    })?;

    Ok(NewNotification {
        title: pattern.title.clone(),
        text: template::render(&pattern.body, &template::recipient_fields(person)),
        destination: destination.to_string(),
        channel: person.channel.as_str().to_string(),
    })
}
