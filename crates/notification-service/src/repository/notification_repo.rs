//! 通知存储（Postgres）

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use super::traits::NotificationStore;
use crate::error::Result;
use crate::models::{NewNotification, Notification, NotificationStatus};

const NOTIFICATION_COLUMNS: &str =
    "id, title, text, destination, channel, status, created_at, updated_at";

/// 通知存储
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    #[instrument(skip(self, notification), fields(channel = %notification.channel))]
    async fn create(&self, notification: &NewNotification) -> Result<Notification> {
        let created = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (title, text, destination, channel, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(&notification.title)
        .bind(&notification.text)
        .bind(&notification.destination)
        .bind(&notification.channel)
        .bind(NotificationStatus::NotSent)
        .fetch_one(&self.pool)
        .await?;

        debug!(notification_id = created.id, "通知已持久化");
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Notification>> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn find_all(&self) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn mark_sent(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = $3
            "#,
        )
        .bind(id)
        .bind(NotificationStatus::Sent)
        .bind(NotificationStatus::NotSent)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// 走 status 索引，避免补偿扫描全表读取
    async fn find_by_status(&self, status: NotificationStatus) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE status = $1 ORDER BY id ASC"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }
}
