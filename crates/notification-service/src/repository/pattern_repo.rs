//! 模板仓储（Postgres）
//!
//! 模板与接收人通过 `pattern_recipients` 关联表多对多关联

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::person_repo::PERSON_COLUMNS;
use super::traits::PatternRepository;
use crate::error::{NotificationError, Result};
use crate::models::{PageRequest, Pattern, PatternRow, Person};

/// 带模板 id 的接收人行，用于批量加载关联
#[derive(sqlx::FromRow)]
struct RecipientRow {
    pattern_id: Uuid,
    #[sqlx(flatten)]
    person: Person,
}

/// 模板仓储
pub struct PgPatternRepository {
    pool: PgPool,
}

impl PgPatternRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 批量加载多个模板的接收人，按模板 id 分组
    async fn load_recipients(&self, pattern_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Person>>> {
        if pattern_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let columns = PERSON_COLUMNS
            .split(", ")
            .map(|c| format!("p.{c}"))
            .collect::<Vec<_>>()
            .join(", ");

        let rows = sqlx::query_as::<_, RecipientRow>(&format!(
            r#"
            SELECT pr.pattern_id, {columns}
            FROM pattern_recipients pr
            JOIN people p ON p.id = pr.person_id
            WHERE pr.pattern_id = ANY($1)
            ORDER BY p.id ASC
            "#
        ))
        .bind(pattern_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<Person>> = HashMap::new();
        for row in rows {
            grouped.entry(row.pattern_id).or_default().push(row.person);
        }
        Ok(grouped)
    }
}

#[async_trait]
impl PatternRepository for PgPatternRepository {
    async fn create(&self, pattern: &Pattern) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO patterns (id, title, body, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(pattern.id)
        .bind(&pattern.title)
        .bind(&pattern.body)
        .bind(pattern.created_at)
        .execute(&mut *tx)
        .await;

        if let Err(sqlx::Error::Database(db_err)) = &inserted
            && db_err.is_unique_violation()
        {
            return Err(NotificationError::already_exists("pattern", &pattern.title));
        }
        inserted?;

        let person_ids: Vec<i64> = pattern.recipients.iter().map(|p| p.id).collect();
        if !person_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO pattern_recipients (pattern_id, person_id)
                SELECT $1, UNNEST($2::BIGINT[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(pattern.id)
            .bind(&person_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Pattern>> {
        let row = sqlx::query_as::<_, PatternRow>(
            "SELECT id, title, body, created_at FROM patterns WHERE title = $1",
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut recipients = self.load_recipients(&[row.id]).await?;
        let people = recipients.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_pattern(people)))
    }

    async fn add_recipients(&self, pattern_id: Uuid, person_ids: &[i64]) -> Result<()> {
        if person_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO pattern_recipients (pattern_id, person_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(pattern_id)
        .bind(person_ids)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<Pattern>> {
        let rows = sqlx::query_as::<_, PatternRow>(
            r#"
            SELECT id, title, body, created_at
            FROM patterns
            ORDER BY created_at ASC, title ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut recipients = self.load_recipients(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let people = recipients.remove(&row.id).unwrap_or_default();
                row.into_pattern(people)
            })
            .collect())
    }

    async fn delete_by_title(&self, title: &str) -> Result<bool> {
        // pattern_recipients 通过外键级联删除
        let result = sqlx::query("DELETE FROM patterns WHERE title = $1")
            .bind(title)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
