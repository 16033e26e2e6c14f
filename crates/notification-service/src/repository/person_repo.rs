//! 接收人仓储（Postgres）

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::PersonRepository;
use crate::error::Result;
use crate::models::{NewPerson, PageRequest, Person, PersonIdentity};

pub(crate) const PERSON_COLUMNS: &str = "id, full_name, channel, email, phone, city, created_at";

/// 接收人仓储
pub struct PgPersonRepository {
    pool: PgPool,
}

impl PgPersonRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersonRepository for PgPersonRepository {
    async fn create(&self, person: &NewPerson) -> Result<Person> {
        let created = sqlx::query_as::<_, Person>(&format!(
            r#"
            INSERT INTO people (full_name, channel, email, phone, city)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PERSON_COLUMNS}
            "#
        ))
        .bind(&person.full_name)
        .bind(person.channel)
        .bind(&person.email)
        .bind(&person.phone)
        .bind(&person.city)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Person>> {
        let person = sqlx::query_as::<_, Person>(&format!(
            "SELECT {PERSON_COLUMNS} FROM people WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(person)
    }

    async fn find_by_identity(&self, identity: &PersonIdentity) -> Result<Option<Person>> {
        let person = sqlx::query_as::<_, Person>(&format!(
            r#"
            SELECT {PERSON_COLUMNS} FROM people
            WHERE full_name = $1 AND channel = $2 AND city = $3
            LIMIT 1
            "#
        ))
        .bind(&identity.full_name)
        .bind(identity.channel)
        .bind(&identity.city)
        .fetch_optional(&self.pool)
        .await?;

        Ok(person)
    }

    async fn find_by_full_names(&self, names: &[String]) -> Result<Vec<Person>> {
        if names.is_empty() {
            return Ok(vec![]);
        }

        let people = sqlx::query_as::<_, Person>(&format!(
            "SELECT {PERSON_COLUMNS} FROM people WHERE full_name = ANY($1) ORDER BY id ASC"
        ))
        .bind(names)
        .fetch_all(&self.pool)
        .await?;

        Ok(people)
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<Person>> {
        let people = sqlx::query_as::<_, Person>(&format!(
            "SELECT {PERSON_COLUMNS} FROM people ORDER BY id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(people)
    }

    async fn update(&self, id: i64, person: &NewPerson) -> Result<Option<Person>> {
        let updated = sqlx::query_as::<_, Person>(&format!(
            r#"
            UPDATE people
            SET full_name = $2, channel = $3, email = $4, phone = $5, city = $6
            WHERE id = $1
            RETURNING {PERSON_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&person.full_name)
        .bind(person.channel)
        .bind(&person.email)
        .bind(&person.phone)
        .bind(&person.city)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM people WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
