//! 接收人服务

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::error::{NotificationError, Result};
use crate::models::{NewPerson, PageRequest, Person};
use crate::repository::PersonRepository;

/// 接收人服务
///
/// 批量导入时先整体校验，任一记录不合法则全部不保存；
/// 身份（姓名、渠道、城市）已存在的记录跳过
pub struct PersonService {
    repo: Arc<dyn PersonRepository>,
}

impl PersonService {
    pub fn new(repo: Arc<dyn PersonRepository>) -> Self {
        Self { repo }
    }

    /// 批量保存接收人，返回本次新增的记录
    #[instrument(skip(self, people), fields(count = people.len()))]
    pub async fn save_people(&self, people: Vec<NewPerson>) -> Result<Vec<Person>> {
        for person in &people {
            person.check()?;
        }

        let mut seen = HashSet::new();
        let mut saved = Vec::new();
        for person in people {
            let identity = person.identity();
            if !seen.insert(identity.clone()) {
                continue;
            }
            if self.repo.find_by_identity(&identity).await?.is_some() {
                info!(full_name = %person.full_name, "接收人已存在，跳过");
                continue;
            }

            let created = self.repo.create(&person).await?;
            info!(person_id = created.id, full_name = %created.full_name, "接收人已保存");
            saved.push(created);
        }

        Ok(saved)
    }

    pub async fn list_people(&self, page: PageRequest) -> Result<Vec<Person>> {
        self.repo.list(page).await
    }

    pub async fn update_person(&self, id: i64, person: NewPerson) -> Result<Person> {
        person.check()?;

        let updated = self
            .repo
            .update(id, &person)
            .await?
            .ok_or_else(|| NotificationError::not_found("person", id))?;

        info!(person_id = id, "接收人已更新");
        Ok(updated)
    }

    pub async fn delete_person(&self, id: i64) -> Result<()> {
        if !self.repo.delete(id).await? {
            return Err(NotificationError::not_found("person", id));
        }
        info!(person_id = id, "接收人已删除");
        Ok(())
    }
}
