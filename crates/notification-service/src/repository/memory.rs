//! 内存仓储实现
//!
//! 基于 DashMap，用于本地运行和测试。语义与 Postgres 实现保持一致：
//! 通知状态条件更新、接收人按身份可查、模板标题唯一。

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use super::traits::{NotificationStore, PatternRepository, PersonRepository};
use crate::error::{NotificationError, Result};
use crate::models::{
    NewNotification, NewPerson, Notification, NotificationStatus, PageRequest, Pattern, Person,
    PersonIdentity,
};

fn page_of<T: Clone>(items: &BTreeMap<i64, T>, page: PageRequest) -> Vec<T> {
    items
        .values()
        .skip(page.offset.max(0) as usize)
        .take(page.limit.max(0) as usize)
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// 通知
// ---------------------------------------------------------------------------

/// 内存通知存储
#[derive(Default)]
pub struct MemoryNotificationStore {
    items: DashMap<i64, Notification>,
    next_id: AtomicI64,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn create(&self, notification: &NewNotification) -> Result<Notification> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = notification.clone().into_notification(id);
        self.items.insert(id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Notification>> {
        Ok(self.items.get(&id).map(|n| n.value().clone()))
    }

    async fn find_all(&self) -> Result<Vec<Notification>> {
        let mut all: Vec<Notification> = self.items.iter().map(|n| n.value().clone()).collect();
        all.sort_by_key(|n| n.id);
        Ok(all)
    }

    async fn mark_sent(&self, id: i64) -> Result<bool> {
        // get_mut 持有分片写锁，判断与修改是原子的
        match self.items.get_mut(&id) {
            Some(mut entry) if entry.status == NotificationStatus::NotSent => {
                entry.status = NotificationStatus::Sent;
                entry.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// ---------------------------------------------------------------------------
// 接收人
// ---------------------------------------------------------------------------

/// 内存接收人仓储
#[derive(Default)]
pub struct MemoryPersonRepository {
    items: DashMap<i64, Person>,
    next_id: AtomicI64,
}

impl MemoryPersonRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(&self) -> BTreeMap<i64, Person> {
        self.items
            .iter()
            .map(|p| (*p.key(), p.value().clone()))
            .collect()
    }
}

fn apply(id: i64, person: &NewPerson, created_at: chrono::DateTime<Utc>) -> Person {
    Person {
        id,
        full_name: person.full_name.clone(),
        channel: person.channel,
        email: person.email.clone(),
        phone: person.phone.clone(),
        city: person.city.clone(),
        created_at,
    }
}

#[async_trait]
impl PersonRepository for MemoryPersonRepository {
    async fn create(&self, person: &NewPerson) -> Result<Person> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = apply(id, person, Utc::now());
        self.items.insert(id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Person>> {
        Ok(self.items.get(&id).map(|p| p.value().clone()))
    }

    async fn find_by_identity(&self, identity: &PersonIdentity) -> Result<Option<Person>> {
        Ok(self
            .sorted()
            .into_values()
            .find(|p| &p.identity() == identity))
    }

    async fn find_by_full_names(&self, names: &[String]) -> Result<Vec<Person>> {
        Ok(self
            .sorted()
            .into_values()
            .filter(|p| names.contains(&p.full_name))
            .collect())
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<Person>> {
        Ok(page_of(&self.sorted(), page))
    }

    async fn update(&self, id: i64, person: &NewPerson) -> Result<Option<Person>> {
        Ok(self.items.get_mut(&id).map(|mut entry| {
            let updated = apply(id, person, entry.created_at);
            *entry = updated.clone();
            updated
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.items.remove(&id).is_some())
    }
}

// ---------------------------------------------------------------------------
// 模板
// ---------------------------------------------------------------------------

/// 模板记录，接收人只保存 id，读取时从接收人仓储解析
#[derive(Clone)]
struct PatternRecord {
    seq: i64,
    pattern: Pattern,
    person_ids: Vec<i64>,
}

/// 内存模板仓储
pub struct MemoryPatternRepository {
    items: DashMap<String, PatternRecord>,
    people: Arc<MemoryPersonRepository>,
    next_seq: AtomicI64,
}

impl MemoryPatternRepository {
    pub fn new(people: Arc<MemoryPersonRepository>) -> Self {
        Self {
            items: DashMap::new(),
            people,
            next_seq: AtomicI64::new(0),
        }
    }

    /// 已删除的接收人会从关联中消失，与外键级联一致
    fn resolve(&self, record: PatternRecord) -> Pattern {
        let recipients = record
            .person_ids
            .iter()
            .filter_map(|id| self.people.items.get(id).map(|p| p.value().clone()))
            .collect();
        Pattern {
            recipients,
            ..record.pattern
        }
    }
}

#[async_trait]
impl PatternRepository for MemoryPatternRepository {
    async fn create(&self, pattern: &Pattern) -> Result<()> {
        match self.items.entry(pattern.title.clone()) {
            Entry::Occupied(_) => Err(NotificationError::already_exists("pattern", &pattern.title)),
            Entry::Vacant(slot) => {
                let mut person_ids: Vec<i64> = Vec::new();
                for person in &pattern.recipients {
                    if !person_ids.contains(&person.id) {
                        person_ids.push(person.id);
                    }
                }
                slot.insert(PatternRecord {
                    seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
                    pattern: Pattern {
                        recipients: Vec::new(),
                        ..pattern.clone()
                    },
                    person_ids,
                });
                Ok(())
            }
        }
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Pattern>> {
        let record = self.items.get(title).map(|r| r.value().clone());
        Ok(record.map(|r| self.resolve(r)))
    }

    async fn add_recipients(&self, pattern_id: Uuid, person_ids: &[i64]) -> Result<()> {
        let mut record = self
            .items
            .iter_mut()
            .find(|r| r.pattern.id == pattern_id)
            .ok_or_else(|| NotificationError::not_found("pattern", pattern_id))?;

        for id in person_ids {
            if !record.person_ids.contains(id) {
                record.person_ids.push(*id);
            }
        }
        Ok(())
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<Pattern>> {
        let ordered: BTreeMap<i64, PatternRecord> = self
            .items
            .iter()
            .map(|r| (r.seq, r.value().clone()))
            .collect();

        Ok(page_of(&ordered, page)
            .into_iter()
            .map(|r| self.resolve(r))
            .collect())
    }

    async fn delete_by_title(&self, title: &str) -> Result<bool> {
        Ok(self.items.remove(title).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Channel;

    fn new_notification(destination: &str) -> NewNotification {
        NewNotification {
            title: "Flood".to_string(),
            text: "Dear Ann Lee, evacuate Riverton!".to_string(),
            destination: destination.to_string(),
            channel: "EMAIL".to_string(),
        }
    }

    fn new_person(name: &str, city: &str) -> NewPerson {
        NewPerson {
            full_name: name.to_string(),
            channel: Channel::Sms,
            email: None,
            phone: Some("4512345678".to_string()),
            city: city.to_string(),
        }
    }

    #[tokio::test]
    async fn test_notification_round_trip() {
        let store = MemoryNotificationStore::new();
        let created = store.create(&new_notification("ann@example.com")).await.unwrap();

        let fetched = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Flood");
        assert_eq!(fetched.text, "Dear Ann Lee, evacuate Riverton!");
        assert_eq!(fetched.destination, "ann@example.com");
        assert_eq!(fetched.channel, "EMAIL");
        assert_eq!(fetched.status, NotificationStatus::NotSent);
    }

    #[tokio::test]
    async fn test_mark_sent_is_compare_and_set() {
        let store = MemoryNotificationStore::new();
        let created = store.create(&new_notification("a@example.com")).await.unwrap();

        assert!(store.mark_sent(created.id).await.unwrap());
        assert!(!store.mark_sent(created.id).await.unwrap());
        assert!(!store.mark_sent(999).await.unwrap());

        let pending = store
            .find_by_status(NotificationStatus::NotSent)
            .await
            .unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_find_all_ordered_by_id() {
        let store = MemoryNotificationStore::new();
        for i in 0..5 {
            store
                .create(&new_notification(&format!("{i}@example.com")))
                .await
                .unwrap();
        }

        let ids: Vec<i64> = store.find_all().await.unwrap().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_person_identity_lookup_and_paging() {
        let repo = MemoryPersonRepository::new();
        repo.create(&new_person("Ann Lee", "Riverton")).await.unwrap();
        repo.create(&new_person("Bo Chen", "Lakeside")).await.unwrap();
        repo.create(&new_person("Ann Lee", "Lakeside")).await.unwrap();

        let identity = PersonIdentity::new("Ann Lee", Channel::Sms, "Lakeside");
        let found = repo.find_by_identity(&identity).await.unwrap().unwrap();
        assert_eq!(found.id, 3);

        let anns = repo
            .find_by_full_names(&["Ann Lee".to_string()])
            .await
            .unwrap();
        assert_eq!(anns.len(), 2);

        let second_page = repo.list(PageRequest::new(1, 2)).await.unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].full_name, "Ann Lee");
    }

    #[tokio::test]
    async fn test_pattern_title_unique_and_recipients_follow_people() {
        let people = Arc::new(MemoryPersonRepository::new());
        let ann = people.create(&new_person("Ann Lee", "Riverton")).await.unwrap();
        let bo = people.create(&new_person("Bo Chen", "Lakeside")).await.unwrap();
        let repo = MemoryPatternRepository::new(people.clone());

        let pattern = Pattern {
            id: Uuid::new_v4(),
            title: "Flood".to_string(),
            body: "Dear {name}, evacuate {city}!".to_string(),
            recipients: vec![ann.clone()],
            created_at: Utc::now(),
        };
        repo.create(&pattern).await.unwrap();

        let err = repo.create(&pattern).await.unwrap_err();
        assert!(matches!(err, NotificationError::AlreadyExists { .. }));

        repo.add_recipients(pattern.id, &[ann.id, bo.id]).await.unwrap();
        let loaded = repo.find_by_title("Flood").await.unwrap().unwrap();
        assert_eq!(loaded.recipients.len(), 2);

        people.delete(ann.id).await.unwrap();
        let loaded = repo.find_by_title("Flood").await.unwrap().unwrap();
        assert_eq!(loaded.recipients, vec![bo]);

        assert!(repo.delete_by_title("Flood").await.unwrap());
        assert!(repo.find_by_title("Flood").await.unwrap().is_none());
    }
}
