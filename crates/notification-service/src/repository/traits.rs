//! 仓储 Trait 定义
//!
//! 服务层、路由和补偿扫描只依赖这些接口，Postgres 与内存实现可互换，也便于 mock 测试

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    NewNotification, NewPerson, Notification, NotificationStatus, PageRequest, Pattern, Person,
    PersonIdentity,
};

/// 通知存储接口
///
/// 状态更新只有 `mark_sent` 一种，实现必须保证已发送的记录不会被改回未发送
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// 持久化并分配 id，初始状态为 NotSent
    async fn create(&self, notification: &NewNotification) -> Result<Notification>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Notification>>;
    async fn find_all(&self) -> Result<Vec<Notification>>;

    /// NotSent -> Sent 的条件更新，返回本次调用是否完成了状态切换
    async fn mark_sent(&self, id: i64) -> Result<bool>;

    /// 按状态过滤，默认基于全量读取
    async fn find_by_status(&self, status: NotificationStatus) -> Result<Vec<Notification>> {
        Ok(self
            .find_all()
            .await?
            .into_iter()
            .filter(|n| n.status == status)
            .collect())
    }
}

/// 接收人仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PersonRepository: Send + Sync {
    async fn create(&self, person: &NewPerson) -> Result<Person>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Person>>;
    async fn find_by_identity(&self, identity: &PersonIdentity) -> Result<Option<Person>>;
    async fn find_by_full_names(&self, names: &[String]) -> Result<Vec<Person>>;
    async fn list(&self, page: PageRequest) -> Result<Vec<Person>>;
    async fn update(&self, id: i64, person: &NewPerson) -> Result<Option<Person>>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// 模板仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PatternRepository: Send + Sync {
    /// 保存模板及其初始接收人，标题重复时返回 AlreadyExists
    async fn create(&self, pattern: &Pattern) -> Result<()>;
    async fn find_by_title(&self, title: &str) -> Result<Option<Pattern>>;
    /// 追加接收人，已关联的忽略
    async fn add_recipients(&self, pattern_id: Uuid, person_ids: &[i64]) -> Result<()>;
    async fn list(&self, page: PageRequest) -> Result<Vec<Pattern>>;
    async fn delete_by_title(&self, title: &str) -> Result<bool>;
}
