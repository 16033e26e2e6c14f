//! 模板服务
//!
//! 负责模板的创建、接收人关联、按标题发送和分页查询。
//!
//! ## 发送流程
//!
//! 1. 按标题加载模板 -> 2. 工厂为每个接收人生成通知 -> 3. 逐条投递通知 id 到队列
//!
//! 入队失败只记录日志，落库的 NotSent 通知会被 worker 的补偿扫描发出。

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use alert_shared::cache::{Cache, CacheKey};
use alert_shared::observability::metrics;

use crate::error::{NotificationError, Result};
use crate::factory::{FactoryReport, NotificationFactory};
use crate::models::{NewPattern, PageRequest, Pattern, Person};
use crate::queue::NotificationPublisher;
use crate::repository::{PatternRepository, PersonRepository};

/// 模板服务
pub struct PatternService {
    patterns: Arc<dyn PatternRepository>,
    people: Arc<dyn PersonRepository>,
    factory: NotificationFactory,
    publisher: Arc<dyn NotificationPublisher>,
    /// 模板列表读缓存（可选）
    cache: Option<(Arc<Cache>, Duration)>,
}

impl PatternService {
    pub fn new(
        patterns: Arc<dyn PatternRepository>,
        people: Arc<dyn PersonRepository>,
        factory: NotificationFactory,
        publisher: Arc<dyn NotificationPublisher>,
    ) -> Self {
        Self {
            patterns,
            people,
            factory,
            publisher,
            cache: None,
        }
    }

    /// 启用模板列表读缓存
    pub fn with_cache(mut self, cache: Arc<Cache>, ttl: Duration) -> Self {
        self.cache = Some((cache, ttl));
        self
    }

    /// 创建模板并关联已存在的接收人（按姓名匹配）
    #[instrument(skip(self, new_pattern, recipient_names), fields(title = %new_pattern.title))]
    pub async fn create_pattern(
        &self,
        new_pattern: NewPattern,
        recipient_names: &[String],
    ) -> Result<Pattern> {
        new_pattern.validate()?;

        if self.patterns.find_by_title(&new_pattern.title).await?.is_some() {
            return Err(NotificationError::already_exists("pattern", &new_pattern.title));
        }

        let recipients = dedup_by_identity(self.people.find_by_full_names(recipient_names).await?);

        let pattern = Pattern {
            id: Uuid::new_v4(),
            title: new_pattern.title,
            body: new_pattern.body,
            recipients,
            created_at: Utc::now(),
        };
        self.patterns.create(&pattern).await?;
        self.evict_listing().await;

        info!(
            pattern_id = %pattern.id,
            recipients = pattern.recipients.len(),
            "模板已创建"
        );
        Ok(pattern)
    }

    /// 为模板追加接收人，已关联的跳过，返回按姓名匹配到的全部接收人
    #[instrument(skip(self, names))]
    pub async fn add_recipients(&self, title: &str, names: &[String]) -> Result<Vec<Person>> {
        let pattern = self.require_pattern(title).await?;
        let matched = self.people.find_by_full_names(names).await?;

        let subscribed: HashSet<_> = pattern.recipients.iter().map(Person::identity).collect();
        let mut added = HashSet::new();
        let new_ids: Vec<i64> = matched
            .iter()
            .filter(|p| !subscribed.contains(&p.identity()) && added.insert(p.identity()))
            .map(|p| p.id)
            .collect();

        if !new_ids.is_empty() {
            self.patterns.add_recipients(pattern.id, &new_ids).await?;
            self.evict_listing().await;
        }

        info!(matched = matched.len(), added = new_ids.len(), "模板接收人已更新");
        Ok(matched)
    }

    /// 按模板生成通知并逐条入队
    #[instrument(skip(self))]
    pub async fn send_by_title(&self, title: &str) -> Result<FactoryReport> {
        let pattern = self.require_pattern(title).await?;
        let report = self.factory.create_notifications(&pattern).await?;

        let mut enqueued = 0usize;
        for notification in &report.created {
            match self.publisher.publish(notification.id).await {
                Ok(()) => {
                    enqueued += 1;
                    metrics::record_enqueue(true);
                }
                Err(e) => {
                    metrics::record_enqueue(false);
                    error!(
                        notification_id = notification.id,
                        error = %e,
                        "通知入队失败，等待补偿扫描"
                    );
                }
            }
        }

        info!(
            created = report.created.len(),
            enqueued,
            failed = report.failures.len(),
            "模板通知已发送"
        );
        Ok(report)
    }

    /// 分页查询模板，启用缓存时走读穿透
    pub async fn list_patterns(&self, page: PageRequest) -> Result<Vec<Pattern>> {
        match &self.cache {
            Some((cache, ttl)) => {
                let key = CacheKey::pattern_page(page.offset, page.limit);
                cache
                    .get_or_set(&key, *ttl, || self.patterns.list(page))
                    .await
            }
            None => self.patterns.list(page).await,
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_by_title(&self, title: &str) -> Result<()> {
        if !self.patterns.delete_by_title(title).await? {
            return Err(NotificationError::not_found("pattern", title));
        }
        self.evict_listing().await;
        info!("模板已删除");
        Ok(())
    }

    async fn require_pattern(&self, title: &str) -> Result<Pattern> {
        self.patterns
            .find_by_title(title)
            .await?
            .ok_or_else(|| NotificationError::not_found("pattern", title))
    }

    /// 缓存失效失败只告警，列表最迟在 TTL 后刷新
    async fn evict_listing(&self) {
        if let Some((cache, _)) = &self.cache
            && let Err(e) = cache.delete_pattern(CacheKey::pattern_pages()).await
        {
            warn!(error = %e, "模板列表缓存失效失败");
        }
    }
}

fn dedup_by_identity(people: Vec<Person>) -> Vec<Person> {
    let mut seen = HashSet::new();
    people
        .into_iter()
        .filter(|p| seen.insert(p.identity()))
        .collect()
}
