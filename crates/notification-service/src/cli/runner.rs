//! 命令执行器
//!
//! 按配置组装仓储、队列和缓存，再把子命令转交给服务层

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use alert_shared::cache::Cache;
use alert_shared::config::AppConfig;
use alert_shared::database::Database;

use super::commands::Commands;
use crate::MIGRATOR;
use crate::factory::NotificationFactory;
use crate::models::{NewPattern, NewPerson, PageRequest};
use crate::queue::KafkaNotificationPublisher;
use crate::repository::{PgNotificationStore, PgPatternRepository, PgPersonRepository};
use crate::service::{PatternService, PersonService};

/// 命令执行器
pub struct CommandRunner {
    people: PersonService,
    patterns: PatternService,
    database: Database,
}

impl CommandRunner {
    /// 连接数据库、执行迁移并组装服务
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let database = Database::open(&config.database, &MIGRATOR)
            .await
            .context("连接数据库或执行迁移失败")?;

        let pool = database.pool().clone();
        let person_repo = Arc::new(PgPersonRepository::new(pool.clone()));
        let pattern_repo = Arc::new(PgPatternRepository::new(pool.clone()));
        let store = Arc::new(PgNotificationStore::new(pool));
        let publisher = Arc::new(
            KafkaNotificationPublisher::new(&config.kafka).context("创建 Kafka 生产者失败")?,
        );

        let mut patterns = PatternService::new(
            pattern_repo,
            person_repo.clone(),
            NotificationFactory::new(store),
            publisher,
        );
        if config.cache.enabled {
            match connect_cache(config).await {
                Ok(cache) => {
                    patterns = patterns.with_cache(Arc::new(cache), config.cache.pattern_ttl());
                    info!("模板列表缓存已启用");
                }
                Err(e) => warn!(error = %e, "Redis 不可用，模板列表不走缓存"),
            }
        }

        Ok(Self {
            people: PersonService::new(person_repo),
            patterns,
            database,
        })
    }

    /// 执行子命令并把结果以 JSON 打印到标准输出
    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::AddPerson {
                name,
                channel,
                email,
                phone,
                city,
            } => {
                let person = NewPerson {
                    full_name: name,
                    channel,
                    email,
                    phone,
                    city,
                };
                print_json(&self.people.save_people(vec![person]).await?)
            }
            Commands::ImportPeople { file } => {
                let raw = fs::read_to_string(&file).with_context(|| format!("读取 {file} 失败"))?;
                let people: Vec<NewPerson> =
                    serde_json::from_str(&raw).with_context(|| format!("解析 {file} 失败"))?;
                print_json(&self.people.save_people(people).await?)
            }
            Commands::ListPeople { page, size } => {
                print_json(&self.people.list_people(PageRequest::new(page, size)).await?)
            }
            Commands::DeletePerson { id } => {
                self.people.delete_person(id).await?;
                print_json(&serde_json::json!({ "deleted": id }))
            }
            Commands::CreatePattern {
                title,
                body,
                recipients,
            } => {
                let pattern = self
                    .patterns
                    .create_pattern(NewPattern::new(title, body), &recipients)
                    .await?;
                print_json(&pattern)
            }
            Commands::AddRecipients { title, recipients } => {
                print_json(&self.patterns.add_recipients(&title, &recipients).await?)
            }
            Commands::Send { title } => {
                let report = self.patterns.send_by_title(&title).await?;
                print_json(&serde_json::json!({
                    "ids": report.ids(),
                    "failures": report.failures,
                }))
            }
            Commands::ListPatterns { page, size } => {
                print_json(&self.patterns.list_patterns(PageRequest::new(page, size)).await?)
            }
            Commands::DeletePattern { title } => {
                self.patterns.delete_by_title(&title).await?;
                print_json(&serde_json::json!({ "deleted": title }))
            }
        }
    }

    pub async fn close(&self) {
        self.database.close().await;
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn connect_cache(config: &AppConfig) -> alert_shared::error::Result<Cache> {
    let cache = Cache::new(&config.redis)?;
    cache.health_check().await?;
    Ok(cache)
}
