//! 通知投递 worker 入口
//!
//! 消费 Kafka 中的通知 id 并投递，同时按配置间隔运行补偿扫描。

use std::sync::Arc;

use alert_shared::{config::AppConfig, database::Database, observability};
use anyhow::Result;
use notification_service::MIGRATOR;
use notification_service::queue::KafkaNotificationSubscription;
use notification_service::repository::PgNotificationStore;
use notification_worker::channels::{EmailAdapter, SmsAdapter};
use notification_worker::{DispatchRouter, NotificationConsumer, RetrySweeper};
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

const SERVICE_NAME: &str = "notification-worker";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载配置并初始化日志与指标
    let config = AppConfig::load(SERVICE_NAME)?;
    let _guard = observability::init(&config.service_name, &config.observability)?;

    info!(environment = %config.environment, "Starting notification-worker...");

    // 2. 数据库与迁移
    let db = Database::open(&config.database, &MIGRATOR).await?;
    let store = Arc::new(PgNotificationStore::new(db.pool().clone()));

    // 3. 渠道与路由
    if config.sms.secret.is_empty() {
        warn!("未配置短信签名密钥，短信通知将投递失败并保持未发送");
    }
    let router = Arc::new(
        DispatchRouter::new(store, config.dispatch.verify_before_send)
            .with_adapter(Arc::new(EmailAdapter::from_config(&config.mail)?))
            .with_adapter(Arc::new(SmsAdapter::from_config(&config.sms)?)),
    );
    let sweeper = Arc::new(RetrySweeper::new(router.clone(), config.sweep.concurrency));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // 4. 定时补偿扫描
    let sweep_handle = config.sweep.enabled.then(|| {
        tokio::spawn(
            sweeper
                .clone()
                .run_periodic(config.sweep.interval(), shutdown_rx.clone()),
        )
    });

    // 5. 队列消费
    let subscription = KafkaNotificationSubscription::new(&config.kafka)?;
    let consumer = NotificationConsumer::new(subscription, router).with_sweeper(sweeper);
    let consumer_handle = tokio::spawn(consumer.run(shutdown_rx));

    shutdown_signal().await;
    let _ = shutdown_tx.send(true);

    consumer_handle.await?;
    if let Some(handle) = sweep_handle {
        handle.await?;
    }

    db.close().await;
    info!("Service shutdown complete");
    Ok(())
}

/// 监听 Ctrl+C 和 SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting graceful shutdown..."),
    }
}
