//! 依赖 Postgres / Kafka 的集成测试
//!
//! 默认忽略，启动 docker-compose 后用 `cargo test -- --ignored` 运行。

use alert_shared::database::Database;
use alert_shared::test_utils::{test_database_config, test_kafka_config};
use notification_service::queue::{KafkaNotificationPublisher, KafkaNotificationSubscription};
use notification_service::repository::PgNotificationStore;
use notification_service::{
    MIGRATOR, NewNotification, NotificationPublisher, NotificationStatus, NotificationStore,
    NotificationSubscription,
};

async fn store() -> PgNotificationStore {
    let db = Database::open(&test_database_config(), &MIGRATOR)
        .await
        .unwrap();
    PgNotificationStore::new(db.pool().clone())
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn pg_store_round_trips_and_marks_sent_once() {
    let store = store().await;
    let created = store
        .create(&NewNotification {
            title: "Flood".to_string(),
            text: "Dear Ann Lee, evacuate Riverton!".to_string(),
            destination: "ann@example.com".to_string(),
            channel: "EMAIL".to_string(),
        })
        .await
        .unwrap();

    let fetched = store.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.title, "Flood");
    assert_eq!(fetched.text, "Dear Ann Lee, evacuate Riverton!");
    assert_eq!(fetched.destination, "ann@example.com");
    assert_eq!(fetched.channel, "EMAIL");
    assert_eq!(fetched.status, NotificationStatus::NotSent);

    assert!(store.mark_sent(created.id).await.unwrap());
    assert!(!store.mark_sent(created.id).await.unwrap());

    let pending = store
        .find_by_status(NotificationStatus::NotSent)
        .await
        .unwrap();
    assert!(pending.iter().all(|n| n.id != created.id));
}

#[tokio::test]
#[ignore] // 需要 Kafka
async fn kafka_queue_delivers_published_id() {
    let config = test_kafka_config("queue-round-trip");
    let publisher = KafkaNotificationPublisher::new(&config).unwrap();
    let mut subscription = KafkaNotificationSubscription::new(&config).unwrap();

    let id = chrono::Utc::now().timestamp_millis();
    publisher.publish(id).await.unwrap();

    loop {
        let delivery = subscription.next().await.unwrap().unwrap();
        subscription.ack(&delivery).await.unwrap();
        if delivery.notification_id == id {
            break;
        }
    }
}
