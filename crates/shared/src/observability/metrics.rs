//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。
//! 未初始化导出器时，各 `record_*` 函数为空操作。

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// 初始化 Prometheus 指标导出
///
/// 导出器自带 HTTP 监听，需要在 tokio 运行时内调用。
pub fn init(service_name: &str, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    register_common_metrics(service_name);
    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!(
        "notifications_created_total",
        "Total number of notifications persisted by the factory"
    );
    metrics::describe_counter!(
        "notifications_enqueued_total",
        "Total number of notification ids handed to the queue"
    );
    metrics::describe_counter!(
        "notification_dispatch_total",
        "Total number of dispatch attempts by channel and outcome"
    );
    metrics::describe_counter!("notification_sweeps_total", "Total number of retry sweeps");
    metrics::describe_histogram!(
        "notification_sweep_pending",
        "Number of NOT_SENT notifications found per sweep"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

// ============================================================================
// 业务指标记录函数
// ============================================================================

/// 记录工厂创建的通知数量
#[inline]
pub fn record_notifications_created(count: u64) {
    metrics::counter!("notifications_created_total").increment(count);
}

/// 记录通知 ID 入队结果
#[inline]
pub fn record_enqueue(success: bool) {
    let outcome = if success { "ok" } else { "error" };
    metrics::counter!("notifications_enqueued_total", "outcome" => outcome).increment(1);
}

/// 记录一次投递尝试
///
/// outcome 取值：sent / already_sent / failed / unknown_channel
///
/// channel 只接受静态标签，存储中的任意渠道字符串不能直接作为指标标签
#[inline]
pub fn record_dispatch(channel: &'static str, outcome: &'static str) {
    metrics::counter!(
        "notification_dispatch_total",
        "channel" => channel,
        "outcome" => outcome
    )
    .increment(1);
}

/// 记录一次补偿扫描
#[inline]
pub fn record_sweep(pending: usize) {
    metrics::counter!("notification_sweeps_total").increment(1);
    metrics::histogram!("notification_sweep_pending").record(pending as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_without_exporter_is_noop() {
        record_notifications_created(3);
        record_enqueue(true);
        record_dispatch("EMAIL", "sent");
        record_sweep(0);
    }
}
