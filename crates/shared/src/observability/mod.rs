//! 统一可观测性模块
//!
//! 提供 logging 与 metrics 的统一初始化。
//! 所有服务通过单一入口点配置可观测性，确保一致的日志格式和指标命名。

pub mod metrics;
pub mod tracing;

use ::tracing::info;
use anyhow::Result;

use crate::config::ObservabilityConfig;

/// 可观测性资源守卫
///
/// 持有 metrics 导出器的生命周期，进程退出前应保持存活。
pub struct ObservabilityGuard {
    _metrics_enabled: bool,
}

impl ObservabilityGuard {
    /// 创建一个空的 Guard（用于测试或禁用可观测性时）
    pub fn empty() -> Self {
        Self {
            _metrics_enabled: false,
        }
    }
}

impl Drop for ObservabilityGuard {
    fn drop(&mut self) {
        info!("Shutting down observability...");
    }
}

/// 统一初始化可观测性
///
/// 初始化顺序：
/// 1. Tracing（日志）
/// 2. Metrics（Prometheus 指标，按配置开启）
///
/// # Example
///
/// ```ignore
/// use alert_shared::config::AppConfig;
/// use alert_shared::observability;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = AppConfig::load("notification-worker")?;
///     let _guard = observability::init(&config.service_name, &config.observability)?;
///     Ok(())
/// }
/// ```
pub fn init(service_name: &str, config: &ObservabilityConfig) -> Result<ObservabilityGuard> {
    tracing::init(config)?;

    if config.metrics_enabled {
        metrics::init(service_name, config.metrics_port)?;
    }

    info!(
        service = %service_name,
        metrics_enabled = config.metrics_enabled,
        metrics_port = config.metrics_port,
        "Observability initialized"
    );

    Ok(ObservabilityGuard {
        _metrics_enabled: config.metrics_enabled,
    })
}
