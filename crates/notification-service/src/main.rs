//! 通知生产端 CLI
//!
//! 管理接收人与模板，按模板生成通知并投递到队列。

use clap::Parser;

use alert_shared::config::AppConfig;
use alert_shared::observability;
use notification_service::cli::{Cli, CommandRunner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.service_name)?;
    let _guard = observability::init(&config.service_name, &config.observability)?;

    let runner = CommandRunner::connect(&config).await?;
    let result = runner.run(cli.command).await;
    runner.close().await;

    result
}
