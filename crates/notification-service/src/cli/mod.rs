//! CLI 模块
//!
//! 生产端的命令行入口，覆盖接收人、模板管理和按模板发送：
//!
//! ```bash
//! notification-cli add-person --name "Ann Lee" --channel EMAIL --email ann@example.com --city Riverton
//! notification-cli import-people --file people.json
//! notification-cli create-pattern --title Flood --body "Dear {name}, evacuate {city}!" -r "Ann Lee"
//! notification-cli add-recipients --title Flood -r "Bo Chen"
//! notification-cli send --title Flood
//! notification-cli list-patterns --page 0 --size 20
//! ```

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands};
pub use runner::CommandRunner;
