//! CLI 命令定义

use clap::{Parser, Subcommand};

use crate::models::Channel;

/// 紧急通知生产端命令行工具
#[derive(Parser, Debug)]
#[command(name = "notification-cli")]
#[command(version, about = "紧急通知模板与接收人管理")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 服务名，决定加载 config/{service}.toml
    #[arg(long, default_value = "notification-cli")]
    pub service_name: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// 子命令枚举
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 新增单个接收人
    AddPerson {
        #[arg(short, long)]
        name: String,

        /// 渠道：EMAIL 或 SMS
        #[arg(short, long)]
        channel: Channel,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        city: String,
    },

    /// 从 JSON 文件批量导入接收人（数组，字段为 camelCase）
    ImportPeople {
        #[arg(short, long)]
        file: String,
    },

    /// 分页列出接收人
    ListPeople {
        #[arg(short, long, default_value = "0")]
        page: i64,

        #[arg(short, long, default_value = "20")]
        size: i64,
    },

    /// 删除接收人
    DeletePerson {
        #[arg(long)]
        id: i64,
    },

    /// 创建模板，正文必须包含 {name} 和 {city}
    CreatePattern {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        body: String,

        /// 接收人姓名，可重复
        #[arg(short, long = "recipient")]
        recipients: Vec<String>,
    },

    /// 为模板追加接收人
    AddRecipients {
        #[arg(short, long)]
        title: String,

        #[arg(short, long = "recipient", required = true)]
        recipients: Vec<String>,
    },

    /// 按模板生成通知并入队
    Send {
        #[arg(short, long)]
        title: String,
    },

    /// 分页列出模板
    ListPatterns {
        #[arg(short, long, default_value = "0")]
        page: i64,

        #[arg(short, long, default_value = "20")]
        size: i64,
    },

    /// 删除模板
    DeletePattern {
        #[arg(short, long)]
        title: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_add_person() {
        let cli = Cli::parse_from([
            "notification-cli",
            "add-person",
            "--name",
            "Ann Lee",
            "--channel",
            "EMAIL",
            "--email",
            "ann@example.com",
            "--city",
            "Riverton",
        ]);
        match cli.command {
            Commands::AddPerson {
                name,
                channel,
                email,
                phone,
                city,
            } => {
                assert_eq!(name, "Ann Lee");
                assert_eq!(channel, Channel::Email);
                assert_eq!(email.as_deref(), Some("ann@example.com"));
                assert!(phone.is_none());
                assert_eq!(city, "Riverton");
            }
            _ => panic!("预期 AddPerson 命令"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_channel() {
        let result = Cli::try_parse_from([
            "notification-cli",
            "add-person",
            "-n",
            "Ann Lee",
            "-c",
            "FAX",
            "--city",
            "Riverton",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_create_pattern_with_recipients() {
        let cli = Cli::parse_from([
            "notification-cli",
            "create-pattern",
            "-t",
            "Flood",
            "-b",
            "Dear {name}, evacuate {city}!",
            "-r",
            "Ann Lee",
            "-r",
            "Bo Chen",
        ]);
        match cli.command {
            Commands::CreatePattern {
                title,
                body,
                recipients,
            } => {
                assert_eq!(title, "Flood");
                assert_eq!(body, "Dear {name}, evacuate {city}!");
                assert_eq!(recipients, vec!["Ann Lee", "Bo Chen"]);
            }
            _ => panic!("预期 CreatePattern 命令"),
        }
    }

    #[test]
    fn test_cli_list_defaults() {
        let cli = Cli::parse_from(["notification-cli", "list-patterns"]);
        match cli.command {
            Commands::ListPatterns { page, size } => {
                assert_eq!(page, 0);
                assert_eq!(size, 20);
            }
            _ => panic!("预期 ListPatterns 命令"),
        }
    }
}
