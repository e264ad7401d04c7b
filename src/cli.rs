// cli.rs — 命令行接口定义模块
// 使用 clap 的 derive 模式定义所有子命令和参数

use clap::{Parser, Subcommand}; // Parser: 解析命令行参数的 trait; Subcommand: 定义子命令的 trait
use clap_complete::Shell; // Shell 枚举：Bash, Zsh, Fish, Elvish, PowerShell

/// NASA 每日天文图壁纸工具
///
/// 抓取 APOD 当日图片，写入 hyprpaper 配置并重启 hyprpaper。
/// 不带子命令时等同于 `apod-wall run`，适合放进 systemd timer 或 cron。
#[derive(Parser)]
#[command(name = "apod-wall")]
#[command(version)] // 自动从 Cargo.toml 读取 version 字段
#[command(author)]
#[command(about = "Set NASA's Astronomy Picture of the Day as the hyprpaper wallpaper")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 下载今天的图片并设置为壁纸（默认）
    ///
    /// 用法示例:
    ///   apod-wall run
    Run,

    /// 只下载今天的图片，不修改 hyprpaper
    ///
    /// 用法示例:
    ///   apod-wall fetch
    Fetch,

    /// 生成 shell 补全脚本（支持 bash, zsh, fish, elvish, powershell）
    ///
    /// 用法示例：
    ///   apod-wall completions zsh > ~/.zsh/completions/_apod-wall
    Completions {
        /// 目标 shell 类型
        shell: Shell,
    },

    /// 配置管理操作
    ///
    /// 用法示例:
    ///   apod-wall config show
    ///   apod-wall config set min_size 1024
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// 配置管理操作
#[derive(Subcommand)]
pub enum ConfigAction {
    /// 查看当前配置简报
    Show,
    /// 生成配置文件对应的 JSON Schema
    Schema,
    /// 以 TOML 格式打印当前完整配置内容
    Dump,
    /// 设置配置项的值 (支持: wallpaper_dir, url, min_size, config_path, daemon, kill_program, settle_ms)
    Set {
        /// 要设置的键
        key: String,
        /// 要设置的值
        value: String,
    },
}
