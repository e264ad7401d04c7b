// main.rs — 程序入口
// 负责初始化日志与异步运行时、解析命令行参数、分发子命令

mod cli; // 声明 cli 模块，对应 src/cli.rs
mod config; // 声明 config 模块，对应 src/config.rs
mod daemon;
mod hyprpaper;
mod pipeline;
mod source;

// 初始化多语言支持，嵌入 locales 目录下的所有翻译
rust_i18n::i18n!("locales");

use clap::{CommandFactory, Parser}; // CommandFactory 用于生成补全脚本
use clap_complete::generate; // 引入补全脚本生成函数
use cli::{Cli, Commands}; // 引入 CLI 结构体和子命令枚举
use config::AppConfig; // 引入应用配置
use daemon::NamedProcess;
use pipeline::{PipelineError, Stage};
use rust_i18n::t; // 引入翻译宏
use source::apod::ApodClient;

/// 无论流程成功与否都以 0 退出，失败只通过输出文字报告
#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // 自动检测系统语言并设置
    let locale = std::env::var("LANG").unwrap_or_else(|_| "en".to_string());
    if locale.starts_with("zh") {
        rust_i18n::set_locale("zh-CN");
    } else {
        rust_i18n::set_locale("en");
    }

    let cli = Cli::parse();

    if let Err(e) = dispatch(cli).await {
        println!("{}", t!("error_generic", reason => e));
    }
}

async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // 补全脚本不需要读取配置
    if let Some(Commands::Completions { shell }) = &cli.command {
        generate(
            *shell,
            &mut Cli::command(),
            "apod-wall",
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    let mut config = AppConfig::load()?;
    log::debug!("loaded config: {config:?}");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => handle_run(&config).await,
        Commands::Fetch => handle_fetch(&config).await,
        Commands::Config { action } => handle_config(&mut config, &action)?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// 处理 run 子命令：下载并设置壁纸
async fn handle_run(config: &AppConfig) {
    let client = ApodClient::new(config.source_url.clone(), config.min_size);
    let daemon = NamedProcess::new(
        config.daemon.clone(),
        config.kill_program.clone(),
        config.settle,
    );

    match pipeline::run(
        &client,
        &daemon,
        &config.wallpaper_dir,
        &config.hyprpaper_config,
    )
    .await
    {
        Ok(_) => println!("{}", t!("set_done")),
        Err(e) => report_failure(&e),
    }
}

/// 处理 fetch 子命令：只下载
async fn handle_fetch(config: &AppConfig) {
    let client = ApodClient::new(config.source_url.clone(), config.min_size);

    match pipeline::fetch(&client, &config.wallpaper_dir).await {
        Ok(_) => println!("{}", t!("download_done")),
        Err(e) => report_failure(&e),
    }
}

/// 按失败阶段打印诊断信息
fn report_failure(error: &PipelineError) {
    log::debug!("pipeline stopped at stage {}: {error}", error.stage());

    let headline = match error.stage() {
        Stage::Fetching => t!("error_locate"),
        Stage::Downloading => t!("error_download"),
        Stage::ConfigUpdating | Stage::Restarting | Stage::Done => t!("error_set_failed"),
    };
    println!("{headline}: {error}");
}

/// 处理 config 子命令：查看或修改配置
fn handle_config(
    config: &mut AppConfig,
    action: &cli::ConfigAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        cli::ConfigAction::Show => {
            println!("{}", t!("config_title"));
            println!(
                "{}",
                t!("config_path", path => config.config_path.display())
            );
            println!(
                "{}",
                t!("config_wallpaper_dir", path => config.wallpaper_dir.display())
            );
            println!(
                "{}",
                t!("config_hyprpaper", path => config.hyprpaper_config.display())
            );
            println!("{}", t!("config_url", url => config.source_url));
            println!("{}", t!("config_min_size", size => config.min_size));
            println!(
                "{}",
                t!("config_daemon", daemon => config.daemon, ms => config.settle.as_millis())
            );
        }
        cli::ConfigAction::Schema => {
            println!("{}", AppConfig::get_schema()?);
        }
        cli::ConfigAction::Dump => {
            println!("{}", config.to_toml()?);
        }
        cli::ConfigAction::Set { key, value } => {
            config.set(key, value)?;
            config.save()?;
            println!("{}", t!("config_updated", key => key, value => value));
        }
    }
    Ok(())
}
