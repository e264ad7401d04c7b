// pipeline.rs — 更换壁纸的完整流程
// 定位图片 -> 下载 -> 写入 hyprpaper 配置 -> 重启守护进程，任一步失败即停止

use crate::daemon::{DaemonControl, RestartError};
use crate::hyprpaper::{self, HyprpaperError};
use crate::source::{DownloadError, LocateError, WallpaperSource};
use log::info;
use rust_i18n::t;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 流程所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Downloading,
    ConfigUpdating,
    Restarting,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::Downloading => "downloading",
            Stage::ConfigUpdating => "config-updating",
            Stage::Restarting => "restarting",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// 流程失败，变体对应失败的阶段
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Config(#[from] HyprpaperError),

    #[error(transparent)]
    Restart(#[from] RestartError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Locate(_) => Stage::Fetching,
            PipelineError::Download(_) => Stage::Downloading,
            PipelineError::Config(_) => Stage::ConfigUpdating,
            PipelineError::Restart(_) => Stage::Restarting,
        }
    }
}

/// 定位并下载今天的图片，返回保存路径
pub async fn fetch(
    source: &dyn WallpaperSource,
    wallpaper_dir: &Path,
) -> Result<PathBuf, PipelineError> {
    info!("stage: {}", Stage::Fetching);
    println!("{}", t!("fetch_start"));
    let image = source.locate().await?;
    println!(
        "{}",
        t!("image_found", url => image.url, size => image.size)
    );

    info!("stage: {}", Stage::Downloading);
    let save_path = source.download(&image, wallpaper_dir).await?;
    println!("{}", t!("save_path", path => save_path.display()));

    Ok(save_path)
}

/// 完整流程：下载图片后写入配置并重启守护进程
///
/// 配置写入失败时不会尝试重启。
pub async fn run(
    source: &dyn WallpaperSource,
    daemon: &dyn DaemonControl,
    wallpaper_dir: &Path,
    hyprpaper_config: &Path,
) -> Result<PathBuf, PipelineError> {
    let save_path = fetch(source, wallpaper_dir).await?;

    info!("stage: {}", Stage::ConfigUpdating);
    hyprpaper::update_config(hyprpaper_config, &save_path)?;
    println!(
        "{}",
        t!("config_written", path => hyprpaper_config.display())
    );

    info!("stage: {}", Stage::Restarting);
    println!("{}", t!("restarting_daemon"));
    daemon.restart().await?;

    info!("stage: {}", Stage::Done);
    Ok(save_path)
}
