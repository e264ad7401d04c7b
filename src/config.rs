// config.rs — 配置管理模块
// 遵循 Unix 风格：优先从 ~/.config/apod-wall/config.toml 读取配置

use crate::daemon::{DEFAULT_DAEMON, DEFAULT_KILL_PROGRAM, DEFAULT_SETTLE_MS};
use crate::source::apod::{DEFAULT_MIN_SIZE, DEFAULT_URL};
use schemars::JsonSchema; // 引入用于生成 JSON Schema 的 trait
use serde::{Deserialize, Serialize}; // 引入序列化与反序列化 trait
use shellexpand::full_with_context_no_errors; // 用于展开 ~ 和环境变量
use std::env; // 环境变量模块
use std::fs; // 文件系统模块
use std::path::{Path, PathBuf}; // 路径处理类型
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("the $HOME environment variable is not set")]
    HomeMissing,

    #[error("could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("could not build config schema: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("unknown config key `{0}`")]
    UnknownKey(String),

    #[error("invalid value `{value}` for `{key}`")]
    InvalidValue { key: String, value: String },
}

/// 展开路径中的 ~、$HOME 及其他环境变量，相对路径则相对于 home
///
/// ~ 与 $HOME 都以传入的 home 为准；未定义的变量原样保留。
fn resolve_path(path_str: &str, home: &Path) -> PathBuf {
    let home_str = home.to_string_lossy();
    let expanded = full_with_context_no_errors(
        path_str,
        || Some(&*home_str),
        |var| match var {
            "HOME" => Some(home_str.to_string()),
            _ => env::var(var).ok(),
        },
    );
    let p = PathBuf::from(expanded.into_owned());
    if p.is_absolute() { p } else { home.join(p) }
}

/// 映射 config.toml 文件内容的嵌套结构体
#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct ConfigFile {
    #[serde(default)]
    common: CommonConfig,
    #[serde(default)]
    source: SourceConfig,
    #[serde(default)]
    hyprpaper: HyprpaperConfig,
}

#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct CommonConfig {
    /// 壁纸保存目录 (支持 ~、$HOME 等环境变量，相对路径则相对于 $HOME)
    /// 不配置则默认为 ~/Pictures/Wallpapers/apod
    wallpaper_dir: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct SourceConfig {
    /// APOD 页面地址，相对的图片链接基于它拼接
    #[serde(default = "default_url")]
    url: String,
    /// 候选图片的最小字节数，更小的视为图标
    #[serde(default = "default_min_size")]
    min_size: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            min_size: default_min_size(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct HyprpaperConfig {
    /// hyprpaper 配置文件路径，不配置则为 ~/.config/hypr/hyprpaper.conf
    config_path: Option<String>,
    /// 守护进程名
    #[serde(default = "default_daemon")]
    daemon: String,
    /// 按名称结束进程的程序
    #[serde(default = "default_kill_program")]
    kill_program: String,
    /// 重启前后的等待时间（毫秒）
    #[serde(default = "default_settle_ms")]
    settle_ms: u64,
}

impl Default for HyprpaperConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            daemon: default_daemon(),
            kill_program: default_kill_program(),
            settle_ms: default_settle_ms(),
        }
    }
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}
fn default_min_size() -> u64 {
    DEFAULT_MIN_SIZE
}
fn default_daemon() -> String {
    DEFAULT_DAEMON.to_string()
}
fn default_kill_program() -> String {
    DEFAULT_KILL_PROGRAM.to_string()
}
fn default_settle_ms() -> u64 {
    DEFAULT_SETTLE_MS
}

/// 应用全局配置项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// APOD 页面地址 (优先级：ENV > TOML)
    pub source_url: String,
    /// 尺寸阈值（字节）
    pub min_size: u64,
    /// 壁纸保存目录
    pub wallpaper_dir: PathBuf,
    /// hyprpaper 配置文件
    pub hyprpaper_config: PathBuf,
    /// 守护进程名
    pub daemon: String,
    /// 结束进程的程序
    pub kill_program: String,
    /// 重启前后的等待时间
    pub settle: Duration,
    /// 本程序配置文件所在路径
    pub config_path: PathBuf,
    /// 相对路径的基准目录
    pub home: PathBuf,
}

impl AppConfig {
    /// 从 $HOME 与环境变量加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let home = env::var_os("HOME").ok_or(ConfigError::HomeMissing)?;
        Ok(Self::from_home(Path::new(&home), env::var("APOD_URL").ok()))
    }

    /// 以给定的 home 目录加载配置
    ///
    /// 配置文件缺失或无法解析时全部使用默认值；`url_override` 优先于文件内容。
    pub fn from_home(home: &Path, url_override: Option<String>) -> Self {
        let config_path = home.join(".config").join("apod-wall").join("config.toml");
        let config_file = Self::load_config_from_file(&config_path).unwrap_or_default();

        let wallpaper_dir = match config_file.common.wallpaper_dir {
            Some(dir) => resolve_path(&dir, home),
            None => home.join("Pictures").join("Wallpapers").join("apod"),
        };

        let hyprpaper_config = match config_file.hyprpaper.config_path {
            Some(path) => resolve_path(&path, home),
            None => home.join(".config").join("hypr").join("hyprpaper.conf"),
        };

        Self {
            source_url: url_override.unwrap_or(config_file.source.url),
            min_size: config_file.source.min_size,
            wallpaper_dir,
            hyprpaper_config,
            daemon: config_file.hyprpaper.daemon,
            kill_program: config_file.hyprpaper.kill_program,
            settle: Duration::from_millis(config_file.hyprpaper.settle_ms),
            config_path,
            home: home.to_path_buf(),
        }
    }

    /// 辅助函数：解析 TOML 配置文件
    fn load_config_from_file(path: &Path) -> Option<ConfigFile> {
        fs::read_to_string(path)
            .ok()
            .and_then(|content| toml::from_str(&content).ok())
    }

    fn to_file(&self) -> ConfigFile {
        ConfigFile {
            common: CommonConfig {
                wallpaper_dir: Some(self.wallpaper_dir.to_string_lossy().to_string()),
            },
            source: SourceConfig {
                url: self.source_url.clone(),
                min_size: self.min_size,
            },
            hyprpaper: HyprpaperConfig {
                config_path: Some(self.hyprpaper_config.to_string_lossy().to_string()),
                daemon: self.daemon.clone(),
                kill_program: self.kill_program.clone(),
                settle_ms: self.settle.as_millis() as u64,
            },
        }
    }

    /// 将配置保存回文件
    pub fn save(&self) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: self.config_path.clone(),
            source,
        };

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let toml_str = toml::to_string_pretty(&self.to_file())?;
        fs::write(&self.config_path, toml_str).map_err(io_err)
    }

    /// 修改单个配置项（不会自动保存）
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "wallpaper_dir" => self.wallpaper_dir = resolve_path(value, &self.home),
            "url" => self.source_url = value.to_string(),
            "min_size" => self.min_size = value.parse().map_err(|_| invalid())?,
            "config_path" => self.hyprpaper_config = resolve_path(value, &self.home),
            "daemon" => self.daemon = value.to_string(),
            "kill_program" => self.kill_program = value.to_string(),
            "settle_ms" => {
                self.settle = Duration::from_millis(value.parse().map_err(|_| invalid())?)
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// 获取配置文件的 JSON Schema
    pub fn get_schema() -> Result<String, ConfigError> {
        let schema = schemars::schema_for!(ConfigFile);
        Ok(serde_json::to_string_pretty(&schema)?)
    }

    /// 将当前配置转换为 TOML 字符串
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&self.to_file())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(home: &Path, content: &str) {
        let dir = home.join(".config").join("apod-wall");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), content).unwrap();
    }

    #[test]
    fn defaults_without_config_file() {
        let home = tempfile::tempdir().unwrap();
        let config = AppConfig::from_home(home.path(), None);

        assert_eq!(config.source_url, DEFAULT_URL);
        assert_eq!(config.min_size, 500);
        assert_eq!(
            config.wallpaper_dir,
            home.path().join("Pictures/Wallpapers/apod")
        );
        assert_eq!(
            config.hyprpaper_config,
            home.path().join(".config/hypr/hyprpaper.conf")
        );
        assert_eq!(config.daemon, "hyprpaper");
        assert_eq!(config.kill_program, "killall");
        assert_eq!(config.settle, Duration::from_secs(1));
    }

    #[test]
    fn reads_values_from_toml() {
        let home = tempfile::tempdir().unwrap();
        write_config(
            home.path(),
            r#"
[common]
wallpaper_dir = "/srv/walls"

[source]
min_size = 2048

[hyprpaper]
config_path = "dotfiles/hyprpaper.conf"
settle_ms = 250
"#,
        );

        let config = AppConfig::from_home(home.path(), None);
        assert_eq!(config.wallpaper_dir, PathBuf::from("/srv/walls"));
        assert_eq!(config.min_size, 2048);
        assert_eq!(config.source_url, DEFAULT_URL);
        assert_eq!(
            config.hyprpaper_config,
            home.path().join("dotfiles/hyprpaper.conf")
        );
        assert_eq!(config.daemon, "hyprpaper");
        assert_eq!(config.settle, Duration::from_millis(250));
    }

    #[test]
    fn url_override_beats_file() {
        let home = tempfile::tempdir().unwrap();
        write_config(home.path(), "[source]\nurl = \"https://file.test/\"\n");

        let config = AppConfig::from_home(home.path(), Some("https://env.test/".to_string()));
        assert_eq!(config.source_url, "https://env.test/");
    }

    #[test]
    fn invalid_toml_falls_back_to_defaults() {
        let home = tempfile::tempdir().unwrap();
        write_config(home.path(), "[source\nurl = ");

        let config = AppConfig::from_home(home.path(), None);
        assert_eq!(config.source_url, DEFAULT_URL);
    }

    #[test]
    fn save_then_load_keeps_changes() {
        let home = tempfile::tempdir().unwrap();
        let mut config = AppConfig::from_home(home.path(), None);
        config.set("min_size", "1024").unwrap();
        config.set("wallpaper_dir", "walls/apod").unwrap();
        config.save().unwrap();

        let reloaded = AppConfig::from_home(home.path(), None);
        assert_eq!(reloaded, config);
        assert_eq!(reloaded.wallpaper_dir, home.path().join("walls/apod"));
    }

    #[test]
    fn tilde_and_home_var_expand_to_home() {
        let home = tempfile::tempdir().unwrap();
        let mut config = AppConfig::from_home(home.path(), None);

        config.set("wallpaper_dir", "~/walls").unwrap();
        assert_eq!(config.wallpaper_dir, home.path().join("walls"));

        config.set("wallpaper_dir", "$HOME/walls").unwrap();
        assert_eq!(config.wallpaper_dir, home.path().join("walls"));

        config.set("config_path", "${HOME}/hypr/hyprpaper.conf").unwrap();
        assert_eq!(
            config.hyprpaper_config,
            home.path().join("hypr/hyprpaper.conf")
        );
    }

    #[test]
    fn toml_paths_expand_home() {
        let home = tempfile::tempdir().unwrap();
        write_config(
            home.path(),
            "[common]\nwallpaper_dir = \"~/walls\"\n\n[hyprpaper]\nconfig_path = \"$HOME/hypr.conf\"\n",
        );

        let config = AppConfig::from_home(home.path(), None);
        assert_eq!(config.wallpaper_dir, home.path().join("walls"));
        assert_eq!(config.hyprpaper_config, home.path().join("hypr.conf"));
    }

    #[test]
    fn set_kill_program() {
        let home = tempfile::tempdir().unwrap();
        let mut config = AppConfig::from_home(home.path(), None);

        config.set("kill_program", "pkill").unwrap();
        assert_eq!(config.kill_program, "pkill");
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_number() {
        let home = tempfile::tempdir().unwrap();
        let mut config = AppConfig::from_home(home.path(), None);

        assert!(matches!(
            config.set("theme", "dracula"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            config.set("settle_ms", "soon"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn schema_lists_sections() {
        let schema = AppConfig::get_schema().unwrap();
        assert!(schema.contains("hyprpaper"));
        assert!(schema.contains("min_size"));
    }
}
