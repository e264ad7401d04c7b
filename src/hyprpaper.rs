// hyprpaper.rs — hyprpaper 配置文件写入模块
// 只改写 preload / wallpaper 两条指令，其余行原样保留

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// preload 指令前缀
pub const PRELOAD_PREFIX: &str = "preload = ";
/// wallpaper 指令前缀
pub const WALLPAPER_PREFIX: &str = "wallpaper = ";

#[derive(Debug, Error)]
pub enum HyprpaperError {
    #[error("could not update {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn preload_line(image: &str) -> String {
    format!("{PRELOAD_PREFIX}{image}\n")
}

/// 逗号前的显示器选择为空，表示作用于所有显示器
fn wallpaper_line(image: &str) -> String {
    format!("{WALLPAPER_PREFIX},{image}\n")
}

/// 在配置文本中写入两条指令
///
/// 以 `preload = ` / `wallpaper = ` 开头的每一行都替换为指向 `image` 的新行，
/// 其余行保持原样和原顺序。缺少的指令追加在末尾，先 preload 后 wallpaper。
pub fn upsert_directives(content: &str, image: &str) -> String {
    let mut output = String::with_capacity(content.len() + 2 * image.len() + 32);
    let mut preload_found = false;
    let mut wallpaper_found = false;

    // split_inclusive 保留每行的换行符，未改动的行可以逐字节还原
    for line in content.split_inclusive('\n') {
        if line.starts_with(PRELOAD_PREFIX) {
            output.push_str(&preload_line(image));
            preload_found = true;
        } else if line.starts_with(WALLPAPER_PREFIX) {
            output.push_str(&wallpaper_line(image));
            wallpaper_found = true;
        } else {
            output.push_str(line);
        }
    }

    let appending = !preload_found || !wallpaper_found;
    if appending && !output.is_empty() && !output.ends_with('\n') {
        output.push('\n');
    }
    if !preload_found {
        output.push_str(&preload_line(image));
    }
    if !wallpaper_found {
        output.push_str(&wallpaper_line(image));
    }

    output
}

/// 把 hyprpaper 配置中的壁纸指向 `image`
///
/// 配置文件不存在时从空内容开始，父目录按需创建；写回时覆盖整个文件。
pub fn update_config(config_path: &Path, image: &Path) -> Result<(), HyprpaperError> {
    let io_err = |source| HyprpaperError::Io {
        path: config_path.to_path_buf(),
        source,
    };

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(io_err(e)),
    };

    let updated = upsert_directives(&content, &image.to_string_lossy());
    fs::write(config_path, updated).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE: &str = "/home/user/Pictures/Wallpapers/apod/m31.jpg";

    #[test]
    fn empty_config_gets_both_directives_in_order() {
        assert_eq!(
            upsert_directives("", IMAGE),
            format!("preload = {IMAGE}\nwallpaper = ,{IMAGE}\n")
        );
    }

    #[test]
    fn replaces_in_place_and_keeps_other_lines() {
        let before = "# hyprpaper\nsplash = false\npreload = /old.jpg\nipc = off\nwallpaper = DP-1,/old.jpg\n";
        let after = upsert_directives(before, IMAGE);
        assert_eq!(
            after,
            format!(
                "# hyprpaper\nsplash = false\npreload = {IMAGE}\nipc = off\nwallpaper = ,{IMAGE}\n"
            )
        );
    }

    #[test]
    fn appends_only_missing_directive() {
        let before = "wallpaper = ,/old.jpg\nsplash = true\n";
        let after = upsert_directives(before, IMAGE);
        assert_eq!(
            after,
            format!("wallpaper = ,{IMAGE}\nsplash = true\npreload = {IMAGE}\n")
        );
    }

    #[test]
    fn upsert_is_idempotent() {
        let before = "splash = false\n\n# keep me\nipc = on\n";
        let once = upsert_directives(before, IMAGE);
        let twice = upsert_directives(&once, IMAGE);
        assert_eq!(once, twice);

        let lines: Vec<&str> = twice.lines().collect();
        assert_eq!(
            lines.iter().filter(|l| l.starts_with(PRELOAD_PREFIX)).count(),
            1
        );
        assert_eq!(
            lines.iter().filter(|l| l.starts_with(WALLPAPER_PREFIX)).count(),
            1
        );
        assert_eq!(&lines[..4], &["splash = false", "", "# keep me", "ipc = on"]);
    }

    #[test]
    fn every_duplicate_directive_is_replaced() {
        let before = "preload = /a.jpg\npreload = /b.jpg\nwallpaper = ,/a.jpg\n";
        let after = upsert_directives(before, IMAGE);
        assert_eq!(
            after,
            format!("preload = {IMAGE}\npreload = {IMAGE}\nwallpaper = ,{IMAGE}\n")
        );
    }

    #[test]
    fn prefix_must_match_exactly() {
        // 缩进或没有空格的写法不算指令
        let before = "  preload = /a.jpg\npreload=/b.jpg\n";
        let after = upsert_directives(before, IMAGE);
        assert!(after.starts_with(before));
        assert!(after.ends_with(&format!("preload = {IMAGE}\nwallpaper = ,{IMAGE}\n")));
    }

    #[test]
    fn missing_trailing_newline_does_not_merge_lines() {
        let after = upsert_directives("splash = false", IMAGE);
        assert_eq!(
            after,
            format!("splash = false\npreload = {IMAGE}\nwallpaper = ,{IMAGE}\n")
        );
    }

    #[test]
    fn update_config_creates_missing_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("hypr").join("hyprpaper.conf");
        let image = dir.path().join("apod").join("sample.jpg");

        update_config(&config, &image).unwrap();

        let written = std::fs::read_to_string(&config).unwrap();
        let image = image.display();
        assert_eq!(written, format!("preload = {image}\nwallpaper = ,{image}\n"));
    }

    #[test]
    fn update_config_twice_keeps_single_directives() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("hyprpaper.conf");
        std::fs::write(&config, "splash = false\nipc = off\n").unwrap();

        let first = dir.path().join("first.jpg");
        let second = dir.path().join("second.jpg");
        update_config(&config, &first).unwrap();
        update_config(&config, &second).unwrap();

        let written = std::fs::read_to_string(&config).unwrap();
        let second = second.display();
        assert_eq!(
            written,
            format!("splash = false\nipc = off\npreload = {second}\nwallpaper = ,{second}\n")
        );
    }
}
