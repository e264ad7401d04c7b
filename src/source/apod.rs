// apod.rs — NASA APOD（每日天文图）客户端模块
// 负责抓取每日页面、从 HTML 中找出图片链接、探测大小并下载图片

use super::{
    DownloadError, HttpTransport, ImageRef, LocateError, Transport, WallpaperSource,
};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use log::debug;
use regex::Regex;
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::fs::File; // tokio 提供的异步文件操作
use tokio::io::AsyncWriteExt; // 异步写入 trait，提供 write_all() 等方法

/// APOD 首页地址，相对链接都基于它拼接
pub const DEFAULT_URL: &str = "https://apod.nasa.gov/apod/";

/// 小于这个字节数的候选图被视为图标或缩略图
pub const DEFAULT_MIN_SIZE: u64 = 500;

/// 找不到文件名时使用的扩展名
const FALLBACK_EXTENSION: &str = "jpg";

// 页面里的图片链接都以 image/ 开头，例如 <a href="image/2410/foo.jpg">
static ANCHOR_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a href="(image.*?)""#).expect("anchor pattern is valid")
});
static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img src="(image.*?)""#).expect("img pattern is valid")
});

/// 查找图片链接时使用的元素属性，按查找顺序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkElement {
    /// `<a href="image/...">`，通常指向原图
    Anchor,
    /// `<img src="image/...">`，页面上展示的图
    Image,
}

impl LinkElement {
    /// 两级查找顺序：先 a href，再 img src
    pub const SEARCH_ORDER: [LinkElement; 2] = [LinkElement::Anchor, LinkElement::Image];

    fn pattern(self) -> &'static Regex {
        match self {
            LinkElement::Anchor => &ANCHOR_HREF,
            LinkElement::Image => &IMG_SRC,
        }
    }

    /// 在页面文本中查找第一个匹配的链接
    pub fn find_link(self, page: &str) -> Option<&str> {
        self.pattern()
            .captures(page)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// APOD 客户端
///
/// 泛型参数 `T` 是传输层，默认是基于 reqwest 的 [`HttpTransport`]。
pub struct ApodClient<T = HttpTransport> {
    transport: T,

    /// 页面地址，同时也是相对链接的基准
    base_url: String,

    /// 尺寸阈值（字节）
    min_size: u64,
}

impl ApodClient<HttpTransport> {
    /// 创建使用真实网络的客户端
    pub fn new(base_url: String, min_size: u64) -> Self {
        Self::with_transport(HttpTransport::new(), base_url, min_size)
    }
}

impl<T: Transport> ApodClient<T> {
    pub fn with_transport(transport: T, base_url: String, min_size: u64) -> Self {
        Self {
            transport,
            base_url,
            min_size,
        }
    }

    /// 以页面地址为基准解析相对链接，已是 http(s) 链接的保持不变
    pub fn resolve(&self, link: &str) -> String {
        if link.starts_with("http") {
            return link.to_string();
        }

        match Url::parse(&self.base_url).and_then(|base| base.join(link)) {
            Ok(url) => url.into(),
            Err(e) => {
                // 基准地址无法解析时退回直接拼接
                debug!("could not resolve {link} against {}: {e}", self.base_url);
                format!("{}{}", self.base_url, link)
            }
        }
    }

    /// 按给定元素查找链接并用 HEAD 探测大小
    ///
    /// 没有匹配或 HEAD 失败时返回 None。
    async fn probe(&self, element: LinkElement, page: &str) -> Option<ImageRef> {
        let link = element.find_link(page)?;
        let url = self.resolve(link);

        let size = match self.transport.content_length(&url).await {
            Ok(size) => size,
            Err(e) => {
                debug!("size probe for {url} failed: {e}");
                return None;
            }
        };

        Some(ImageRef {
            filename: filename_from_url(&url),
            url,
            size,
        })
    }
}

#[async_trait]
impl<T: Transport> WallpaperSource for ApodClient<T> {
    async fn locate(&self) -> Result<ImageRef, LocateError> {
        let page = self
            .transport
            .get_text(&self.base_url)
            .await
            .map_err(LocateError::Page)?;

        for element in LinkElement::SEARCH_ORDER {
            match self.probe(element, &page).await {
                Some(image) if image.size >= self.min_size => {
                    debug!("{element:?} candidate accepted: {} ({} bytes)", image.url, image.size);
                    return Ok(image);
                }
                Some(image) => {
                    debug!(
                        "{element:?} candidate too small: {} ({} < {} bytes)",
                        image.url, image.size, self.min_size
                    );
                }
                None => debug!("no usable {element:?} candidate"),
            }
        }

        Err(LocateError::NoImage)
    }

    async fn download(&self, image: &ImageRef, save_dir: &Path) -> Result<PathBuf, DownloadError> {
        let bytes = self.transport.get_bytes(&image.url).await?;

        tokio::fs::create_dir_all(save_dir)
            .await
            .map_err(|source| DownloadError::Io {
                path: save_dir.to_path_buf(),
                source,
            })?;

        let filename = image
            .filename
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| dated_filename(Local::now().date_naive()));
        let save_path = save_dir.join(filename);

        // File::create 会覆盖同名文件
        let io_err = |source| DownloadError::Io {
            path: save_path.clone(),
            source,
        };
        let mut file = File::create(&save_path).await.map_err(io_err)?;
        file.write_all(&bytes).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;

        Ok(save_path)
    }
}

/// 取 URL 最后一段作为文件名，例如 .../image/2410/foo.jpg -> foo.jpg
fn filename_from_url(url: &str) -> Option<String> {
    url.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// 生成按日期命名的文件名，例如 apod_20241017.jpg
pub fn dated_filename(date: NaiveDate) -> String {
    format!("apod_{}.{}", date.format("%Y%m%d"), FALLBACK_EXTENSION)
}
