// source/mod.rs — 壁纸源模块入口
// 定义图片引用结构、壁纸源 Trait，以及可替换的 HTTP 传输层

pub mod apod;

use async_trait::async_trait; // 异步 Trait 支持宏
use std::path::{Path, PathBuf}; // 路径相关类型
use thiserror::Error;

/// 从页面中找到的图片引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// 图片的绝对下载 URL
    pub url: String,
    /// URL 最后一段作为文件名；取不到时为 None，下载时再生成
    pub filename: Option<String>,
    /// HEAD 探测得到的 Content-Length（字节），缺失按 0 处理
    pub size: u64,
}

/// 网络请求失败（连接错误或非 2xx 状态码）
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// 定位图片失败
#[derive(Debug, Error)]
pub enum LocateError {
    /// 页面本身没取到
    #[error("could not fetch the page: {0}")]
    Page(#[source] TransportError),

    /// 两级查找都没有找到足够大的图片
    #[error("could not find a valid image on the page")]
    NoImage,
}

/// 下载或保存图片失败
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("download failed: {0}")]
    Transport(#[from] TransportError),

    #[error("could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// HTTP 传输层抽象
///
/// 壁纸源只通过这三个操作访问网络，测试中可以换成内存实现。
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET 并返回文本
    async fn get_text(&self, url: &str) -> Result<String, TransportError>;

    /// HEAD 并返回 Content-Length
    async fn content_length(&self, url: &str) -> Result<u64, TransportError>;

    /// GET 并返回完整的响应体
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

/// 基于 reqwest 的默认传输层
pub struct HttpTransport {
    /// HTTP 客户端（内部有连接池，应复用）
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// 发送请求，并把非 2xx 状态码转换为错误
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<reqwest::Response, TransportError> {
        let response = request
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_text(&self, url: &str) -> Result<String, TransportError> {
        let response = self.send(self.client.get(url), url).await?;
        response.text().await.map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })
    }

    async fn content_length(&self, url: &str) -> Result<u64, TransportError> {
        let response = self.send(self.client.head(url), url).await?;

        // HEAD 响应没有 body，reqwest 的 content_length() 会给出 0，
        // 所以直接读响应头
        let size = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(0);

        Ok(size)
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let response = self.send(self.client.get(url), url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;
        Ok(bytes.to_vec())
    }
}

/// 壁纸源的抽象 Trait
///
/// 流水线只依赖这个接口：先定位今天的图片，再把它下载到指定目录。
#[async_trait]
pub trait WallpaperSource: Send + Sync {
    /// 定位图片，返回通过尺寸检查的引用
    async fn locate(&self) -> Result<ImageRef, LocateError>;

    /// 下载图片，返回保存后的完整路径
    async fn download(&self, image: &ImageRef, save_dir: &Path) -> Result<PathBuf, DownloadError>;
}
