use std::time::Duration;

use reqwest::{StatusCode, Url, header};

use crate::record::{Envelope, Record};

/// 单次拉取失败的原因。
///
/// 所有变体对页面来说都是同一个失败状态，这里只保留细节用于日志。
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// 网络不可达、连接被拒等传输层错误
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 非 2xx 响应
    #[error("unexpected status: {0}")]
    HttpStatus(StatusCode),

    /// 响应体不是合法的 `{ "data": ... }`
    #[error("malformed body: {0}")]
    Parse(#[from] serde_json::Error),

    /// 超过配置的等待时间
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid request url: {0}")]
    Url(String),
}

/// 按集合名和标识拉取单条记录
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(
        &self,
        collection: &str,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Record>, FetchError>> + Send;
}

/// 基于 reqwest 的远端接口客户端，请求 `GET {base_url}/{collection}/{id}`。
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpFetcher {
    pub fn new(base_url: Url) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .default_headers({
                let mut header = header::HeaderMap::new();
                header.insert(
                    header::ACCEPT,
                    header::HeaderValue::from_static("application/json"),
                );
                header
            })
            .build()?;

        Ok(Self { client, base_url })
    }

    /// 拼接请求地址，`id` 会作为单个路径段进行转义
    pub fn record_url(&self, collection: &str, id: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Url(self.base_url.to_string()))?
            .pop_if_empty()
            .push(collection)
            .push(id);
        Ok(url)
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, collection: &str, id: &str) -> Result<Option<Record>, FetchError> {
        let url = self.record_url(collection, id)?;

        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status));
        }

        let body = resp.bytes().await?;
        Ok(Envelope::<Record>::from_slice(&body)?)
    }
}
