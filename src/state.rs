use std::{collections::HashMap, sync::Arc, time::Duration};

use crate::{
    config::Config,
    error::{ApiError, Result},
    fetch::{FetchError, HttpFetcher},
    page::{DetailPage, PageConfig},
    telemetry::{self, Sink},
};

/// 应用程序上下文
///
/// [`AppState`] 持有页面定义、共享的 HTTP 客户端和上报通道，
/// 每个请求从这里构建一个全新的页面组件。
#[derive(Clone)]
pub struct AppState {
    pages: Arc<HashMap<String, Arc<PageConfig>>>,
    fetcher: Arc<HttpFetcher>,
    sink: Arc<dyn Sink>,
    fetch_timeout: Duration,
}

impl AppState {
    /// 创建一个新的 [`AppState`] 实例
    pub fn new(config: &Config) -> core::result::Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(config.api_base_url.clone())?;

        let pages = config
            .pages
            .iter()
            .map(|page| (page.name.clone(), Arc::new(page.clone())))
            .collect();

        Ok(Self {
            pages: Arc::new(pages),
            fetcher: Arc::new(fetcher),
            sink: telemetry::sink(),
            fetch_timeout: config.fetch_timeout,
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sink = sink;
        self
    }

    /// 按路由名构建页面组件，未配置的页面返回 [`ApiError::NotFound`]
    pub fn page(&self, name: &str) -> Result<DetailPage<HttpFetcher>> {
        let config = self.pages.get(name).ok_or(ApiError::NotFound)?;

        Ok(DetailPage::new(config.clone(), self.fetcher.clone())
            .with_sink(self.sink.clone())
            .with_timeout(self.fetch_timeout))
    }
}
