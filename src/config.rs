use std::{env, path::Path, time::Duration};

use reqwest::Url;
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    page::{DEFAULT_FETCH_TIMEOUT, PageConfig},
};

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

/// 运行配置，来自环境变量
///
/// - `PAGES_API_BASE_URL`：远端接口根地址（必填）
/// - `PAGES_FETCH_TIMEOUT_MS`：单次拉取超时，默认 10000
/// - `PAGES_LISTEN_ADDR`：监听地址，默认 `0.0.0.0:3000`
/// - `PAGES_CONFIG`：额外页面定义的 TOML 文件路径
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: Url,
    pub fetch_timeout: Duration,
    pub listen_addr: String,
    pub pages: Vec<PageConfig>,
}

#[derive(Debug, Deserialize)]
struct PagesFile {
    #[serde(default)]
    pages: Vec<PageConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源构建配置，便于测试
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base = lookup("PAGES_API_BASE_URL")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::Config("PAGES_API_BASE_URL not set".to_string()))?;
        let api_base_url = parse_base_url(&base)?;

        let fetch_timeout = match lookup("PAGES_FETCH_TIMEOUT_MS") {
            Some(ms) => ms
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .ok_or_else(|| Error::Config(format!("invalid PAGES_FETCH_TIMEOUT_MS: {ms}")))?,
            None => DEFAULT_FETCH_TIMEOUT,
        };

        let listen_addr =
            lookup("PAGES_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());

        let mut pages = vec![PageConfig::pastoral(), PageConfig::social_center()];
        if let Some(path) = lookup("PAGES_CONFIG") {
            merge_pages(&mut pages, load_pages_file(path)?);
        }

        Ok(Self {
            api_base_url,
            fetch_timeout,
            listen_addr,
            pages,
        })
    }
}

/// 解析接口根地址，去掉末尾的 `/`
fn parse_base_url(s: &str) -> Result<Url> {
    let url = Url::parse(s.trim().trim_end_matches('/'))
        .map_err(|e| Error::Config(format!("invalid PAGES_API_BASE_URL: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(Error::Config(format!("invalid PAGES_API_BASE_URL: {s}")));
    }
    Ok(url)
}

/// 读取 TOML 页面定义文件
pub fn load_pages_file(path: impl AsRef<Path>) -> Result<Vec<PageConfig>> {
    let content = std::fs::read_to_string(path)?;
    parse_pages(&content)
}

/// 解析 TOML 页面定义
///
/// ```toml
/// [[pages]]
/// name = "schools"
/// collection = "schools"
/// noun = "school"
/// ```
pub fn parse_pages(content: &str) -> Result<Vec<PageConfig>> {
    let file: PagesFile = toml::from_str(content)?;

    for page in &file.pages {
        if page.name.is_empty() || page.name.contains('/') {
            return Err(Error::Config(format!("invalid page name: {:?}", page.name)));
        }
        if page.collection.is_empty() {
            return Err(Error::Config(format!(
                "page {:?} has an empty collection",
                page.name
            )));
        }
    }

    Ok(file.pages)
}

/// 同名页面以后者为准
fn merge_pages(pages: &mut Vec<PageConfig>, extra: Vec<PageConfig>) {
    for page in extra {
        match pages.iter_mut().find(|p| p.name == page.name) {
            Some(existing) => *existing = page,
            None => pages.push(page),
        }
    }
}
