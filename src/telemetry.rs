use std::sync::{Arc, OnceLock};

use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

/// 运维侧的上报通道。
///
/// 页面组件只通过这个 trait 上报拉取失败的技术细节，不依赖具体实现。
pub trait Sink: Send + Sync {
    /// 上报一次失败的拉取周期
    fn fetch_failed(&self, page: &str, id: &str, error: &(dyn std::error::Error + 'static));
}

/// 默认实现：写入 tracing 日志
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn fetch_failed(&self, page: &str, id: &str, error: &(dyn std::error::Error + 'static)) {
        tracing::error!(page, id, error = %error, "fetch cycle failed");
    }
}

static SINK: OnceLock<Arc<dyn Sink>> = OnceLock::new();

/// 安装进程级上报通道，只有第一次调用生效。
///
/// 返回 `false` 表示之前已经安装过。
pub fn init(sink: Arc<dyn Sink>) -> bool {
    SINK.set(sink).is_ok()
}

/// 获取进程级上报通道，未安装时退回 [`TracingSink`]。
pub fn sink() -> Arc<dyn Sink> {
    SINK.get_or_init(|| Arc::new(TracingSink) as Arc<dyn Sink>)
        .clone()
}

/// 初始化日志输出，过滤规则来自环境变量 `PAGES_LOG`。
///
/// 已经安装过订阅者时保留原有的，并输出一条 debug 日志。
pub fn init_logging() {
    let result = tracing_subscriber::fmt()
        .with_target(false)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()))
        .with_env_filter(EnvFilter::from_env("PAGES_LOG"))
        .try_init();

    if let Err(e) = result {
        tracing::debug!(%e, "tracing subscriber already installed");
    }
}
