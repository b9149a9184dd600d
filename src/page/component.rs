use std::{sync::Arc, time::Duration};

use tokio::{sync::watch, task::AbortHandle};
use tracing::instrument;

use super::{PageConfig, Ticket, View, ViewState, render};
use crate::{
    fetch::{FetchError, Fetcher},
    record::Record,
    telemetry::{self, Sink},
};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// 通用详情页组件。
///
/// 每个实例只服务于当前展示的一个标识：收到标识后进入 `Loading`，
/// 在后台任务中拉取记录，最后落定为 `Loaded` 或 `Failed`。
/// 标识变化时旧周期会被中止，晚到的旧结果也不会覆盖新状态。
pub struct DetailPage<F> {
    config: Arc<PageConfig>,
    fetcher: Arc<F>,
    sink: Arc<dyn Sink>,
    timeout: Duration,
    state: Arc<watch::Sender<ViewState>>,
    generation: u64,
    in_flight: Option<AbortHandle>,
}

impl<F: Fetcher> DetailPage<F> {
    /// 创建处于 `Idle` 状态的组件，上报通道取自进程级的 [`telemetry::sink`]
    pub fn new(config: Arc<PageConfig>, fetcher: Arc<F>) -> Self {
        let (state, _) = watch::channel(ViewState::Idle);
        Self {
            config,
            fetcher,
            sink: telemetry::sink(),
            timeout: DEFAULT_FETCH_TIMEOUT,
            state: Arc::new(state),
            generation: 0,
            in_flight: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    /// 当前状态的快照
    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    /// 收到（或切换到）新的标识。
    ///
    /// 空标识不发起请求，状态保持不变，返回 `None`。
    /// 否则状态被替换为新的 `Loading`，并在后台发起一次请求。
    pub fn on_identifier(&mut self, id: &str) -> Option<Ticket> {
        if id.trim().is_empty() {
            return None;
        }

        self.generation += 1;
        let ticket = Ticket {
            id: id.to_string(),
            generation: self.generation,
        };

        // 先替换状态再中止旧任务，旧任务的收尾因此不会再命中
        self.state.send_replace(ViewState::Loading(ticket.clone()));
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }

        let task = tokio::spawn(run_cycle(
            self.config.clone(),
            self.fetcher.clone(),
            self.sink.clone(),
            self.timeout,
            CycleGuard {
                state: self.state.clone(),
                ticket: ticket.clone(),
                fallback: self.config.failure_message(),
            },
        ));
        self.in_flight = Some(task.abort_handle());

        Some(ticket)
    }

    /// 发起一次周期并等待其落定，返回落定后的状态
    pub async fn load(&mut self, id: &str) -> ViewState {
        let mut rx = self.state.subscribe();
        if self.on_identifier(id).is_none() {
            return self.state();
        }

        let settled = rx.wait_for(|s| !s.is_loading()).await.map(|s| s.clone());
        settled.unwrap_or_else(|_| self.state())
    }

    /// 按当前状态生成视图
    pub fn render(&self) -> View {
        render(&self.state.borrow(), &self.config)
    }
}

impl<F> Drop for DetailPage<F> {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

/// 保证一个周期无论如何结束都会离开 `Loading`。
///
/// 任务被中止或崩溃时，析构会以失败文案落定；
/// 若状态已经不在等待这个周期，落定不生效。
struct CycleGuard {
    state: Arc<watch::Sender<ViewState>>,
    ticket: Ticket,
    fallback: String,
}

impl CycleGuard {
    fn settle(&self, outcome: Result<Option<Record>, String>) -> bool {
        self.state
            .send_if_modified(|state| state.settle(&self.ticket, outcome))
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.settle(Err(self.fallback.clone()));
    }
}

#[instrument(name = "fetch cycle", skip_all, fields(page = %config.name, id = %guard.ticket.id))]
async fn run_cycle<F: Fetcher>(
    config: Arc<PageConfig>,
    fetcher: Arc<F>,
    sink: Arc<dyn Sink>,
    timeout: Duration,
    guard: CycleGuard,
) {
    let id = guard.ticket.id.as_str();

    let outcome =
        match tokio::time::timeout(timeout, fetcher.fetch(&config.collection, id)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(timeout)),
        };

    let outcome = outcome.map_err(|e| {
        sink.fetch_failed(&config.name, id, &e);
        config.failure_message()
    });

    if !guard.settle(outcome) {
        tracing::debug!("discarding superseded result");
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use reqwest::StatusCode;
    use tokio::sync::oneshot;

    use super::*;
    use crate::page::{Phase, View};

    type Outcome = Result<Option<Record>, FetchError>;

    fn titled(title: &str) -> Record {
        Record {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    /// 每次返回同一个结果，并记录调用次数
    struct FixedFetcher {
        make: Box<dyn Fn(&str) -> Outcome + Send + Sync>,
        calls: AtomicUsize,
    }

    impl FixedFetcher {
        fn new(make: impl Fn(&str) -> Outcome + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self {
                make: Box::new(make),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Fetcher for FixedFetcher {
        async fn fetch(&self, _collection: &str, id: &str) -> Outcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.make)(id)
        }
    }

    /// 每个标识的响应由测试手动放行
    #[derive(Default)]
    struct GatedFetcher {
        gates: Mutex<HashMap<String, oneshot::Receiver<Outcome>>>,
    }

    impl GatedFetcher {
        fn gate(&self, id: &str) -> oneshot::Sender<Outcome> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(id.to_string(), rx);
            tx
        }
    }

    impl Fetcher for GatedFetcher {
        async fn fetch(&self, _collection: &str, id: &str) -> Outcome {
            let rx = self.gates.lock().unwrap().remove(id).expect("未设置响应");
            rx.await.unwrap_or(Ok(None))
        }
    }

    struct PendingFetcher;

    impl Fetcher for PendingFetcher {
        async fn fetch(&self, _collection: &str, _id: &str) -> Outcome {
            std::future::pending().await
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<(String, String, String)>>,
    }

    impl Sink for RecordingSink {
        fn fetch_failed(&self, page: &str, id: &str, error: &(dyn std::error::Error + 'static)) {
            self.events
                .lock()
                .unwrap()
                .push((page.to_string(), id.to_string(), error.to_string()));
        }
    }

    fn page<F: Fetcher>(config: PageConfig, fetcher: Arc<F>) -> DetailPage<F> {
        DetailPage::new(Arc::new(config), fetcher)
    }

    #[tokio::test]
    async fn test_empty_id_never_fetches() {
        let fetcher = FixedFetcher::new(|_| Ok(Some(titled("x"))));
        let mut p = page(PageConfig::pastoral(), fetcher.clone());

        assert!(p.on_identifier("").is_none());
        assert!(p.on_identifier("   ").is_none());
        assert_eq!(p.load("").await, ViewState::Idle);

        assert_eq!(fetcher.calls(), 0);
        assert_eq!(p.render(), View::Blank);
    }

    #[tokio::test]
    async fn test_load_success_enters_loading_first() {
        let fetcher = FixedFetcher::new(|id| Ok(Some(titled(&format!("record {id}")))));
        let mut p = page(PageConfig::pastoral(), fetcher.clone());

        let mut rx = p.subscribe();
        let ticket = p.on_identifier("42").expect("应发起请求");
        assert_eq!(ticket.id, "42");
        assert_eq!(rx.borrow_and_update().phase(), Phase::Loading);
        assert!(matches!(p.render(), View::Loading { .. }));

        let state = rx
            .wait_for(|s| !s.is_loading())
            .await
            .expect("状态通道关闭")
            .clone();
        assert_eq!(
            state.loaded().and_then(|r| r.title.as_deref()),
            Some("record 42")
        );
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_generic_and_reported() {
        let fetcher = FixedFetcher::new(|_| Err(FetchError::HttpStatus(StatusCode::BAD_GATEWAY)));
        let sink = Arc::new(RecordingSink::default());
        let mut p = page(PageConfig::social_center(), fetcher).with_sink(sink.clone());

        let state = p.load("7").await;
        assert_eq!(
            state,
            ViewState::Failed(
                "Unable to load social center details. Please try again later.".into()
            )
        );

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "social-center");
        assert_eq!(events[0].1, "7");
        assert!(events[0].2.contains("502"));
    }

    #[tokio::test]
    async fn test_empty_data_is_loaded_none() {
        let fetcher = FixedFetcher::new(|_| Ok(None));
        let mut p = page(PageConfig::pastoral(), fetcher);

        assert_eq!(p.load("1").await, ViewState::Loaded(None));
        assert!(matches!(p.render(), View::Empty { .. }));
    }

    #[tokio::test]
    async fn test_same_id_twice_is_idempotent() {
        let fetcher = FixedFetcher::new(|id| Ok(Some(titled(id))));
        let mut p = page(PageConfig::pastoral(), fetcher);

        let first = p.load("5").await;
        let first_view = p.render();
        let second = p.load("5").await;

        assert_eq!(first, second);
        assert_eq!(first_view, p.render());
    }

    #[tokio::test]
    async fn test_superseded_response_is_discarded() {
        let fetcher = Arc::new(GatedFetcher::default());
        let gate1 = fetcher.gate("1");
        let gate2 = fetcher.gate("2");

        let mut p = page(PageConfig::pastoral(), fetcher.clone());
        let mut rx = p.subscribe();

        p.on_identifier("1");
        // 让第一个周期真正开始等待响应
        tokio::task::yield_now().await;
        p.on_identifier("2");

        let _ = gate2.send(Ok(Some(titled("two"))));
        rx.wait_for(|s| !s.is_loading()).await.expect("状态通道关闭");

        // 旧周期的响应晚到
        let _ = gate1.send(Ok(Some(titled("one"))));
        tokio::task::yield_now().await;

        assert_eq!(
            p.state().loaded().and_then(|r| r.title.as_deref()),
            Some("two")
        );
    }

    #[tokio::test]
    async fn test_timeout_fails_cycle() {
        let sink = Arc::new(RecordingSink::default());
        let mut p = page(PageConfig::pastoral(), Arc::new(PendingFetcher))
            .with_sink(sink.clone())
            .with_timeout(Duration::from_millis(50));

        let state = p.load("9").await;
        assert_eq!(state.phase(), Phase::Failed);
        assert!(sink.events.lock().unwrap()[0].2.contains("timed out"));
    }

    #[tokio::test]
    async fn test_aborted_cycle_leaves_loading() {
        let fetcher = Arc::new(GatedFetcher::default());
        let _gate = fetcher.gate("1");

        let mut p = page(PageConfig::pastoral(), fetcher.clone());
        let mut rx = p.subscribe();
        p.on_identifier("1");

        // 组件析构时中止后台任务，状态仍会离开 Loading
        drop(p);
        while rx.changed().await.is_ok() {}
        assert_eq!(rx.borrow().phase(), Phase::Failed);
    }
}
