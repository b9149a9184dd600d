use crate::record::Record;

/// 一次拉取周期的凭证，结果只会应用到发起它的那个周期。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: String,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// 页面当前展示的状态，任一时刻只有一个变体生效。
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState<T = Record> {
    #[default]
    Idle,
    Loading(Ticket),
    /// 请求成功，`None` 表示接口返回了空数据
    Loaded(Option<T>),
    Failed(String),
}

impl<T> ViewState<T> {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::Loading(_) => Phase::Loading,
            Self::Loaded(_) => Phase::Loaded,
            Self::Failed(_) => Phase::Failed,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading(_))
    }

    /// 是否仍在等待 `ticket` 对应的结果
    pub fn is_awaiting(&self, ticket: &Ticket) -> bool {
        matches!(self, Self::Loading(t) if t == ticket)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(data) => data.as_ref(),
            _ => None,
        }
    }

    /// 用周期结果替换 `Loading`。
    ///
    /// 只有状态仍在等待同一个 `ticket` 时才生效，返回是否发生了替换。
    pub fn settle(&mut self, ticket: &Ticket, outcome: Result<Option<T>, String>) -> bool {
        if !self.is_awaiting(ticket) {
            return false;
        }
        *self = match outcome {
            Ok(data) => Self::Loaded(data),
            Err(message) => Self::Failed(message),
        };
        true
    }
}
