use chrono::{DateTime, Local};

use super::{PageConfig, ViewState};
use crate::record::Record;

/// 声明式的页面描述，由渲染层转换成实际输出。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// 尚未收到标识
    Blank,
    Loading {
        label: String,
    },
    Error {
        message: String,
    },
    /// 请求成功但没有数据
    Empty {
        message: String,
    },
    Detail(DetailView),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetailView {
    pub image: Option<Image>,
    pub title: Option<String>,
    /// 原样保留换行
    pub description: Option<String>,
    pub metadata: Vec<MetaField>,
    pub link: Option<OutboundLink>,
}

/// 图片加载失败时应隐藏，而不是显示破图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaField {
    pub label: &'static str,
    pub value: String,
}

/// 外链，总是在新窗口打开且不向目标页暴露来源窗口
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundLink {
    pub href: String,
    pub label: String,
}

/// 把状态映射为视图，不产生任何副作用。
pub fn render(state: &ViewState, config: &PageConfig) -> View {
    match state {
        ViewState::Idle => View::Blank,
        ViewState::Loading(_) => View::Loading {
            label: config.loading_label(),
        },
        ViewState::Failed(message) => View::Error {
            message: message.clone(),
        },
        ViewState::Loaded(None) => View::Empty {
            message: config.empty_message(),
        },
        ViewState::Loaded(Some(record)) => View::Detail(detail(record, config)),
    }
}

fn detail(record: &Record, config: &PageConfig) -> DetailView {
    let fields = &config.fields;

    let image = record
        .image()
        .filter(|_| fields.show_image)
        .map(|src| Image {
            src: src.to_string(),
            alt: record.title.clone().unwrap_or_default(),
        });

    let description = record
        .description
        .clone()
        .filter(|d| fields.show_description && !d.is_empty());

    let mut metadata = Vec::new();
    if fields.show_id {
        if let Some(id) = &record.id {
            metadata.push(MetaField {
                label: "ID",
                value: id.to_string(),
            });
        }
    }
    if fields.show_created_at {
        if let Some(at) = &record.created_at {
            metadata.push(MetaField {
                label: "Created",
                value: calendar_date(at),
            });
        }
    }
    if fields.show_updated_at {
        if let Some(at) = &record.updated_at {
            metadata.push(MetaField {
                label: "Updated",
                value: calendar_date(at),
            });
        }
    }

    let link = record
        .outbound_link()
        .filter(|_| fields.show_link)
        .map(|href| OutboundLink {
            href: href.to_string(),
            label: fields.link_label.clone(),
        });

    DetailView {
        image,
        title: record.title.clone(),
        description,
        metadata,
        link,
    }
}

/// 本地日历日期，如 `3/14/2024`
pub fn calendar_date(at: &DateTime<Local>) -> String {
    at.format("%-m/%-d/%Y").to_string()
}
