use axum::{
    Router,
    extract::{Path, State},
    response::Html,
    routing::get,
};

use super::Result;
use crate::{
    fetch::Fetcher,
    page::{DetailPage, View, escape},
    state::AppState,
};

/// 配置页面路由。
///
/// - `GET /health`：存活检查
/// - `GET /{page}`：尚未提供标识的空白页面
/// - `GET /{page}/{id}`：拉取并展示单条记录
pub fn setup_route() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/{page}", get(page_blank))
        .route("/{page}/{id}", get(page_detail))
}

async fn health() -> &'static str {
    "ok"
}

/// 没有标识时不发起请求，直接输出空白页面
async fn page_blank(Path(page): Path<String>, State(app): State<AppState>) -> Result<Html<String>> {
    let component = app.page(&page)?;
    Ok(Html(document(&component)))
}

/// 为本次请求构建新的组件，等待周期落定后输出页面。
///
/// 拉取失败也是页面的一种状态，因此仍返回 200。
async fn page_detail(
    Path((page, id)): Path<(String, String)>,
    State(app): State<AppState>,
) -> Result<Html<String>> {
    let mut component = app.page(&page)?;
    component.load(&id).await;
    Ok(Html(document(&component)))
}

/// 包装成完整的 HTML 文档
fn document<F: Fetcher>(component: &DetailPage<F>) -> String {
    let view = component.render();

    let title = match &view {
        View::Detail(detail) => detail.title.clone(),
        _ => None,
    }
    .unwrap_or_else(|| format!("{} details", component.config().noun));

    format!(
        concat!(
            "<!DOCTYPE html>",
            r#"<html lang="en"><head><meta charset="utf-8">"#,
            "<title>{}</title></head><body>{}</body></html>"
        ),
        escape(&title),
        view.to_html()
    )
}
