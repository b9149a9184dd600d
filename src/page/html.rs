use std::fmt::Write;

use super::{DetailView, View};

impl View {
    /// 输出 HTML 片段，所有文本和属性都会转义
    pub fn to_html(&self) -> String {
        match self {
            View::Blank => r#"<div class="page-blank"></div>"#.to_string(),
            View::Loading { label } => format!(
                r#"<div class="page-loading" role="status">{}</div>"#,
                escape(label)
            ),
            View::Error { message } => format!(
                r#"<div class="page-error" role="alert">{}</div>"#,
                escape(message)
            ),
            View::Empty { message } => {
                format!(r#"<div class="page-empty">{}</div>"#, escape(message))
            }
            View::Detail(detail) => detail_html(detail),
        }
    }
}

fn detail_html(detail: &DetailView) -> String {
    let mut out = String::from(r#"<article class="page-detail">"#);

    if let Some(image) = &detail.image {
        // 图片加载失败时隐藏自身
        let _ = write!(
            out,
            r#"<img class="page-image" src="{}" alt="{}" onerror="this.style.display='none'">"#,
            escape(&image.src),
            escape(&image.alt)
        );
    }

    if let Some(title) = &detail.title {
        let _ = write!(out, r#"<h1 class="page-title">{}</h1>"#, escape(title));
    }

    if let Some(description) = &detail.description {
        let _ = write!(
            out,
            r#"<p class="page-description" style="white-space: pre-line">{}</p>"#,
            escape(description)
        );
    }

    if !detail.metadata.is_empty() {
        out.push_str(r#"<dl class="page-metadata">"#);
        for field in &detail.metadata {
            let _ = write!(
                out,
                "<dt>{}</dt><dd>{}</dd>",
                escape(field.label),
                escape(&field.value)
            );
        }
        out.push_str("</dl>");
    }

    if let Some(link) = &detail.link {
        let _ = write!(
            out,
            r#"<a class="page-link" href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
            escape(&link.href),
            escape(&link.label)
        );
    }

    out.push_str("</article>");
    out
}

/// 转义 HTML 特殊字符
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
