use std::fmt;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};

/// 记录标识，远端既可能返回数字也可能返回字符串。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{n}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

/// 页面展示的单条记录（堂区、社会服务中心等）。
///
/// 除标识外所有字段都可能缺失，缺失的字段在渲染时直接隐藏。
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Record {
    pub id: Option<RecordId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Local>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Local>>,
}

impl Record {
    /// 外链地址
    ///
    /// `None`、空串和 `"#"` 都表示没有外链，其余值原样返回。
    pub fn outbound_link(&self) -> Option<&str> {
        self.link
            .as_deref()
            .filter(|link| !link.is_empty() && *link != "#")
    }

    /// 图片地址，空串视为没有图片
    pub fn image(&self) -> Option<&str> {
        self.image_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// 接口响应外壳：`{ "data": ... }`
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
}

impl<T: DeserializeOwned> Envelope<T> {
    /// 从响应体解析外壳，`data` 缺失或为 `null` 时得到 `None`。
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Option<T>> {
        serde_json::from_slice::<Envelope<T>>(body).map(|envelope| envelope.data)
    }
}

/// 宽松解析时间戳，无法解析的值记录日志后丢弃，不影响整条记录。
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Local>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;

    let Some(value) = value else {
        return Ok(None);
    };

    let parsed = value.as_str().and_then(parse_timestamp);
    if parsed.is_none() {
        tracing::warn!(%value, "ignoring unparseable timestamp");
    }
    Ok(parsed)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Local>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }

    for fmt in &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive_dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Local.from_local_datetime(&naive_dt).earliest();
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|naive_dt| Local.from_local_datetime(&naive_dt).earliest())
}
