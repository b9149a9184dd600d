use serde::Deserialize;

/// 详情页中哪些字段参与展示
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DisplaySpec {
    pub show_image: bool,
    pub show_description: bool,
    pub show_id: bool,
    pub show_created_at: bool,
    pub show_updated_at: bool,
    pub show_link: bool,
    /// 外链按钮文字
    pub link_label: String,
}

impl Default for DisplaySpec {
    fn default() -> Self {
        Self {
            show_image: true,
            show_description: true,
            show_id: true,
            show_created_at: true,
            show_updated_at: true,
            show_link: true,
            link_label: "Visit Link".to_string(),
        }
    }
}

/// 一类详情页的配置。
///
/// 不同内容类型共用同一个组件，只在集合名和字段布局上有区别。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageConfig {
    /// 路由名，如 `pastoral`
    pub name: String,
    /// 远端集合名，原样拼进请求路径
    pub collection: String,
    /// 用于提示文案的名词
    pub noun: String,
    #[serde(default)]
    pub fields: DisplaySpec,
}

impl PageConfig {
    pub fn new(
        name: impl Into<String>,
        collection: impl Into<String>,
        noun: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            collection: collection.into(),
            noun: noun.into(),
            fields: DisplaySpec::default(),
        }
    }

    /// 堂区详情页
    pub fn pastoral() -> Self {
        Self::new("pastoral", "parishes", "pastoral")
    }

    /// 社会服务中心详情页
    pub fn social_center() -> Self {
        Self::new("social-center", "socialcenteres", "social center")
    }

    pub fn with_fields(mut self, fields: DisplaySpec) -> Self {
        self.fields = fields;
        self
    }

    pub fn failure_message(&self) -> String {
        format!(
            "Unable to load {} details. Please try again later.",
            self.noun
        )
    }

    pub fn loading_label(&self) -> String {
        format!("Loading {} details...", self.noun)
    }

    pub fn empty_message(&self) -> String {
        format!("No {} details found.", self.noun)
    }
}
