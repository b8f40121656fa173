use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Number(f64),
    Bool(bool),
    String(String),
}

/// A narrow, closed set of recognized frontmatter keys; anything else is
/// silently ignored per the data model.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PieConfig {
    pub text_position: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Config {
    pub pie: PieConfig,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Frontmatter {
    pub raw: String,
    pub body: String,
    pub config: Option<Config>,
    pub theme_variables: Option<IndexMap<String, ConfigValue>>,
}
