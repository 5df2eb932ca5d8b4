//! Raw content documents: file formats and value rendering.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::Path;

/// Structured-data formats content documents may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Detect the format from a file extension (`.yaml`, `.yml`, `.json`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(|value| value.to_str())
            .map(|value| value.to_lowercase())?;
        match ext.as_str() {
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            "json" => Some(DocumentFormat::Json),
            _ => None,
        }
    }

    /// File extension used when writing documents in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Yaml => "yaml",
            DocumentFormat::Json => "json",
        }
    }

    /// Parse document text into a raw value.
    pub fn parse(&self, contents: &str) -> Result<Value, String> {
        match self {
            DocumentFormat::Yaml => serde_yaml::from_str(contents).map_err(|err| err.to_string()),
            DocumentFormat::Json => serde_json::from_str(contents).map_err(|err| err.to_string()),
        }
    }

    /// Serialize a value as document text.
    pub fn render<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, String> {
        match self {
            DocumentFormat::Yaml => serde_yaml::to_string(value).map_err(|err| err.to_string()),
            DocumentFormat::Json => serde_json::to_string_pretty(value)
                .map(|mut text| {
                    text.push('\n');
                    text
                })
                .map_err(|err| err.to_string()),
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Render a raw value as compact single-line text.
///
/// Strings render bare; everything else renders as flow-style JSON, falling
/// back to YAML for values JSON cannot express (non-string mapping keys).
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        other => serde_json::to_string(other).unwrap_or_else(|_| {
            serde_yaml::to_string(other)
                .map(|text| text.trim_end().to_string())
                .unwrap_or_default()
        }),
    }
}
