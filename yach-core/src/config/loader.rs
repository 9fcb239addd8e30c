use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::node::ConfigNode;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    Json,
    Yaml,
    Toml,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                Error::Config(format!(
                    "config '{}' has no file extension to infer its format",
                    path.display()
                ))
            })?;
        extension.parse()
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            other => Err(Error::Config(format!("unsupported config format '{other}'"))),
        }
    }
}

/// Seeds a tree from text. Nested mappings become nested nodes; an empty
/// document yields an empty tree.
pub fn load_from_str(content: &str, format: Format) -> Result<ConfigNode> {
    if content.trim().is_empty() {
        return Ok(ConfigNode::new());
    }

    let value: Value = match format {
        Format::Json => serde_json::from_str(content)?,
        Format::Yaml => serde_yaml::from_str(content)?,
        Format::Toml => toml::from_str(content)?,
    };
    ConfigNode::from_value(value)
}

pub fn load_from_file(path: &Path) -> Result<ConfigNode> {
    let format = Format::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|err| {
        Error::Config(format!("failed to read config '{}': {err}", path.display()))
    })?;

    load_from_str(&content, format).map_err(|err| {
        Error::Config(format!(
            "failed to parse config '{}': {err}",
            path.display()
        ))
    })
}
