//! Declarative description of the mock server, loaded once from YAML.
//!
//! Every field is optional at parse time; problems with individual entries
//! (an empty name, an unparsable URI) are reported when the entry is
//! registered, not here.

use crate::types::McpError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server: ServerSettings,
    pub manifest: Manifest,
    pub tools: Vec<ToolConfig>,
    pub prompts: Vec<PromptConfig>,
    pub resources: Vec<ResourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub base_path: String,
    pub transport: TransportKind,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            base_path: String::new(),
            transport: TransportKind::default(),
        }
    }
}

impl ServerSettings {
    /// `host:port`, suitable for `TcpListener::bind`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base path with a leading slash and no trailing slash; empty stays empty.
    pub fn normalized_base_path(&self) -> String {
        let trimmed = self.base_path.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransportKind {
    #[serde(rename = "sse")]
    Sse,
    #[default]
    #[serde(rename = "streamable-http", alias = "StreamableHTTP", alias = "streamable_http")]
    StreamableHttp,
    #[serde(rename = "stdio")]
    Stdio,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportKind::Sse => "sse",
            TransportKind::StreamableHttp => "streamable-http",
            TransportKind::Stdio => "stdio",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Manifest {
    pub name: String,
    pub description: String,
    #[serde(deserialize_with = "scalar_string")]
    pub version: String,
}

/// Accepts `1.0` as well as `"1.0"`; YAML would otherwise read it as a float.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected a scalar value, found {:?}",
            other
        ))),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolConfig {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
    pub mock_template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub required: bool,
}

impl Default for ToolParameter {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: "string".to_owned(),
            description: String::new(),
            required: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PromptConfig {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgumentConfig>,
    pub mock_template: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PromptArgumentConfig {
    pub name: String,
    pub description: String,
    pub required: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResourceConfig {
    pub name: String,
    pub description: String,
    pub mime_type: String,
    pub uri: String,
    pub mock_content: String,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, McpError> {
        let path = path.as_ref();
        debug!("Reading config from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| McpError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, McpError> {
        // An empty document is a valid, empty configuration.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}
