use crate::types::{ErrorCode, JsonRpcError};
use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpError {
    // Transport Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Transport closed")]
    TransportClosed,
    #[error("HTTP error: {0}")]
    Http(String),

    // Protocol Errors
    #[error("JSON-RPC error: {0}")]
    JsonRpc(#[from] JsonRpcError),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Method not found: {0}")]
    MethodNotFound(String),
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    // Configuration Errors
    #[error("Failed to read config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse YAML config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    // Registration Errors
    #[error("Invalid declaration: {0}")]
    InvalidDeclaration(String),
    #[error("Failed to register {kind} {name}: {source}")]
    Registration {
        kind: &'static str,
        name: String,
        #[source]
        source: Box<McpError>,
    },

    // Server errors
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Unknown prompt: {0}")]
    UnknownPrompt(String),
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    // Other Errors
    #[error("{0}")]
    Other(String),
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

impl StdError for JsonRpcError {}

impl McpError {
    /// Wraps a declaration failure with the kind and name of the config entry.
    pub fn registration(kind: &'static str, name: impl Into<String>, source: McpError) -> Self {
        McpError::Registration {
            kind,
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// JSON-RPC error code reported to the caller when a request fails.
    pub fn code(&self) -> i32 {
        match self {
            McpError::JsonRpc(e) => e.code,
            McpError::MethodNotFound(_) => ErrorCode::MethodNotFound.code(),
            McpError::InvalidMessage(_) => ErrorCode::ParseError.code(),
            McpError::SerializationError(_)
            | McpError::UnknownTool(_)
            | McpError::UnknownPrompt(_)
            | McpError::UnknownResource(_) => ErrorCode::InvalidParams.code(),
            _ => ErrorCode::InternalError.code(),
        }
    }

    pub fn to_json_rpc(&self) -> JsonRpcError {
        match self {
            McpError::JsonRpc(e) => e.clone(),
            other => JsonRpcError::new(other.code(), other.to_string()),
        }
    }
}
