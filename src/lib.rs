// types is shared between the server and the registry
pub mod types;
pub use types::McpError;

pub mod config;
pub use config::Config;

pub mod template;
pub mod variables;

pub mod registry;
pub use registry::{MockRegistry, Registrar};

pub mod server;
pub use server::{McpPrompt, McpResource, McpServer, McpTool};
