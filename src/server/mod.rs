pub mod handlers;
pub mod server;
pub mod transport;

pub use server::{McpPrompt, McpResource, McpServer, McpTool};
