//! Turns the declarative [`Config`] into registered tools, prompts and
//! resources.

mod mock;

pub use mock::{MockPrompt, MockResource, MockTool};

use crate::config::Config;
use crate::server::{McpPrompt, McpResource, McpTool};
use crate::types::McpError;
use std::sync::Arc;
use tracing::info;

/// Anything that can accept handler objects. [`crate::McpServer`] is the
/// production implementation.
pub trait Registrar {
    fn register_tool(&mut self, tool: Box<dyn McpTool>) -> Result<(), McpError>;
    fn register_prompt(&mut self, prompt: Box<dyn McpPrompt>) -> Result<(), McpError>;
    fn register_resource(&mut self, resource: Box<dyn McpResource>) -> Result<(), McpError>;
}

/// Registers one mock handler per config entry.
///
/// Each pass stops at the first entry that fails; entries registered before
/// the failure stay registered.
pub struct MockRegistry {
    config: Arc<Config>,
}

impl MockRegistry {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    pub fn register_tools(&self, registrar: &mut impl Registrar) -> Result<(), McpError> {
        for tool in &self.config.tools {
            MockTool::new(tool)
                .and_then(|handler| registrar.register_tool(Box::new(handler)))
                .map_err(|e| McpError::registration("tool", &tool.name, e))?;
            info!("Registered tool: {}", tool.name);
        }
        Ok(())
    }

    pub fn register_prompts(&self, registrar: &mut impl Registrar) -> Result<(), McpError> {
        for prompt in &self.config.prompts {
            MockPrompt::new(prompt)
                .and_then(|handler| registrar.register_prompt(Box::new(handler)))
                .map_err(|e| McpError::registration("prompt", &prompt.name, e))?;
            info!("Registered prompt: {}", prompt.name);
        }
        Ok(())
    }

    pub fn register_resources(&self, registrar: &mut impl Registrar) -> Result<(), McpError> {
        for resource in &self.config.resources {
            MockResource::new(resource)
                .and_then(|handler| registrar.register_resource(Box::new(handler)))
                .map_err(|e| McpError::registration("resource", &resource.name, e))?;
            info!("Registered resource: {}", resource.name);
        }
        Ok(())
    }

    /// Tools, then prompts, then resources.
    pub fn register_all(&self, registrar: &mut impl Registrar) -> Result<(), McpError> {
        self.register_tools(registrar)?;
        self.register_prompts(registrar)?;
        self.register_resources(registrar)
    }
}
