use crate::server::McpServer;
use crate::types::{
    CallTool, CallToolRequest, CallToolResponse, EmptyResult, GetPrompt, GetPromptRequest,
    GetPromptResponse, Implementation, Initialize, InitializeRequest, InitializeResponse,
    ListPrompts, ListPromptsRequest, ListPromptsResponse, ListResourceTemplates,
    ListResourceTemplatesRequest, ListResourceTemplatesResponse, ListResources,
    ListResourcesRequest, ListResourcesResponse, ListTools, ListToolsRequest, ListToolsResponse,
    McpCommand, McpError, Ping, Prompt, PromptCapabilities, ReadResource, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceCapabilities, ServerCapabilities, Subscribe,
    SubscribeRequest, ToolCapabilities, ToolDefinition, Unsubscribe, UnsubscribeRequest,
    LATEST_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS,
};
use tracing::{debug, info};

/// Command handler trait
pub trait CommandHandler<CMD: McpCommand>: Send + Sync {
    fn handle(&self, request: CMD::Request, server: &McpServer)
        -> Result<CMD::Response, McpError>;
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

/// Default handlers
pub struct DefaultInitializeHandler;
impl CommandHandler<Initialize> for DefaultInitializeHandler {
    fn handle(
        &self,
        request: InitializeRequest,
        server: &McpServer,
    ) -> Result<InitializeResponse, McpError> {
        // Echo the client's revision when we speak it, otherwise offer ours.
        let protocol_version = if SUPPORTED_PROTOCOL_VERSIONS.contains(&request.protocol_version.as_str()) {
            request.protocol_version
        } else {
            LATEST_PROTOCOL_VERSION.to_string()
        };
        info!(
            "Client `{}` {} initialized with protocol {}",
            request.client_info.name, request.client_info.version, protocol_version
        );

        Ok(InitializeResponse {
            protocol_version,
            capabilities: ServerCapabilities {
                tools: Some(ToolCapabilities {
                    list_changed: Some(true),
                }),
                prompts: Some(PromptCapabilities {
                    list_changed: Some(false),
                }),
                resources: Some(ResourceCapabilities {
                    subscribe: Some(true),
                    list_changed: Some(true),
                }),
                ..Default::default()
            },
            server_info: Implementation {
                name: server.info().name.clone(),
                version: server.info().version.clone(),
            },
            instructions: server.instructions().map(str::to_string),
        })
    }
}

pub struct DefaultPingHandler;
impl CommandHandler<Ping> for DefaultPingHandler {
    fn handle(&self, _request: EmptyResult, _server: &McpServer) -> Result<EmptyResult, McpError> {
        Ok(EmptyResult::default())
    }
}

pub struct DefaultListToolsHandler;
impl CommandHandler<ListTools> for DefaultListToolsHandler {
    fn handle(
        &self,
        _request: ListToolsRequest,
        server: &McpServer,
    ) -> Result<ListToolsResponse, McpError> {
        let tools = server
            .tools()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: non_empty(tool.description()),
                input_schema: tool.schema(),
            })
            .collect();

        Ok(ListToolsResponse {
            tools,
            next_cursor: None,
            meta: None,
        })
    }
}

pub struct DefaultCallToolHandler;
impl CommandHandler<CallTool> for DefaultCallToolHandler {
    fn handle(
        &self,
        request: CallToolRequest,
        server: &McpServer,
    ) -> Result<CallToolResponse, McpError> {
        let tool = server
            .tool(&request.name)
            .ok_or_else(|| McpError::UnknownTool(request.name.clone()))?;

        debug!("Calling tool {}", request.name);
        tool.execute(request.arguments.as_ref())
    }
}

pub struct DefaultListPromptsHandler;
impl CommandHandler<ListPrompts> for DefaultListPromptsHandler {
    fn handle(
        &self,
        _request: ListPromptsRequest,
        server: &McpServer,
    ) -> Result<ListPromptsResponse, McpError> {
        let prompts = server
            .prompts()
            .map(|prompt| {
                let arguments = prompt.arguments();
                Prompt {
                    name: prompt.name().to_string(),
                    description: non_empty(prompt.description()),
                    arguments: (!arguments.is_empty()).then_some(arguments),
                }
            })
            .collect();

        Ok(ListPromptsResponse {
            prompts,
            next_cursor: None,
            meta: None,
        })
    }
}

pub struct DefaultGetPromptHandler;
impl CommandHandler<GetPrompt> for DefaultGetPromptHandler {
    fn handle(
        &self,
        request: GetPromptRequest,
        server: &McpServer,
    ) -> Result<GetPromptResponse, McpError> {
        let prompt = server
            .prompt(&request.name)
            .ok_or_else(|| McpError::UnknownPrompt(request.name.clone()))?;

        debug!("Getting prompt {}", request.name);
        prompt.get(request.arguments.as_ref())
    }
}

pub struct DefaultListResourcesHandler;
impl CommandHandler<ListResources> for DefaultListResourcesHandler {
    fn handle(
        &self,
        _request: ListResourcesRequest,
        server: &McpServer,
    ) -> Result<ListResourcesResponse, McpError> {
        let resources = server
            .resources()
            .map(|resource| Resource {
                uri: resource.uri().to_string(),
                name: resource.name().to_string(),
                description: non_empty(resource.description()),
                mime_type: non_empty(resource.mime_type()),
            })
            .collect();

        Ok(ListResourcesResponse {
            resources,
            next_cursor: None,
            meta: None,
        })
    }
}

pub struct DefaultReadResourceHandler;
impl CommandHandler<ReadResource> for DefaultReadResourceHandler {
    fn handle(
        &self,
        request: ReadResourceRequest,
        server: &McpServer,
    ) -> Result<ReadResourceResponse, McpError> {
        let resource = server
            .resource(&request.uri)
            .ok_or_else(|| McpError::UnknownResource(request.uri.clone()))?;

        debug!("Reading resource {}", request.uri);
        resource.read(&request.uri)
    }
}

pub struct DefaultListResourceTemplatesHandler;
impl CommandHandler<ListResourceTemplates> for DefaultListResourceTemplatesHandler {
    fn handle(
        &self,
        _request: ListResourceTemplatesRequest,
        _server: &McpServer,
    ) -> Result<ListResourceTemplatesResponse, McpError> {
        // Mock resources are always concrete URIs.
        Ok(ListResourceTemplatesResponse {
            resource_templates: Vec::new(),
            next_cursor: None,
        })
    }
}

pub struct DefaultSubscribeHandler;
impl CommandHandler<Subscribe> for DefaultSubscribeHandler {
    fn handle(
        &self,
        request: SubscribeRequest,
        _server: &McpServer,
    ) -> Result<EmptyResult, McpError> {
        // Mock content never changes, so there is nothing to notify about.
        debug!("Subscribed to {}", request.uri);
        Ok(EmptyResult::default())
    }
}

pub struct DefaultUnsubscribeHandler;
impl CommandHandler<Unsubscribe> for DefaultUnsubscribeHandler {
    fn handle(
        &self,
        request: UnsubscribeRequest,
        _server: &McpServer,
    ) -> Result<EmptyResult, McpError> {
        debug!("Unsubscribed from {}", request.uri);
        Ok(EmptyResult::default())
    }
}
