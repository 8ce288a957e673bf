use crate::config::{ServerSettings, TransportKind};
use crate::registry::Registrar;
use crate::server::handlers::*;
use crate::server::transport::{self, SseTransport, StdioServerTransport, StreamableHttpTransport};
use crate::types::*;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::net::TcpListener;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Core tool interface
pub trait McpTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn schema(&self) -> Value;
    fn execute(&self, args: Option<&Value>) -> Result<CallToolResponse, McpError>;
}

/// Core prompt interface
pub trait McpPrompt: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn arguments(&self) -> Vec<PromptArgument>;
    fn get(
        &self,
        arguments: Option<&HashMap<String, String>>,
    ) -> Result<GetPromptResponse, McpError>;
}

/// Core resource interface
pub trait McpResource: Send + Sync {
    fn uri(&self) -> &str;
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn mime_type(&self) -> &str;
    /// `uri` is the URI exactly as the client sent it, echoed back in the contents.
    fn read(&self, uri: &str) -> Result<ReadResourceResponse, McpError>;
}

/// The MCP Server implementation.
///
/// Entries are added through [`Registrar`] while the server is still owned;
/// once [`McpServer::start`] is called it is frozen behind an `Arc` and every
/// request is dispatched through `&self`.
pub struct McpServer {
    info: Implementation,
    instructions: Option<String>,
    tools: BTreeMap<String, Box<dyn McpTool>>,
    prompts: BTreeMap<String, Box<dyn McpPrompt>>,
    resources: BTreeMap<String, Box<dyn McpResource>>,
    handlers: HashMap<&'static str, HandlerFn>,
}

impl McpServer {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let mut server = Self {
            info: Implementation {
                name: name.into(),
                version: version.into(),
            },
            instructions: None,
            tools: BTreeMap::new(),
            prompts: BTreeMap::new(),
            resources: BTreeMap::new(),
            handlers: HashMap::new(),
        };

        // Set up default handlers
        server.set_handler::<Initialize, _>(DefaultInitializeHandler);
        server.set_handler::<Ping, _>(DefaultPingHandler);
        server.set_handler::<ListTools, _>(DefaultListToolsHandler);
        server.set_handler::<CallTool, _>(DefaultCallToolHandler);
        server.set_handler::<ListPrompts, _>(DefaultListPromptsHandler);
        server.set_handler::<GetPrompt, _>(DefaultGetPromptHandler);
        server.set_handler::<ListResources, _>(DefaultListResourcesHandler);
        server.set_handler::<ReadResource, _>(DefaultReadResourceHandler);
        server.set_handler::<ListResourceTemplates, _>(DefaultListResourceTemplatesHandler);
        server.set_handler::<Subscribe, _>(DefaultSubscribeHandler);
        server.set_handler::<Unsubscribe, _>(DefaultUnsubscribeHandler);

        server
    }

    /// Text sent back as `instructions` in the initialize result.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        let instructions = instructions.into();
        self.instructions = (!instructions.is_empty()).then_some(instructions);
        self
    }

    pub fn set_handler<CMD, H>(&mut self, handler: H)
    where
        CMD: McpCommand,
        H: CommandHandler<CMD> + 'static,
    {
        let handler_fn = HandlerFn::new(move |params, server| {
            let request: CMD::Request = serde_json::from_value(params)?;
            let response = handler.handle(request, server)?;
            Ok(serde_json::to_value(response)?)
        });

        self.handlers.insert(CMD::COMMAND, handler_fn);
    }

    pub fn info(&self) -> &Implementation {
        &self.info
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    pub fn tool(&self, name: &str) -> Option<&dyn McpTool> {
        self.tools.get(name).map(|tool| tool.as_ref())
    }

    pub fn tools(&self) -> impl Iterator<Item = &dyn McpTool> {
        self.tools.values().map(|tool| tool.as_ref())
    }

    pub fn prompt(&self, name: &str) -> Option<&dyn McpPrompt> {
        self.prompts.get(name).map(|prompt| prompt.as_ref())
    }

    pub fn prompts(&self) -> impl Iterator<Item = &dyn McpPrompt> {
        self.prompts.values().map(|prompt| prompt.as_ref())
    }

    /// Resources are keyed by their URI text; no normalisation is applied.
    pub fn resource(&self, uri: &str) -> Option<&dyn McpResource> {
        self.resources.get(uri).map(|resource| resource.as_ref())
    }

    pub fn resources(&self) -> impl Iterator<Item = &dyn McpResource> {
        self.resources.values().map(|resource| resource.as_ref())
    }

    /// Freeze the server and run the configured transport until it stops.
    pub fn start(self, settings: &ServerSettings) -> Result<(), McpError> {
        info!(
            "MCP Server `{}` started, version {}, transport {}",
            self.info.name, self.info.version, settings.transport
        );
        let server = Arc::new(self);
        let base_path = settings.normalized_base_path();

        match settings.transport {
            TransportKind::Stdio => transport::serve(&server, &mut StdioServerTransport::new()),
            TransportKind::StreamableHttp => {
                let listener = TcpListener::bind(settings.address())?;
                info!("Listening on http://{}{}/mcp", settings.address(), base_path);
                StreamableHttpTransport::new(server, base_path).serve(listener)
            }
            TransportKind::Sse => {
                let listener = TcpListener::bind(settings.address())?;
                info!("Listening on http://{}{}/sse", settings.address(), base_path);
                SseTransport::new(server, base_path).serve(listener)
            }
        }
    }

    /// Parse and dispatch one raw JSON-RPC message. Returns the message to
    /// send back, if any; unparsable input yields an error response.
    pub fn handle_json(&self, raw: &str) -> Option<JsonRpcMessage> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Unparsable message: {}", e);
                return Some(error_message(
                    RequestId::Null,
                    ErrorCode::ParseError,
                    format!("Parse error: {}", e),
                ));
            }
        };

        match serde_json::from_value::<JsonRpcMessage>(value.clone()) {
            Ok(message) => self.handle_message(message),
            Err(e) => {
                warn!("Invalid JSON-RPC message: {}", e);
                let id = value
                    .get("id")
                    .and_then(|id| serde_json::from_value(id.clone()).ok())
                    .unwrap_or_default();
                Some(error_message(
                    id,
                    ErrorCode::InvalidRequest,
                    format!("Invalid request: {}", e),
                ))
            }
        }
    }

    pub fn handle_message(&self, message: JsonRpcMessage) -> Option<JsonRpcMessage> {
        debug!("Received message: {:?}", message);
        match message {
            JsonRpcMessage::Request(request) => {
                Some(JsonRpcMessage::Response(self.handle_request(request)))
            }
            JsonRpcMessage::Notification(notification) => {
                self.handle_notification(notification);
                None
            }
            JsonRpcMessage::Response(response) => {
                warn!("Unexpected response from client, id {:?}", response.id);
                None
            }
        }
    }

    pub fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let result = match self.handlers.get(request.method.as_str()) {
            Some(handler) => handler.handle(request.params.unwrap_or(json!({})), self),
            None => Err(McpError::MethodNotFound(request.method.clone())),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(e) => {
                debug!("Request {} failed: {}", request.method, e);
                JsonRpcResponse::failure(request.id, e.to_json_rpc())
            }
        }
    }

    fn handle_notification(&self, notification: JsonRpcNotification) {
        debug!("Received notification: {}", notification.method);
    }
}

impl Registrar for McpServer {
    fn register_tool(&mut self, tool: Box<dyn McpTool>) -> Result<(), McpError> {
        if tool.name().trim().is_empty() {
            return Err(McpError::InvalidDeclaration("tool name must not be empty".into()));
        }
        if !tool.schema().is_object() {
            return Err(McpError::InvalidDeclaration(
                "tool input schema must be a JSON object".into(),
            ));
        }

        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!("Tool {} registered twice, keeping the latest", name);
        }
        Ok(())
    }

    fn register_prompt(&mut self, prompt: Box<dyn McpPrompt>) -> Result<(), McpError> {
        if prompt.name().trim().is_empty() {
            return Err(McpError::InvalidDeclaration("prompt name must not be empty".into()));
        }

        let name = prompt.name().to_string();
        if self.prompts.insert(name.clone(), prompt).is_some() {
            warn!("Prompt {} registered twice, keeping the latest", name);
        }
        Ok(())
    }

    fn register_resource(&mut self, resource: Box<dyn McpResource>) -> Result<(), McpError> {
        if resource.name().trim().is_empty() {
            return Err(McpError::InvalidDeclaration(
                "resource name must not be empty".into(),
            ));
        }
        if resource.uri().is_empty() {
            return Err(McpError::InvalidDeclaration("resource uri must not be empty".into()));
        }

        let uri = resource.uri().to_string();
        if self.resources.insert(uri.clone(), resource).is_some() {
            warn!("Resource {} registered twice, keeping the latest", uri);
        }
        Ok(())
    }
}

fn error_message(id: RequestId, code: ErrorCode, message: String) -> JsonRpcMessage {
    JsonRpcMessage::Response(JsonRpcResponse::failure(
        id,
        JsonRpcError::new(code.code(), message),
    ))
}

/// Serialize a message for the wire; these types always serialize.
pub(crate) fn to_wire<T: Serialize>(message: &T) -> Result<String, McpError> {
    Ok(serde_json::to_string(message)?)
}

// Handler function type for type-erased command handling
struct HandlerFn {
    handle_fn: Box<dyn Fn(Value, &McpServer) -> Result<Value, McpError> + Send + Sync>,
}

impl HandlerFn {
    fn new<F>(f: F) -> Self
    where
        F: Fn(Value, &McpServer) -> Result<Value, McpError> + Send + Sync + 'static,
    {
        Self {
            handle_fn: Box::new(f),
        }
    }

    fn handle(&self, params: Value, server: &McpServer) -> Result<Value, McpError> {
        (self.handle_fn)(params, server)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    impl McpTool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the input"
        }

        fn schema(&self) -> Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }

        fn execute(&self, args: Option<&Value>) -> Result<CallToolResponse, McpError> {
            let text = args
                .and_then(|a| a.get("text"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            Ok(CallToolResponse::text(text))
        }
    }

    struct BadSchemaTool;

    impl McpTool for BadSchemaTool {
        fn name(&self) -> &str {
            "bad"
        }

        fn description(&self) -> &str {
            ""
        }

        fn schema(&self) -> Value {
            json!("not a schema")
        }

        fn execute(&self, _args: Option<&Value>) -> Result<CallToolResponse, McpError> {
            Ok(CallToolResponse::text(""))
        }
    }

    fn server() -> McpServer {
        let mut server = McpServer::new("test-server", "0.0.1");
        server.register_tool(Box::new(EchoTool)).unwrap();
        server
    }

    fn response(message: Option<JsonRpcMessage>) -> JsonRpcResponse {
        match message {
            Some(JsonRpcMessage::Response(response)) => response,
            other => panic!("Expected response, got {:?}", other),
        }
    }

    #[test]
    fn test_call_tool() {
        let request = JsonRpcRequest::new(
            RequestId::Number(1),
            "tools/call",
            Some(json!({"name": "echo", "arguments": {"text": "hello"}})),
        );
        let response = server().handle_request(request);

        assert_eq!(response.id, RequestId::Number(1));
        assert_eq!(
            response.result,
            Some(json!({"content": [{"type": "text", "text": "hello"}]}))
        );
    }

    #[test]
    fn test_unknown_method() {
        let response = server().handle_request(JsonRpcRequest::new(RequestId::Number(2), "bogus/method", None));
        let error = response.error.unwrap();
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "Method not found: bogus/method");
    }

    #[test]
    fn test_unknown_tool() {
        let request = JsonRpcRequest::new(RequestId::from("x"), "tools/call", Some(json!({"name": "nope"})));
        let response = server().handle_request(request);
        assert_eq!(response.id, RequestId::String("x".into()));
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[test]
    fn test_bad_params() {
        let request = JsonRpcRequest::new(RequestId::Number(3), "tools/call", Some(json!({"arguments": {}})));
        let response = server().handle_request(request);
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[test]
    fn test_notification_gets_no_reply() {
        let reply = server().handle_message(JsonRpcMessage::Notification(
            JsonRpcNotification::initialized(),
        ));
        assert!(reply.is_none());
    }

    #[test]
    fn test_handle_json_parse_error() {
        let reply = response(server().handle_json("{not json"));
        assert_eq!(reply.id, RequestId::Null);
        assert_eq!(reply.error.unwrap().code, -32700);
    }

    #[test]
    fn test_handle_json_invalid_request_keeps_id() {
        let reply = response(server().handle_json(r#"{"id": 9, "method": 12}"#));
        assert_eq!(reply.id, RequestId::Number(9));
        assert_eq!(reply.error.unwrap().code, -32600);
    }

    #[test]
    fn test_handle_json_ping() {
        let reply = response(server().handle_json(r#"{"jsonrpc":"2.0","id":4,"method":"ping"}"#));
        assert_eq!(reply.result, Some(json!({})));
    }

    #[test]
    fn test_register_rejects_bad_declarations() {
        let mut server = McpServer::new("test-server", "0.0.1");
        let err = server.register_tool(Box::new(BadSchemaTool)).unwrap_err();
        assert!(matches!(err, McpError::InvalidDeclaration(_)));
        assert!(server.tool("bad").is_none());
    }

    #[test]
    fn test_instructions_skip_empty() {
        assert!(McpServer::new("a", "1").with_instructions("").instructions().is_none());
        assert_eq!(
            McpServer::new("a", "1").with_instructions("hi").instructions(),
            Some("hi")
        );
    }
}
