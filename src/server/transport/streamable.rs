use crate::server::server::to_wire;
use crate::server::transport::http::{self, HttpRequest, HttpResponse};
use crate::server::McpServer;
use crate::types::{JsonRpcMessage, McpError};
use serde_json::Value;
use std::io::BufReader;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const SESSION_HEADER: &str = "Mcp-Session-Id";

/// Streamable HTTP: every JSON-RPC message is a `POST` to a single endpoint
/// and the reply comes back as the response body.
pub struct StreamableHttpTransport {
    server: Arc<McpServer>,
    endpoint: String,
}

impl StreamableHttpTransport {
    pub fn new(server: Arc<McpServer>, base_path: impl Into<String>) -> Self {
        Self {
            server,
            endpoint: format!("{}/mcp", base_path.into()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Accept connections forever, one thread per connection.
    pub fn serve(self, listener: TcpListener) -> Result<(), McpError> {
        let transport = Arc::new(self);
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let transport = Arc::clone(&transport);
                    thread::spawn(move || transport.handle_connection(stream));
                }
                Err(e) => warn!("Failed to accept connection: {}", e),
            }
        }
        Ok(())
    }

    fn handle_connection(&self, stream: TcpStream) {
        let mut reader = BufReader::new(&stream);
        let response = match http::read_request(&mut reader) {
            Ok(Some(request)) => self.route(&request),
            Ok(None) => return,
            Err(e) => {
                debug!("Rejected request: {}", e);
                HttpResponse::text(400, e.to_string())
            }
        };

        if let Err(e) = http::write_response(&mut &stream, &response) {
            debug!("Client went away before the response was written: {}", e);
        }
    }

    pub fn route(&self, request: &HttpRequest) -> HttpResponse {
        if request.path != self.endpoint {
            return HttpResponse::text(404, "Not Found");
        }

        match request.method.as_str() {
            "POST" => self.handle_post(request),
            "DELETE" => {
                if let Some(session) = request.header(SESSION_HEADER) {
                    info!("Session {} closed by client", session);
                }
                HttpResponse::empty(200)
            }
            _ => HttpResponse::text(405, "Method Not Allowed").with_header("Allow", "POST, DELETE"),
        }
    }

    fn handle_post(&self, request: &HttpRequest) -> HttpResponse {
        let Ok(raw) = std::str::from_utf8(&request.body) else {
            return HttpResponse::text(400, "Request body is not valid UTF-8");
        };

        let Some(reply) = self.server.handle_json(raw) else {
            return HttpResponse::empty(202);
        };

        let body = match to_wire(&reply) {
            Ok(body) => body,
            Err(e) => return HttpResponse::text(500, e.to_string()),
        };
        let response = HttpResponse::json(200, body);

        if is_initialize(raw) && !is_error(&reply) {
            let session = Uuid::new_v4().to_string();
            info!("Started session {}", session);
            return response.with_header(SESSION_HEADER, session);
        }
        response
    }
}

fn is_initialize(raw: &str) -> bool {
    serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|v| v.get("method").and_then(Value::as_str).map(|m| m == "initialize"))
        .unwrap_or(false)
}

fn is_error(reply: &JsonRpcMessage) -> bool {
    matches!(reply, JsonRpcMessage::Response(response) if response.is_error())
}
