use crate::server::McpServer;
use crate::types::{JsonRpcMessage, JsonRpcResponse, McpError, RequestId};
use tracing::{debug, info, warn};

/// Server-side transport trait for streams that carry one message per read.
pub trait ServerTransport: Send + Sync {
    /// Returns `McpError::TransportClosed` once the peer has gone away.
    fn read_message(&mut self) -> Result<String, McpError>;
    fn write_message(&mut self, message: &JsonRpcMessage) -> Result<(), McpError>;
    fn close(&mut self) -> Result<(), McpError>;
}

/// Pump messages between `transport` and `server` until the transport closes.
pub fn serve(server: &McpServer, transport: &mut impl ServerTransport) -> Result<(), McpError> {
    let result = loop {
        let raw = match transport.read_message() {
            Ok(raw) => raw,
            Err(McpError::TransportClosed) => {
                info!("Transport closed, shutting down");
                break Ok(());
            }
            Err(e @ McpError::InvalidMessage(_)) => {
                warn!("Unreadable message: {}", e);
                let reply = JsonRpcMessage::Response(JsonRpcResponse::failure(
                    RequestId::Null,
                    e.to_json_rpc(),
                ));
                if let Err(e) = transport.write_message(&reply) {
                    break Err(e);
                }
                continue;
            }
            Err(e) => {
                warn!("Transport error: {}", e);
                break Err(e);
            }
        };

        if raw.trim().is_empty() {
            continue;
        }

        if let Some(reply) = server.handle_json(&raw) {
            debug!("Sending reply: {:?}", reply);
            if let Err(e) = transport.write_message(&reply) {
                break Err(e);
            }
        }
    };

    transport.close()?;
    result
}

pub mod http;
mod sse;
mod stdio;
mod streamable;

pub use sse::SseTransport;
pub use stdio::StdioServerTransport;
pub use streamable::StreamableHttpTransport;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;

    /// Feeds canned lines and records everything written back.
    struct ScriptedTransport {
        incoming: VecDeque<Result<String, McpError>>,
        outgoing: Vec<JsonRpcMessage>,
        closed: bool,
    }

    impl ScriptedTransport {
        fn new(lines: &[&str]) -> Self {
            Self {
                incoming: lines.iter().map(|l| Ok(l.to_string())).collect(),
                outgoing: Vec::new(),
                closed: false,
            }
        }
    }

    impl ServerTransport for ScriptedTransport {
        fn read_message(&mut self) -> Result<String, McpError> {
            self.incoming.pop_front().unwrap_or(Err(McpError::TransportClosed))
        }

        fn write_message(&mut self, message: &JsonRpcMessage) -> Result<(), McpError> {
            self.outgoing.push(message.clone());
            Ok(())
        }

        fn close(&mut self) -> Result<(), McpError> {
            self.closed = true;
            Ok(())
        }
    }

    #[test]
    fn test_serve_until_closed() {
        let server = McpServer::new("scripted", "1.0.0");
        let mut transport = ScriptedTransport::new(&[
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
        ]);

        serve(&server, &mut transport).unwrap();

        assert!(transport.closed);
        assert_eq!(
            transport.outgoing,
            vec![
                JsonRpcMessage::Response(JsonRpcResponse::success(RequestId::Number(1), json!({}))),
                JsonRpcMessage::Response(JsonRpcResponse::success(
                    RequestId::Number(2),
                    json!({"tools": []})
                )),
            ]
        );
    }

    #[test]
    fn test_unreadable_line_gets_parse_error_and_serving_continues() {
        let server = McpServer::new("scripted", "1.0.0");
        let mut transport = ScriptedTransport::new(&[]);
        transport.incoming = VecDeque::from([
            Err(McpError::InvalidMessage("line is not valid UTF-8".into())),
            Ok(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#.to_string()),
        ]);

        serve(&server, &mut transport).unwrap();

        assert_eq!(transport.outgoing.len(), 2);
        match &transport.outgoing[0] {
            JsonRpcMessage::Response(response) => {
                assert_eq!(response.id, RequestId::Null);
                assert_eq!(response.error.as_ref().map(|e| e.code), Some(-32700));
            }
            other => panic!("Expected error response, got {:?}", other),
        }
        assert_eq!(
            transport.outgoing[1],
            JsonRpcMessage::Response(JsonRpcResponse::success(RequestId::Number(1), json!({})))
        );
    }

    #[test]
    fn test_io_error_ends_serving() {
        let server = McpServer::new("scripted", "1.0.0");
        let mut transport = ScriptedTransport::new(&[]);
        transport.incoming = VecDeque::from([Err(McpError::Http("boom".into()))]);

        assert!(serve(&server, &mut transport).is_err());
        assert!(transport.closed);
    }
}
