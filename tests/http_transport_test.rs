use serde_json::{json, Value};
use sovran_mcp_mock::server::transport::{SseTransport, StreamableHttpTransport};
use sovran_mcp_mock::{Config, McpError, McpServer, MockRegistry};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const MOCK_YAML: &str = r#"
manifest:
  name: http-mock
  version: "0.1.0"
tools:
  - name: greet
    parameters:
      - name: name
        required: true
    mock_template: "Hello, {{name}}!"
"#;

fn mock_server() -> Result<Arc<McpServer>, McpError> {
    let config = Arc::new(Config::from_yaml(MOCK_YAML)?);
    let mut server = McpServer::new(&config.manifest.name, &config.manifest.version);
    MockRegistry::new(config).register_all(&mut server)?;
    Ok(Arc::new(server))
}

fn local_listener() -> Result<(TcpListener, SocketAddr), McpError> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    Ok((listener, addr))
}

/// Send one request and read until the server closes the connection.
fn exchange(addr: SocketAddr, method: &str, target: &str, body: &str) -> Result<String, McpError> {
    let mut stream = TcpStream::connect(addr)?;
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    write!(
        stream,
        "{} {} HTTP/1.1\r\nHost: {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        method,
        target,
        addr,
        body.len(),
        body
    )?;
    let mut response = String::new();
    stream.read_to_string(&mut response)?;
    Ok(response)
}

fn body_of(response: &str) -> Value {
    let (_, body) = response.split_once("\r\n\r\n").unwrap_or_default();
    serde_json::from_str(body).unwrap_or(Value::Null)
}

#[test]
fn test_streamable_http_round_trip() -> Result<(), McpError> {
    let (listener, addr) = local_listener()?;
    let transport = StreamableHttpTransport::new(mock_server()?, "/api");
    thread::spawn(move || transport.serve(listener));

    let init = exchange(
        addr,
        "POST",
        "/api/mcp",
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26","capabilities":{},"clientInfo":{"name":"t","version":"1"}}}"#,
    )?;
    assert!(init.starts_with("HTTP/1.1 200 OK\r\n"), "{}", init);
    assert!(init.contains("Mcp-Session-Id: "));
    assert_eq!(body_of(&init)["result"]["serverInfo"]["name"], "http-mock");

    let accepted = exchange(
        addr,
        "POST",
        "/api/mcp",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
    )?;
    assert!(accepted.starts_with("HTTP/1.1 202 Accepted\r\n"), "{}", accepted);

    let call = exchange(
        addr,
        "POST",
        "/api/mcp",
        &json!({
            "jsonrpc": "2.0",
            "id": "call-1",
            "method": "tools/call",
            "params": {"name": "greet", "arguments": {"name": "Ada"}}
        })
        .to_string(),
    )?;
    let reply = body_of(&call);
    assert_eq!(reply["id"], "call-1");
    assert_eq!(reply["result"]["content"][0]["text"], "Hello, Ada!");

    let missing = exchange(addr, "POST", "/elsewhere", "{}")?;
    assert!(missing.starts_with("HTTP/1.1 404 Not Found\r\n"));
    Ok(())
}

#[test]
fn test_sse_round_trip() -> Result<(), McpError> {
    let (listener, addr) = local_listener()?;
    let transport = SseTransport::new(mock_server()?, "");
    thread::spawn(move || transport.serve(listener));

    let mut events = TcpStream::connect(addr)?;
    events.set_read_timeout(Some(Duration::from_secs(5)))?;
    write!(events, "GET /sse HTTP/1.1\r\nHost: {}\r\n\r\n", addr)?;
    let mut events = BufReader::new(events);

    let mut endpoint = None;
    let mut line = String::new();
    while endpoint.is_none() {
        line.clear();
        if events.read_line(&mut line)? == 0 {
            break;
        }
        endpoint = line.strip_prefix("data: ").map(|e| e.trim().to_string());
    }
    let endpoint = endpoint.unwrap_or_default();
    assert!(endpoint.starts_with("/message?sessionId="), "{}", endpoint);

    let ack = exchange(
        addr,
        "POST",
        &endpoint,
        r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"greet","arguments":{"name":"Grace"}}}"#,
    )?;
    assert!(ack.starts_with("HTTP/1.1 202 Accepted\r\n"), "{}", ack);

    let mut pushed = None;
    while pushed.is_none() {
        line.clear();
        if events.read_line(&mut line)? == 0 {
            break;
        }
        if line.starts_with("event: message") {
            line.clear();
            events.read_line(&mut line)?;
            pushed = line.strip_prefix("data: ").map(|d| d.trim().to_string());
        }
    }
    let pushed: Value = serde_json::from_str(&pushed.unwrap_or_default())?;
    assert_eq!(pushed["id"], 7);
    assert_eq!(pushed["result"]["content"][0]["text"], "Hello, Grace!");

    let unknown = exchange(addr, "POST", "/message?sessionId=nope", "{}")?;
    assert!(unknown.starts_with("HTTP/1.1 404 Not Found\r\n"));
    Ok(())
}
