//! Minimal blocking HTTP/1.1 used by the `sse` and `streamable-http` transports.
//!
//! One request per connection, `Content-Length` bodies only (chunked uploads
//! are rejected). Headers are capped at 32 KiB and bodies at 1 MiB.

use crate::types::McpError;
use std::collections::HashMap;
use std::io::{self, BufRead, Read, Write};

const MAX_HEADER_SIZE: usize = 32 * 1024;
const MAX_BODY_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn json(status: u16, body: String) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: body.into_bytes(),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".into(), "text/plain; charset=utf-8".into())],
            body: body.into().into_bytes(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        202 => "Accepted",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// Read one request. `Ok(None)` means the peer closed before sending anything.
pub fn read_request(reader: &mut impl BufRead) -> Result<Option<HttpRequest>, McpError> {
    let mut head = Vec::with_capacity(1024);
    loop {
        // Never buffer more than one byte past the cap, newline or not.
        let remaining = (MAX_HEADER_SIZE + 1).saturating_sub(head.len()) as u64;
        let read = reader.by_ref().take(remaining).read_until(b'\n', &mut head)?;
        if read == 0 {
            if head.is_empty() {
                return Ok(None);
            }
            return Err(McpError::Http("connection closed mid-request".into()));
        }
        if head.len() > MAX_HEADER_SIZE {
            return Err(McpError::Http("headers too large".into()));
        }
        if head.ends_with(b"\r\n\r\n") || head.ends_with(b"\n\n") {
            break;
        }
    }

    let mut parsed_headers = [httparse::EMPTY_HEADER; 64];
    let mut parsed = httparse::Request::new(&mut parsed_headers);
    match parsed.parse(&head) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) => {
            return Err(McpError::Http("incomplete request head".into()));
        }
        Err(e) => return Err(McpError::Http(format!("malformed request: {}", e))),
    }

    let method = parsed.method.unwrap_or_default().to_string();
    let (path, query) = split_target(parsed.path.unwrap_or("/"));
    let headers: Vec<(String, String)> = parsed
        .headers
        .iter()
        .map(|h| {
            (
                h.name.to_string(),
                String::from_utf8_lossy(h.value).trim().to_string(),
            )
        })
        .collect();

    let mut request = HttpRequest {
        method,
        path,
        query,
        headers,
        body: Vec::new(),
    };

    if request
        .header("Transfer-Encoding")
        .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"))
    {
        return Err(McpError::Http("chunked transfer encoding not supported".into()));
    }

    let content_length = match request.header("Content-Length") {
        Some(raw) => Some(
            raw.parse::<usize>()
                .map_err(|_| McpError::Http(format!("invalid Content-Length: {}", raw)))?,
        ),
        None => None,
    };

    match content_length {
        Some(len) if len > MAX_BODY_SIZE => {
            return Err(McpError::Http("request body too large".into()));
        }
        Some(len) => {
            let mut body = Vec::with_capacity(len);
            reader.take(len as u64).read_to_end(&mut body)?;
            if body.len() < len {
                return Err(McpError::Http("connection closed mid-body".into()));
            }
            request.body = body;
        }
        None if request.method == "POST" => {
            return Err(McpError::Http("POST requires Content-Length".into()));
        }
        None => {}
    }

    Ok(Some(request))
}

fn split_target(target: &str) -> (String, HashMap<String, String>) {
    match target.split_once('?') {
        Some((path, query)) => (
            path.to_string(),
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        ),
        None => (target.to_string(), HashMap::new()),
    }
}

/// Write a complete response and mark the connection for closing.
pub fn write_response(stream: &mut impl Write, response: &HttpResponse) -> io::Result<()> {
    let mut head = format!("HTTP/1.1 {} {}\r\n", response.status, reason(response.status));
    head.push_str(&format!("Content-Length: {}\r\n", response.body.len()));
    head.push_str("Connection: close\r\n");
    for (name, value) in &response.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("\r\n");

    stream.write_all(head.as_bytes())?;
    stream.write_all(&response.body)?;
    stream.flush()
}

/// Start an open-ended `text/event-stream` response.
pub fn write_event_stream_head(stream: &mut impl Write) -> io::Result<()> {
    stream.write_all(
        b"HTTP/1.1 200 OK\r\n\
          Content-Type: text/event-stream\r\n\
          Cache-Control: no-cache\r\n\
          Connection: keep-alive\r\n\r\n",
    )?;
    stream.flush()
}

/// Write one server-sent event. Multi-line data is split across `data:` lines.
pub fn write_event(stream: &mut impl Write, event: &str, data: &str) -> io::Result<()> {
    let mut frame = format!("event: {}\n", event);
    for line in data.lines() {
        frame.push_str("data: ");
        frame.push_str(line);
        frame.push('\n');
    }
    frame.push('\n');
    stream.write_all(frame.as_bytes())?;
    stream.flush()
}
