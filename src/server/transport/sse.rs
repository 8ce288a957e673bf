use crate::server::server::to_wire;
use crate::server::transport::http::{self, HttpRequest, HttpResponse};
use crate::server::McpServer;
use crate::types::McpError;
use std::collections::HashMap;
use std::io::{self, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

const KEEP_ALIVE: Duration = Duration::from_secs(15);

type Sessions = HashMap<String, Sender<String>>;

/// Legacy HTTP+SSE transport.
///
/// A client opens `GET {base}/sse` and is told where to post through an
/// `endpoint` event. Each `POST {base}/message?sessionId=..` is acknowledged
/// with `202 Accepted` and the JSON-RPC reply is pushed down the event stream.
pub struct SseTransport {
    server: Arc<McpServer>,
    sse_path: String,
    message_path: String,
    sessions: Mutex<Sessions>,
}

impl SseTransport {
    pub fn new(server: Arc<McpServer>, base_path: impl Into<String>) -> Self {
        let base_path = base_path.into();
        Self {
            server,
            sse_path: format!("{}/sse", base_path),
            message_path: format!("{}/message", base_path),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn sse_path(&self) -> &str {
        &self.sse_path
    }

    pub fn message_path(&self) -> &str {
        &self.message_path
    }

    /// Number of event streams currently open.
    pub fn session_count(&self) -> usize {
        self.sessions().len()
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

    fn sessions(&self) -> MutexGuard<'_, Sessions> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle_connection(&self, stream: TcpStream) {
        let mut reader = BufReader::new(&stream);
        let response = match http::read_request(&mut reader) {
            Ok(Some(request)) if request.method == "GET" && request.path == self.sse_path => {
                self.stream_events(&stream);
                return;
            }
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

    /// Handle everything except opening an event stream.
    pub fn route(&self, request: &HttpRequest) -> HttpResponse {
        if request.path == self.message_path {
            return match request.method.as_str() {
                "POST" => self.handle_post(request),
                _ => HttpResponse::text(405, "Method Not Allowed").with_header("Allow", "POST"),
            };
        }
        if request.path == self.sse_path {
            return HttpResponse::text(405, "Method Not Allowed").with_header("Allow", "GET");
        }
        HttpResponse::text(404, "Not Found")
    }

    fn handle_post(&self, request: &HttpRequest) -> HttpResponse {
        let Some(session_id) = request.query_param("sessionId") else {
            return HttpResponse::text(400, "Missing sessionId");
        };
        let Some(sender) = self.sessions().get(session_id).cloned() else {
            return HttpResponse::text(404, "Unknown session");
        };
        let Ok(raw) = std::str::from_utf8(&request.body) else {
            return HttpResponse::text(400, "Request body is not valid UTF-8");
        };

        if let Some(reply) = self.server.handle_json(raw) {
            let body = match to_wire(&reply) {
                Ok(body) => body,
                Err(e) => return HttpResponse::text(500, e.to_string()),
            };
            if sender.send(body).is_err() {
                return HttpResponse::text(404, "Unknown session");
            }
        }
        HttpResponse::empty(202)
    }

    /// Register a new session, returning its id and the receiving end of its queue.
    fn open_session(&self) -> (String, Receiver<String>) {
        let session_id = Uuid::new_v4().to_string();
        let (sender, receiver) = mpsc::channel();
        self.sessions().insert(session_id.clone(), sender);
        (session_id, receiver)
    }

    fn stream_events(&self, stream: &TcpStream) {
        let (session_id, receiver) = self.open_session();
        info!("Opened SSE session {}", session_id);

        if let Err(e) = self.pump(stream, &session_id, &receiver) {
            debug!("SSE session {} ended: {}", session_id, e);
        }

        self.sessions().remove(&session_id);
        info!("Closed SSE session {}", session_id);
    }

    fn pump(
        &self,
        mut stream: &TcpStream,
        session_id: &str,
        receiver: &Receiver<String>,
    ) -> io::Result<()> {
        http::write_event_stream_head(&mut stream)?;
        let endpoint = format!("{}?sessionId={}", self.message_path, session_id);
        http::write_event(&mut stream, "endpoint", &endpoint)?;

        loop {
            match receiver.recv_timeout(KEEP_ALIVE) {
                Ok(message) => http::write_event(&mut stream, "message", &message)?,
                Err(RecvTimeoutError::Timeout) => {
                    stream.write_all(b": ping\n\n")?;
                    stream.flush()?;
                }
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }
    }
}
