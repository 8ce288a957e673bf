use crate::server::transport::ServerTransport;
use crate::types::{JsonRpcMessage, McpError};
use std::io::{self, BufRead, Write};

/// Newline-delimited JSON-RPC on stdin/stdout.
pub struct StdioServerTransport;

impl StdioServerTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StdioServerTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Read one line. A line that is not UTF-8 is consumed and reported as
/// `InvalidMessage` so the caller can keep reading.
fn read_line(reader: &mut impl BufRead) -> Result<String, McpError> {
    let mut line = Vec::new();
    if reader.read_until(b'\n', &mut line)? == 0 {
        return Err(McpError::TransportClosed);
    }
    String::from_utf8(line)
        .map_err(|e| McpError::InvalidMessage(format!("line is not valid UTF-8: {}", e)))
}

impl ServerTransport for StdioServerTransport {
    fn read_message(&mut self) -> Result<String, McpError> {
        read_line(&mut io::stdin().lock())
    }

    fn write_message(&mut self, message: &JsonRpcMessage) -> Result<(), McpError> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        serde_json::to_writer(&mut handle, message)?;
        writeln!(handle)?;
        handle.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), McpError> {
        // do nothing
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_bad_utf8_line_does_not_end_the_stream() {
        let mut input = Cursor::new(b"\xff\xfe\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n".to_vec());

        assert!(matches!(read_line(&mut input), Err(McpError::InvalidMessage(_))));
        assert_eq!(
            read_line(&mut input).unwrap(),
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n"
        );
        assert!(matches!(read_line(&mut input), Err(McpError::TransportClosed)));
    }
}
