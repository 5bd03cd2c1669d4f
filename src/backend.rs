//! Opaque backend passthroughs.
//!
//! Two console prefixes bypass the verb machinery entirely: `bun ` tooling
//! commands and `proxy_call ` raw HTTP relays. The router forwards them
//! verbatim; the engine's only involvement is classifying the returned stream
//! entries for console styling.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::console::EntryKind;

/// Network-level failure of a passthrough or fallback request.
#[derive(Debug, Clone)]
pub struct TransportError(pub String);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TransportError {}

/// One NDJSON entry from a passthrough stream. The payload may be a string or
/// a structured value depending on the remote endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamData {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Value,
}

impl StreamData {
    /// The payload as console text: strings pass through, anything else is
    /// rendered as JSON.
    pub fn payload_text(&self) -> String {
        match &self.payload {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Map a stream entry's type tag onto a console entry kind.
pub fn entry_kind_for(kind: &str) -> EntryKind {
    match kind {
        "stderr" | "error" => EntryKind::Error,
        "exit" | "system" => EntryKind::System,
        _ => EntryKind::Output,
    }
}

/// The tooling/relay boundary. Implementations own transport and workspace
/// context; the engine never inspects the forwarded text.
pub trait Backend {
    /// Run a tool command (the `bun ` family) and stream its output.
    fn run_tool(
        &mut self,
        command: &str,
        on_data: &mut dyn FnMut(StreamData),
    ) -> Result<(), TransportError>;

    /// Relay a JSON payload to an arbitrary URL and stream the response.
    fn relay(
        &mut self,
        url: &str,
        payload: Value,
        on_data: &mut dyn FnMut(StreamData),
    ) -> Result<(), TransportError>;
}

/// Backend used when no server is configured. Every request fails the way a
/// dead connection would.
pub struct NullBackend;

impl Backend for NullBackend {
    fn run_tool(
        &mut self,
        _command: &str,
        _on_data: &mut dyn FnMut(StreamData),
    ) -> Result<(), TransportError> {
        Err(TransportError(
            "Could not connect to the backend server. Is it running?".to_string(),
        ))
    }

    fn relay(
        &mut self,
        _url: &str,
        _payload: Value,
        _on_data: &mut dyn FnMut(StreamData),
    ) -> Result<(), TransportError> {
        Err(TransportError(
            "Could not connect to the backend server. Is it running?".to_string(),
        ))
    }
}
