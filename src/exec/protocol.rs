//! Wire protocol for the Cyclops exec endpoint.
//!
//! The backend relays a container PTY over a WebSocket. Every frame we send
//! is a JSON object `{"command": "..."}`. Frames we receive are either JSON
//! objects carrying an `output` field or plain text to print as-is.

use std::fmt;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// The pod container a session attaches to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecTarget {
    /// Kubernetes namespace.
    pub namespace: String,
    /// Pod name.
    pub pod: String,
    /// Container name inside the pod.
    pub container: String,
}

impl ExecTarget {
    /// Build a target, rejecting empty parts and parts containing `/`.
    pub fn new(
        namespace: impl Into<String>,
        pod: impl Into<String>,
        container: impl Into<String>,
    ) -> Result<Self> {
        let target = Self {
            namespace: namespace.into(),
            pod: pod.into(),
            container: container.into(),
        };
        target.validate()?;
        Ok(target)
    }

    /// Check every path part is usable as a single URL segment.
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("namespace", &self.namespace),
            ("pod", &self.pod),
            ("container", &self.container),
        ] {
            if value.trim().is_empty() {
                bail!("{} must not be empty", label);
            }
            if value.contains('/') {
                bail!("{} must not contain '/': {}", label, value);
            }
        }
        Ok(())
    }

    /// Resolve the full WebSocket endpoint against a backend base URL.
    ///
    /// Any path already on the base (e.g. `/api`) is kept as a prefix.
    pub fn endpoint(&self, base: &Url) -> Result<Url> {
        self.validate()?;

        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("Backend URL cannot be a base: {}", base))?
            .pop_if_empty()
            .extend([
                "exec",
                self.namespace.as_str(),
                self.pod.as_str(),
                self.container.as_str(),
            ]);
        Ok(url)
    }
}

impl fmt::Display for ExecTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.pod, self.container)
    }
}

/// Parse a backend URL and map it onto a WebSocket scheme.
///
/// `http` becomes `ws` and `https` becomes `wss`, so the same address the
/// dashboard uses for REST calls can be passed straight through.
pub fn websocket_base(raw: &str) -> Result<Url> {
    let mut url =
        Url::parse(raw).with_context(|| format!("Invalid backend URL: {}", raw))?;

    let scheme = match url.scheme() {
        "ws" | "http" => "ws",
        "wss" | "https" => "wss",
        other => bail!("Unsupported backend URL scheme '{}': {}", other, raw),
    };

    if url.scheme() != scheme && url.set_scheme(scheme).is_err() {
        bail!("Failed to switch backend URL to {}: {}", scheme, raw);
    }

    Ok(url)
}

/// Command frame sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundCommand {
    /// A submitted line, a single control character, or an escape sequence.
    pub command: String,
}

impl OutboundCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Serialize to the JSON text frame the backend expects.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize exec command")
    }
}

/// A frame received from the exec endpoint, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    Binary(Vec<u8>),
}

#[derive(Deserialize)]
struct OutputPayload {
    output: String,
}

/// Decode an inbound frame into the text to render.
///
/// Text that is not JSON, or JSON that is not an object, is rendered as-is.
/// A JSON object without a string `output` field is a decode failure.
pub fn decode_output(frame: &InboundFrame) -> Result<String> {
    let text = match frame {
        InboundFrame::Text(text) => text,
        InboundFrame::Binary(bytes) => return Ok(String::from_utf8_lossy(bytes).into_owned()),
    };

    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => return Ok(text.clone()),
    };

    if !value.is_object() {
        return Ok(text.clone());
    }

    let payload: OutputPayload = serde_json::from_value(value)
        .context("Exec message has no string `output` field")?;
    Ok(payload.output)
}
