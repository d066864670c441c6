use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Network failure or timeout.
    Transport(String),
    /// The session could not be refreshed; the user must log in again.
    SessionExpired,
    /// Non-2xx answer from the backend.
    Api { status: u16, message: String },
    /// A 2xx body that did not decode.
    Decode(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(msg) => write!(f, "transport error: {msg}"),
            ClientError::SessionExpired => {
                write!(f, "session expired: log in again to obtain new tokens")
            }
            ClientError::Api { status, message } => {
                write!(f, "api error status={status}: {message}")
            }
            ClientError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

/// Turn a validation body such as `{"cantidad": ["must be > 0"]}` into
/// `"Cantidad: must be > 0"`, one line per message. Non-JSON bodies are
/// returned trimmed.
pub fn flatten_error_body(body: &str) -> String {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };

    let mut lines = Vec::new();
    for (field, v) in &map {
        let field = capitalize(field);
        match v {
            Value::Array(msgs) => {
                for m in msgs {
                    lines.push(format!("{field}: {}", plain(m)));
                }
            }
            other => lines.push(format!("{field}: {}", plain(other))),
        }
    }
    lines.join("\n")
}

fn plain(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
