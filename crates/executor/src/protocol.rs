//! Wire protocol between agents and the executor worker.
//!
//! A frame is a JSON document, base64-encoded (standard alphabet, padded),
//! followed by `\n`. Each connection carries exactly one request frame and
//! one response frame.
//!
//! Request: `{"id": "...", "command": "ping|list_tools|execute", "tool_name": "...", "tool_args": {...}}`
//!
//! Response: `{"status": "success|error", "message": <any JSON>}`

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use baton_core::tool::ToolArgs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Upper bound on a single encoded frame, newline excluded.
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Empty frame")]
    Empty,

    #[error("Frame exceeds {MAX_FRAME_BYTES} bytes")]
    TooLarge,

    #[error("Invalid base64 frame: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Requested operation. Anything unrecognized (or absent) is `Unknown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Ping,
    ListTools,
    Execute,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorRequest {
    /// Correlation id. The server overwrites it with its own per-connection id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub command: Command,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_args: Option<ToolArgs>,
}

impl ExecutorRequest {
    pub fn new(command: Command) -> Self {
        Self {
            id: None,
            command,
            tool_name: None,
            tool_args: None,
        }
    }

    pub fn ping() -> Self {
        Self::new(Command::Ping)
    }

    pub fn list_tools() -> Self {
        Self::new(Command::ListTools)
    }

    pub fn execute(tool_name: impl Into<String>, tool_args: ToolArgs) -> Self {
        Self {
            tool_name: Some(tool_name.into()),
            tool_args: Some(tool_args),
            ..Self::new(Command::Execute)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorResponse {
    pub status: Status,
    #[serde(default)]
    pub message: Value,
}

impl ExecutorResponse {
    pub fn success(message: impl Into<Value>) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Value::String(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// The payload on success, the error text otherwise.
    pub fn into_result(self) -> Result<Value, String> {
        match self.status {
            Status::Success => Ok(self.message),
            Status::Error => Err(match self.message {
                Value::String(s) => s,
                other => other.to_string(),
            }),
        }
    }
}

/// Encode a message as a complete frame, trailing newline included.
pub fn encode_frame<T: Serialize>(message: &T) -> Result<Vec<u8>, FrameError> {
    let json = serde_json::to_vec(message)?;
    let mut frame = BASE64.encode(json).into_bytes();
    frame.push(b'\n');
    Ok(frame)
}

/// Decode one frame. Surrounding whitespace (the newline) is ignored.
pub fn decode_frame<T: DeserializeOwned>(frame: &[u8]) -> Result<T, FrameError> {
    let trimmed = frame.trim_ascii();
    if trimmed.is_empty() {
        return Err(FrameError::Empty);
    }
    if trimmed.len() > MAX_FRAME_BYTES {
        return Err(FrameError::TooLarge);
    }
    let json = BASE64.decode(trimmed)?;
    Ok(serde_json::from_slice(&json)?)
}

/// Read bytes up to and including the first newline, or to EOF.
///
/// Reads at most `MAX_FRAME_BYTES + 2` bytes so an oversized frame is
/// detected by [`decode_frame`] without buffering the whole stream.
pub async fn read_frame<R>(reader: &mut R) -> std::io::Result<Vec<u8>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut limited = reader.take(MAX_FRAME_BYTES as u64 + 2);
    limited.read_until(b'\n', &mut buf).await?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_wire_shape() {
        let args = json!({"a": 3, "b": 5}).as_object().cloned().unwrap();
        let value = serde_json::to_value(ExecutorRequest::execute("core_sum", args)).unwrap();
        assert_eq!(
            value,
            json!({"command": "execute", "tool_name": "core_sum", "tool_args": {"a": 3, "b": 5}})
        );
        assert_eq!(
            serde_json::to_value(ExecutorRequest::list_tools()).unwrap(),
            json!({"command": "list_tools"})
        );
    }

    #[test]
    fn unknown_or_missing_command_parses_as_unknown() {
        let req: ExecutorRequest = serde_json::from_value(json!({"command": "reboot"})).unwrap();
        assert_eq!(req.command, Command::Unknown);

        let req: ExecutorRequest = serde_json::from_value(json!({"id": "x"})).unwrap();
        assert_eq!(req.command, Command::Unknown);
        assert_eq!(req.id.as_deref(), Some("x"));
    }

    #[test]
    fn response_wire_shape() {
        let value = serde_json::to_value(ExecutorResponse::success("pong")).unwrap();
        assert_eq!(value, json!({"status": "success", "message": "pong"}));

        let value = serde_json::to_value(ExecutorResponse::error("nope")).unwrap();
        assert_eq!(value, json!({"status": "error", "message": "nope"}));
    }

    #[test]
    fn frame_is_base64_json_line() {
        let frame = encode_frame(&ExecutorResponse::success("pong")).unwrap();
        assert_eq!(frame.last(), Some(&b'\n'));
        let body = BASE64.decode(&frame[..frame.len() - 1]).unwrap();
        let parsed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["message"], "pong");

        let decoded: ExecutorResponse = decode_frame(&frame).unwrap();
        assert!(decoded.is_success());
    }

    #[test]
    fn malformed_frames_are_rejected() {
        assert!(matches!(
            decode_frame::<ExecutorRequest>(b"\n"),
            Err(FrameError::Empty)
        ));
        assert!(matches!(
            decode_frame::<ExecutorRequest>(b"%%% not base64 %%%\n"),
            Err(FrameError::Base64(_))
        ));
        let not_json = BASE64.encode("{oops");
        assert!(matches!(
            decode_frame::<ExecutorRequest>(not_json.as_bytes()),
            Err(FrameError::Json(_))
        ));
        let huge = vec![b'A'; MAX_FRAME_BYTES + 4];
        assert!(matches!(
            decode_frame::<ExecutorRequest>(&huge),
            Err(FrameError::TooLarge)
        ));
    }

    #[test]
    fn into_result_splits_on_status() {
        assert_eq!(ExecutorResponse::success(8).into_result(), Ok(json!(8)));
        assert_eq!(
            ExecutorResponse::error("bad").into_result(),
            Err("bad".to_string())
        );
    }

    #[tokio::test]
    async fn read_frame_stops_at_newline() {
        let data: &[u8] = b"abc\ndef\n";
        let mut reader = tokio::io::BufReader::new(data);
        assert_eq!(read_frame(&mut reader).await.unwrap(), b"abc\n");
        assert_eq!(read_frame(&mut reader).await.unwrap(), b"def\n");
        assert!(read_frame(&mut reader).await.unwrap().is_empty());
    }
}
