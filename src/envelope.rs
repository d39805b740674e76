//! Response envelopes.
//!
//! A completed request is expected to produce a [`ResponseEnvelope`], which is either a success
//! carrying data or a failure carrying an [`ErrorInfo`]. On the wire, this looks like
//! `{"status": "success", "data": ...}` or `{"status": "failed", "error": {...}}`.
use crate::FetchError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value as Json;
use std::fmt;

/// Error code, which is either numeric (like an HTTP status) or a string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Number(i64),
    Text(String),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Number(number) => write!(f, "{number}"),
            ErrorCode::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        ErrorCode::Number(code)
    }
}

impl From<i32> for ErrorCode {
    fn from(code: i32) -> Self {
        ErrorCode::Number(code.into())
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        ErrorCode::Text(code.into())
    }
}

/// Structured error, as seen by consumers.
///
/// The `message` is meant to be displayed, `name` and `code` are meant for branching.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

impl ErrorInfo {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<ErrorCode>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)?;
        if let Some(code) = &self.code {
            write!(f, " ({code})")?;
        }
        Ok(())
    }
}

/// Result of a completed request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResponseEnvelope<T> {
    Success { data: T },
    Failed { error: ErrorInfo },
}

impl<T> ResponseEnvelope<T> {
    pub fn success(data: T) -> Self {
        ResponseEnvelope::Success { data }
    }

    pub fn failed(error: impl Into<ErrorInfo>) -> Self {
        ResponseEnvelope::Failed {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResponseEnvelope::Success { .. })
    }

    /// Turn this envelope into a result.
    pub fn into_result(self) -> Result<T, ErrorInfo> {
        match self {
            ResponseEnvelope::Success { data } => Ok(data),
            ResponseEnvelope::Failed { error } => Err(error),
        }
    }
}

impl ResponseEnvelope<Json> {
    /// Decode the payload of an untyped envelope.
    ///
    /// A payload which does not match `T` turns into a failed envelope with a `ParseError`.
    pub fn decode<T: DeserializeOwned>(self) -> ResponseEnvelope<T> {
        match self {
            ResponseEnvelope::Success { data } => match serde_json::from_value(data) {
                Ok(data) => ResponseEnvelope::Success { data },
                Err(error) => ResponseEnvelope::failed(FetchError::from(error)),
            },
            ResponseEnvelope::Failed { error } => ResponseEnvelope::Failed { error },
        }
    }
}

/// Normalize a raw HTTP response into an envelope.
///
/// - a body that is not valid JSON, or not shaped like an envelope, is a `ParseError`;
/// - a non-2xx status is an `HttpError` carrying the status, unless the body is a failed
///   envelope, whose error is kept;
/// - otherwise the envelope in the body is returned as-is.
pub fn from_http(status: u16, body: &str) -> ResponseEnvelope<Json> {
    let success = (200..300).contains(&status);
    let parsed = serde_json::from_str::<ResponseEnvelope<Json>>(body);
    match (parsed, success) {
        (Ok(envelope @ ResponseEnvelope::Failed { .. }), _) => envelope,
        (Ok(envelope), true) => envelope,
        (_, false) => ResponseEnvelope::failed(FetchError::Http { status }),
        (Err(error), true) => ResponseEnvelope::failed(FetchError::from(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_wire_format() {
        let envelope: ResponseEnvelope<u32> =
            serde_json::from_value(json!({"status": "success", "data": 7})).unwrap();
        assert_eq!(envelope, ResponseEnvelope::success(7));

        let envelope: ResponseEnvelope<u32> = serde_json::from_value(json!({
            "status": "failed",
            "error": {"name": "ValidationError", "message": "bad input", "code": 422}
        }))
        .unwrap();
        assert_eq!(
            envelope,
            ResponseEnvelope::failed(ErrorInfo::new("ValidationError", "bad input").with_code(422))
        );
    }

    #[test]
    fn error_code_may_be_string() {
        let info: ErrorInfo =
            serde_json::from_value(json!({"name": "Auth", "message": "no", "code": "E_AUTH"}))
                .unwrap();
        assert_eq!(info.code, Some(ErrorCode::Text("E_AUTH".into())));
        assert_eq!(info.to_string(), "Auth: no (E_AUTH)");
    }

    #[test]
    fn http_success() {
        let envelope = from_http(200, r#"{"status":"success","data":[1,2]}"#);
        assert_eq!(envelope, ResponseEnvelope::success(json!([1, 2])));
    }

    #[test]
    fn http_invalid_body_is_parse_error() {
        let error = from_http(200, "<html>").into_result().unwrap_err();
        assert_eq!(error.name, "ParseError");

        let error = from_http(200, r#"{"data": 1}"#).into_result().unwrap_err();
        assert_eq!(error.name, "ParseError");
    }

    #[test]
    fn http_status_is_http_error() {
        let error = from_http(503, "Service Unavailable").into_result().unwrap_err();
        assert_eq!(error.name, "HttpError");
        assert_eq!(error.code, Some(ErrorCode::Number(503)));

        let error = from_http(500, r#"{"status":"success","data":1}"#)
            .into_result()
            .unwrap_err();
        assert_eq!(error.name, "HttpError");
    }

    #[test]
    fn http_failed_envelope_keeps_error() {
        let body = r#"{"status":"failed","error":{"name":"NotFound","message":"gone","code":404}}"#;
        let error = from_http(404, body).into_result().unwrap_err();
        assert_eq!(error, ErrorInfo::new("NotFound", "gone").with_code(404));
    }

    #[test]
    fn decode_mismatch_is_parse_error() {
        let envelope = ResponseEnvelope::success(json!("text")).decode::<u32>();
        assert_eq!(envelope.into_result().unwrap_err().name, "ParseError");
        let envelope = ResponseEnvelope::success(json!(3)).decode::<u32>();
        assert_eq!(envelope, ResponseEnvelope::success(3));
    }
}
