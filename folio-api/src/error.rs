use anyhow::{anyhow, Context};
use http::StatusCode;
use serde_json::{json, Value};

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("No category or model named {0:?}")]
    ScopeNotFound(String),

    #[error("Comment content is empty")]
    EmptyContent,

    #[error("Nickname is {0} characters long, more than allowed")]
    NicknameTooLong(usize),

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Invalid(_) => StatusCode::BAD_REQUEST,
            Error::ScopeNotFound(_) => StatusCode::NOT_FOUND,
            Error::EmptyContent => StatusCode::BAD_REQUEST,
            Error::NicknameTooLong(_) => StatusCode::BAD_REQUEST,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Serializes into the same shape Django REST framework uses for its
    /// errors, plus a `type` tag so that `parse` can restore the exact variant
    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "type": "unknown",
                "detail": msg,
            }),
            Error::NotFound(msg) => json!({
                "type": "not-found",
                "detail": msg,
            }),
            Error::Invalid(msg) => json!({
                "type": "invalid",
                "non_field_errors": [msg],
            }),
            Error::ScopeNotFound(name) => json!({
                "type": "scope-not-found",
                "error": "Object not found",
                "name": name,
            }),
            Error::EmptyContent => json!({
                "type": "empty-content",
                "content": ["This field may not be blank."],
            }),
            Error::NicknameTooLong(len) => json!({
                "type": "nickname-too-long",
                "nickname": [format!(
                    "Ensure this field has no more than {} characters.",
                    crate::MAX_NICKNAME_LEN
                )],
                "length": len,
            }),
            Error::NullByteInString(s) => json!({
                "type": "null-byte",
                "non_field_errors": ["Null characters are not allowed."],
                "string": s,
            }),
        })
        .expect("serializing error contents")
    }

    /// Parses an error response body. Untagged bodies, as sent by the real
    /// backend, are classified by status code.
    pub fn parse(status: StatusCode, body: &[u8]) -> anyhow::Result<Error> {
        let data: Value = serde_json::from_slice(body).context("parsing error contents")?;
        let typ = match data.get("type").and_then(|t| t.as_str()) {
            Some(typ) => typ,
            None => {
                let msg = drf_message(&data)
                    .ok_or_else(|| anyhow!("error contents carry no message"))?;
                return Ok(match status {
                    StatusCode::NOT_FOUND => Error::NotFound(msg),
                    s if s.is_client_error() => Error::Invalid(msg),
                    _ => Error::Unknown(msg),
                });
            }
        };
        let message = || drf_message(&data).unwrap_or_default();
        Ok(match typ {
            "unknown" => Error::Unknown(message()),
            "not-found" => Error::NotFound(message()),
            "invalid" => Error::Invalid(message()),
            "scope-not-found" => Error::ScopeNotFound(String::from(
                data.get("name")
                    .and_then(|n| n.as_str())
                    .ok_or_else(|| anyhow!("error is a scope-not-found without a name"))?,
            )),
            "empty-content" => Error::EmptyContent,
            "nickname-too-long" => Error::NicknameTooLong(
                data.get("length")
                    .and_then(|l| l.as_u64())
                    .ok_or_else(|| anyhow!("error is a nickname-too-long without a length"))?
                    as usize,
            ),
            "null-byte" => Error::NullByteInString(String::from(
                data.get("string")
                    .and_then(|s| s.as_str())
                    .ok_or_else(|| anyhow!("error is a null-byte-in-string without a string"))?,
            )),
            _ => return Err(anyhow!("error contents has unknown type {typ:?}")),
        })
    }
}

/// Extracts a human-readable message out of a DRF error body
fn drf_message(data: &Value) -> Option<String> {
    match data {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let msgs = items.iter().filter_map(drf_message).collect::<Vec<_>>();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        Value::Object(fields) => {
            for key in ["detail", "error"] {
                if let Some(Value::String(s)) = fields.get(key) {
                    return Some(s.clone());
                }
            }
            let msgs = fields
                .iter()
                .filter(|(k, _)| !matches!(k.as_str(), "type" | "name" | "length" | "string"))
                .filter_map(|(k, v)| {
                    drf_message(v).map(|m| match k.as_str() {
                        "non_field_errors" => m,
                        _ => format!("{k}: {m}"),
                    })
                })
                .collect::<Vec<_>>();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        _ => None,
    }
}
