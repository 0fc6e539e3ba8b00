use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Application-level success code.
pub const SUCCESS_CODE: i64 = 200;

/// Default text for failures that carry no message.
pub const DEFAULT_ERROR_MESSAGE: &str = "Error";

/// The body every successful call resolves with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEnvelope {
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// `None` when the server sent no `data` field; an explicit `null` is
    /// `Some(Value::Null)`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Value>,
    /// Any other top-level fields the server sent, including a `message`
    /// that is not a string.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl ServerEnvelope {
    /// Splits a successful body into its envelope fields.
    pub(crate) fn from_parts(code: i64, body: Value) -> Self {
        let mut fields = match body {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        fields.remove("code");
        let message = match fields.remove("message") {
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                fields.insert("message".to_string(), other);
                None
            }
            None => None,
        };
        let data = fields.remove("data");
        Self {
            code,
            message,
            data,
            extra: fields,
        }
    }
}

/// Strict success check: the code is a JSON number equal to 200. Strings
/// never pass.
pub(crate) fn is_strict_success(body: &Value) -> bool {
    match body.get("code") {
        Some(Value::Number(n)) => {
            n.as_i64() == Some(SUCCESS_CODE) || n.as_f64() == Some(SUCCESS_CODE as f64)
        }
        _ => false,
    }
}

/// Loose success check: numbers equal to 200, or strings that parse to 200.
pub(crate) fn is_loose_success(code: Option<&Value>) -> bool {
    match code {
        Some(Value::Number(n)) => n.as_f64() == Some(SUCCESS_CODE as f64),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok() == Some(SUCCESS_CODE as f64),
        _ => false,
    }
}

/// The envelope's `message`, or `"Error"` when absent or empty.
pub(crate) fn message_or_default(body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_ERROR_MESSAGE)
        .to_string()
}
