use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const STATUS_SUCCESS: &str = "success";

/// One request to the Blender addon listener.
///
/// The addon reads the script of an `execute_code` command from the
/// top-level `code` key; `params.code` carries the same text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl Command {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            code: None,
            params: Map::new(),
        }
    }

    pub fn ping() -> Self {
        Self::new("ping")
    }

    pub fn execute_code(code: impl Into<String>) -> Self {
        let code = code.into();
        let mut command =
            Self::new("execute_code").with_param("code", Value::String(code.clone()));
        command.code = Some(code);
        command
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Serializes to a single JSON line terminated by `\n`.
    pub fn encode_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// One reply from the Blender addon listener. Fields the bridge does not
/// know about are kept in `extra` so responses can be forwarded verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Captured stdout of an `execute_code` call.
    pub fn output(&self) -> String {
        match &self.result {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    pub fn failure_message(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }

    pub fn decode_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim())
    }
}
