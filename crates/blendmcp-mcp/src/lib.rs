//! MCP (Model Context Protocol) server exposing the Blender tools and
//! resources. JSON-RPC 2.0 messages are newline-delimited on the reader and
//! writer handed to [`McpServer::serve`]; diagnostics go through `tracing`,
//! which the binary points at stderr.

mod catalog;

use blendmcp_connection::CommandTransport;
use blendmcp_tools::{BlenderResources, BlenderTools, ResourceKind, ToolError};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::io::{self, BufRead, Write};
use tracing::{debug, error, info, warn};

pub use catalog::{TOOL_NAMES, resource_definitions, tool_definitions};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "blender-mcp";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

fn jsonrpc_result(id: &Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

fn jsonrpc_error(id: &Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message,
        },
    })
}

fn tool_result_text(text: &str) -> Value {
    json!({
        "content": [{"type": "text", "text": text}],
    })
}

fn tool_result_error(text: &str) -> Value {
    json!({
        "content": [{"type": "text", "text": text}],
        "isError": true,
    })
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn decode<A: DeserializeOwned>(arguments: Value) -> Result<A, ToolError> {
    serde_json::from_value(arguments).map_err(|err| ToolError::InvalidArgument(err.to_string()))
}

pub struct McpServer<T: CommandTransport> {
    transport: T,
}

impl<T: CommandTransport> McpServer<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Processes messages until the reader is exhausted. Blank lines are
    /// skipped and notifications get no reply.
    pub fn serve<R, W>(&self, reader: R, mut writer: W) -> io::Result<()>
    where
        R: BufRead,
        W: Write,
    {
        info!("MCP server listening on stdio");
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(reply) = self.handle_line(line) {
                let serialized = serde_json::to_string(&reply).map_err(io::Error::other)?;
                writeln!(writer, "{serialized}")?;
                writer.flush()?;
            }
        }
        info!("MCP input closed");
        Ok(())
    }

    pub fn handle_line(&self, line: &str) -> Option<Value> {
        match serde_json::from_str::<Value>(line) {
            Ok(message) => self.handle_message(&message),
            Err(err) => {
                warn!("invalid JSON-RPC message: {err}");
                Some(jsonrpc_error(
                    &Value::Null,
                    PARSE_ERROR,
                    &format!("Parse error: {err}"),
                ))
            }
        }
    }

    pub fn handle_message(&self, message: &Value) -> Option<Value> {
        let id = message.get("id").cloned().unwrap_or(Value::Null);
        let is_notification = message.get("id").is_none();
        let method = message.get("method").and_then(Value::as_str).unwrap_or("");
        let params = message.get("params");
        debug!(method, "handling MCP message");

        let response = match method {
            "initialize" => handle_initialize(&id),
            "notifications/initialized" => {
                info!("MCP client initialized");
                return None;
            }
            "ping" => jsonrpc_result(&id, json!({})),
            "tools/list" => jsonrpc_result(&id, json!({"tools": tool_definitions()})),
            "tools/call" => self.handle_tools_call(&id, params),
            "resources/list" => {
                jsonrpc_result(&id, json!({"resources": resource_definitions()}))
            }
            "resources/read" => self.handle_resources_read(&id, params),
            _ if is_notification => return None,
            _ => jsonrpc_error(&id, METHOD_NOT_FOUND, &format!("Method not found: {method}")),
        };

        if is_notification {
            return None;
        }
        Some(response)
    }

    fn handle_tools_call(&self, id: &Value, params: Option<&Value>) -> Value {
        let name = params
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("");
        let arguments = params
            .and_then(|p| p.get("arguments"))
            .filter(|a| !a.is_null())
            .cloned()
            .unwrap_or_else(|| json!({}));

        if !TOOL_NAMES.contains(&name) {
            return jsonrpc_error(id, INVALID_PARAMS, &format!("Unknown tool: {name}"));
        }

        match self.call_tool(name, arguments) {
            Ok(result) => jsonrpc_result(id, tool_result_text(&pretty(&result))),
            Err(ToolError::InvalidArgument(message)) => jsonrpc_error(id, INVALID_PARAMS, &message),
            Err(err) => {
                error!(tool = name, "tool call failed: {err}");
                jsonrpc_result(id, tool_result_error(&format!("Error: {err}")))
            }
        }
    }

    fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let tools = BlenderTools::new(&self.transport);
        match name {
            "create_object" => tools.create_object(&decode(arguments)?),
            "delete_object" => tools.delete_object(&decode(arguments)?),
            "modify_object" => tools.modify_object(&decode(arguments)?),
            "create_material" => tools.create_material(&decode(arguments)?),
            "setup_lighting" => tools.setup_lighting(&decode(arguments)?),
            "setup_camera" => tools.setup_camera(&decode(arguments)?),
            "execute_python" => tools.execute_python(&decode(arguments)?),
            "render_scene" => tools.render_scene(&decode(arguments)?),
            other => Err(ToolError::InvalidArgument(format!("Unknown tool: {other}"))),
        }
    }

    fn handle_resources_read(&self, id: &Value, params: Option<&Value>) -> Value {
        let uri = params
            .and_then(|p| p.get("uri"))
            .and_then(Value::as_str)
            .unwrap_or("");
        let Some(kind) = ResourceKind::from_uri(uri) else {
            return jsonrpc_error(id, INVALID_PARAMS, &format!("Unknown resource: {uri}"));
        };

        let contents = match BlenderResources::new(&self.transport).read(kind) {
            Ok(data) => json!({
                "uri": uri,
                "mimeType": "application/json",
                "text": pretty(&data),
            }),
            Err(err) => {
                error!(uri, "resource read failed: {err}");
                json!({
                    "uri": uri,
                    "mimeType": "text/plain",
                    "text": format!("Error: {err}"),
                })
            }
        };
        jsonrpc_result(id, json!({"contents": [contents]}))
    }
}

fn handle_initialize(id: &Value) -> Value {
    jsonrpc_result(
        id,
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION,
            },
            "capabilities": {
                "tools": {},
                "resources": {},
            },
        }),
    )
}
