//! # Stdio Tool Server
//!
//! JSON-RPC 2.0 over newline-delimited stdin/stdout. Requests are handled
//! one at a time in arrival order. Logs go to stderr; stdout carries only
//! protocol messages.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::tools::{error_reply, resource_definitions, tool_definitions, PantryTools};

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "pantry";

// Standard JSON-RPC error codes
pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Absent for notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
            id,
        }
    }
}

pub struct McpServer {
    tools: PantryTools,
}

impl McpServer {
    pub fn new(tools: PantryTools) -> Self {
        Self { tools }
    }

    /// Answer one request; notifications get no reply
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, "Handling request");
        let Some(id) = request.id else {
            if request.method != "notifications/initialized" {
                debug!(method = %request.method, "Ignoring notification");
            }
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": {}, "resources": {} },
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }),
            ),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, json!({ "tools": tool_definitions() })),
            "tools/call" => self.call_tool(id, request.params).await,
            "resources/list" => {
                JsonRpcResponse::success(id, json!({ "resources": resource_definitions() }))
            }
            "resources/read" => self.read_resource(id, request.params).await,
            other => {
                warn!(method = other, "Unknown method");
                JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {other}"))
            }
        };
        Some(response)
    }

    async fn call_tool(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params = params.unwrap_or(Value::Null);
        let Some(name) = params["name"].as_str() else {
            return JsonRpcResponse::error(id, INVALID_PARAMS, "tools/call requires a tool name");
        };
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        let reply = self.tools.call(name, arguments).await;
        JsonRpcResponse::success(
            id,
            json!({
                "content": [{ "type": "text", "text": reply.text }],
                "isError": reply.is_error
            }),
        )
    }

    async fn read_resource(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params = params.unwrap_or(Value::Null);
        let Some(uri) = params["uri"].as_str() else {
            return JsonRpcResponse::error(id, INVALID_PARAMS, "resources/read requires a uri");
        };

        match self.tools.read_resource(uri).await {
            Ok(text) => JsonRpcResponse::success(
                id,
                json!({
                    "contents": [{ "uri": uri, "mimeType": "application/json", "text": text }]
                }),
            ),
            Err(err) => {
                let reply = error_reply(&err);
                JsonRpcResponse::error(id, INVALID_PARAMS, reply.text)
            }
        }
    }

    /// Answer one raw line; `None` for notifications
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!(error = %e, "Unparseable request");
                Some(JsonRpcResponse::error(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {e}"),
                ))
            }
        }
    }

    /// Serve requests from `reader` until it closes
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            let read = reader
                .read_until(b'\n', &mut buffer)
                .await
                .context("Failed to read request")?;
            if read == 0 {
                break;
            }

            let response = match std::str::from_utf8(&buffer) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_line(line.trim()).await,
                Err(e) => {
                    warn!(error = %e, "Request is not valid UTF-8");
                    Some(JsonRpcResponse::error(
                        Value::Null,
                        PARSE_ERROR,
                        format!("Parse error: {e}"),
                    ))
                }
            };
            let Some(response) = response else {
                continue;
            };

            let mut payload = match serde_json::to_string(&response) {
                Ok(payload) => payload,
                Err(e) => {
                    error!("Failed to serialize response: {e}");
                    continue;
                }
            };
            payload.push('\n');
            writer
                .write_all(payload.as_bytes())
                .await
                .context("Failed to write response")?;
            writer.flush().await.context("Failed to flush response")?;
        }
        Ok(())
    }

    pub async fn serve_stdio(&self) -> Result<()> {
        info!("Pantry tool server listening on stdio");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await?;
        info!("Stdin closed, shutting down");
        Ok(())
    }
}
