//! Line-delimited JSON-RPC server over stdio.
//!
//! Each request line is handled on its own task. Responses funnel through a
//! single writer task so lines never interleave. A `notifications/cancelled`
//! message aborts the task serving the named request, dropping its in-flight
//! backend call; the cancelled request gets no response.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Map, Value as JsonValue};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinSet};
use tracing::{debug, info, warn};

use tacit_search::{Operation, SearchService};

use crate::protocol::{
    CallToolParams, CallToolResult, CancelledParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo,
    ToolsCapability, CANCELLED_NOTIFICATION, INVALID_PARAMS, INVALID_REQUEST,
    MCP_PROTOCOL_VERSION, METHOD_NOT_FOUND, PARSE_ERROR,
};
use crate::tools::tool_definitions;

pub const SERVER_NAME: &str = "tacit-mcp";

/// Request id of a `notifications/cancelled` message, if `message` is one.
fn cancelled_request(message: &JsonValue) -> Option<JsonValue> {
    if message.get("method").and_then(JsonValue::as_str) != Some(CANCELLED_NOTIFICATION) {
        return None;
    }
    let params = message.get("params").cloned()?;
    serde_json::from_value::<CancelledParams>(params)
        .ok()
        .map(|p| p.request_id)
}

/// Request tasks spawned by [`McpServer::run`], keyed by request id.
///
/// Finished tasks are reaped before every spawn, so the set only holds work
/// that is still running.
struct InFlight {
    tasks: JoinSet<()>,
    by_id: HashMap<String, AbortHandle>,
}

impl InFlight {
    fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            by_id: HashMap::new(),
        }
    }

    fn reap(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(e) = joined {
                if e.is_panic() {
                    warn!(subsystem = "mcp", error = %e, "Request task panicked");
                }
            }
        }
        self.by_id.retain(|_, handle| !handle.is_finished());
    }

    fn spawn<F>(&mut self, id: Option<&JsonValue>, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.reap();
        let handle = self.tasks.spawn(task);
        if let Some(id) = id {
            self.by_id.insert(id.to_string(), handle);
        }
    }

    /// Abort the task serving `id`. Returns whether one was still running.
    fn cancel(&mut self, id: &JsonValue) -> bool {
        match self.by_id.remove(&id.to_string()) {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    fn len(&self) -> usize {
        self.tasks.len()
    }

    async fn drain(&mut self) {
        while self.tasks.join_next().await.is_some() {}
        self.by_id.clear();
    }
}

/// Tool server state shared by all request tasks.
pub struct McpServer {
    service: SearchService,
}

impl McpServer {
    pub fn new(service: SearchService) -> Self {
        Self { service }
    }

    /// Handle one input line. Returns `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        self.handle_message(serde_json::from_str(line)).await
    }

    async fn handle_message(
        &self,
        parsed: serde_json::Result<JsonValue>,
    ) -> Option<JsonRpcResponse> {
        let value = match parsed {
            Ok(v) => v,
            Err(e) => {
                warn!(subsystem = "mcp", error = %e, "Unparseable request line");
                return Some(JsonRpcResponse::failure(
                    JsonValue::Null,
                    JsonRpcError::new(PARSE_ERROR, "Parse error"),
                ));
            }
        };

        let id_hint = value.get("id").cloned().unwrap_or(JsonValue::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    id_hint,
                    JsonRpcError::new(INVALID_REQUEST, format!("Invalid request: {}", e)),
                ))
            }
        };

        self.handle_request(request).await
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            debug!(subsystem = "mcp", method = %request.method, "Notification received");
            return None;
        };

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => serde_json::to_value(ListToolsResult {
                tools: tool_definitions(),
            })
            .map_err(internal),
            "tools/call" => self.call_tool(request.params, &id).await,
            other => Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            )),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    fn initialize(&self) -> JsonValue {
        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability::default(),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };
        serde_json::to_value(result).unwrap_or_else(|_| json!({}))
    }

    async fn call_tool(
        &self,
        params: Option<JsonValue>,
        id: &JsonValue,
    ) -> Result<JsonValue, JsonRpcError> {
        let params: CallToolParams = params
            .ok_or_else(|| JsonRpcError::new(INVALID_PARAMS, "Missing tool call parameters"))
            .and_then(|p| {
                serde_json::from_value(p).map_err(|e| {
                    JsonRpcError::new(INVALID_PARAMS, format!("Invalid tool call parameters: {}", e))
                })
            })?;

        let op: Operation = params
            .name
            .parse()
            .map_err(|_| JsonRpcError::new(INVALID_PARAMS, format!("Unknown tool: {}", params.name)))?;

        let arguments: Map<String, JsonValue> = match params.arguments {
            None | Some(JsonValue::Null) => Map::new(),
            Some(JsonValue::Object(map)) => map,
            Some(_) => {
                return Err(JsonRpcError::new(
                    INVALID_PARAMS,
                    "Tool arguments must be an object",
                ))
            }
        };

        let start = Instant::now();
        let result = match self.service.execute(op, &arguments).await {
            Ok(text) => {
                info!(
                    subsystem = "mcp",
                    op = %op,
                    request_id = %id,
                    success = true,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool call complete"
                );
                CallToolResult::text(text)
            }
            Err(e) => {
                warn!(
                    subsystem = "mcp",
                    op = %op,
                    request_id = %id,
                    success = false,
                    stage = %e.stage(),
                    error = %e,
                    "Tool call failed"
                );
                CallToolResult::error(format!("{} failed at {}: {}", op, e.stage(), e))
            }
        };

        serde_json::to_value(result).map_err(internal)
    }

    /// Serve requests from `reader` until EOF, writing responses to `writer`.
    pub async fn run<R, W>(self: Arc<Self>, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let writer_task = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<_, std::io::Error>(())
        });

        let mut in_flight = InFlight::new();
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let parsed = serde_json::from_str::<JsonValue>(&line);
            if let Some(request_id) = parsed.as_ref().ok().and_then(cancelled_request) {
                let cancelled = in_flight.cancel(&request_id);
                debug!(subsystem = "mcp", request_id = %request_id, cancelled, "Cancellation received");
                continue;
            }

            let id = parsed.as_ref().ok().and_then(|m| m.get("id")).cloned();
            let server = Arc::clone(&self);
            let tx = tx.clone();
            in_flight.spawn(id.as_ref(), async move {
                if let Some(response) = server.handle_message(parsed).await {
                    match serde_json::to_string(&response) {
                        Ok(encoded) => {
                            let _ = tx.send(encoded);
                        }
                        Err(e) => warn!(subsystem = "mcp", error = %e, "Failed to encode response"),
                    }
                }
            });
        }

        debug!(
            subsystem = "mcp",
            in_flight = in_flight.len(),
            "Input closed, draining in-flight requests"
        );
        in_flight.drain().await;
        drop(tx);

        writer_task
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
    }
}

fn internal(e: serde_json::Error) -> JsonRpcError {
    JsonRpcError::new(-32603, format!("Internal error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tacit_core::{CollectionAllowList, Error};
    use tacit_search::mock::StubBackend;
    use tacit_search::FallbackPolicy;

    fn server(primary: StubBackend) -> McpServer {
        McpServer::new(SearchService::new(
            Arc::new(primary),
            Arc::new(StubBackend::new("secondary")),
            Arc::new(CollectionAllowList::default()),
            FallbackPolicy::Disabled,
        ))
    }

    async fn call(server: &McpServer, line: &str) -> JsonValue {
        let response = server.handle_line(line).await.expect("expected a response");
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_parse_error() {
        let out = call(&server(StubBackend::new("primary")), "{not json").await;
        assert_eq!(out["error"]["code"], PARSE_ERROR);
        assert_eq!(out["id"], JsonValue::Null);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let out = call(
            &server(StubBackend::new("primary")),
            r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#,
        )
        .await;
        assert_eq!(out["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(out["id"], 1);
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let s = server(StubBackend::new("primary"));
        assert!(s
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_initialize_reports_protocol_version() {
        let out = call(
            &server(StubBackend::new("primary")),
            r#"{"jsonrpc":"2.0","id":"init","method":"initialize","params":{}}"#,
        )
        .await;
        assert_eq!(out["result"]["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(out["result"]["serverInfo"]["name"], SERVER_NAME);
    }

    #[tokio::test]
    async fn test_pipeline_error_becomes_error_content() {
        let primary =
            StubBackend::new("primary").failing_with(|| Error::Backend("connection refused".into()));
        let out = call(
            &server(primary),
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"search_candidates","arguments":{"q":"rust"}}}"#,
        )
        .await;
        assert_eq!(out["result"]["isError"], true);
        assert_eq!(
            out["result"]["content"][0]["text"],
            "search_candidates failed at search: Backend error: connection refused"
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_is_invalid_params() {
        let out = call(
            &server(StubBackend::new("primary")),
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"drop_everything"}}"#,
        )
        .await;
        assert_eq!(out["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_finished_tasks_are_reaped() {
        let mut in_flight = InFlight::new();
        for i in 0..64 {
            let (done_tx, done_rx) = tokio::sync::oneshot::channel();
            in_flight.spawn(Some(&json!(i)), async move {
                let _ = done_tx.send(());
            });
            done_rx.await.unwrap();
            assert!(in_flight.len() <= 1, "{} tasks retained", in_flight.len());
        }
        in_flight.reap();
        assert_eq!(in_flight.len(), 0);
        assert!(in_flight.by_id.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_aborts_running_task() {
        let mut in_flight = InFlight::new();
        let (started_tx, started_rx) = tokio::sync::oneshot::channel();
        in_flight.spawn(Some(&json!("call-7")), async move {
            let _ = started_tx.send(());
            std::future::pending::<()>().await;
        });
        started_rx.await.unwrap();

        assert!(!in_flight.cancel(&json!("call-8")));
        assert!(in_flight.cancel(&json!("call-7")));
        in_flight.drain().await;
        assert_eq!(in_flight.len(), 0);
    }

    #[test]
    fn test_cancelled_request_extraction() {
        assert_eq!(
            cancelled_request(&json!({
                "jsonrpc": "2.0",
                "method": "notifications/cancelled",
                "params": {"requestId": 9, "reason": "timeout"}
            })),
            Some(json!(9))
        );
        assert_eq!(
            cancelled_request(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"})),
            None
        );
        assert_eq!(
            cancelled_request(&json!({"jsonrpc": "2.0", "method": "notifications/cancelled"})),
            None
        );
    }

    #[tokio::test]
    async fn test_run_answers_every_request_line() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":41}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );
        let (client, server_side) = tokio::io::duplex(64 * 1024);
        let srv = Arc::new(server(StubBackend::new("primary")));

        srv.run(tokio::io::BufReader::new(input.as_bytes()), server_side)
            .await
            .unwrap();

        let mut output = String::new();
        let mut client = tokio::io::BufReader::new(client);
        while client.read_line(&mut output).await.unwrap() > 0 {}

        let responses: Vec<JsonValue> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(responses.len(), 2);
        assert!(responses.iter().any(|r| r["id"] == 1 && r["result"] == json!({})));
        assert!(responses
            .iter()
            .any(|r| r["id"] == 2 && r["result"]["tools"].as_array().map(Vec::len) == Some(7)));
    }
}
