use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{Html, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use blendmcp_connection::{BridgeError, CommandTransport, Response as BlenderResponse};
use blendmcp_interpret::{Interpretation, Interpreter};
use blendmcp_script::dedent;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

const INDEX_HTML: &str = include_str!("../static/index.html");

pub type SharedTransport = Arc<dyn CommandTransport + Send + Sync>;
pub type SharedInterpreter = Arc<dyn Interpreter + Send + Sync>;

#[derive(Clone)]
pub struct WebState {
    pub transport: SharedTransport,
    pub interpreter: SharedInterpreter,
}

impl WebState {
    pub fn new(transport: SharedTransport, interpreter: SharedInterpreter) -> Self {
        Self {
            transport,
            interpreter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretRequest {
    pub natural_language_command: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
}

/// HTTP status and `detail` text for a failed Blender round trip.
pub fn bridge_error_response(err: &BridgeError) -> (StatusCode, String) {
    match err {
        BridgeError::ConnectionRefused { .. }
        | BridgeError::Communication(_)
        | BridgeError::NoResponse => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!(
                "Could not connect to Blender: {err}. Ensure Blender and the MCP addon server are running."
            ),
        ),
        BridgeError::Timeout { .. } => (
            StatusCode::GATEWAY_TIMEOUT,
            format!("Command to Blender timed out: {err}"),
        ),
        BridgeError::InvalidResponse(_) => (
            StatusCode::BAD_GATEWAY,
            format!("Invalid response from Blender: {err}"),
        ),
        BridgeError::Encode(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("An internal server error occurred: {err}"),
        ),
    }
}

pub fn build_web_app(state: WebState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/healthz", get(healthz_handler))
        .route("/api/blender/interpret", post(interpret_handler))
        .route("/api/blender/execute", post(execute_handler))
        .layer(middleware::from_fn(access_log_middleware))
        .with_state(state)
}

/// Pings Blender once and logs whether the addon answered.
pub async fn check_blender(state: &WebState) {
    let transport = state.transport.clone();
    match tokio::task::spawn_blocking(move || transport.test_connection()).await {
        Ok(true) => info!("successfully connected to the Blender MCP addon server"),
        Ok(false) => warn!(
            "could not connect to the Blender MCP addon server; ensure Blender is running with the addon enabled and the server started"
        ),
        Err(err) => error!("error testing Blender connection on startup: {err}"),
    }
}

async fn access_log_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "http access"
    );
    response
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn healthz_handler() -> Json<StatusResponse> {
    Json(StatusResponse { status: "ok" })
}

async fn interpret_handler(
    State(state): State<WebState>,
    Json(request): Json<InterpretRequest>,
) -> Result<Json<Interpretation>, ApiError> {
    let command = request.natural_language_command.trim().to_string();
    if command.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "natural_language_command must not be empty",
        ));
    }
    info!("received natural language command: {command}");

    let interpreter = state.interpreter.clone();
    let outcome = tokio::task::spawn_blocking(move || interpreter.interpret(&command))
        .await
        .map_err(|err| {
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("An internal server error occurred: {err}"),
            )
        })?;

    match outcome {
        Ok(interpretation) => Ok(Json(interpretation)),
        Err(err) => {
            error!("interpretation failed: {err:#}");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Interpretation failed: {err:#}"),
            ))
        }
    }
}

async fn execute_handler(
    State(state): State<WebState>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<BlenderResponse>, ApiError> {
    let preview: String = request.code.chars().take(100).collect();
    info!("received code to execute: {preview}");
    let code = dedent(&request.code);

    let transport = state.transport.clone();
    let outcome = tokio::task::spawn_blocking(move || transport.execute_script(&code))
        .await
        .map_err(|err| {
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("An internal server error occurred: {err}"),
            )
        })?;

    match outcome {
        Ok(response) => {
            info!(status = %response.status, "response from Blender");
            Ok(Json(response))
        }
        Err(err) => {
            let (status, detail) = bridge_error_response(&err);
            error!(status = status.as_u16(), "Blender round trip failed: {err}");
            Err(api_error(status, detail))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::bridge_error_response;
    use axum::http::StatusCode;
    use blendmcp_connection::BridgeError;
    use std::io;
    use std::time::Duration;

    #[test]
    fn status_mapping() {
        let refused = BridgeError::ConnectionRefused {
            host: "localhost".to_string(),
            port: 9876,
        };
        assert_eq!(bridge_error_response(&refused).0, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            bridge_error_response(&BridgeError::NoResponse).0,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            bridge_error_response(&BridgeError::Communication(io::Error::other("reset"))).0,
            StatusCode::SERVICE_UNAVAILABLE
        );

        let (status, detail) = bridge_error_response(&BridgeError::Timeout {
            after: Duration::from_secs(30),
        });
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(detail, "Command to Blender timed out: command timed out after 30 seconds");

        let bad_json = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid");
        assert_eq!(
            bridge_error_response(&BridgeError::InvalidResponse(bad_json)).0,
            StatusCode::BAD_GATEWAY
        );
    }
}
