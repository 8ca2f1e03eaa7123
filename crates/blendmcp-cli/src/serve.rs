use crate::connection;
use anyhow::{Context, Result};
use blendmcp_config::{BridgeSettings, InterpreterSetting};
use blendmcp_interpret::{
    InterpreterRouter, InterpreterSelection, KeywordInterpreter, OllamaInterpreter, OllamaProbe,
};
use blendmcp_web::{WebState, build_web_app, check_blender};
use std::sync::Arc;
use tracing::info;

fn selection(setting: InterpreterSetting) -> InterpreterSelection {
    match setting {
        InterpreterSetting::Auto => InterpreterSelection::Auto,
        InterpreterSetting::Keyword => InterpreterSelection::Keyword,
        InterpreterSetting::Ollama => InterpreterSelection::Ollama,
    }
}

fn build_state(settings: &BridgeSettings) -> WebState {
    let ollama = OllamaInterpreter::new(settings.ollama_url.clone(), settings.ollama_model.clone());
    let router = InterpreterRouter {
        keyword: KeywordInterpreter,
        reachability: OllamaProbe(ollama.clone()),
        ollama,
        selection: selection(settings.interpreter),
    };
    WebState::new(Arc::new(connection(settings)), Arc::new(router))
}

/// Runs the web backend until the process is stopped.
pub fn run(settings: &BridgeSettings) -> Result<()> {
    let state = build_state(settings);
    let addr = settings.web_addr.clone();
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;

    runtime.block_on(async move {
        check_blender(&state).await;
        let app = build_web_app(state);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        info!("web backend listening on http://{}", listener.local_addr()?);
        axum::serve(listener, app)
            .await
            .context("web backend stopped")
    })
}
