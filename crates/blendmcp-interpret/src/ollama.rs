use crate::{
    Interpretation, Interpreter, ReachabilityProbe, STATUS_SUCCESS, ensure_bpy_import,
    normalize_python_output,
};
use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const GENERATE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct OllamaInterpreter {
    pub base_url: String,
    pub model: String,
}

impl OllamaInterpreter {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    pub fn is_reachable(&self) -> bool {
        let client = match Client::builder().timeout(PROBE_TIMEOUT).build() {
            Ok(c) => c,
            Err(_) => return false,
        };

        client
            .get(self.endpoint("/api/tags"))
            .send()
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl Interpreter for OllamaInterpreter {
    fn interpret(&self, command: &str) -> Result<Interpretation> {
        info!(model = %self.model, "interpreting with Ollama: {command}");
        let prompt = build_prompt(command);
        let client = Client::builder()
            .timeout(GENERATE_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        let response = client
            .post(self.endpoint("/api/generate"))
            .json(&GenerateRequest {
                model: &self.model,
                prompt: &prompt,
                stream: false,
            })
            .send()
            .context("failed calling Ollama")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_else(|_| "<unavailable>".to_string());
            return Err(anyhow!("Ollama request failed ({status}): {body}"));
        }

        let parsed: GenerateResponse = response
            .json()
            .context("failed to decode Ollama response")?;
        let code = normalize_python_output(&parsed.response)?;

        Ok(Interpretation {
            status: STATUS_SUCCESS.to_string(),
            review: format!(
                "Interpreting command: '{command}'. (Generated by {} via Ollama)",
                self.model
            ),
            generated_code: ensure_bpy_import(format!("{code}\n")),
        })
    }
}

/// Reachability of the Ollama server backing an [`OllamaInterpreter`].
#[derive(Debug, Clone)]
pub struct OllamaProbe(pub OllamaInterpreter);

impl ReachabilityProbe for OllamaProbe {
    fn ollama_reachable(&self) -> bool {
        self.0.is_reachable()
    }
}

fn build_prompt(command: &str) -> String {
    format!(
        "You write Python scripts for Blender's bpy API. Return only runnable Python code, no prose.\nThe script runs inside Blender with bpy available; print a short confirmation when done.\nINSTRUCTION START\n{command}\nINSTRUCTION END"
    )
}

#[cfg(test)]
mod tests {
    use super::{OllamaInterpreter, build_prompt};
    use crate::Interpreter;

    #[test]
    fn prompt_embeds_instruction() {
        let prompt = build_prompt("add a cube");
        assert!(prompt.contains("INSTRUCTION START\nadd a cube\nINSTRUCTION END"));
    }

    #[test]
    fn unreachable_server_reports_false() {
        let client = OllamaInterpreter::new("http://127.0.0.1:9/", "none");
        assert_eq!(client.endpoint("/api/tags"), "http://127.0.0.1:9/api/tags");
        assert!(!client.is_reachable());
    }

    #[test]
    #[ignore]
    fn live_ollama_interpret_if_enabled() {
        if std::env::var("BLENDMCP_RUN_LIVE_TESTS").ok().as_deref() != Some("1") {
            return;
        }

        let base = std::env::var("BLENDMCP_OLLAMA_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:11434".to_string());
        let model = std::env::var("BLENDMCP_OLLAMA_MODEL")
            .unwrap_or_else(|_| "qwen2.5-coder:7b".to_string());

        let out = OllamaInterpreter::new(base, model)
            .interpret("add a cube at the origin")
            .expect("ollama live request should succeed");
        assert!(!out.generated_code.trim().is_empty());
    }
}
