//! Turns free-text instructions into Blender Python for the web form.

mod keyword;
mod ollama;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub use keyword::KeywordInterpreter;
pub use ollama::{OllamaInterpreter, OllamaProbe};

pub const STATUS_SUCCESS: &str = "success";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpretation {
    pub status: String,
    pub review: String,
    pub generated_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Keyword,
    Ollama,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterSelection {
    Auto,
    Keyword,
    Ollama,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendAttempt {
    pub backend: Backend,
    pub error: String,
}

#[derive(Debug, Error)]
#[error("interpretation failed after {attempts:?}")]
pub struct RoutingError {
    pub attempts: Vec<BackendAttempt>,
}

pub trait Interpreter {
    fn interpret(&self, command: &str) -> Result<Interpretation>;
}

pub trait ReachabilityProbe {
    fn ollama_reachable(&self) -> bool;
}

/// Strips a Markdown fence around model output and rejects empty code.
pub fn normalize_python_output(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("model returned empty output"));
    }

    if let Some(block) = extract_fenced_code(trimmed) {
        if block.trim().is_empty() {
            return Err(anyhow!("model returned empty fenced output"));
        }
        return Ok(block.trim().to_string());
    }

    Ok(trimmed.to_string())
}

fn extract_fenced_code(input: &str) -> Option<String> {
    let start = input.find("```")?;
    let remainder = &input[start + 3..];
    let body_start = remainder.find('\n')? + 1;
    let body = &remainder[body_start..];
    let end = body.find("```")?;
    Some(body[..end].to_string())
}

/// Prepends `import bpy` to scripts that call operators without importing.
pub fn ensure_bpy_import(script: String) -> String {
    if script.contains("bpy.ops") && !script.contains("import bpy") {
        return format!("import bpy\n{script}");
    }
    script
}

pub struct InterpreterRouter<K, O, R>
where
    K: Interpreter,
    O: Interpreter,
    R: ReachabilityProbe,
{
    pub keyword: K,
    pub ollama: O,
    pub reachability: R,
    pub selection: InterpreterSelection,
}

impl<K, O, R> InterpreterRouter<K, O, R>
where
    K: Interpreter,
    O: Interpreter,
    R: ReachabilityProbe,
{
    pub fn candidate_chain(&self) -> Vec<Backend> {
        match self.selection {
            InterpreterSelection::Keyword => vec![Backend::Keyword],
            InterpreterSelection::Ollama => vec![Backend::Ollama],
            InterpreterSelection::Auto => {
                if self.reachability.ollama_reachable() {
                    vec![Backend::Ollama, Backend::Keyword]
                } else {
                    vec![Backend::Keyword]
                }
            }
        }
    }

    fn call_backend(&self, backend: Backend, command: &str) -> Result<Interpretation> {
        match backend {
            Backend::Keyword => self.keyword.interpret(command),
            Backend::Ollama => self.ollama.interpret(command),
        }
    }
}

impl<K, O, R> Interpreter for InterpreterRouter<K, O, R>
where
    K: Interpreter,
    O: Interpreter,
    R: ReachabilityProbe,
{
    fn interpret(&self, command: &str) -> Result<Interpretation> {
        let mut attempts = Vec::new();

        for backend in self.candidate_chain() {
            debug!(?backend, "interpreting command");
            match self.call_backend(backend, command) {
                Ok(interpretation) => return Ok(interpretation),
                Err(err) => {
                    warn!(?backend, "interpreter failed: {err:#}");
                    attempts.push(BackendAttempt {
                        backend,
                        error: err.to_string(),
                    });
                }
            }
        }

        Err(RoutingError { attempts }.into())
    }
}
