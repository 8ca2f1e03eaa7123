use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "blendmcp.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpreterSetting {
    Auto,
    Keyword,
    Ollama,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub timeout_secs: Option<u64>,
    pub web_addr: Option<String>,
    pub web_url: Option<String>,
    pub interpreter: Option<InterpreterSetting>,
    pub ollama_url: Option<String>,
    pub ollama_model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub timeout_secs: Option<u64>,
    pub web_addr: Option<String>,
    pub web_url: Option<String>,
    pub interpreter: Option<InterpreterSetting>,
    pub ollama_url: Option<String>,
    pub ollama_model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub timeout_secs: Option<u64>,
    pub web_addr: Option<String>,
    pub web_url: Option<String>,
    pub interpreter: Option<InterpreterSetting>,
    pub ollama_url: Option<String>,
    pub ollama_model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
    pub web_addr: String,
    pub web_url: String,
    pub interpreter: InterpreterSetting,
    pub ollama_url: String,
    pub ollama_model: String,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9876,
            timeout_secs: 30,
            web_addr: "127.0.0.1:8000".to_string(),
            web_url: "http://127.0.0.1:8000".to_string(),
            interpreter: InterpreterSetting::Auto,
            ollama_url: "http://127.0.0.1:11434".to_string(),
            ollama_model: "qwen2.5-coder:7b".to_string(),
        }
    }
}

/// Loads the JSON config file. An explicit path must exist; otherwise
/// `blendmcp.json` in `cwd` is tried, then the per-user config directory.
pub fn load_file_config(explicit_path: Option<&Path>, cwd: &Path) -> Result<Option<FileConfig>> {
    let path = match explicit_path {
        Some(p) => p.to_path_buf(),
        None => match discover_config_path(cwd) {
            Some(found) => found,
            None => return Ok(None),
        },
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed reading config file {}", path.display()))?;
    let parsed: FileConfig = serde_json::from_str(&raw)
        .with_context(|| format!("failed parsing config file {}", path.display()))?;
    Ok(Some(parsed))
}

fn discover_config_path(cwd: &Path) -> Option<PathBuf> {
    let local = cwd.join(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    let user = dirs::config_dir()?.join("blendmcp").join("config.json");
    user.exists().then_some(user)
}

impl EnvConfig {
    pub fn from_current_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            host: lookup("BLENDER_HOST").filter(|v| !v.trim().is_empty()),
            port: lookup("BLENDER_PORT").and_then(|v| v.trim().parse().ok()),
            timeout_secs: lookup("BLENDER_TIMEOUT").and_then(|v| v.trim().parse().ok()),
            web_addr: lookup("BLENDMCP_WEB_ADDR"),
            web_url: lookup("BLENDMCP_WEB_URL"),
            interpreter: lookup("BLENDMCP_INTERPRETER").and_then(|v| parse_interpreter(&v)),
            ollama_url: lookup("BLENDMCP_OLLAMA_URL"),
            ollama_model: lookup("BLENDMCP_OLLAMA_MODEL"),
        }
    }
}

pub fn resolve_settings(
    cli: &CliOverrides,
    env_cfg: &EnvConfig,
    file_cfg: Option<&FileConfig>,
) -> BridgeSettings {
    let base = BridgeSettings::default();

    let host = cli
        .host
        .clone()
        .or_else(|| env_cfg.host.clone())
        .or_else(|| file_cfg.and_then(|c| c.host.clone()))
        .unwrap_or(base.host);

    let port = cli
        .port
        .or(env_cfg.port)
        .or(file_cfg.and_then(|c| c.port))
        .unwrap_or(base.port);

    let timeout_secs = cli
        .timeout_secs
        .or(env_cfg.timeout_secs)
        .or(file_cfg.and_then(|c| c.timeout_secs))
        .unwrap_or(base.timeout_secs);

    let web_addr = cli
        .web_addr
        .clone()
        .or_else(|| env_cfg.web_addr.clone())
        .or_else(|| file_cfg.and_then(|c| c.web_addr.clone()))
        .unwrap_or(base.web_addr);

    let web_url = cli
        .web_url
        .clone()
        .or_else(|| env_cfg.web_url.clone())
        .or_else(|| file_cfg.and_then(|c| c.web_url.clone()))
        .unwrap_or(base.web_url);

    let interpreter = cli
        .interpreter
        .or(env_cfg.interpreter)
        .or(file_cfg.and_then(|c| c.interpreter))
        .unwrap_or(base.interpreter);

    let ollama_url = cli
        .ollama_url
        .clone()
        .or_else(|| env_cfg.ollama_url.clone())
        .or_else(|| file_cfg.and_then(|c| c.ollama_url.clone()))
        .unwrap_or(base.ollama_url);

    let ollama_model = cli
        .ollama_model
        .clone()
        .or_else(|| env_cfg.ollama_model.clone())
        .or_else(|| file_cfg.and_then(|c| c.ollama_model.clone()))
        .unwrap_or(base.ollama_model);

    BridgeSettings {
        host,
        port,
        timeout_secs,
        web_addr,
        web_url,
        interpreter,
        ollama_url,
        ollama_model,
    }
}

pub fn parse_interpreter(input: &str) -> Option<InterpreterSetting> {
    match input.trim().to_ascii_lowercase().as_str() {
        "auto" => Some(InterpreterSetting::Auto),
        "keyword" | "keywords" | "placeholder" => Some(InterpreterSetting::Keyword),
        "ollama" | "llm" => Some(InterpreterSetting::Ollama),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BridgeSettings, CliOverrides, EnvConfig, FileConfig, InterpreterSetting,
        load_file_config, parse_interpreter, resolve_settings,
    };
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn valid_config_parses() {
        let dir = tempdir().expect("tempdir should work");
        let path = dir.path().join("blendmcp.json");
        fs::write(&path, r#"{"host":"blender.local","port":9999,"interpreter":"keyword"}"#)
            .expect("write should work");

        let parsed = load_file_config(None, dir.path())
            .expect("parse should work")
            .expect("file should exist");
        assert_eq!(parsed.host.as_deref(), Some("blender.local"));
        assert_eq!(parsed.port, Some(9999));
        assert_eq!(parsed.interpreter, Some(InterpreterSetting::Keyword));
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempdir().expect("tempdir should work");
        let missing = dir.path().join("nope.json");
        let err = load_file_config(Some(&missing), dir.path()).expect_err("must fail");
        assert!(format!("{err:#}").contains("failed reading config file"));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let dir = tempdir().expect("tempdir should work");
        let path = dir.path().join("blendmcp.json");
        fs::write(&path, r#"{"unknown":1}"#).expect("write should work");

        let err = load_file_config(None, dir.path()).expect_err("parse should fail");
        assert!(format!("{err:#}").contains("unknown field"));
    }

    #[test]
    fn malformed_json_has_location() {
        let dir = tempdir().expect("tempdir should work");
        let path = dir.path().join("blendmcp.json");
        fs::write(&path, "{\n  \"port\":\n").expect("write should work");

        let err = load_file_config(None, dir.path()).expect_err("parse should fail");
        assert!(
            format!("{err:#}").contains("line") || format!("{err:#}").contains("column"),
            "expected location details, got: {err}"
        );
    }

    #[test]
    fn env_lookup_parses_and_skips_garbage() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("BLENDER_HOST", "10.0.0.2"),
            ("BLENDER_PORT", "not-a-port"),
            ("BLENDER_TIMEOUT", "12"),
            ("BLENDMCP_INTERPRETER", "Ollama"),
        ]);
        let env_cfg = EnvConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(env_cfg.host.as_deref(), Some("10.0.0.2"));
        assert_eq!(env_cfg.port, None);
        assert_eq!(env_cfg.timeout_secs, Some(12));
        assert_eq!(env_cfg.interpreter, Some(InterpreterSetting::Ollama));
    }

    #[test]
    fn precedence_cli_env_file_defaults() {
        let file = FileConfig {
            host: Some("file-host".to_string()),
            port: Some(1111),
            timeout_secs: Some(5),
            interpreter: Some(InterpreterSetting::Ollama),
            ..FileConfig::default()
        };

        let env_cfg = EnvConfig {
            port: Some(2222),
            timeout_secs: Some(10),
            ..EnvConfig::default()
        };

        let cli = CliOverrides {
            timeout_secs: Some(20),
            ..CliOverrides::default()
        };

        let resolved = resolve_settings(&cli, &env_cfg, Some(&file));
        assert_eq!(resolved.host, "file-host");
        assert_eq!(resolved.port, 2222);
        assert_eq!(resolved.timeout_secs, 20);
        assert_eq!(resolved.interpreter, InterpreterSetting::Ollama);
        assert_eq!(resolved.web_addr, BridgeSettings::default().web_addr);
    }

    #[test]
    fn defaults_without_any_source() {
        let resolved = resolve_settings(&CliOverrides::default(), &EnvConfig::default(), None);
        assert_eq!(resolved, BridgeSettings::default());
        assert_eq!(resolved.host, "localhost");
        assert_eq!(resolved.port, 9876);
        assert_eq!(resolved.timeout_secs, 30);
    }

    #[test]
    fn interpreter_aliases() {
        assert_eq!(parse_interpreter(" AUTO "), Some(InterpreterSetting::Auto));
        assert_eq!(parse_interpreter("placeholder"), Some(InterpreterSetting::Keyword));
        assert_eq!(parse_interpreter("gpt"), None);
    }
}
