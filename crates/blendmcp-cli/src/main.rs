mod logging;
mod serve;

use anyhow::{Context, Result, anyhow, bail};
use blendmcp_config::{
    BridgeSettings, CliOverrides, EnvConfig, InterpreterSetting, load_file_config,
    resolve_settings,
};
use blendmcp_connection::{BlenderConnection, Command as BridgeCommand, CommandTransport};
use blendmcp_mcp::McpServer;
use blendmcp_script::{create_safe_blender_script, dedent, format_blender_error};
use blendmcp_web::{HttpPageApi, PageController};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InterpreterArg {
    Auto,
    Keyword,
    Ollama,
}

impl InterpreterArg {
    fn as_setting(self) -> InterpreterSetting {
        match self {
            InterpreterArg::Auto => InterpreterSetting::Auto,
            InterpreterArg::Keyword => InterpreterSetting::Keyword,
            InterpreterArg::Ollama => InterpreterSetting::Ollama,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "blendmcp",
    version,
    about = "Drive Blender through its MCP addon socket"
)]
struct Cli {
    /// JSON config file (defaults to ./blendmcp.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    host: Option<String>,
    /// Addon socket port [default: 9876]. The stock addon listens on 9999.
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Socket read timeout in seconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check that the Blender addon answers.
    Ping,
    /// Print Blender version and build metadata.
    Info,
    /// Run a Python script inside Blender.
    Exec {
        /// Script file; stdin is read when neither this nor --code is given.
        file: Option<PathBuf>,
        #[arg(long, conflicts_with = "file")]
        code: Option<String>,
        /// Wrap the script in try/except with a traceback print.
        #[arg(long)]
        safe: bool,
    },
    /// Start the web backend.
    Serve {
        #[arg(long)]
        addr: Option<String>,
        #[arg(long, value_enum)]
        interpreter: Option<InterpreterArg>,
        #[arg(long)]
        ollama_url: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    /// Serve the Model Context Protocol over stdio.
    Mcp,
    /// Interpret a command through a running web backend, then execute it.
    Ask {
        text: String,
        #[arg(long)]
        web_url: Option<String>,
        /// Execute without asking for confirmation.
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let mut overrides = CliOverrides {
        host: cli.host.clone(),
        port: cli.port,
        timeout_secs: cli.timeout,
        ..CliOverrides::default()
    };
    match &cli.command {
        Commands::Serve {
            addr,
            interpreter,
            ollama_url,
            model,
        } => {
            overrides.web_addr = addr.clone();
            overrides.interpreter = interpreter.map(InterpreterArg::as_setting);
            overrides.ollama_url = ollama_url.clone();
            overrides.ollama_model = model.clone();
        }
        Commands::Ask { web_url, .. } => overrides.web_url = web_url.clone(),
        _ => {}
    }

    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let file_cfg = load_file_config(cli.config.as_deref(), &cwd)?;
    let settings = resolve_settings(&overrides, &EnvConfig::from_current_env(), file_cfg.as_ref());

    match cli.command {
        Commands::Ping => run_ping(&settings),
        Commands::Info => run_info(&settings),
        Commands::Exec { file, code, safe } => run_exec(&settings, file, code, safe),
        Commands::Serve { .. } => serve::run(&settings),
        Commands::Mcp => run_mcp(&settings),
        Commands::Ask { text, yes, .. } => run_ask(&settings, &text, yes),
    }
}

fn connection(settings: &BridgeSettings) -> BlenderConnection {
    BlenderConnection::new(settings.host.clone(), settings.port)
        .with_timeout(Duration::from_secs(settings.timeout_secs))
}

fn run_ping(settings: &BridgeSettings) -> Result<()> {
    let conn = connection(settings);
    let response = conn.send_command(&BridgeCommand::ping())?;
    if !response.is_success() {
        bail!(
            "Blender at {} answered ping with an error: {}",
            conn.address(),
            response.failure_message()
        );
    }
    println!("pong from Blender at {}", conn.address());
    Ok(())
}

fn run_info(settings: &BridgeSettings) -> Result<()> {
    let info = connection(settings).blender_info()?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

fn read_script(file: Option<PathBuf>, code: Option<String>) -> Result<String> {
    if let Some(code) = code {
        return Ok(code);
    }
    match file {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("failed reading script {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed reading script from stdin")?;
            Ok(buf)
        }
    }
}

fn run_exec(
    settings: &BridgeSettings,
    file: Option<PathBuf>,
    code: Option<String>,
    safe: bool,
) -> Result<()> {
    let source = dedent(&read_script(file, code)?);
    if source.trim().is_empty() {
        bail!("no code to execute");
    }
    let script = if safe {
        create_safe_blender_script(&source)
    } else {
        source
    };

    let response = connection(settings).execute_script(&script)?;
    if !response.is_success() {
        let mut message = format_blender_error(&response.failure_message());
        if let Some(traceback) = &response.traceback {
            message.push('\n');
            message.push_str(traceback);
        }
        return Err(anyhow!(message));
    }
    print!("{}", response.output());
    io::stdout().flush()?;
    Ok(())
}

fn run_mcp(settings: &BridgeSettings) -> Result<()> {
    let conn = connection(settings);
    if conn.test_connection() {
        info!("connected to Blender at {}", conn.address());
    } else {
        warn!(
            "Blender is not reachable at {}; tool calls will fail until it is",
            conn.address()
        );
    }

    let server = McpServer::new(conn);
    let stdin = io::stdin();
    let stdout = io::stdout();
    server
        .serve(stdin.lock(), stdout.lock())
        .context("MCP stdio loop failed")
}

fn run_ask(settings: &BridgeSettings, text: &str, yes: bool) -> Result<()> {
    let api = HttpPageApi::new(
        settings.web_url.clone(),
        Duration::from_secs(settings.timeout_secs.max(1) * 3),
    )?;
    let mut controller = PageController::new(api);
    controller.process(text)?;

    let view = controller.view();
    println!("{}", view.review.as_deref().unwrap_or_default());
    println!();
    println!("{}", view.generated_code.as_deref().unwrap_or_default());
    if !view.execute_enabled {
        bail!("the interpreter produced nothing to execute");
    }

    if !yes && !confirm("Execute this code in Blender? [y/N] ")? {
        println!("Skipped.");
        return Ok(());
    }
    controller.execute()?;
    println!("{}", controller.view().execution.as_deref().unwrap_or_default());
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
