// crates/multidb-cli/src/main.rs
// ============================================================================
// Module: Multi-DB Gateway CLI Entry Point
// Description: Command dispatcher for serving and inspecting the gateway.
// Purpose: Start the SSE server and expose offline catalog/config utilities.
// Dependencies: clap, multidb-adapters, multidb-config, multidb-mcp, tokio
// ============================================================================

//! ## Overview
//! `serve` runs the gateway until the listener fails. `tools` prints the tool
//! catalog the configuration would publish without contacting any backend.
//! `config validate` and `config example` check and scaffold config files.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use multidb_adapters::build_registry;
use multidb_config::GatewayConfig;
use multidb_config::config_toml_example;
use multidb_mcp::McpServer;
use thiserror::Error;
use tokio::net::TcpListener;

// ============================================================================
// SECTION: CLI Definitions
// ============================================================================

/// Multi-DB gateway command line.
#[derive(Parser, Debug)]
#[command(name = "multidb-gateway", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gateway SSE server.
    Serve(ConfigArgs),
    /// Print the tool catalog as JSON.
    Tools(ConfigArgs),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Shared config file selection.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Optional config file path (defaults to multidb-gateway.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate configuration, including env overrides.
    Validate(ConfigArgs),
    /// Print an example configuration file.
    Example,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => command_serve(args).await,
        Commands::Tools(args) => command_tools(&args),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(args: ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(&args)?;
    let addr = config
        .server
        .bind_addr()
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let server = tokio::task::spawn_blocking(move || McpServer::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("gateway init failed: init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("gateway init failed: {err}")))?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| CliError::new(format!("failed to bind {addr}: {err}")))?;
    let local = listener.local_addr().unwrap_or(addr);
    write_stderr_line(&format!(
        "multidb-gateway listening on http://{local} ({} tools)",
        server.sessions().dispatcher().registry().len()
    ))
    .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    server
        .serve_with_listener(listener)
        .await
        .map_err(|err| CliError::new(format!("gateway failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `tools` command.
fn command_tools(args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(args)?;
    let registry =
        build_registry(&config).map_err(|err| CliError::new(format!("gateway init failed: {err}")))?;
    let rendered = serde_json::to_string_pretty(registry.list())
        .map_err(|err| CliError::new(format!("failed to render catalog: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(args) => {
            let _config = load_config(&args)?;
            write_stdout_line("config valid")
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
        ConfigCommand::Example => {
            let mut stdout = std::io::stdout();
            stdout
                .write_all(config_toml_example().as_bytes())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Loads configuration from the selected path, env, or defaults.
fn load_config(args: &ConfigArgs) -> CliResult<GatewayConfig> {
    GatewayConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
