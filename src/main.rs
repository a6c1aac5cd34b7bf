//! Cooperative JSON-RPC peer - command-line entry point.
//!
//! This binary is a thin demo harness: it loads configuration, initializes
//! logging, wires a [`protocol::jsonrpc::peer::Peer`] to a line-oriented
//! stdio sink, and pumps stdin lines into it. It exists to give the
//! ambient CLI/config/logging stack something to drive, not as a
//! production transport.

mod config;
mod error;
mod protocol;

use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use error::sink::SinkError;
use error::{set_error_reporter, PeerError, PeerResult, TracingErrorReporter};
use protocol::jsonrpc::client::{ClientRegistry, OutputSink};
use protocol::jsonrpc::peer::Peer;
use protocol::jsonrpc::server::{HandlerOutcome, ServerDispatcher};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

/// Command line arguments.
#[derive(Parser, Debug)]
#[clap(name = "cooperative-jrpc", version, author, about)]
struct Args {
    /// Path to configuration file.
    #[clap(short, long, value_parser)]
    config: Option<PathBuf>,

    /// Command to execute.
    #[clap(subcommand)]
    command: Option<Command>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Start the demo peer, reading requests from stdin.
    Start,

    /// Validate the configuration file.
    Validate,

    /// Generate a default configuration file.
    GenConfig {
        /// Path to output configuration file.
        #[clap(short, long, value_parser)]
        output: PathBuf,
    },
}

/// Writes outbound JSON-RPC bytes as a line on stdout.
struct StdoutSink {
    out: Mutex<std::io::Stdout>,
}

impl StdoutSink {
    fn new() -> Self {
        Self { out: Mutex::new(std::io::stdout()) }
    }
}

impl OutputSink for StdoutSink {
    fn send(&self, bytes: &[u8]) -> Result<(), SinkError> {
        let mut out = self.out.lock().map_err(|_| SinkError::NotReady)?;
        out.write_all(bytes).map_err(|e| SinkError::Rejected(e.to_string()))?;
        out.write_all(b"\n").map_err(|e| SinkError::Rejected(e.to_string()))?;
        out.flush().map_err(|e| SinkError::Rejected(e.to_string()))
    }
}

/// Initializes the logging system.
fn init_logging(json: bool, level: &str) -> PeerResult<()> {
    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::from_default_env());

    let result = if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    result.map_err(|e| PeerError::Custom(format!("failed to set global tracing subscriber: {e}")))
}

/// Registers the demo methods: `ping` and `echo`.
fn register_demo_methods(server: &ServerDispatcher) {
    server.handler_set("ping", |_params| async move { HandlerOutcome::Ok(serde_json::json!("pong")) });
    server.handler_set("echo", |params: Option<serde_json::Value>| async move {
        HandlerOutcome::Ok(params.unwrap_or(serde_json::Value::Null))
    });
}

async fn run_start(config: config::PeerToolConfig) -> PeerResult<()> {
    let server = ServerDispatcher::new(config.server.max_requests, config.server.parallel);
    register_demo_methods(&server);
    let client = ClientRegistry::new(config.client.max_requests);
    let peer = Peer::new(client, server, StdoutSink::new(), config.server.max_input_len)
        .with_on_error(|e| tracing::warn!(error = %e, "failed to write response"));

    info!("peer ready, reading JSON-RPC requests from stdin (one per line)");

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    while let Some(line) = lines.next_line().await.map_err(PeerError::Io)? {
        if line.trim().is_empty() {
            continue;
        }
        peer.read(line.as_bytes()).await;
    }

    Ok(())
}

fn main() -> PeerResult<()> {
    let args = <Args as clap::Parser>::parse();

    let env_prefix = "COOPERATIVE_JRPC";
    let config_loader = config::ConfigLoader::new(args.config.as_deref(), env_prefix);

    match args.command.unwrap_or(Command::Start) {
        Command::Start => {
            let loaded = match config_loader.load() {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("configuration error: {e}");
                    process::exit(1);
                }
            };

            init_logging(loaded.log.json, &loaded.log.level)?;
            set_error_reporter(Arc::new(TracingErrorReporter));
            config::init_global_config(loaded.clone());

            info!("starting cooperative JSON-RPC peer");

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(PeerError::Io)?;
            runtime.block_on(run_start(loaded))
        }
        Command::Validate => {
            match config_loader.load() {
                Ok(_) => {
                    println!("configuration is valid");
                    Ok(())
                }
                Err(e) => {
                    eprintln!("configuration validation error: {e}");
                    process::exit(1);
                }
            }
        }
        Command::GenConfig { output } => {
            let default_config = config::PeerToolConfig::default();

            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent).map_err(PeerError::Io)?;
            }

            let toml = toml::to_string_pretty(&default_config)
                .map_err(|e| PeerError::Custom(format!("failed to serialize config: {e}")))?;

            std::fs::write(&output, toml).map_err(PeerError::Io)?;
            println!("default configuration written to {output:?}");
            Ok(())
        }
    }
}
