use clap::{Parser, ValueEnum};
use sovran_mcp_mock::config::{Config, TransportKind};
use sovran_mcp_mock::{McpError, McpServer, MockRegistry};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Serve mock MCP tools, prompts and resources from a YAML file", long_about = None)]
struct Cli {
    /// Path to the YAML configuration
    #[arg(short, long, env = "MCP_MOCK_CONFIG", default_value = "mock.yaml")]
    config: PathBuf,

    /// Override `server.host`
    #[arg(long)]
    host: Option<String>,

    /// Override `server.port`
    #[arg(long)]
    port: Option<u16>,

    /// Override `server.transport`
    #[arg(long, value_enum)]
    transport: Option<Transport>,

    /// Load and register everything, then exit without serving
    #[arg(long)]
    check: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Transport {
    Sse,
    StreamableHttp,
    Stdio,
}

impl From<Transport> for TransportKind {
    fn from(transport: Transport) -> Self {
        match transport {
            Transport::Sse => TransportKind::Sse,
            Transport::StreamableHttp => TransportKind::StreamableHttp,
            Transport::Stdio => TransportKind::Stdio,
        }
    }
}

fn main() -> ExitCode {
    // stdout carries protocol traffic under the stdio transport
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), McpError> {
    let mut config = Config::from_file(&cli.config)?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(transport) = cli.transport {
        config.server.transport = transport.into();
    }

    info!(
        "Loaded config: {} v{}",
        config.manifest.name, config.manifest.version
    );

    let config = Arc::new(config);
    let mut server = McpServer::new(&config.manifest.name, &config.manifest.version)
        .with_instructions(&config.manifest.description);
    MockRegistry::new(Arc::clone(&config)).register_all(&mut server)?;

    if cli.check {
        info!(
            "Config OK: {} tools, {} prompts, {} resources",
            config.tools.len(),
            config.prompts.len(),
            config.resources.len()
        );
        return Ok(());
    }

    server.start(&config.server)
}
