//! Summary manager MCP server - main entry point.
//!
//! Speaks newline-delimited JSON-RPC on stdin/stdout. Logs go to stderr.
//! Configuration comes from flags or the matching environment variables.

use clap::{Parser, Subcommand, ValueEnum};
use std::process::ExitCode;
use std::time::Duration;

use summary_manager::ipc::{Dispatcher, Session, StdioServer};
use summary_manager::prompts::PromptCatalog;
use summary_manager::storage::{bootstrap_schema, build_store, schema_sql};
use summary_manager::tools::{register_summary_tools, ToolRegistry};
use summary_manager::types::{IpcConfig, ObservabilityConfig, StoreBackend, StoreConfig};
use summary_manager::Config;

#[derive(Parser, Debug)]
#[command(name = "summary-manager")]
#[command(about = "MCP server for saving and loading conversation summaries")]
#[command(version)]
struct Args {
    /// Base URL of the PostgREST/Supabase store
    #[arg(long, env = "SUPABASE_URL", default_value = "")]
    url: String,

    /// Store access key
    #[arg(long, env = "SUPABASE_KEY", default_value = "", hide_env_values = true)]
    key: String,

    /// Client token bound as the caller identity for this process
    #[arg(long, env = "MCP_CLIENT_ID", default_value = "")]
    client_id: String,

    /// Table holding summary rows
    #[arg(long, env = "SUMMARY_TABLE", default_value = "conversation_summaries")]
    table: String,

    /// Store backend
    #[arg(long, env = "SUMMARY_STORE_BACKEND", value_enum, default_value_t = Backend::Postgrest)]
    backend: Backend,

    /// Per-request timeout for store calls (e.g. "10s", "500ms")
    #[arg(
        long,
        env = "SUMMARY_REQUEST_TIMEOUT",
        default_value = "10s",
        value_parser = humantime_serde::re::humantime::parse_duration
    )]
    request_timeout: Duration,

    /// Largest accepted request line in bytes
    #[arg(long, env = "SUMMARY_MAX_FRAME_BYTES", default_value_t = 4 * 1024 * 1024)]
    max_frame_bytes: usize,

    /// Log output format
    #[arg(long, env = "SUMMARY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the SQL the store table needs and exit
    PrintSchema,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Backend {
    Postgrest,
    Memory,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogFormat {
    Text,
    Json,
}

impl Args {
    fn into_config(self) -> Config {
        Config {
            client_id: self.client_id,
            store: StoreConfig {
                backend: match self.backend {
                    Backend::Postgrest => StoreBackend::Postgrest,
                    Backend::Memory => StoreBackend::Memory,
                },
                url: self.url,
                api_key: self.key,
                table: self.table,
                request_timeout: self.request_timeout,
                ..StoreConfig::default()
            },
            observability: ObservabilityConfig {
                json_logs: matches!(self.log_format, LogFormat::Json),
            },
            ipc: IpcConfig {
                max_frame_bytes: self.max_frame_bytes,
            },
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let mut args = Args::parse();

    if let Some(Command::PrintSchema) = args.command.take() {
        println!("{}", schema_sql(&args.table));
        return ExitCode::SUCCESS;
    }

    let config = args.into_config();
    if let Err(e) = config.validate() {
        eprintln!("summary-manager: {}", e);
        return ExitCode::from(2);
    }

    summary_manager::observability::init_tracing(config.observability.json_logs);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "summary manager stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = build_store(&config.store)?;

    let state = bootstrap_schema(&*store, &schema_sql(&config.store.table)).await?;
    tracing::info!(
        backend = ?config.store.backend,
        table = %config.store.table,
        schema = ?state,
        "store ready"
    );

    let mut tools = ToolRegistry::new();
    register_summary_tools(&mut tools, store)?;

    let dispatcher = Dispatcher::new(tools, PromptCatalog::new());
    let session = Session::from_config(&config)?;
    let server = StdioServer::new(dispatcher, session, config.ipc.clone());

    let cancel = server.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received");
            cancel.cancel();
        }
    });

    server.serve_stdio().await?;
    Ok(())
}
