//! plamo-scanner - scan bags and boxes into Notion
//!
//! Serves the HTTP/SSE control surface for a GUI shell and, with `--stdin`,
//! reads scans line by line from standard input.

use anyhow::{Context, Result};
use clap::Parser;
use plamo_common::config::{default_config_path, load_toml_config, read_toml_config};
use plamo_common::events::EventBus;
use plamo_scanner::config::{resolve_config, ConfigOverrides};
use plamo_scanner::notion::{NotionClient, NotionRepository};
use plamo_scanner::opener::{CommandOpener, EventOpener, PageOpener};
use plamo_scanner::{build_router, console, AppState, Scanner};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "plamo-scanner", version, about = "Scan bags and boxes into Notion")]
struct Args {
    /// Config file (default: <config dir>/plamo/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Notion integration token
    #[arg(long)]
    notion_api_key: Option<String>,

    /// Database holding bag records
    #[arg(long)]
    bag_database_id: Option<String>,

    /// Database holding box records
    #[arg(long)]
    box_database_id: Option<String>,

    /// Command that opens record URLs (e.g. xdg-open); without one, open
    /// requests go to SSE subscribers
    #[arg(long)]
    opener: Option<String>,

    /// HTTP bind host
    #[arg(long)]
    host: Option<String>,

    /// HTTP bind port
    #[arg(long)]
    port: Option<u16>,

    /// Log filter when RUST_LOG is unset (overrides the config file)
    #[arg(long)]
    log_level: Option<String>,

    /// Read scans from standard input
    #[arg(long)]
    stdin: bool,

    /// Do not serve HTTP (requires --stdin)
    #[arg(long, requires = "stdin")]
    no_server: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The log level may live in the config file, so peek at it before tracing exists
    let config_path = args.config.clone().or_else(default_config_path);
    let configured_level = config_path
        .as_deref()
        .filter(|p| p.exists())
        .and_then(|p| read_toml_config(p).ok())
        .map(|c| c.logging.level);
    let level = args
        .log_level
        .clone()
        .or(configured_level)
        .unwrap_or_else(|| "info".to_string());
    plamo_common::logging::init_tracing(&level);

    info!(
        "Starting plamo-scanner v{}",
        env!("CARGO_PKG_VERSION")
    );

    let toml_config = load_toml_config(config_path.as_deref())?;
    let overrides = ConfigOverrides {
        notion_api_key: args.notion_api_key,
        bag_database_id: args.bag_database_id,
        box_database_id: args.box_database_id,
        opener_command: args.opener,
        host: args.host,
        port: args.port,
    };
    let config = resolve_config(&toml_config, &overrides)?;

    let event_bus = EventBus::new(100);

    let client = NotionClient::with_base_url(config.notion_api_key.clone(), &config.notion_base_url)
        .context("Failed to create Notion client")?;
    let repository = NotionRepository::new(
        Arc::new(client),
        config.properties.bag_box_relation.clone(),
    );

    let opener: Arc<dyn PageOpener> = match &config.opener_command {
        Some(program) => {
            info!("Opening pages with `{}`", program);
            Arc::new(CommandOpener::new(program.clone()))
        }
        None => {
            info!("Opening pages through SSE subscribers");
            Arc::new(EventOpener::new(event_bus.clone()))
        }
    };

    let scanner = Scanner::new(
        repository,
        opener,
        event_bus.clone(),
        config.scanner_settings(),
    );

    if args.stdin {
        console::spawn_display_printer(&event_bus);
        let console_task = tokio::spawn(console::run_console(
            scanner.clone(),
            tokio::io::BufReader::new(tokio::io::stdin()),
        ));

        if args.no_server {
            info!("Reading scans from stdin");
            console_task.await??;
            return Ok(());
        }
    }

    let state = AppState::new(scanner, event_bus);
    let app = build_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
