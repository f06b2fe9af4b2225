use std::error::Error;
use std::sync::Arc;

use chat_presence::api;
use chat_presence::clock::SystemClock;
use chat_presence::config::{self, AppConfig};
use chat_presence::presence::{PresenceEngine, Sweeper};
use chat_presence::storage::{self, Database};
use clap::Parser;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;

#[derive(Parser)]
#[command(
    name = "chat_presence",
    version,
    about = "Poll-based chat backend with participant presence tracking"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Port to listen on (overrides config and PORT)
    #[arg(long)]
    port: Option<u16>,
    /// SQLite file holding participants and messages
    #[arg(long, value_name = "FILE")]
    database: Option<String>,
    /// Keep everything in memory; nothing survives a restart
    #[arg(long, conflicts_with = "database")]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config);
    app_config.apply_env();
    if let Some(port) = cli.port {
        app_config.port = port;
    }
    if let Some(database) = cli.database {
        app_config.database_path = database;
    }

    let db = Arc::new(open_database(&app_config, cli.in_memory)?);
    let engine = Arc::new(PresenceEngine::open(db, Arc::new(SystemClock))?);
    match engine.message_count() {
        Ok(count) => log::info!("Message log holds {count} entries"),
        Err(err) => log::warn!("Could not count messages: {err}"),
    }

    let sweeper = Sweeper::new(Arc::clone(&engine), app_config.sweep_interval()).spawn();

    let listener = TcpListener::bind(app_config.bind_addr()).await?;
    log::info!("HTTP: listening on {}", listener.local_addr()?);

    axum::serve(listener, api::router(engine))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.stop().await;
    log::info!("Server stopped");
    Ok(())
}

fn open_database(app_config: &AppConfig, in_memory: bool) -> Result<Database, Box<dyn Error>> {
    if in_memory {
        log::info!("SQLite: in memory");
        return Ok(Database::in_memory()?);
    }

    storage::ensure_parent_dir(&app_config.database_path)?;
    log::info!("SQLite: {}", app_config.database_path);
    Ok(Database::new(&app_config.database_path)?)
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    log::info!("Received shutdown signal, stopping...");
}
