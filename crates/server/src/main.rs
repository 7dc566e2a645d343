mod api;
mod cli;
mod metrics_store;
mod predict;
mod router;
mod startup;
mod state;

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Command};

fn load_config() -> director_core::Config {
    director_core::config::load_dotenv();
    director_core::Config::from_env()
}

async fn serve(config: &director_core::Config, workflows: Option<PathBuf>) -> anyhow::Result<()> {
    let loaded = startup::load_schedule(config, workflows)?;
    startup::log_schedule(&loaded.schedule);

    let state = startup::build_app_state(config, loaded)?;
    let app = router::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn print_schedule(config: &director_core::Config, workflows: Option<PathBuf>) -> anyhow::Result<()> {
    let loaded = startup::load_schedule(config, workflows)?;
    let out = serde_json::json!({
        "workflows": loaded.workflow_count,
        "schedule": loaded.schedule,
        "upcoming": loaded.schedule.upcoming(chrono::Utc::now()),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = load_config();

    match cli.command() {
        Command::Serve { workflows } => {
            config.log_summary();
            serve(&config, workflows).await
        }
        Command::Schedule { workflows } => print_schedule(&config, workflows),
    }
}
