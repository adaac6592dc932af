//! content-dispatch - fire repository-dispatch events from the command line
//!
//! Builds the same handler a content host would use, feeds it the records
//! given on the command line, and drains the sends before exiting.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use content_dispatch::{
    app::App,
    cli::{Cli, Command},
    config::Config,
    core::{ContentEvent, ContentRecord, Notification},
};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            tracing_subscriber::fmt().init();
            error!("Failed to load configuration: {}", err);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log_level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("content-dispatch starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Owner: {}", config.github.owner);
    info!("Repo: {}", config.github.repo);
    info!(
        "Token: {}",
        if config.github.token.trim().is_empty() {
            "Not configured"
        } else {
            "Configured"
        }
    );
    info!("API Base URL: {}", config.github.api_base_url);
    info!("User-Agent: {}", config.github.user_agent);
    match config.dispatch.timeout_seconds {
        Some(secs) => info!("Request Timeout: {}s", secs),
        None => info!("Request Timeout: transport default"),
    }
    info!("Drain Timeout: {}s", config.dispatch.drain_timeout_seconds);
    info!("-------------------------------------------------------");

    let notification = notification_from(&cli.command).await?;

    let mut builder = App::builder(config);
    if let Some(path) = &cli.config {
        let overrides = cli.clone();
        builder = builder.config_file(path.clone(), move |p| {
            Ok(Config::figment(p).merge(overrides.clone()).extract()?)
        });
    }
    let app = builder.build().await?;

    app.handler().handle(notification);

    let report = app.shutdown().await;
    if report.abandoned > 0 {
        warn!("{} dispatches did not finish before exit", report.abandoned);
    }
    info!("content-dispatch finished.");
    Ok(())
}

async fn notification_from(command: &Command) -> Result<Notification> {
    let (event, records) = match command {
        Command::Send {
            event,
            id,
            name,
            content_type,
            update_date,
        } => {
            let record = ContentRecord::new(
                *id,
                name.clone(),
                content_type.clone(),
                update_date.unwrap_or_else(Utc::now),
            );
            (*event, vec![record])
        }
        Command::Replay { event, file } => (*event, read_records(file.as_ref()).await?),
    };

    Ok(match event {
        ContentEvent::Published => Notification::ContentPublished(records),
        ContentEvent::Unpublished => Notification::ContentUnpublished(records),
    })
}

async fn read_records(file: Option<&PathBuf>) -> Result<Vec<ContentRecord>> {
    let raw = match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };
    serde_json::from_str(&raw).context("records must be a JSON array of content records")
}
