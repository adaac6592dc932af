//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the operator binary
//! using the `clap` crate. Global flags are merged over the configuration file
//! and environment variables through the `figment::Provider` impl below.

use crate::core::ContentEvent;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use figment::{
    value::{Dict, Map, Tag, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Sends repository-dispatch events for published or unpublished content.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (overrides `log_level`).
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Repository owner (overrides `github.owner`).
    #[arg(long, global = true)]
    pub owner: Option<String>,

    /// Repository name (overrides `github.repo`).
    #[arg(long, global = true)]
    pub repo: Option<String>,

    /// API token (overrides `github.token`).
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// API base URL (overrides `github.api_base_url`).
    #[arg(long, value_name = "URL", global = true)]
    pub api_base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Dispatch a single content record described by flags.
    Send {
        /// `published` or `unpublished`.
        #[arg(long, default_value = "published")]
        event: ContentEvent,
        #[arg(long)]
        id: i64,
        #[arg(long)]
        name: String,
        /// The content type alias.
        #[arg(long)]
        content_type: String,
        /// RFC 3339 update timestamp; defaults to now.
        #[arg(long)]
        update_date: Option<DateTime<Utc>>,
    },
    /// Dispatch a JSON array of content records read from a file or stdin.
    Replay {
        #[arg(long, default_value = "published")]
        event: ContentEvent,
        /// JSON file with records; stdin when omitted.
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        let mut github = Dict::new();
        for (key, value) in [
            ("owner", &self.owner),
            ("repo", &self.repo),
            ("token", &self.token),
            ("api_base_url", &self.api_base_url),
        ] {
            if let Some(value) = value {
                github.insert(key.into(), Value::from(value.clone()));
            }
        }
        if !github.is_empty() {
            dict.insert("github".into(), Value::Dict(Tag::Default, github));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
