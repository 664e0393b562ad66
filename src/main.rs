//! Binary entry point for music-library.
//!
//! This binary serves the HTTP API and manages the song table schema.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow option_if_let_else for environment variable fallback chains
#![allow(clippy::option_if_let_else)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use music_library::config::{LibraryConfig, StorageBackend, parse_bind_addr};
use music_library::observability::{self, ObservabilityConfig};
use music_library::{PostgresSongStore, api};
use std::path::Path;
use std::process::ExitCode;

/// Music library - songs and lyrics over HTTP.
#[derive(Parser)]
#[command(name = "music-library")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server.
    Serve {
        /// Listen address or bare port (overrides config).
        #[arg(short, long)]
        bind: Option<String>,

        /// Serve the demo metadata source at `/info`.
        #[arg(long)]
        mock_info: bool,
    },

    /// Apply or roll back the song table schema.
    Migrate {
        /// Drop the song table and its migration history.
        #[arg(long)]
        down: bool,
    },

    /// Manage configuration.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is the normal case.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    let mut observability_config =
        ObservabilityConfig::from_settings(&config.observability, cli.verbose);
    observability_config.metrics.enabled &= matches!(cli.command, Commands::Serve { .. });

    if let Err(e) = observability::init(&observability_config) {
        eprintln!("Failed to initialize observability: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
async fn run_command(command: Commands, config: LibraryConfig) -> anyhow::Result<()> {
    match command {
        Commands::Serve { bind, mock_info } => cmd_serve(config, bind.as_deref(), mock_info).await,
        Commands::Migrate { down } => cmd_migrate(&config, down).await,
        Commands::Config { show } => {
            cmd_config(&config, show);
            Ok(())
        },
    }
}

/// Loads configuration from `--config`, `MUSIC_LIBRARY_CONFIG_PATH` or the
/// default locations, then applies environment overrides.
fn load_config(path: Option<&str>) -> anyhow::Result<LibraryConfig> {
    let base = if let Some(config_path) = path {
        LibraryConfig::load_from_file(Path::new(config_path))?
    } else if let Some(config_path) = std::env::var("MUSIC_LIBRARY_CONFIG_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
    {
        LibraryConfig::load_from_file(Path::new(&config_path))?
    } else {
        LibraryConfig::load_default()?
    };

    let config = base.with_env_overrides();
    config.validate()?;
    Ok(config)
}

async fn cmd_serve(
    mut config: LibraryConfig,
    bind: Option<&str>,
    mock_info: bool,
) -> anyhow::Result<()> {
    if let Some(bind) = bind {
        config = config.with_bind_addr(parse_bind_addr(bind)?);
    }
    config.server.mock_info |= mock_info;

    api::serve(&config).await?;
    Ok(())
}

async fn cmd_migrate(config: &LibraryConfig, down: bool) -> anyhow::Result<()> {
    if config.database.backend != StorageBackend::Postgres {
        bail!(
            "migrations need the postgres backend (configured: {})",
            config.database.backend.as_str()
        );
    }

    let store = PostgresSongStore::new(&config.database)
        .context("failed to configure the PostgreSQL pool")?;

    if down {
        store.migration_runner().rollback().await?;
        println!("Dropped table '{}'", store.table_name());
    } else {
        let applied = store.run_migrations().await?;
        let version = store.migration_runner().current_version().await?;
        println!(
            "Applied {applied} migration(s) to '{}' (schema version {version})",
            store.table_name()
        );
    }
    Ok(())
}

fn cmd_config(config: &LibraryConfig, show: bool) {
    if !show {
        println!("Use --show to display current configuration");
        return;
    }

    let redacted = |set: bool| if set { "<redacted>" } else { "(not set)" };
    let or_unset = |value: Option<&str>| value.unwrap_or("(not set)").to_string();

    println!("Current Configuration");
    println!("=====================");
    println!();
    println!("[server]");
    println!("  Bind Address: {}", config.server.bind_addr);
    println!("  Mock Info: {}", config.server.mock_info);
    println!();
    println!("[database]");
    println!("  Backend: {}", config.database.backend.as_str());
    println!("  URL: {}", redacted(config.database.url.is_some()));
    println!("  Host: {}", or_unset(config.database.host.as_deref()));
    println!(
        "  Port: {}",
        config
            .database
            .port
            .map_or_else(|| "(not set)".to_string(), |p| p.to_string())
    );
    println!("  User: {}", or_unset(config.database.user.as_deref()));
    println!("  Password: {}", redacted(config.database.password.is_some()));
    println!("  Database: {}", or_unset(config.database.dbname.as_deref()));
    println!("  Table: {}", config.database.table_name);
    println!("  Pool Max Size: {}", config.database.pool_max_size);
    println!();
    println!("[enrichment]");
    println!("  URL: {}", or_unset(config.enrichment.url.as_deref()));
    println!("  Timeout: {}s", config.enrichment.timeout.as_secs());
    println!("  Max Attempts: {}", config.enrichment.max_attempts);
    println!();
    println!("[observability]");
    println!(
        "  Log Format: {}",
        or_unset(config.observability.logging.format.as_deref())
    );
    println!(
        "  Log Filter: {}",
        or_unset(config.observability.logging.filter.as_deref())
    );
    println!(
        "  Log File: {}",
        config
            .observability
            .logging
            .file
            .as_ref()
            .map_or_else(|| "(not set)".to_string(), |p| p.display().to_string())
    );
    println!("  Metrics Enabled: {}", config.observability.metrics.enabled);
}
