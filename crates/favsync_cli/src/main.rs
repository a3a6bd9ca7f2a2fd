//! favsync CLI
//!
//! Command-line client for offline-first favorites sync.
//!
//! # Commands
//!
//! - `add` / `remove` / `list` - Manage local favorites (no network)
//! - `pull` / `push` / `sync` - Run sync phases once
//! - `status` - Show local state and settings
//! - `reset-cursor` - Force a full pull on the next sync
//! - `watch` - Run periodic sync until interrupted
//! - `config` - Show or change stored settings

mod commands;
mod http;
mod settings;

use clap::{Parser, Subcommand, ValueEnum};
use commands::config::SettingsUpdate;
use commands::sync::Phase;
use favsync_model::PointOfInterest;
use favsync_store::DataDir;
use settings::{FallbackSetting, Settings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Offline-first favorites sync client.
#[derive(Parser)]
#[command(name = "favsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data directory
    #[arg(global = true, short, long, default_value = ".favsync")]
    data_dir: PathBuf,

    /// Backend base URL (overrides the stored setting)
    #[arg(global = true, long)]
    server_url: Option<String>,

    /// User id (overrides the stored setting)
    #[arg(global = true, short, long)]
    user: Option<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Favorite a place locally
    Add {
        /// Point of interest id
        poi_id: String,

        /// Place name
        #[arg(short, long, default_value = "")]
        name: String,

        /// Description
        #[arg(long)]
        description: Option<String>,

        /// Category
        #[arg(short, long)]
        category: Option<String>,

        /// Street address
        #[arg(long)]
        address: Option<String>,

        /// Latitude
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Rating
        #[arg(short, long)]
        rating: Option<f64>,

        /// Image URL (repeatable; the first one is kept)
        #[arg(long = "image")]
        images: Vec<String>,
    },

    /// Unfavorite a place locally
    Remove {
        /// Point of interest id
        poi_id: String,
    },

    /// List local favorites
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Download changes from the backend
    Pull {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Upload all local favorites
    Push {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Pull, then push
    Sync {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show local state and settings
    Status,

    /// Forget the sync cursor so the next pull fetches everything
    ResetCursor,

    /// Run periodic sync until interrupted
    Watch {
        /// Treat the network as metered
        #[arg(long)]
        metered: bool,

        /// Sync once immediately
        #[arg(long)]
        now: bool,
    },

    /// Show or change stored settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the stored settings
    Show,

    /// Change stored settings (also saves --server-url and --user)
    Set {
        /// HTTP timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Hours between periodic syncs (1-24)
        #[arg(long)]
        interval_hours: Option<u32>,

        /// Only sync on unmetered networks
        #[arg(long)]
        only_wifi: Option<bool>,

        /// Enable periodic sync
        #[arg(long)]
        enabled: Option<bool>,

        /// Cursor policy when the server sends no timestamp
        #[arg(long, value_enum)]
        cursor_fallback: Option<FallbackArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FallbackArg {
    DeviceClock,
    KeepPrevious,
}

impl From<FallbackArg> for FallbackSetting {
    fn from(arg: FallbackArg) -> Self {
        match arg {
            FallbackArg::DeviceClock => FallbackSetting::DeviceClock,
            FallbackArg::KeepPrevious => FallbackSetting::KeepPrevious,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let dir = DataDir::open(&cli.data_dir)?;
    let mut settings = Settings::load(&dir.config_path())?;
    if let Some(url) = &cli.server_url {
        settings.server_url = Some(url.clone());
    }
    if let Some(user) = &cli.user {
        settings.user_id = Some(user.clone());
    }

    match cli.command {
        Commands::Add {
            poi_id,
            name,
            description,
            category,
            address,
            lat,
            lon,
            rating,
            images,
        } => {
            let user_id = settings.require_user_id()?;
            let poi = PointOfInterest {
                id: poi_id,
                name,
                description,
                category,
                address,
                lat,
                lon,
                rating,
                images,
            };
            commands::favorites::add(&dir, user_id, &poi)?;
        }
        Commands::Remove { poi_id } => {
            commands::favorites::remove(&dir, &poi_id)?;
        }
        Commands::List { format } => {
            commands::favorites::list(&dir, &format)?;
        }
        Commands::Pull { format } => {
            commands::sync::run(&dir, &settings, Phase::Pull, &format)?;
        }
        Commands::Push { format } => {
            commands::sync::run(&dir, &settings, Phase::Push, &format)?;
        }
        Commands::Sync { format } => {
            commands::sync::run(&dir, &settings, Phase::Both, &format)?;
        }
        Commands::Status => {
            commands::sync::status(&dir, &settings)?;
        }
        Commands::ResetCursor => {
            commands::sync::reset_cursor(&dir)?;
        }
        Commands::Watch { metered, now } => {
            commands::watch::run(&dir, &settings, metered, now)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&dir)?,
            ConfigAction::Set {
                timeout_secs,
                interval_hours,
                only_wifi,
                enabled,
                cursor_fallback,
            } => {
                let update = SettingsUpdate {
                    server_url: cli.server_url,
                    user_id: cli.user,
                    timeout_secs,
                    interval_hours,
                    only_wifi,
                    enabled,
                    cursor_fallback: cursor_fallback.map(Into::into),
                };
                commands::config::set(&dir, update)?;
            }
        },
        Commands::Version => {
            println!("favsync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
