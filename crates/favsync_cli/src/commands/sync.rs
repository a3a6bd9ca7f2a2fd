//! One-shot sync commands: pull, push, sync, status and reset-cursor.

use super::open_engine;
use crate::settings::Settings;
use favsync_engine::SyncResult;
use favsync_store::{CursorStore, DataDir, LocalFavoritesStore};
use serde::Serialize;

/// Which phases to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Pull only.
    Pull,
    /// Push only.
    Push,
    /// Pull, then push.
    Both,
}

/// Summary printed by the sync commands.
#[derive(Debug, Serialize)]
struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    server_timestamp: Option<String>,
    added: usize,
    updated: usize,
    removed: usize,
    pushed: usize,
    partial: bool,
    message: String,
}

impl From<SyncResult> for Report {
    fn from(result: SyncResult) -> Self {
        Self {
            server_timestamp: result.server_timestamp,
            added: result.favorites_added,
            updated: result.favorites_updated,
            removed: result.favorites_removed,
            pushed: result.pushed,
            partial: result.partial,
            message: result.message,
        }
    }
}

/// Runs pull, push or a full sync once.
pub fn run(
    dir: &DataDir,
    settings: &Settings,
    phase: Phase,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = dir.lock_sync()?;
    let engine = open_engine(dir, settings)?;
    let user_id = settings.require_user_id()?;

    let report = match phase {
        Phase::Pull => {
            let summary = engine.pull(user_id)?;
            Report {
                message: format!(
                    "Pulled: {} added, {} updated, {} removed",
                    summary.added, summary.updated, summary.removed
                ),
                server_timestamp: summary.server_timestamp,
                added: summary.added,
                updated: summary.updated,
                removed: summary.removed,
                pushed: 0,
                partial: false,
            }
        }
        Phase::Push => {
            let summary = engine.push(user_id)?;
            Report {
                server_timestamp: None,
                added: 0,
                updated: 0,
                removed: 0,
                pushed: summary.pushed,
                partial: false,
                message: format!("Pushed {} favorites", summary.pushed),
            }
        }
        Phase::Both => engine.sync(user_id)?.into(),
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => {
            let mark = if report.partial { "!" } else { "✓" };
            println!("{mark} {}", report.message);
            if let Some(ts) = &report.server_timestamp {
                println!("  Cursor: {ts}");
            }
        }
    }
    Ok(())
}

/// Runs the status command.
pub fn status(dir: &DataDir, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let favorites = dir.favorites()?.count()?;
    let cursor = dir.cursor().get()?;

    println!("Data directory: {}", dir.path().display());
    println!("  Server: {}", settings.server_url.as_deref().unwrap_or("(not set)"));
    println!("  User: {}", settings.user_id.as_deref().unwrap_or("(not set)"));
    println!("  Favorites: {favorites}");
    println!("  Cursor: {}", cursor.as_deref().unwrap_or("(never synced)"));
    println!(
        "  Schedule: every {}h, {}, {}",
        settings.schedule.interval_hours,
        if settings.schedule.only_wifi { "wifi only" } else { "any network" },
        if settings.schedule.enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

/// Clears the cursor so the next pull fetches everything.
pub fn reset_cursor(dir: &DataDir) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = dir.lock_sync()?;
    dir.cursor().clear()?;
    println!("✓ Cursor cleared; the next sync performs a full pull");
    Ok(())
}
