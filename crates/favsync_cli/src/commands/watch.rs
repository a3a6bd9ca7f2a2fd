//! Watch command: run the scheduler until interrupted.

use super::open_engine;
use crate::settings::Settings;
use favsync_engine::{
    NetworkType, StaticNetwork, SyncError, SyncJob, SyncOutcome, SyncResult, SyncScheduler,
    SyncStatus,
};
use favsync_store::DataDir;
use std::sync::Arc;
use tracing::info;

/// Runs one sync against freshly opened stores.
///
/// Reopening per run picks up favorites added by other `favsync`
/// invocations while the daemon is running. Runs hold the directory's
/// sync lock, so periodic, manual and one-shot `favsync sync` runs take
/// turns.
struct DataDirJob {
    dir: DataDir,
    settings: Settings,
}

impl SyncJob for DataDirJob {
    fn run(&self) -> SyncOutcome<SyncResult> {
        let _lock = self.dir.lock_sync()?;
        let engine = open_engine(&self.dir, &self.settings)
            .map_err(|e| SyncError::InvalidConfig(e.to_string()))?;
        engine.sync_current_user()
    }
}

/// Runs the watch command.
pub fn run(
    dir: &DataDir,
    settings: &Settings,
    metered: bool,
    sync_now: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    settings.require_server_url()?;
    settings.require_user_id()?;
    let config = settings.scheduler_config();
    config.validate()?;

    let runtime = tokio::runtime::Runtime::new()?;
    let job = Arc::new(DataDirJob {
        dir: dir.clone(),
        settings: settings.clone(),
    });
    let network = if metered {
        NetworkType::Metered
    } else {
        NetworkType::Unmetered
    };
    let scheduler = SyncScheduler::new(
        job,
        Arc::new(StaticNetwork::new(network)),
        runtime.handle().clone(),
    );
    let mut status = scheduler.subscribe();

    scheduler.configure(config)?;
    if sync_now {
        scheduler.sync_now();
    }
    println!(
        "Watching {} (every {}h{}); press Ctrl-C to stop",
        dir.path().display(),
        settings.schedule.interval_hours,
        if settings.schedule.only_wifi { ", wifi only" } else { "" }
    );

    runtime.block_on(async {
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                changed = status.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    print_status(&status.borrow_and_update());
                }
            }
        }
    });

    info!("stopping scheduler");
    scheduler.stop();
    Ok(())
}

fn print_status(status: &SyncStatus) {
    match status {
        SyncStatus::Idle => {}
        SyncStatus::WaitingForNetwork { work } => println!("[{work}] waiting for network"),
        SyncStatus::Running { work, attempt } => println!("[{work}] syncing (attempt {attempt})"),
        SyncStatus::Retrying { work, attempt, delay } => {
            println!("[{work}] retrying in {}s (attempt {attempt})", delay.as_secs())
        }
        SyncStatus::Succeeded { work, result } => println!("[{work}] ✓ {}", result.message),
        SyncStatus::Failed { work, message, .. } => println!("[{work}] ✗ {message}"),
        SyncStatus::Skipped { work } => println!("[{work}] skipped: network constraint not met"),
    }
}
