//! Background scheduling of sync invocations.
//!
//! The scheduler owns two kinds of work, each identified by a work name:
//!
//! - the periodic job, of which at most one is registered; registering a
//!   new one replaces the old
//! - the manual job started by [`SyncScheduler::sync_now`]; while one is in
//!   flight further requests are dropped
//!
//! Both wait for the network constraint before running and retry
//! transient failures with exponential backoff. Engine invocations run on
//! the blocking pool since the engine is synchronous.

use crate::config::{RetryConfig, SchedulerConfig};
use crate::engine::{SyncJob, SyncResult};
use crate::error::SyncOutcome;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, error, info, warn};

/// Work name of the periodic job.
pub const PERIODIC_WORK: &str = "favorites_sync_periodic";
/// Work name of the manual job.
pub const MANUAL_WORK: &str = "favorites_sync_now";

/// Connectivity as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkType {
    /// No connectivity.
    Unavailable,
    /// Connected over a metered link (cellular).
    Metered,
    /// Connected over an unmetered link (Wi-Fi, ethernet).
    Unmetered,
}

impl NetworkType {
    /// Returns true if this network satisfies the constraint.
    pub fn satisfies(self, only_wifi: bool) -> bool {
        match self {
            NetworkType::Unavailable => false,
            NetworkType::Metered => !only_wifi,
            NetworkType::Unmetered => true,
        }
    }
}

/// Reports the current network type.
pub trait NetworkMonitor: Send + Sync {
    /// Returns the current connectivity.
    fn current(&self) -> NetworkType;
}

/// A network monitor that reports whatever it was last told.
#[derive(Debug)]
pub struct StaticNetwork {
    network: RwLock<NetworkType>,
}

impl StaticNetwork {
    /// Creates a monitor reporting `network`.
    pub fn new(network: NetworkType) -> Self {
        Self {
            network: RwLock::new(network),
        }
    }

    /// Changes the reported network.
    pub fn set(&self, network: NetworkType) {
        *self.network.write() = network;
    }
}

impl NetworkMonitor for StaticNetwork {
    fn current(&self) -> NetworkType {
        *self.network.read()
    }
}

/// Latest scheduler activity, published through [`SyncScheduler::subscribe`].
#[derive(Debug, Clone, PartialEq)]
pub enum SyncStatus {
    /// Nothing has run yet.
    Idle,
    /// A job is waiting for the network constraint.
    WaitingForNetwork {
        /// Work name.
        work: &'static str,
    },
    /// A job is running the engine.
    Running {
        /// Work name.
        work: &'static str,
        /// Attempt number, starting at 1.
        attempt: u32,
    },
    /// A transient failure will be retried after `delay`.
    Retrying {
        /// Work name.
        work: &'static str,
        /// The attempt about to start.
        attempt: u32,
        /// Backoff before the attempt.
        delay: Duration,
    },
    /// A job finished successfully (fully or partially).
    Succeeded {
        /// Work name.
        work: &'static str,
        /// The engine's summary.
        result: SyncResult,
    },
    /// A job gave up.
    Failed {
        /// Work name.
        work: &'static str,
        /// Error message.
        message: String,
        /// Whether the last error was transient.
        retryable: bool,
    },
    /// The network constraint never held inside the flex window.
    Skipped {
        /// Work name.
        work: &'static str,
    },
}

/// What to do when work with the same name is already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExistingWork {
    Replace,
    Keep,
}

/// State shared with spawned jobs.
struct Worker {
    job: Arc<dyn SyncJob>,
    network: Arc<dyn NetworkMonitor>,
    status: watch::Sender<SyncStatus>,
    skipped: AtomicU64,
}

impl Worker {
    fn publish(&self, status: SyncStatus) {
        self.status.send_replace(status);
    }

    /// Waits until the network satisfies the constraint.
    ///
    /// Returns false if `deadline` passes first. With `announce` unset the
    /// wait is not published, leaving the previous status in place.
    async fn wait_for_network(
        &self,
        work: &'static str,
        only_wifi: bool,
        poll: Duration,
        deadline: Option<Instant>,
        announce: bool,
    ) -> bool {
        let mut announced = !announce;
        loop {
            if self.network.current().satisfies(only_wifi) {
                return true;
            }
            let now = Instant::now();
            if deadline.is_some_and(|d| now >= d) {
                return false;
            }
            if !announced {
                debug!(work, only_wifi, "waiting for network");
                self.publish(SyncStatus::WaitingForNetwork { work });
                announced = true;
            }
            let next = now + poll;
            sleep_until(deadline.map_or(next, |d| next.min(d))).await;
        }
    }

    /// Runs the job once on the blocking pool.
    async fn run_blocking(&self) -> Option<SyncOutcome<SyncResult>> {
        let job = Arc::clone(&self.job);
        match tokio::task::spawn_blocking(move || job.run()).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!(error = %e, "sync job panicked");
                None
            }
        }
    }

    /// Runs the job, retrying transient failures.
    async fn run_with_retry(&self, work: &'static str, retry: &RetryConfig) {
        let attempts = retry.max_attempts.max(1);
        for attempt in 0..attempts {
            let delay = retry.backoff_before(attempt);
            if !delay.is_zero() {
                self.publish(SyncStatus::Retrying {
                    work,
                    attempt: attempt + 1,
                    delay,
                });
                sleep(delay).await;
            }

            self.publish(SyncStatus::Running {
                work,
                attempt: attempt + 1,
            });
            let outcome = match self.run_blocking().await {
                Some(outcome) => outcome,
                None => {
                    self.publish(SyncStatus::Failed {
                        work,
                        message: "sync job panicked".into(),
                        retryable: false,
                    });
                    return;
                }
            };

            match outcome {
                Ok(result) => {
                    info!(work, message = %result.message, "sync finished");
                    self.publish(SyncStatus::Succeeded { work, result });
                    return;
                }
                Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                    warn!(work, attempt = attempt + 1, error = %e, "sync failed, will retry");
                }
                Err(e) => {
                    if e.is_permission_denied() {
                        error!(work, error = %e, "sync rejected by server; check credentials");
                    } else {
                        warn!(work, error = %e, "sync failed");
                    }
                    self.publish(SyncStatus::Failed {
                        work,
                        message: e.to_string(),
                        retryable: e.is_retryable(),
                    });
                    return;
                }
            }
        }
    }

    /// The periodic registration: one run per interval inside the flex window.
    async fn periodic(self: Arc<Self>, config: SchedulerConfig) {
        let interval = config.interval();
        let flex = config.flex();
        let mut period_start = Instant::now();
        // Keeps `Skipped` visible while the constraint stays unmet.
        let mut skipped_last = false;
        loop {
            let window_start = period_start + (interval - flex);
            let period_end = period_start + interval;
            sleep_until(window_start).await;

            let ready = self
                .wait_for_network(
                    PERIODIC_WORK,
                    config.only_wifi,
                    config.constraint_poll,
                    Some(period_end),
                    !skipped_last,
                )
                .await;
            skipped_last = !ready;
            if ready {
                self.run_with_retry(PERIODIC_WORK, &config.retry).await;
            } else {
                let skipped = self.skipped.fetch_add(1, Ordering::Relaxed) + 1;
                info!(
                    work = PERIODIC_WORK,
                    skipped, "network constraint not met, skipping period"
                );
                self.publish(SyncStatus::Skipped {
                    work: PERIODIC_WORK,
                });
            }

            sleep_until(period_end).await;
            period_start = period_end;
        }
    }

    /// The manual job: waits for the network without a deadline.
    async fn manual(self: Arc<Self>, config: SchedulerConfig) {
        if self
            .wait_for_network(MANUAL_WORK, config.only_wifi, config.constraint_poll, None, true)
            .await
        {
            self.run_with_retry(MANUAL_WORK, &config.retry).await;
        }
    }
}

/// Schedules periodic and on-demand sync.
///
/// # Example
///
/// ```no_run
/// # use favsync_engine::{SyncScheduler, SyncJob, NetworkMonitor};
/// # use std::sync::Arc;
/// # fn demo(job: Arc<dyn SyncJob>, network: Arc<dyn NetworkMonitor>) {
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// let scheduler = SyncScheduler::new(job, network, runtime.handle().clone());
/// scheduler.start(6, true).unwrap();
/// scheduler.sync_now();
/// # }
/// ```
pub struct SyncScheduler {
    worker: Arc<Worker>,
    runtime: Handle,
    config: RwLock<SchedulerConfig>,
    jobs: Mutex<HashMap<&'static str, JoinHandle<()>>>,
}

impl SyncScheduler {
    /// Creates a scheduler with nothing registered.
    pub fn new(job: Arc<dyn SyncJob>, network: Arc<dyn NetworkMonitor>, runtime: Handle) -> Self {
        let (status, _) = watch::channel(SyncStatus::Idle);
        Self {
            worker: Arc::new(Worker {
                job,
                network,
                status,
                skipped: AtomicU64::new(0),
            }),
            runtime,
            config: RwLock::new(SchedulerConfig::default().with_enabled(false)),
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Registers periodic sync, replacing any previous registration.
    ///
    /// Retry and poll settings of the current configuration are kept.
    pub fn start(&self, interval_hours: u32, only_wifi: bool) -> SyncOutcome<()> {
        let mut config = self.config();
        config.interval_hours = interval_hours;
        config.only_wifi = only_wifi;
        config.enabled = true;
        self.configure(config)
    }

    /// Applies a full configuration.
    ///
    /// An enabled configuration (re)registers the periodic job; a disabled
    /// one cancels it. The configuration is stored either way.
    pub fn configure(&self, config: SchedulerConfig) -> SyncOutcome<()> {
        config.validate()?;
        *self.config.write() = config.clone();

        if config.enabled {
            info!(
                interval_hours = config.interval_hours,
                only_wifi = config.only_wifi,
                "registering periodic sync"
            );
            let worker = Arc::clone(&self.worker);
            self.enqueue(PERIODIC_WORK, ExistingWork::Replace, worker.periodic(config));
        } else {
            self.cancel(PERIODIC_WORK);
        }
        Ok(())
    }

    /// Cancels periodic sync. A manual job in flight keeps running.
    pub fn stop(&self) {
        self.config.write().enabled = false;
        if self.cancel(PERIODIC_WORK) {
            info!("periodic sync stopped");
        }
    }

    /// Registers periodic sync again with the stored configuration.
    pub fn restart(&self) -> SyncOutcome<()> {
        let config = self.config().with_enabled(true);
        self.configure(config)
    }

    /// Requests an immediate sync.
    ///
    /// Returns false if a manual sync is already in flight; that one is kept.
    pub fn sync_now(&self) -> bool {
        let config = self.config();
        let worker = Arc::clone(&self.worker);
        let queued = self.enqueue(MANUAL_WORK, ExistingWork::Keep, worker.manual(config));
        if !queued {
            debug!(work = MANUAL_WORK, "manual sync already in flight");
        }
        queued
    }

    /// Returns true if periodic sync is registered.
    pub fn is_active(&self) -> bool {
        self.jobs
            .lock()
            .get(PERIODIC_WORK)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Returns the stored configuration.
    pub fn config(&self) -> SchedulerConfig {
        self.config.read().clone()
    }

    /// Returns how many periods were skipped because the network
    /// constraint never held inside the flex window.
    pub fn skipped_periods(&self) -> u64 {
        self.worker.skipped.load(Ordering::Relaxed)
    }

    /// Returns a receiver of the latest [`SyncStatus`].
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.worker.status.subscribe()
    }

    fn enqueue<F>(&self, work: &'static str, policy: ExistingWork, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut jobs = self.jobs.lock();
        if let Some(existing) = jobs.get(work) {
            if !existing.is_finished() {
                match policy {
                    ExistingWork::Keep => return false,
                    ExistingWork::Replace => existing.abort(),
                }
            }
        }
        jobs.insert(work, self.runtime.spawn(task));
        true
    }

    fn cancel(&self, work: &'static str) -> bool {
        match self.jobs.lock().remove(work) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.jobs.lock().drain() {
            handle.abort();
        }
    }
}
