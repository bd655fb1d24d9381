//! Proactive and on-demand session refresh.
//!
//! The scheduler owns the refresh cadence: one acquisition at startup, a
//! periodic timer thereafter, and a lazy trigger consumers can fire when a
//! read finds the store expired. All paths funnel through the store's
//! refresh slot, so overlapping triggers collapse into one acquisition.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use tokio::{
    sync::{Mutex, Notify},
    task::JoinHandle,
    time::timeout,
};
use tracing::{debug, error, info, warn};

use crate::{
    acquirer::CredentialAcquirer,
    error::AcquireError,
    snapshot::now_ms,
    store::SessionStore,
};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Cadence of proactive refreshes, measured from the end of the previous
    /// attempt.
    pub refresh_interval: Duration,
    /// Hard ceiling on one acquisition attempt.
    pub acquire_ceiling: Duration,
    /// Consecutive login rejections before escalating to an error-level
    /// alert.
    pub rejection_alert_threshold: u32,
}

impl From<&sessmux_config::SessionConfig> for SchedulerConfig {
    fn from(cfg: &sessmux_config::SessionConfig) -> Self {
        Self {
            refresh_interval: Duration::from_secs(cfg.refresh_interval_secs),
            acquire_ceiling: Duration::from_millis(cfg.acquire_timeout_ms),
            rejection_alert_threshold: cfg.rejection_alert_threshold,
        }
    }
}

pub struct RefreshScheduler {
    store: Arc<SessionStore>,
    acquirer: Arc<CredentialAcquirer>,
    config: SchedulerConfig,
    wake: Notify,
    timer_handle: Mutex<Option<JoinHandle<()>>>,
    consecutive_rejections: AtomicU32,
}

impl RefreshScheduler {
    pub fn new(
        store: Arc<SessionStore>,
        acquirer: Arc<CredentialAcquirer>,
        config: SchedulerConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            acquirer,
            config,
            wake: Notify::new(),
            timer_handle: Mutex::new(None),
            consecutive_rejections: AtomicU32::new(0),
        })
    }

    /// Run the startup acquisition, then spawn the periodic refresh loop.
    pub async fn start(self: &Arc<Self>) {
        info!(
            refresh_interval_secs = self.config.refresh_interval.as_secs(),
            "refresh scheduler starting"
        );
        self.refresh_now().await;

        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            scheduler.run_loop().await;
        });
        *self.timer_handle.lock().await = Some(handle);
    }

    /// Stop the refresh loop, abandoning any in-flight acquisition. Only
    /// meaningful at process shutdown: an abandoned acquisition leaves the
    /// refresh slot claimed.
    pub async fn stop(&self) {
        if let Some(handle) = self.timer_handle.lock().await.take() {
            handle.abort();
            info!("refresh scheduler stopped");
        }
    }

    /// Lazy refresh hook for readers: wakes the loop only when the store
    /// holds no live snapshot.
    pub fn trigger_if_needed(&self) {
        if self.store.is_expired(now_ms()) {
            debug!("store expired, requesting refresh");
            self.wake.notify_one();
        }
    }

    async fn run_loop(&self) {
        loop {
            tokio::select! {
                () = tokio::time::sleep(self.config.refresh_interval) => {
                    debug!("periodic refresh tick");
                },
                () = self.wake.notified() => {
                    debug!("on-demand refresh request");
                },
            }
            self.refresh_now().await;
        }
    }

    /// Run one acquisition if the refresh slot is free. Returns `false` when
    /// another acquisition was already in flight.
    pub async fn refresh_now(&self) -> bool {
        if !self.store.try_begin_refresh() {
            debug!("acquisition already in flight, skipping");
            return false;
        }

        info!("starting credential acquisition");
        match timeout(self.config.acquire_ceiling, self.acquirer.acquire()).await {
            Ok(Ok(snapshot)) => {
                self.consecutive_rejections.store(0, Ordering::Relaxed);
                info!(
                    cookies = snapshot.cookies().len(),
                    expires_at_ms = snapshot.expires_at_ms(),
                    "credential snapshot committed"
                );
                self.store.commit(snapshot);
            },
            Ok(Err(err)) => {
                self.store.abort_refresh();
                self.note_failure(&err);
            },
            Err(_) => {
                self.store.abort_refresh();
                let ceiling_ms = self.config.acquire_ceiling.as_millis() as u64;
                self.note_failure(&AcquireError::Timeout(ceiling_ms));
            },
        }
        true
    }

    fn note_failure(&self, err: &AcquireError) {
        match err {
            AcquireError::LoginRejected { .. } => {
                let streak = self.consecutive_rejections.fetch_add(1, Ordering::Relaxed) + 1;
                if streak >= self.config.rejection_alert_threshold {
                    error!(
                        consecutive = streak,
                        error = %err,
                        "login repeatedly rejected, retrying will not self-heal"
                    );
                } else {
                    warn!(consecutive = streak, error = %err, "login rejected");
                }
            },
            AcquireError::FieldNotFound(_) => {
                warn!(error = %err, "sign-in markup may have drifted past the locator heuristics");
            },
            AcquireError::Timeout(_) => {
                warn!(error = %err, "acquisition abandoned, browser process reaped on drop");
            },
            other => {
                warn!(error = %other, "acquisition failed, previous snapshot left in place");
            },
        }
    }
}
