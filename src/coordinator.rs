// MIT License - Copyright (c) 2026 Peter Wright

//! Polling coordinator: the single source of truth for one installation.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::client::G4sClient;
use crate::config::SessionConfig;
use crate::error::Result;
use crate::event::{CoordinatorEvent, EventReceiver, EventSender, event_channel};
use crate::model::ArmMode;
use crate::snapshot::Snapshot;

/// Owns the cloud session and the authoritative in-memory state for one
/// installation.
///
/// All entity projections read the latest published [`Snapshot`] through
/// this type; all commands (arm/disarm) go through it too, and every
/// successful command forces a refresh rather than guessing the resulting
/// state locally.
///
/// Refreshes are serialized: a scheduled tick and an on-demand refresh can
/// never interleave their fetch-and-publish sections. Refresh volume is low
/// (one per poll interval plus one per command), so a single async mutex
/// around the whole section is all the machinery this needs.
pub struct Coordinator {
    client: G4sClient,
    poll_interval: Duration,
    latest: RwLock<Option<Arc<Snapshot>>>,
    refresh_lock: Mutex<()>,
    event_tx: EventSender,
    shutdown_tx: watch::Sender<bool>,
    poll_handle: StdMutex<Option<JoinHandle<()>>>,
}

impl Coordinator {
    /// Build a coordinator for the given session. No network call happens
    /// until [`first_refresh`](Self::first_refresh).
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let client = G4sClient::new(config)?;
        let (event_tx, _event_rx) = event_channel(256);
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);

        Ok(Self {
            client,
            // tokio::time::interval panics on a zero period
            poll_interval: Duration::from_secs(config.poll_interval_secs.max(1)),
            latest: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            event_tx,
            shutdown_tx,
            poll_handle: StdMutex::new(None),
        })
    }

    /// Subscribe to coordinator events.
    pub fn subscribe(&self) -> EventReceiver {
        self.event_tx.subscribe()
    }

    /// The configured poll interval.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// The latest published snapshot, or `None` before the first successful
    /// refresh.
    pub async fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.latest.read().await.clone()
    }

    /// Perform the gating first refresh.
    ///
    /// Dependent entity setup must not proceed past a failure here. The
    /// returned error distinguishes bad credentials (`Error::is_auth`) from
    /// transient trouble, because only the former should send the user back
    /// through the reauthentication flow.
    pub async fn first_refresh(&self) -> Result<Arc<Snapshot>> {
        let snapshot = self.refresh_now().await?;
        info!(
            "first refresh complete: state={}, {} door/window, {} climate",
            snapshot.alarm_state,
            snapshot.door_window.len(),
            snapshot.climate.len()
        );
        Ok(snapshot)
    }

    /// Fetch a fresh overview and publish a new snapshot.
    ///
    /// On failure the previously published snapshot stays in place and
    /// remains reachable by readers; the failure is broadcast and returned.
    pub async fn refresh_now(&self) -> Result<Arc<Snapshot>> {
        let _guard = self.refresh_lock.lock().await;

        match self.client.overview().await {
            Ok(overview) => {
                let snapshot = Arc::new(Snapshot::from_overview(overview));
                *self.latest.write().await = Some(Arc::clone(&snapshot));
                let _ = self
                    .event_tx
                    .send(CoordinatorEvent::SnapshotUpdated(Arc::clone(&snapshot)));
                Ok(snapshot)
            }
            Err(e) => {
                warn!("could not read overview: {e}");
                let _ = self.event_tx.send(CoordinatorEvent::RefreshFailed {
                    message: e.to_string(),
                    auth: e.is_auth(),
                });
                Err(e)
            }
        }
    }

    /// True iff `code` is present, non-empty, and exactly matches the access
    /// code of a known user or an access chip in the latest snapshot.
    ///
    /// Pure read over last-known data; never forces a refresh, and always
    /// false before the first successful one.
    pub async fn validate_code(&self, code: Option<&str>) -> bool {
        let Some(code) = code else { return false };
        match self.snapshot().await {
            Some(snapshot) => snapshot.code_matches(code),
            None => false,
        }
    }

    /// Arm the installation in away mode. No code required.
    pub async fn arm_away(&self) -> Result<()> {
        self.client.arm(ArmMode::Away).await?;
        self.converge().await;
        Ok(())
    }

    /// Arm the installation in night mode. No code required.
    pub async fn arm_night(&self) -> Result<()> {
        self.client.arm(ArmMode::Night).await?;
        self.converge().await;
        Ok(())
    }

    /// Disarm the installation.
    ///
    /// The code is validated against the latest snapshot first; a
    /// non-matching code is an explicit [`Error::InvalidCode`] rejection and
    /// no vendor call is made.
    ///
    /// [`Error::InvalidCode`]: crate::error::Error::InvalidCode
    pub async fn disarm(&self, code: Option<&str>) -> Result<()> {
        if !self.validate_code(code).await {
            return Err(crate::error::Error::InvalidCode);
        }
        self.client.disarm().await?;
        self.converge().await;
        Ok(())
    }

    /// Converge on vendor truth after a command. The command already
    /// succeeded, so a refresh failure here is logged and broadcast but does
    /// not fail the command; the next tick retries.
    async fn converge(&self) {
        if let Err(e) = self.refresh_now().await {
            warn!("post-command refresh failed: {e}");
        }
    }

    /// Start the fixed-interval poll task.
    ///
    /// Tick failures are logged and broadcast; the next tick retries at the
    /// same cadence. Call [`shutdown`](Self::shutdown) to stop.
    pub fn start_polling(self: &Arc<Self>) {
        let mut handle_slot = self.poll_handle.lock().expect("poll handle lock poisoned");
        if handle_slot.is_some() {
            debug!("poll task already running");
            return;
        }

        let coordinator = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(coordinator.poll_interval);
            // The first tick fires immediately; the gating first refresh
            // already happened, so skip it.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = coordinator.refresh_now().await {
                            warn!("scheduled refresh failed: {e}");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            debug!("poll task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        *handle_slot = Some(handle);
    }

    /// Stop the poll task.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self
            .poll_handle
            .lock()
            .expect("poll handle lock poisoned")
            .take()
        {
            handle.abort();
        }
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Ok(mut slot) = self.poll_handle.lock()
            && let Some(handle) = slot.take()
        {
            handle.abort();
        }
    }
}
