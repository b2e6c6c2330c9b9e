//! Sync engine - moves data between the local tier and the cloud.
//!
//! Two operations:
//! - [`SyncEngine::sync_now`] replays the sync queue for cloud families.
//! - [`SyncEngine::sync_family`] migrates a whole offline family to the cloud.
//!
//! Session and connectivity are injected, never read from globals. State the UI
//! renders (connectivity, in-flight flag, progress, queue depth) is published through
//! `watch` channels.

mod flush;
mod migration;
mod progress;
mod rollback;

pub use flush::{FlushReport, MutationOutcome};
pub use progress::{SyncProgress, SyncStep};
pub use rollback::RollbackOutcome;

use crate::{
    core::{
        connectivity::{ConnectivityMonitor, Transition},
        local::LocalStore,
        remote::RemoteStore,
        session::SessionState,
    },
    errors::{Error, Result},
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::{
    sync::{broadcast::error::RecvError, watch},
    task::JoinHandle,
};
use tracing::{info, warn};

/// Coordinates the local store, the remote store and the observable sync state.
pub struct SyncEngine {
    local: LocalStore,
    remote: Arc<dyn RemoteStore>,
    session: SessionState,
    connectivity: ConnectivityMonitor,
    in_flight: AtomicUsize,
    syncing: watch::Sender<bool>,
    progress: watch::Sender<Option<SyncProgress>>,
    pending: watch::Sender<u64>,
    migrating: Mutex<HashSet<String>>,
}

impl SyncEngine {
    /// Wires the engine to its collaborators. Call
    /// [`refresh_pending_count`](Self::refresh_pending_count) once to publish the
    /// initial queue depth.
    #[must_use]
    pub fn new(
        local: LocalStore,
        remote: Arc<dyn RemoteStore>,
        session: SessionState,
        connectivity: ConnectivityMonitor,
    ) -> Self {
        Self {
            local,
            remote,
            session,
            connectivity,
            in_flight: AtomicUsize::new(0),
            syncing: watch::Sender::new(false),
            progress: watch::Sender::new(None),
            pending: watch::Sender::new(0),
            migrating: Mutex::new(HashSet::new()),
        }
    }

    /// The local store the engine reads from.
    #[must_use]
    pub const fn local(&self) -> &LocalStore {
        &self.local
    }

    /// The remote store the engine writes to.
    #[must_use]
    pub fn remote(&self) -> &dyn RemoteStore {
        self.remote.as_ref()
    }

    /// The injected session.
    #[must_use]
    pub const fn session(&self) -> &SessionState {
        &self.session
    }

    /// The injected connectivity monitor.
    #[must_use]
    pub const fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    /// Current connectivity.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Observes connectivity.
    #[must_use]
    pub fn subscribe_online(&self) -> watch::Receiver<bool> {
        self.connectivity.subscribe()
    }

    /// True while a flush or a migration is running.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        *self.syncing.borrow()
    }

    /// Observes the in-flight flag.
    #[must_use]
    pub fn subscribe_syncing(&self) -> watch::Receiver<bool> {
        self.syncing.subscribe()
    }

    /// Progress of the running (or last) migration; None when idle.
    #[must_use]
    pub fn sync_progress(&self) -> Option<SyncProgress> {
        self.progress.borrow().clone()
    }

    /// Observes migration progress.
    #[must_use]
    pub fn subscribe_progress(&self) -> watch::Receiver<Option<SyncProgress>> {
        self.progress.subscribe()
    }

    /// Queue depth as of the last flush, migration or routed mutation.
    #[must_use]
    pub fn pending_sync_count(&self) -> u64 {
        *self.pending.borrow()
    }

    /// Observes queue depth.
    #[must_use]
    pub fn subscribe_pending(&self) -> watch::Receiver<u64> {
        self.pending.subscribe()
    }

    /// Resets progress to idle.
    pub fn clear_progress(&self) {
        self.progress.send_replace(None);
    }

    /// Clears progress after `delay`, giving the UI time to show the final state.
    pub fn schedule_progress_clear(self: &Arc<Self>, delay: Duration) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            engine.clear_progress();
        })
    }

    /// Re-reads the queue depth and publishes it. A failed read keeps the last value.
    pub async fn refresh_pending_count(&self) -> u64 {
        match self.local.sync().count().await {
            Ok(count) => {
                self.pending.send_replace(count);
                count
            }
            Err(e) => {
                warn!(error = %e, "Failed to count pending sync items");
                self.pending_sync_count()
            }
        }
    }

    /// Flushes the queue once for every Offline -> Online transition while signed in.
    ///
    /// Transitions are subscribed to before the task starts, so a flap that happens
    /// before it is first polled, or while a flush is running, still triggers a flush.
    /// Abort the handle to stop.
    pub fn spawn_auto_flush(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        let mut transitions = self.connectivity.subscribe_transitions();
        tokio::spawn(async move {
            loop {
                let reconnected = match transitions.recv().await {
                    Ok(transition) => transition == Transition::WentOnline,
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Connectivity transitions dropped");
                        engine.is_online()
                    }
                    Err(RecvError::Closed) => break,
                };
                if reconnected && engine.session.is_authenticated() {
                    info!("Back online, flushing sync queue");
                    if let Err(e) = engine.sync_now().await {
                        warn!(error = %e, "Automatic flush failed");
                    }
                }
            }
        })
    }

    /// User id of the current session, if the cloud is reachable and a user is signed in.
    fn require_cloud_access(&self) -> Result<String> {
        let session = self.session.current().ok_or(Error::NotAuthenticated)?;
        if !self.connectivity.is_online() {
            return Err(Error::Offline);
        }
        Ok(session.user_id)
    }

    /// Marks a family as being migrated until the returned claim is dropped.
    fn claim_family(&self, family_id: &str) -> Result<MigrationClaim<'_>> {
        let mut migrating = self.migrating.lock().unwrap_or_else(PoisonError::into_inner);
        if !migrating.insert(family_id.to_string()) {
            return Err(Error::MigrationInProgress {
                family_id: family_id.to_string(),
            });
        }
        Ok(MigrationClaim {
            engine: self,
            family_id: family_id.to_string(),
        })
    }
}

/// Keeps `is_syncing` true while alive.
struct SyncingGuard<'a> {
    engine: &'a SyncEngine,
}

impl<'a> SyncingGuard<'a> {
    fn new(engine: &'a SyncEngine) -> Self {
        engine.in_flight.fetch_add(1, Ordering::SeqCst);
        engine.syncing.send_replace(true);
        Self { engine }
    }
}

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        if self.engine.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.engine.syncing.send_replace(false);
        }
    }
}

/// Releases a family for migration when dropped.
struct MigrationClaim<'a> {
    engine: &'a SyncEngine,
    family_id: String,
}

impl Drop for MigrationClaim<'_> {
    fn drop(&mut self) {
        self.engine
            .migrating
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.family_id);
    }
}
