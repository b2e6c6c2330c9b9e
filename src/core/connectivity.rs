//! Connectivity monitor - online/offline state with transition reporting.
//!
//! The state is a `watch` value so any number of consumers can observe it. Every
//! transition is also published on a `broadcast` channel, so a consumer that reacts
//! to transitions sees each one even when the state flaps faster than it runs.
//! A probe task ([`spawn_probe`]) feeds the monitor from cloud reachability; tests
//! drive it directly with [`ConnectivityMonitor::set_online`].

use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tracing::{info, warn};

/// Result of feeding a connectivity signal to the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Offline -> Online
    WentOnline,
    /// Online -> Offline
    WentOffline,
    /// Same state as before
    Unchanged,
}

/// Shared online/offline state. Cloning shares the same state.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    tx: Arc<watch::Sender<bool>>,
    events: broadcast::Sender<Transition>,
}

const TRANSITION_BUFFER: usize = 16;

impl ConnectivityMonitor {
    /// Creates a monitor in the given state.
    #[must_use]
    pub fn new(online: bool) -> Self {
        let (events, _) = broadcast::channel(TRANSITION_BUFFER);
        Self {
            tx: Arc::new(watch::Sender::new(online)),
            events,
        }
    }

    /// Current connectivity.
    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Records a platform connectivity signal. Observers are only woken on transitions.
    pub fn set_online(&self, online: bool) -> Transition {
        let mut transition = Transition::Unchanged;
        self.tx.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            transition = if online {
                Transition::WentOnline
            } else {
                Transition::WentOffline
            };
            true
        });
        match transition {
            Transition::WentOnline => info!("Connectivity restored"),
            Transition::WentOffline => warn!("Connectivity lost"),
            Transition::Unchanged => return transition,
        }
        // No subscribers is fine.
        let _ = self.events.send(transition);
        transition
    }

    /// Observes connectivity changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Receives every `WentOnline` / `WentOffline` published after this call.
    #[must_use]
    pub fn subscribe_transitions(&self) -> broadcast::Receiver<Transition> {
        self.events.subscribe()
    }
}

/// Pings the cloud database every `interval` and reports the result to `monitor`.
pub fn spawn_probe(
    monitor: ConnectivityMonitor,
    cloud: DatabaseConnection,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let reachable = cloud.ping().await.is_ok();
            monitor.set_online(reachable);
        }
    })
}
