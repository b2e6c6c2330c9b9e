//! Core business logic - framework-agnostic storage tiers and the sync engine.
//!
//! Nothing in here knows about Discord. The bot layer calls into these modules the
//! same way tests do.

/// Online/offline state and the cloud reachability probe
pub mod connectivity;
/// Creation helpers for offline families and their descendants
pub mod household;
/// Offline and cloud id namespaces
pub mod ids;
/// Projection of recurring expenses and installment plans into months
pub mod installments;
/// The local tier: offline families and the sync queue
pub mod local;
/// Sync queue items and mutations
pub mod queue;
/// The cloud tier as seen by the sync engine
pub mod remote;
/// Injected authentication state
pub mod session;
/// Queue flush and family migration
pub mod sync;
/// JSON addressing of rows by table, shared by both tiers
pub mod tables;
