//! Queue flush and mutation routing.

use super::{SyncEngine, SyncingGuard};
use crate::{
    core::{
        ids::is_offline_id,
        queue::{self, Mutation, SyncAction},
        tables::{self, payload_id},
    },
    entities::sync_queue,
    errors::Result,
};
use tracing::{debug, info, instrument, warn};

/// Outcome of one flush.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    /// Items replayed and removed from the queue
    pub applied: usize,
    /// Items that failed and stay queued
    pub failed: usize,
    /// Items of offline families, left for migration
    pub skipped: usize,
}

/// Where a routed mutation ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Written to the local store (offline family)
    Local,
    /// Written to the cloud
    Remote,
    /// Queued for the next flush
    Queued,
}

impl SyncEngine {
    /// Replays queued mutations of cloud families, oldest first.
    ///
    /// Does nothing without a session or connectivity. Items of offline families are
    /// skipped; they only leave the queue through migration. A failing item stays
    /// queued and the flush moves on to the next one.
    #[instrument(skip(self))]
    pub async fn sync_now(&self) -> Result<FlushReport> {
        if !self.session.is_authenticated() || !self.connectivity.is_online() {
            debug!("Flush skipped: offline or signed out");
            return Ok(FlushReport::default());
        }

        let _syncing = SyncingGuard::new(self);
        let mut report = FlushReport::default();
        let items = self.local.sync().get_all().await?;

        for item in items {
            if is_offline_id(&item.family_id) {
                report.skipped += 1;
                continue;
            }

            if let Err(e) = self.replay(&item).await {
                warn!(item = item.id, entity = %item.entity, action = %item.action, error = %e, "Queued mutation failed, keeping it for the next flush");
                report.failed += 1;
                continue;
            }

            match self.local.sync().remove(item.id).await {
                Ok(()) => {
                    debug!(item = item.id, "Queued mutation applied");
                    report.applied += 1;
                }
                Err(e) => {
                    warn!(item = item.id, error = %e, "Applied mutation could not be removed from the queue");
                    report.failed += 1;
                }
            }
        }

        let pending = self.refresh_pending_count().await;
        info!(
            applied = report.applied,
            failed = report.failed,
            skipped = report.skipped,
            pending,
            "Sync queue flushed"
        );
        Ok(report)
    }

    /// Applies a mutation to whichever tier owns its family.
    ///
    /// Offline families are written locally. Cloud families are written remotely when
    /// possible and queued otherwise, including when the remote write fails.
    #[instrument(skip(self, mutation), fields(action = %mutation.action, entity = %mutation.entity, family = %mutation.family_id))]
    pub async fn apply_mutation(&self, mutation: Mutation) -> Result<MutationOutcome> {
        if is_offline_id(&mutation.family_id) {
            self.apply_locally(&mutation).await?;
            return Ok(MutationOutcome::Local);
        }

        if self.session.is_authenticated() && self.connectivity.is_online() {
            match self.apply_remotely(&mutation).await {
                Ok(()) => return Ok(MutationOutcome::Remote),
                Err(e) => warn!(error = %e, "Cloud write failed, queueing mutation"),
            }
        }

        self.local.sync().add(&mutation).await?;
        self.refresh_pending_count().await;
        Ok(MutationOutcome::Queued)
    }

    async fn replay(&self, item: &sync_queue::Model) -> Result<()> {
        let mutation = queue::decode(item)?;
        self.apply_remotely(&mutation).await
    }

    async fn apply_remotely(&self, mutation: &Mutation) -> Result<()> {
        let payload = &mutation.payload;
        match mutation.action {
            SyncAction::Insert => self.remote.insert_into_table(mutation.entity, payload).await,
            SyncAction::Update => {
                self.remote
                    .update_in_table(mutation.entity, payload_id(payload)?, payload)
                    .await
            }
            SyncAction::Delete => {
                self.remote
                    .delete_by_id_from_table(mutation.entity, payload_id(payload)?)
                    .await
            }
        }
    }

    async fn apply_locally(&self, mutation: &Mutation) -> Result<()> {
        let db = self.local.connection();
        let payload = &mutation.payload;
        match mutation.action {
            SyncAction::Insert => {
                tables::upsert_value(db, mutation.entity, payload.clone()).await?;
            }
            SyncAction::Update => {
                tables::update_value(db, mutation.entity, payload_id(payload)?, payload).await?;
            }
            SyncAction::Delete => {
                tables::delete_value(db, mutation.entity, payload_id(payload)?).await?;
            }
        }
        Ok(())
    }
}
