//! Compensation log for a family migration.
//!
//! Every cloud row created during one migration is recorded in creation order. On
//! failure the rows are deleted newest first, then the membership and the family.
//! Deletion is best-effort: a row that cannot be deleted is logged and skipped.

use crate::core::{remote::RemoteStore, tables::EntityKind};
use tracing::{debug, warn};

/// Cloud rows created so far by one migration.
#[derive(Debug, Default)]
pub(crate) struct RollbackLog {
    family_id: Option<String>,
    member_id: Option<String>,
    created: Vec<(EntityKind, String)>,
}

/// What a rollback managed to undo.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RollbackOutcome {
    /// Rows deleted
    pub deleted: usize,
    /// Rows that could not be deleted
    pub failures: usize,
}

impl RollbackLog {
    pub(crate) fn family_created(&mut self, id: &str) {
        self.family_id = Some(id.to_string());
    }

    pub(crate) fn member_created(&mut self, id: &str) {
        self.member_id = Some(id.to_string());
    }

    pub(crate) fn created(&mut self, kind: EntityKind, id: &str) {
        self.created.push((kind, id.to_string()));
    }

    /// Number of rows recorded, family and membership included.
    pub(crate) fn len(&self) -> usize {
        self.created.len()
            + usize::from(self.family_id.is_some())
            + usize::from(self.member_id.is_some())
    }

    /// Deletes every recorded row, newest first.
    pub(crate) async fn rollback(self, remote: &dyn RemoteStore) -> RollbackOutcome {
        let mut outcome = RollbackOutcome::default();
        let tail = self
            .member_id
            .map(|id| (EntityKind::FamilyMember, id))
            .into_iter()
            .chain(self.family_id.map(|id| (EntityKind::Family, id)));

        for (kind, id) in self.created.into_iter().rev().chain(tail) {
            match remote.delete_by_id_from_table(kind, &id).await {
                Ok(()) => {
                    debug!(table = %kind, %id, "Rolled back cloud row");
                    outcome.deleted += 1;
                }
                Err(e) => {
                    warn!(table = %kind, %id, error = %e, "Failed to roll back cloud row");
                    outcome.failures += 1;
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_rollback_deletes_newest_first() -> Result<()> {
        let remote = RecordingRemote::default();
        let mut log = RollbackLog::default();
        log.family_created("fam");
        log.member_created("member");
        log.created(EntityKind::Subcategory, "sub");
        log.created(EntityKind::Month, "month");
        log.created(EntityKind::Expense, "expense");
        assert_eq!(log.len(), 5);

        let outcome = log.rollback(&remote).await;
        assert_eq!(outcome, RollbackOutcome { deleted: 5, failures: 0 });
        assert_eq!(
            remote.deleted(),
            vec![
                (EntityKind::Expense, "expense".to_string()),
                (EntityKind::Month, "month".to_string()),
                (EntityKind::Subcategory, "sub".to_string()),
                (EntityKind::FamilyMember, "member".to_string()),
                (EntityKind::Family, "fam".to_string()),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_rollback_continues_past_failures() -> Result<()> {
        let remote = RecordingRemote::failing_deletes_of(EntityKind::Month);
        let mut log = RollbackLog::default();
        log.family_created("fam");
        log.created(EntityKind::Month, "month");
        log.created(EntityKind::Expense, "expense");

        let outcome = log.rollback(&remote).await;
        assert_eq!(outcome, RollbackOutcome { deleted: 2, failures: 1 });
        assert_eq!(remote.deleted().len(), 2);
        Ok(())
    }
}
