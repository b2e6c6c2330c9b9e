//! Migration progress reporting.

use std::fmt;
use tokio::sync::watch;

/// Phase of a family migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    /// Creating the cloud family and owner membership
    CreatingFamily,
    /// Copying subcategories
    Subcategories,
    /// Copying recurring expenses
    RecurringExpenses,
    /// Copying months
    Months,
    /// Copying expenses
    Expenses,
    /// Copying income sources
    IncomeSources,
    /// Copying category limits
    CategoryLimits,
    /// Removing the local copy
    CleaningUp,
    /// Deleting partially created cloud rows
    RollingBack,
    /// Migration finished
    Complete,
}

impl SyncStep {
    /// Label shown to users.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CreatingFamily => "Creating family",
            Self::Subcategories => "Syncing subcategories",
            Self::RecurringExpenses => "Syncing recurring expenses",
            Self::Months => "Syncing months",
            Self::Expenses => "Syncing expenses",
            Self::IncomeSources => "Syncing income sources",
            Self::CategoryLimits => "Syncing category limits",
            Self::CleaningUp => "Removing local copy",
            Self::RollingBack => "Rolling back",
            Self::Complete => "Complete",
        }
    }
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of a running migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncProgress {
    /// Current phase
    pub step: SyncStep,
    /// Units of work finished
    pub current: usize,
    /// Units of work in the whole migration
    pub total: usize,
    /// Record being worked on, if any
    pub details: Option<String>,
}

impl fmt::Display for SyncProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.step, self.current, self.total)?;
        if let Some(details) = &self.details {
            write!(f, ": {details}")?;
        }
        Ok(())
    }
}

/// Publishes progress for one migration.
pub(crate) struct ProgressTracker<'a> {
    tx: &'a watch::Sender<Option<SyncProgress>>,
    current: usize,
    total: usize,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(tx: &'a watch::Sender<Option<SyncProgress>>, total: usize) -> Self {
        Self {
            tx,
            current: 0,
            total,
        }
    }

    /// Announces the unit about to be worked on.
    pub(crate) fn start(&self, step: SyncStep, details: Option<String>) {
        self.publish(step, details);
    }

    /// Marks one unit as finished.
    pub(crate) fn advance(&mut self, step: SyncStep, details: Option<String>) {
        self.current = (self.current + 1).min(self.total);
        self.publish(step, details);
    }

    pub(crate) fn complete(&mut self) {
        self.current = self.total;
        self.publish(SyncStep::Complete, None);
    }

    pub(crate) const fn current(&self) -> usize {
        self.current
    }

    fn publish(&self, step: SyncStep, details: Option<String>) {
        self.tx.send_replace(Some(SyncProgress {
            step,
            current: self.current,
            total: self.total,
            details,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_publishes_every_step() {
        let tx = watch::Sender::new(None);
        let mut tracker = ProgressTracker::new(&tx, 2);

        tracker.start(SyncStep::CreatingFamily, Some("Silva".to_string()));
        assert_eq!(tx.borrow().as_ref().map(|p| p.current), Some(0));

        tracker.advance(SyncStep::CreatingFamily, None);
        tracker.advance(SyncStep::Subcategories, None);
        tracker.advance(SyncStep::Subcategories, None);
        assert_eq!(tracker.current(), 2);

        tracker.complete();
        let last = tx.borrow().clone().unwrap_or_else(|| SyncProgress {
            step: SyncStep::RollingBack,
            current: 0,
            total: 0,
            details: None,
        });
        assert_eq!(last.step, SyncStep::Complete);
        assert_eq!(last.to_string(), "Complete (2/2)");
    }
}
