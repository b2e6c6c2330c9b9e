//! Family migration - moves one offline family and everything under it to the cloud.
//!
//! Rows are copied in dependency order (family, owner membership, subcategories,
//! recurring expenses, months, then each month's expenses, income sources and
//! category limits) while an id remap rewrites foreign keys. Any failed insert rolls
//! back the cloud rows created so far and leaves the local copy untouched. The local
//! copy is only removed, in one transaction, once the cloud copy is complete.

use super::{
    SyncEngine, SyncingGuard,
    progress::{ProgressTracker, SyncStep},
    rollback::RollbackLog,
};
use crate::{
    core::{
        ids::{self, is_offline_id},
        queue::QueueOps,
        tables::EntityKind,
    },
    entities::{
        CategoryLimit, Expense, Family, FamilyMember, IncomeSource, Month, RecurringExpense,
        Subcategory, category_limit, expense, family, family_member, income_source, month,
        recurring_expense, subcategory,
    },
    errors::{Error, Result},
};
use sea_orm::{DatabaseTransaction, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{error, info, instrument, warn};

/// One month and the rows hanging off it.
struct MonthDataset {
    month: month::Model,
    expenses: Vec<expense::Model>,
    income_sources: Vec<income_source::Model>,
    category_limits: Vec<category_limit::Model>,
}

/// Everything stored locally for one family.
struct FamilyDataset {
    family: family::Model,
    subcategories: Vec<subcategory::Model>,
    recurring: Vec<recurring_expense::Model>,
    months: Vec<MonthDataset>,
}

impl FamilyDataset {
    /// Units of work: the family itself plus one per descendant row.
    fn total(&self) -> usize {
        let per_month: usize = self
            .months
            .iter()
            .map(|m| 1 + m.expenses.len() + m.income_sources.len() + m.category_limits.len())
            .sum();
        1 + self.subcategories.len() + self.recurring.len() + per_month
    }

    fn month_ids(&self) -> Vec<String> {
        self.months.iter().map(|m| m.month.id.clone()).collect()
    }
}

/// Old local id to new cloud id, filled in dependency order.
struct IdRemap {
    ids: HashMap<String, String>,
}

impl IdRemap {
    fn new(old_family_id: &str, new_family_id: &str) -> Self {
        let mut remap = Self {
            ids: HashMap::new(),
        };
        remap.insert(old_family_id, new_family_id);
        remap
    }

    fn insert(&mut self, old: &str, new: &str) {
        self.ids.insert(old.to_string(), new.to_string());
    }

    /// Rewrites an optional reference. References to rows outside the migrated family
    /// are dropped.
    fn rewrite(&self, field: &str, old: Option<&str>) -> Option<String> {
        let old = old?;
        let new = self.ids.get(old).cloned();
        if new.is_none() {
            warn!(field, id = old, "Reference to a row outside the family dropped");
        }
        new
    }
}

/// The record a migration stopped at.
struct StepFailure {
    entity: String,
    message: String,
}

impl StepFailure {
    fn new(kind: EntityKind, name: &str, error: &Error) -> Self {
        Self {
            entity: format!("{} \"{name}\"", kind.label()),
            message: error.to_string(),
        }
    }
}

impl SyncEngine {
    /// Migrates an offline family to the cloud with the signed-in user as owner.
    ///
    /// Returns the new cloud family id. On failure every cloud row created by this
    /// call is deleted (best-effort) and the local data is left as it was, so the call
    /// can be retried.
    ///
    /// # Errors
    /// - [`Error::NotAuthenticated`] / [`Error::Offline`] before any work is done
    /// - [`Error::FamilyNotFound`] if the family is not stored locally
    /// - [`Error::NotOfflineFamily`] if the stored family already has a cloud id
    /// - [`Error::MigrationInProgress`] if this family is already being migrated
    /// - [`Error::MigrationFailed`] when a step failed and the cloud copy was rolled back
    #[instrument(skip(self))]
    pub async fn sync_family(&self, family_id: &str) -> Result<String> {
        let owner_id = self.require_cloud_access()?;
        self.local
            .get::<Family>(family_id)
            .await?
            .ok_or_else(|| Error::FamilyNotFound {
                family_id: family_id.to_string(),
            })?;
        if !is_offline_id(family_id) {
            return Err(Error::NotOfflineFamily {
                family_id: family_id.to_string(),
            });
        }
        let _claim = self.claim_family(family_id)?;
        let _syncing = SyncingGuard::new(self);

        let dataset = self.load_family(family_id).await?;
        let mut progress = ProgressTracker::new(&self.progress, dataset.total());
        let mut log = RollbackLog::default();
        info!(
            family = %dataset.family.name,
            total = dataset.total(),
            "Migrating offline family to the cloud"
        );

        let new_family_id = match self
            .copy_to_cloud(&dataset, &owner_id, &mut progress, &mut log)
            .await
        {
            Ok(id) => id,
            Err(failure) => return Err(self.abort(failure, log, &progress).await),
        };

        progress.start(SyncStep::CleaningUp, Some(dataset.family.name.clone()));
        let dropped = match self.remove_local_copy(&dataset).await {
            Ok(dropped) => dropped,
            Err(e) => {
                let failure = StepFailure {
                    entity: format!("local copy of family \"{}\"", dataset.family.name),
                    message: e.to_string(),
                };
                return Err(self.abort(failure, log, &progress).await);
            }
        };

        let pending = self.refresh_pending_count().await;
        progress.complete();
        info!(
            family = %dataset.family.name,
            old_id = family_id,
            new_id = %new_family_id,
            dropped_queue_items = dropped,
            pending,
            "Family migrated to the cloud"
        );
        Ok(new_family_id)
    }

    async fn load_family(&self, family_id: &str) -> Result<FamilyDataset> {
        let family = self
            .local
            .get::<Family>(family_id)
            .await?
            .ok_or_else(|| Error::FamilyNotFound {
                family_id: family_id.to_string(),
            })?;

        let subcategories = self
            .local
            .get_all_by_index::<Subcategory>(subcategory::Column::FamilyId, family_id)
            .await?;
        let recurring = self
            .local
            .get_all_by_index::<RecurringExpense>(recurring_expense::Column::FamilyId, family_id)
            .await?;

        let mut months = Vec::new();
        for month in self
            .local
            .get_all_by_index::<Month>(month::Column::FamilyId, family_id)
            .await?
        {
            let expenses = self
                .local
                .get_all_by_index::<Expense>(expense::Column::MonthId, &month.id)
                .await?;
            let income_sources = self
                .local
                .get_all_by_index::<IncomeSource>(income_source::Column::MonthId, &month.id)
                .await?;
            let category_limits = self
                .local
                .get_all_by_index::<CategoryLimit>(category_limit::Column::MonthId, &month.id)
                .await?;
            months.push(MonthDataset {
                month,
                expenses,
                income_sources,
                category_limits,
            });
        }

        Ok(FamilyDataset {
            family,
            subcategories,
            recurring,
            months,
        })
    }

    /// Creates the cloud copy and returns the new family id.
    #[allow(clippy::too_many_lines)]
    async fn copy_to_cloud(
        &self,
        dataset: &FamilyDataset,
        owner_id: &str,
        progress: &mut ProgressTracker<'_>,
        log: &mut RollbackLog,
    ) -> std::result::Result<String, StepFailure> {
        let local_family = &dataset.family;
        progress.start(SyncStep::CreatingFamily, Some(local_family.name.clone()));

        let cloud_family = self
            .remote
            .insert_family(&local_family.name, owner_id)
            .await
            .map_err(|e| StepFailure::new(EntityKind::Family, &local_family.name, &e))?;
        log.family_created(&cloud_family.id);

        let member = self
            .remote
            .insert_family_member(&cloud_family.id, owner_id, family_member::OWNER_ROLE)
            .await
            .map_err(|e| StepFailure::new(EntityKind::FamilyMember, owner_id, &e))?;
        log.member_created(&member.id);
        progress.advance(SyncStep::CreatingFamily, Some(local_family.name.clone()));

        let mut remap = IdRemap::new(&local_family.id, &cloud_family.id);

        for local in &dataset.subcategories {
            let row = subcategory::Model {
                id: String::new(),
                family_id: cloud_family.id.clone(),
                ..local.clone()
            };
            let created = self
                .remote
                .insert_subcategory(row)
                .await
                .map_err(|e| StepFailure::new(EntityKind::Subcategory, &local.name, &e))?;
            log.created(EntityKind::Subcategory, &created.id);
            remap.insert(&local.id, &created.id);
            progress.advance(SyncStep::Subcategories, Some(local.name.clone()));
        }

        for local in &dataset.recurring {
            let row = recurring_expense::Model {
                id: String::new(),
                family_id: cloud_family.id.clone(),
                subcategory_id: remap.rewrite("subcategory_id", local.subcategory_id.as_deref()),
                ..local.clone()
            };
            let created = self
                .remote
                .insert_recurring_expense(row)
                .await
                .map_err(|e| StepFailure::new(EntityKind::RecurringExpense, &local.description, &e))?;
            log.created(EntityKind::RecurringExpense, &created.id);
            remap.insert(&local.id, &created.id);
            progress.advance(SyncStep::RecurringExpenses, Some(local.description.clone()));
        }

        let mut cloud_months = Vec::with_capacity(dataset.months.len());
        for entry in &dataset.months {
            let local = &entry.month;
            let row = month::Model {
                id: ids::rewrite_month_id(&local.id, &local_family.id, &cloud_family.id)
                    .unwrap_or_default(),
                family_id: cloud_family.id.clone(),
                ..local.clone()
            };
            let created = self
                .remote
                .insert_month(row)
                .await
                .map_err(|e| StepFailure::new(EntityKind::Month, &local.label(), &e))?;
            log.created(EntityKind::Month, &created.id);
            remap.insert(&local.id, &created.id);
            progress.advance(SyncStep::Months, Some(local.label()));
            cloud_months.push(created.id);
        }

        for (entry, month_id) in dataset.months.iter().zip(&cloud_months) {
            for local in &entry.expenses {
                let row = expense::Model {
                    id: String::new(),
                    month_id: month_id.clone(),
                    subcategory_id: remap
                        .rewrite("subcategory_id", local.subcategory_id.as_deref()),
                    recurring_expense_id: remap
                        .rewrite("recurring_expense_id", local.recurring_expense_id.as_deref()),
                    ..local.clone()
                };
                let created = self
                    .remote
                    .insert_expense(row)
                    .await
                    .map_err(|e| StepFailure::new(EntityKind::Expense, &local.description, &e))?;
                log.created(EntityKind::Expense, &created.id);
                progress.advance(SyncStep::Expenses, Some(local.description.clone()));
            }
        }

        for (entry, month_id) in dataset.months.iter().zip(&cloud_months) {
            for local in &entry.income_sources {
                let row = income_source::Model {
                    id: String::new(),
                    month_id: month_id.clone(),
                    ..local.clone()
                };
                let created = self
                    .remote
                    .insert_income_source(row)
                    .await
                    .map_err(|e| StepFailure::new(EntityKind::IncomeSource, &local.name, &e))?;
                log.created(EntityKind::IncomeSource, &created.id);
                remap.insert(&local.id, &created.id);
                progress.advance(SyncStep::IncomeSources, Some(local.name.clone()));
            }
        }

        for (entry, month_id) in dataset.months.iter().zip(&cloud_months) {
            for local in &entry.category_limits {
                let row = category_limit::Model {
                    id: String::new(),
                    month_id: month_id.clone(),
                    ..local.clone()
                };
                let created = self
                    .remote
                    .insert_category_limit(row)
                    .await
                    .map_err(|e| {
                        StepFailure::new(EntityKind::CategoryLimit, &local.category_key, &e)
                    })?;
                log.created(EntityKind::CategoryLimit, &created.id);
                progress.advance(SyncStep::CategoryLimits, Some(local.category_key.clone()));
            }
        }

        Ok(cloud_family.id)
    }

    /// Deletes the family, its descendants and its queue items from the local store in
    /// one transaction. Returns the number of queue items dropped.
    async fn remove_local_copy(&self, dataset: &FamilyDataset) -> Result<u64> {
        let family_id = dataset.family.id.as_str();
        let txn = self.local.connection().begin().await?;
        match Self::delete_local_rows(&txn, family_id, dataset.month_ids()).await {
            Ok(dropped) => {
                txn.commit().await?;
                Ok(dropped)
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    warn!(error = %rollback, "Failed to roll back local cleanup");
                }
                Err(e)
            }
        }
    }

    async fn delete_local_rows(
        txn: &DatabaseTransaction,
        family_id: &str,
        month_ids: Vec<String>,
    ) -> Result<u64> {
        Expense::delete_many()
            .filter(expense::Column::MonthId.is_in(month_ids.clone()))
            .exec(txn)
            .await?;
        IncomeSource::delete_many()
            .filter(income_source::Column::MonthId.is_in(month_ids.clone()))
            .exec(txn)
            .await?;
        CategoryLimit::delete_many()
            .filter(category_limit::Column::MonthId.is_in(month_ids))
            .exec(txn)
            .await?;
        Month::delete_many()
            .filter(month::Column::FamilyId.eq(family_id))
            .exec(txn)
            .await?;
        RecurringExpense::delete_many()
            .filter(recurring_expense::Column::FamilyId.eq(family_id))
            .exec(txn)
            .await?;
        Subcategory::delete_many()
            .filter(subcategory::Column::FamilyId.eq(family_id))
            .exec(txn)
            .await?;
        FamilyMember::delete_many()
            .filter(family_member::Column::FamilyId.eq(family_id))
            .exec(txn)
            .await?;
        Family::delete_by_id(family_id.to_string())
            .exec(txn)
            .await?;
        let dropped = QueueOps::new(txn).remove_by_family(family_id).await?;
        Ok(dropped)
    }

    /// Rolls back the cloud copy and builds the error reported to the caller.
    async fn abort(
        &self,
        failure: StepFailure,
        log: RollbackLog,
        progress: &ProgressTracker<'_>,
    ) -> Error {
        progress.start(SyncStep::RollingBack, Some(failure.entity.clone()));
        let created = log.len();
        let outcome = log.rollback(self.remote.as_ref()).await;
        error!(
            entity = %failure.entity,
            error = %failure.message,
            completed = progress.current(),
            created,
            rolled_back = outcome.deleted,
            rollback_failures = outcome.failures,
            "Family migration failed"
        );
        Error::MigrationFailed {
            entity: failure.entity,
            message: failure.message,
            rolled_back: outcome.deleted,
            rollback_failures: outcome.failures,
        }
    }
}
