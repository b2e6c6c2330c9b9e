//! Remote data access - the cloud tier as seen by the sync engine.
//!
//! [`RemoteStore`] is the seam the engine is written against. The generic by-table
//! functions replay queued mutations; the per-entity `insert_*` functions return the
//! created row so a migration can learn the id the backend assigned.
//! [`CloudStore`] implements it over a `SeaORM` connection to the cloud database;
//! database failures surface as [`Error::Remote`].

use crate::{
    core::{
        ids::generate_cloud_id,
        tables::{self, EntityKind},
    },
    entities::{
        Family, FamilyMember, category_limit, expense, family, family_member, income_source,
        month, recurring_expense, subcategory,
    },
    errors::{Error, Result},
};
use async_trait::async_trait;
use sea_orm::{DatabaseConnection, QueryOrder, prelude::*};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

/// Cloud backend operations used by the sync engine.
///
/// Rows passed to the `insert_*` functions with an empty `id` get a backend-assigned
/// id; rows with an id keep it.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Inserts a JSON row into `table`. A row with the same id is overwritten, so
    /// replaying an insert that already reached the backend succeeds.
    async fn insert_into_table(&self, table: EntityKind, data: &Value) -> Result<()>;

    /// Merges a JSON patch into the row `id` of `table`.
    async fn update_in_table(&self, table: EntityKind, id: &str, data: &Value) -> Result<()>;

    /// Deletes the row `id` of `table`. Deleting a missing row succeeds.
    async fn delete_by_id_from_table(&self, table: EntityKind, id: &str) -> Result<()>;

    /// Creates a cloud family owned by `owner_id`.
    async fn insert_family(&self, name: &str, owner_id: &str) -> Result<family::Model>;

    /// Grants `user_id` a role on a cloud family.
    async fn insert_family_member(
        &self,
        family_id: &str,
        user_id: &str,
        role: &str,
    ) -> Result<family_member::Model>;

    /// Inserts a subcategory and returns the created row.
    async fn insert_subcategory(&self, row: subcategory::Model) -> Result<subcategory::Model>;

    /// Inserts a recurring expense and returns the created row.
    async fn insert_recurring_expense(
        &self,
        row: recurring_expense::Model,
    ) -> Result<recurring_expense::Model>;

    /// Inserts a month and returns the created row.
    async fn insert_month(&self, row: month::Model) -> Result<month::Model>;

    /// Inserts an expense and returns the created row.
    async fn insert_expense(&self, row: expense::Model) -> Result<expense::Model>;

    /// Inserts an income source and returns the created row.
    async fn insert_income_source(&self, row: income_source::Model)
    -> Result<income_source::Model>;

    /// Inserts a category limit and returns the created row.
    async fn insert_category_limit(
        &self,
        row: category_limit::Model,
    ) -> Result<category_limit::Model>;

    /// Cloud families the user is a member of.
    async fn list_families_for_user(&self, user_id: &str) -> Result<Vec<family::Model>>;
}

/// [`RemoteStore`] backed by a `SeaORM` connection to the cloud database.
#[derive(Debug, Clone)]
pub struct CloudStore {
    db: DatabaseConnection,
}

impl CloudStore {
    /// Wraps an open connection whose tables already exist.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Inserts a typed row, assigning a cloud id when it has none.
    async fn insert_row<M>(&self, kind: EntityKind, row: &M) -> Result<M>
    where
        M: Serialize + DeserializeOwned + Sync,
    {
        let mut data = serde_json::to_value(row)?;
        let missing_id = data
            .get("id")
            .and_then(Value::as_str)
            .is_none_or(str::is_empty);
        if missing_id {
            data["id"] = Value::String(generate_cloud_id());
        }
        let created = tables::insert_value(&self.db, kind, data)
            .await
            .map_err(into_remote)?;
        debug!(table = %kind, id = ?created.get("id"), "Inserted cloud row");
        serde_json::from_value(created).map_err(Into::into)
    }
}

/// Reports backend failures as remote errors; other errors pass through.
fn into_remote(err: Error) -> Error {
    match err {
        Error::Database(e) => Error::Remote {
            message: e.to_string(),
        },
        other => other,
    }
}

#[async_trait]
impl RemoteStore for CloudStore {
    async fn insert_into_table(&self, table: EntityKind, data: &Value) -> Result<()> {
        tables::upsert_value(&self.db, table, data.clone())
            .await
            .map_err(into_remote)?;
        Ok(())
    }

    async fn update_in_table(&self, table: EntityKind, id: &str, data: &Value) -> Result<()> {
        tables::update_value(&self.db, table, id, data)
            .await
            .map_err(into_remote)
    }

    async fn delete_by_id_from_table(&self, table: EntityKind, id: &str) -> Result<()> {
        tables::delete_value(&self.db, table, id)
            .await
            .map_err(into_remote)?;
        Ok(())
    }

    async fn insert_family(&self, name: &str, owner_id: &str) -> Result<family::Model> {
        let row = family::Model {
            id: String::new(),
            name: name.to_string(),
            owner_id: Some(owner_id.to_string()),
            created_at: chrono::Utc::now(),
        };
        self.insert_row(EntityKind::Family, &row).await
    }

    async fn insert_family_member(
        &self,
        family_id: &str,
        user_id: &str,
        role: &str,
    ) -> Result<family_member::Model> {
        let row = family_member::Model {
            id: String::new(),
            family_id: family_id.to_string(),
            user_id: user_id.to_string(),
            role: role.to_string(),
            created_at: chrono::Utc::now(),
        };
        self.insert_row(EntityKind::FamilyMember, &row).await
    }

    async fn insert_subcategory(&self, row: subcategory::Model) -> Result<subcategory::Model> {
        self.insert_row(EntityKind::Subcategory, &row).await
    }

    async fn insert_recurring_expense(
        &self,
        row: recurring_expense::Model,
    ) -> Result<recurring_expense::Model> {
        self.insert_row(EntityKind::RecurringExpense, &row).await
    }

    async fn insert_month(&self, row: month::Model) -> Result<month::Model> {
        self.insert_row(EntityKind::Month, &row).await
    }

    async fn insert_expense(&self, row: expense::Model) -> Result<expense::Model> {
        self.insert_row(EntityKind::Expense, &row).await
    }

    async fn insert_income_source(
        &self,
        row: income_source::Model,
    ) -> Result<income_source::Model> {
        self.insert_row(EntityKind::IncomeSource, &row).await
    }

    async fn insert_category_limit(
        &self,
        row: category_limit::Model,
    ) -> Result<category_limit::Model> {
        self.insert_row(EntityKind::CategoryLimit, &row).await
    }

    async fn list_families_for_user(&self, user_id: &str) -> Result<Vec<family::Model>> {
        let family_ids: Vec<String> = FamilyMember::find()
            .filter(family_member::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(|e| into_remote(e.into()))?
            .into_iter()
            .map(|m| m.family_id)
            .collect();

        Family::find()
            .filter(family::Column::Id.is_in(family_ids))
            .order_by_asc(family::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| into_remote(e.into()))
    }
}
