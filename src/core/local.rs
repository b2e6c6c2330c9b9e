//! Local store - the on-device database that holds offline families.
//!
//! Reads are typed through `SeaORM` entities; writes take a table and a record and go
//! through the JSON helpers in [`crate::core::tables`], the same path queued mutations
//! use when they are applied to an offline family.

use crate::{
    core::{
        queue::QueueOps,
        tables::{self, EntityKind},
    },
    entities::{Family, family},
    errors::Result,
};
use sea_orm::{DatabaseConnection, PrimaryKeyTrait, QueryOrder, prelude::*};
use serde::Serialize;
use serde_json::Value;

pub use crate::core::ids::{generate_offline_id, is_offline_id};

/// Handle to the local database.
#[derive(Debug, Clone)]
pub struct LocalStore {
    db: DatabaseConnection,
}

impl LocalStore {
    /// Wraps an open connection whose tables already exist.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Underlying connection, for transactions spanning several operations.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Fetches one row by id.
    pub async fn get<E>(&self, id: &str) -> Result<Option<E::Model>>
    where
        E: EntityTrait,
        <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<String>,
    {
        E::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(Into::into)
    }

    /// Every row of one table.
    pub async fn get_all<E>(&self) -> Result<Vec<E::Model>>
    where
        E: EntityTrait,
    {
        E::find().all(&self.db).await.map_err(Into::into)
    }

    /// Rows whose `column` equals `value` (e.g. all months of a family).
    pub async fn get_all_by_index<E>(&self, column: E::Column, value: &str) -> Result<Vec<E::Model>>
    where
        E: EntityTrait,
    {
        E::find()
            .filter(column.eq(value))
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// Inserts or replaces a record.
    pub async fn put<T>(&self, kind: EntityKind, record: &T) -> Result<()>
    where
        T: Serialize + Sync,
    {
        tables::upsert_value(&self.db, kind, serde_json::to_value(record)?).await
    }

    /// Inserts or merges a JSON record.
    pub async fn put_value(&self, kind: EntityKind, record: Value) -> Result<()> {
        tables::upsert_value(&self.db, kind, record).await
    }

    /// Deletes a record; deleting a missing record is not an error.
    pub async fn delete(&self, kind: EntityKind, id: &str) -> Result<()> {
        tables::delete_value(&self.db, kind, id).await?;
        Ok(())
    }

    /// The sync queue namespace.
    #[must_use]
    pub fn sync(&self) -> QueueOps<'_, DatabaseConnection> {
        QueueOps::new(&self.db)
    }

    /// All families stored on this device, by name.
    pub async fn families(&self) -> Result<Vec<family::Model>> {
        Family::find()
            .order_by_asc(family::Column::Name)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }
}
