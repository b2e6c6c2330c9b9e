//! Sync queue entity - mutations waiting to be replayed against the cloud.
//!
//! The autoincrement id defines queue order. Items are tagged with the family they
//! belong to but are not owned by it: no foreign key, so queue items can outlive
//! the local copy of their family until cleanup.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sync queue database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sync_queue")]
pub struct Model {
    /// Queue position
    #[sea_orm(primary_key)]
    pub id: i64,
    /// `"insert"`, `"update"` or `"delete"`
    pub action: String,
    /// Target table name
    pub entity: String,
    /// Row data; `update` and `delete` read the target id from `payload.id`
    pub payload: Json,
    /// Family the mutation belongs to
    pub family_id: String,
    /// When the mutation was queued
    pub created_at: DateTimeUtc,
}

/// `SyncQueue` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
