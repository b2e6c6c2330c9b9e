//! Sync queue - the ordered log of mutations waiting for the cloud.
//!
//! Queue order is the autoincrement id, so [`QueueOps::get_all`] returns items in
//! insertion order. Every function works on any connection, including an open
//! transaction, which lets migration cleanup remove queue items atomically with the
//! local rows they refer to.

use crate::{
    core::tables::EntityKind,
    entities::{SyncQueue, sync_queue},
    errors::{Error, Result},
};
use sea_orm::{ActiveModelTrait, ConnectionTrait, PaginatorTrait, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// What a queued mutation does to its target row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    /// Create the row from the payload
    Insert,
    /// Update the row identified by `payload.id`
    Update,
    /// Delete the row identified by `payload.id`
    Delete,
}

impl SyncAction {
    /// Value stored in the `action` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "insert" => Ok(Self::Insert),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(Error::InvalidPayload {
                message: format!("unknown sync action '{other}'"),
            }),
        }
    }
}

/// A mutation against one row, tagged with the family it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    /// Insert, update or delete
    pub action: SyncAction,
    /// Target table
    pub entity: EntityKind,
    /// Family owning the row
    pub family_id: String,
    /// Row data; must contain `id` for updates and deletes
    pub payload: Value,
}

impl Mutation {
    /// Builds a mutation.
    pub fn new(
        action: SyncAction,
        entity: EntityKind,
        family_id: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            action,
            entity,
            family_id: family_id.into(),
            payload,
        }
    }
}

/// Queue operations bound to one connection.
pub struct QueueOps<'a, C> {
    db: &'a C,
}

impl<'a, C> QueueOps<'a, C>
where
    C: ConnectionTrait,
{
    /// Binds queue operations to a connection or transaction.
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Appends a mutation to the end of the queue.
    pub async fn add(&self, mutation: &Mutation) -> Result<sync_queue::Model> {
        let item = sync_queue::ActiveModel {
            action: Set(mutation.action.as_str().to_string()),
            entity: Set(mutation.entity.table_name().to_string()),
            payload: Set(mutation.payload.clone()),
            family_id: Set(mutation.family_id.clone()),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };
        item.insert(self.db).await.map_err(Into::into)
    }

    /// Every queued item, oldest first.
    pub async fn get_all(&self) -> Result<Vec<sync_queue::Model>> {
        SyncQueue::find()
            .order_by_asc(sync_queue::Column::Id)
            .all(self.db)
            .await
            .map_err(Into::into)
    }

    /// Queued items of one family, oldest first.
    pub async fn get_by_family(&self, family_id: &str) -> Result<Vec<sync_queue::Model>> {
        SyncQueue::find()
            .filter(sync_queue::Column::FamilyId.eq(family_id))
            .order_by_asc(sync_queue::Column::Id)
            .all(self.db)
            .await
            .map_err(Into::into)
    }

    /// Removes one item. Removing an item that is already gone is not an error.
    pub async fn remove(&self, id: i64) -> Result<()> {
        SyncQueue::delete_by_id(id).exec(self.db).await?;
        Ok(())
    }

    /// Removes every item of one family and returns how many were removed.
    pub async fn remove_by_family(&self, family_id: &str) -> Result<u64> {
        let result = SyncQueue::delete_many()
            .filter(sync_queue::Column::FamilyId.eq(family_id))
            .exec(self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Empties the queue.
    pub async fn clear(&self) -> Result<()> {
        SyncQueue::delete_many().exec(self.db).await?;
        Ok(())
    }

    /// Current queue depth.
    pub async fn count(&self) -> Result<u64> {
        SyncQueue::find().count(self.db).await.map_err(Into::into)
    }
}

/// Decodes a stored queue item back into a mutation.
pub fn decode(item: &sync_queue::Model) -> Result<Mutation> {
    Ok(Mutation {
        action: item.action.parse()?,
        entity: item.entity.parse()?,
        family_id: item.family_id.clone(),
        payload: item.payload.clone(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use serde_json::json;

    fn mutation(family_id: &str, id: &str) -> Mutation {
        Mutation::new(
            SyncAction::Update,
            EntityKind::Expense,
            family_id,
            json!({"id": id, "value": 10.0}),
        )
    }

    #[tokio::test]
    async fn test_queue_preserves_insertion_order() -> Result<()> {
        let db = setup_local_db().await?;
        let queue = QueueOps::new(&db);

        for id in ["a", "b", "c"] {
            queue.add(&mutation("fam", id)).await?;
        }

        let items = queue.get_all().await?;
        let ids: Vec<&str> = items.iter().map(|i| i.payload["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(queue.count().await?, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_queue_by_family_and_removal() -> Result<()> {
        let db = setup_local_db().await?;
        let queue = QueueOps::new(&db);

        let first = queue.add(&mutation("fam-a", "1")).await?;
        queue.add(&mutation("fam-b", "2")).await?;
        queue.add(&mutation("fam-a", "3")).await?;

        assert_eq!(queue.get_by_family("fam-a").await?.len(), 2);

        queue.remove(first.id).await?;
        queue.remove(first.id).await?;
        assert_eq!(queue.get_by_family("fam-a").await?.len(), 1);

        assert_eq!(queue.remove_by_family("fam-a").await?, 1);
        assert_eq!(queue.count().await?, 1);

        queue.clear().await?;
        assert_eq!(queue.count().await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_decode_round_trips_mutation() -> Result<()> {
        let db = setup_local_db().await?;
        let queue = QueueOps::new(&db);
        let original = Mutation::new(
            SyncAction::Delete,
            EntityKind::IncomeSource,
            "fam",
            json!({"id": "inc-1"}),
        );
        let stored = queue.add(&original).await?;
        assert_eq!(decode(&stored)?, original);
        Ok(())
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        assert!("upsert".parse::<SyncAction>().is_err());
        assert_eq!("delete".parse::<SyncAction>().unwrap(), SyncAction::Delete);
    }
}
