//! Table addressing shared by both storage tiers.
//!
//! Queued mutations and the remote by-table functions name their target with an
//! [`EntityKind`] and carry rows as JSON. The helpers here turn such payloads into
//! `SeaORM` operations on any connection (local database, cloud database or an open
//! transaction).

use crate::{
    entities::{
        CategoryLimit, Expense, Family, FamilyMember, IncomeSource, Month, RecurringExpense,
        Subcategory, category_limit, expense, family, family_member, income_source, month,
        recurring_expense, subcategory,
    },
    errors::{Error, Result},
};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Every table a mutation can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// `families`
    Family,
    /// `family_members`
    FamilyMember,
    /// `subcategories`
    Subcategory,
    /// `recurring_expenses`
    RecurringExpense,
    /// `months`
    Month,
    /// `expenses`
    Expense,
    /// `income_sources`
    IncomeSource,
    /// `category_limits`
    CategoryLimit,
}

impl EntityKind {
    /// Database table name.
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Family => "families",
            Self::FamilyMember => "family_members",
            Self::Subcategory => "subcategories",
            Self::RecurringExpense => "recurring_expenses",
            Self::Month => "months",
            Self::Expense => "expenses",
            Self::IncomeSource => "income_sources",
            Self::CategoryLimit => "category_limits",
        }
    }

    /// Singular human-readable label for messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Family => "family",
            Self::FamilyMember => "family member",
            Self::Subcategory => "subcategory",
            Self::RecurringExpense => "recurring expense",
            Self::Month => "month",
            Self::Expense => "expense",
            Self::IncomeSource => "income source",
            Self::CategoryLimit => "category limit",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "families" => Ok(Self::Family),
            "family_members" => Ok(Self::FamilyMember),
            "subcategories" => Ok(Self::Subcategory),
            "recurring_expenses" => Ok(Self::RecurringExpense),
            "months" => Ok(Self::Month),
            "expenses" => Ok(Self::Expense),
            "income_sources" => Ok(Self::IncomeSource),
            "category_limits" => Ok(Self::CategoryLimit),
            other => Err(Error::InvalidPayload {
                message: format!("unknown table '{other}'"),
            }),
        }
    }
}

/// Extracts `payload.id` as a string.
pub fn payload_id(payload: &Value) -> Result<&str> {
    payload
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::InvalidPayload {
            message: "payload has no 'id'".to_string(),
        })
}

/// Fetches one row as JSON.
pub async fn get_value<C>(db: &C, kind: EntityKind, id: &str) -> Result<Option<Value>>
where
    C: ConnectionTrait,
{
    let id = id.to_string();
    let row = match kind {
        EntityKind::Family => Family::find_by_id(id).one(db).await?.map(serde_json::to_value),
        EntityKind::FamilyMember => FamilyMember::find_by_id(id)
            .one(db)
            .await?
            .map(serde_json::to_value),
        EntityKind::Subcategory => Subcategory::find_by_id(id)
            .one(db)
            .await?
            .map(serde_json::to_value),
        EntityKind::RecurringExpense => RecurringExpense::find_by_id(id)
            .one(db)
            .await?
            .map(serde_json::to_value),
        EntityKind::Month => Month::find_by_id(id).one(db).await?.map(serde_json::to_value),
        EntityKind::Expense => Expense::find_by_id(id).one(db).await?.map(serde_json::to_value),
        EntityKind::IncomeSource => IncomeSource::find_by_id(id)
            .one(db)
            .await?
            .map(serde_json::to_value),
        EntityKind::CategoryLimit => CategoryLimit::find_by_id(id)
            .one(db)
            .await?
            .map(serde_json::to_value),
    };
    row.transpose().map_err(Into::into)
}

/// Inserts a complete row given as JSON and returns the stored row.
pub async fn insert_value<C>(db: &C, kind: EntityKind, data: Value) -> Result<Value>
where
    C: ConnectionTrait,
{
    let row = match kind {
        EntityKind::Family => {
            serde_json::to_value(family::ActiveModel::from_json(data)?.insert(db).await?)
        }
        EntityKind::FamilyMember => {
            serde_json::to_value(family_member::ActiveModel::from_json(data)?.insert(db).await?)
        }
        EntityKind::Subcategory => {
            serde_json::to_value(subcategory::ActiveModel::from_json(data)?.insert(db).await?)
        }
        EntityKind::RecurringExpense => serde_json::to_value(
            recurring_expense::ActiveModel::from_json(data)?
                .insert(db)
                .await?,
        ),
        EntityKind::Month => {
            serde_json::to_value(month::ActiveModel::from_json(data)?.insert(db).await?)
        }
        EntityKind::Expense => {
            serde_json::to_value(expense::ActiveModel::from_json(data)?.insert(db).await?)
        }
        EntityKind::IncomeSource => {
            serde_json::to_value(income_source::ActiveModel::from_json(data)?.insert(db).await?)
        }
        EntityKind::CategoryLimit => {
            serde_json::to_value(category_limit::ActiveModel::from_json(data)?.insert(db).await?)
        }
    };
    row.map_err(Into::into)
}

/// Applies a (possibly partial) JSON patch to an existing row.
///
/// The patch is merged over the stored row, so absent keys keep their values. The id
/// of the row is always `id`, whatever the patch says.
pub async fn update_value<C>(db: &C, kind: EntityKind, id: &str, patch: &Value) -> Result<()>
where
    C: ConnectionTrait,
{
    let current = get_value(db, kind, id)
        .await?
        .ok_or_else(|| Error::RecordNotFound {
            table: kind.table_name().to_string(),
            id: id.to_string(),
        })?;
    let mut merged = merge_json(current, patch);
    merged["id"] = Value::String(id.to_string());

    match kind {
        EntityKind::Family => {
            family::ActiveModel::from_json(merged)?.update(db).await?;
        }
        EntityKind::FamilyMember => {
            family_member::ActiveModel::from_json(merged)?.update(db).await?;
        }
        EntityKind::Subcategory => {
            subcategory::ActiveModel::from_json(merged)?.update(db).await?;
        }
        EntityKind::RecurringExpense => {
            recurring_expense::ActiveModel::from_json(merged)?
                .update(db)
                .await?;
        }
        EntityKind::Month => {
            month::ActiveModel::from_json(merged)?.update(db).await?;
        }
        EntityKind::Expense => {
            expense::ActiveModel::from_json(merged)?.update(db).await?;
        }
        EntityKind::IncomeSource => {
            income_source::ActiveModel::from_json(merged)?.update(db).await?;
        }
        EntityKind::CategoryLimit => {
            category_limit::ActiveModel::from_json(merged)?.update(db).await?;
        }
    }
    Ok(())
}

/// Inserts the row, or merges it over the stored row when the id already exists.
pub async fn upsert_value<C>(db: &C, kind: EntityKind, data: Value) -> Result<()>
where
    C: ConnectionTrait,
{
    let id = payload_id(&data)?.to_string();
    if get_value(db, kind, &id).await?.is_some() {
        update_value(db, kind, &id, &data).await
    } else {
        insert_value(db, kind, data).await.map(|_| ())
    }
}

/// Deletes a row by id. Returns the number of rows removed (0 or 1).
pub async fn delete_value<C>(db: &C, kind: EntityKind, id: &str) -> Result<u64>
where
    C: ConnectionTrait,
{
    let id = id.to_string();
    let result = match kind {
        EntityKind::Family => Family::delete_by_id(id).exec(db).await?,
        EntityKind::FamilyMember => FamilyMember::delete_by_id(id).exec(db).await?,
        EntityKind::Subcategory => Subcategory::delete_by_id(id).exec(db).await?,
        EntityKind::RecurringExpense => RecurringExpense::delete_by_id(id).exec(db).await?,
        EntityKind::Month => Month::delete_by_id(id).exec(db).await?,
        EntityKind::Expense => Expense::delete_by_id(id).exec(db).await?,
        EntityKind::IncomeSource => IncomeSource::delete_by_id(id).exec(db).await?,
        EntityKind::CategoryLimit => CategoryLimit::delete_by_id(id).exec(db).await?,
    };
    Ok(result.rows_affected)
}

/// Overlays the keys of `patch` on `base` (one level deep, which is all a row has).
fn merge_json(mut base: Value, patch: &Value) -> Value {
    if let (Some(base_map), Some(patch_map)) = (base.as_object_mut(), patch.as_object()) {
        for (key, value) in patch_map {
            base_map.insert(key.clone(), value.clone());
        }
    }
    base
}
