//! Family entity - the root aggregate that owns one household's budget.
//!
//! A family lives entirely in one tier. Offline families carry an offline id and exist
//! only in the local database; cloud families carry a backend-assigned id and an owner.

use crate::core::ids::{StorageTier, tier_of};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Family database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "families")]
pub struct Model {
    /// Offline id or cloud id; determines the tier of every descendant
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name (e.g., "Silva Household")
    pub name: String,
    /// User who owns the family in the cloud, None for offline families
    pub owner_id: Option<String>,
    /// When the family was created
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Storage tier owning this family and all of its descendants.
    #[must_use]
    pub fn tier(&self) -> StorageTier {
        tier_of(&self.id)
    }
}

/// Defines relationships between Family and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One family has many members (cloud only)
    #[sea_orm(has_many = "super::family_member::Entity")]
    FamilyMembers,
    /// One family has many subcategories
    #[sea_orm(has_many = "super::subcategory::Entity")]
    Subcategories,
    /// One family has many recurring expenses
    #[sea_orm(has_many = "super::recurring_expense::Entity")]
    RecurringExpenses,
    /// One family has many months
    #[sea_orm(has_many = "super::month::Entity")]
    Months,
}

impl Related<super::family_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FamilyMembers.def()
    }
}

impl Related<super::subcategory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subcategories.def()
    }
}

impl Related<super::recurring_expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringExpenses.def()
    }
}

impl Related<super::month::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Months.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
