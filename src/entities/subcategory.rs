//! Subcategory entity - a user-defined refinement of a budget category.
//!
//! Subcategories belong to a family and are referenced by category key
//! (e.g. `"essenciais"`). Expenses and recurring expenses may point at one.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subcategory database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subcategories")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning family
    pub family_id: String,
    /// Budget category this subcategory refines
    pub category_key: String,
    /// Display name (e.g., "Groceries")
    pub name: String,
}

/// Defines relationships between Subcategory and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each subcategory belongs to one family
    #[sea_orm(
        belongs_to = "super::family::Entity",
        from = "Column::FamilyId",
        to = "super::family::Column::Id"
    )]
    Family,
    /// One subcategory is used by many expenses
    #[sea_orm(has_many = "super::expense::Entity")]
    Expenses,
    /// One subcategory is used by many recurring expenses
    #[sea_orm(has_many = "super::recurring_expense::Entity")]
    RecurringExpenses,
}

impl Related<super::family::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Family.def()
    }
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Related<super::recurring_expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringExpenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
