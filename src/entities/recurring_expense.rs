//! Recurring expense entity - a template projected into calendar months.
//!
//! When `has_installments` is set the template only applies to `total_installments`
//! consecutive months starting at `start_year`/`start_month`; see
//! [`crate::core::installments`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Recurring expense database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_expenses")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning family
    pub family_id: String,
    /// Optional subcategory
    pub subcategory_id: Option<String>,
    /// Budget category key
    pub category_key: String,
    /// Description shown on generated expenses
    pub description: String,
    /// Amount per occurrence
    pub value: f64,
    /// Day of month the expense is due
    pub due_day: Option<i32>,
    /// Whether this is an installment plan
    pub has_installments: bool,
    /// Number of installments in the plan
    pub total_installments: Option<i32>,
    /// Year of the first installment
    pub start_year: Option<i32>,
    /// Month (1-12) of the first installment
    pub start_month: Option<i32>,
}

/// Defines relationships between `RecurringExpense` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each recurring expense belongs to one family
    #[sea_orm(
        belongs_to = "super::family::Entity",
        from = "Column::FamilyId",
        to = "super::family::Column::Id"
    )]
    Family,
    /// Optional subcategory
    #[sea_orm(
        belongs_to = "super::subcategory::Entity",
        from = "Column::SubcategoryId",
        to = "super::subcategory::Column::Id"
    )]
    Subcategory,
    /// Expenses generated from this template
    #[sea_orm(has_many = "super::expense::Entity")]
    Expenses,
}

impl Related<super::family::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Family.def()
    }
}

impl Related<super::subcategory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subcategory.def()
    }
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
