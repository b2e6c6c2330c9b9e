//! Expense entity - a single spending line inside a month.
//!
//! Expenses generated from a recurring template keep a link to it and, for
//! installment plans, their position in the plan.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Month the expense belongs to
    pub month_id: String,
    /// Budget category key
    pub category_key: String,
    /// Optional subcategory
    pub subcategory_id: Option<String>,
    /// Template this expense was generated from, if any
    pub recurring_expense_id: Option<String>,
    /// Human-readable description (e.g., "Milk")
    pub description: String,
    /// Amount spent
    pub value: f64,
    /// Whether the expense came from a recurring template
    pub is_recurring: bool,
    /// Whether the expense is still unpaid
    pub is_pending: bool,
    /// Day of month the expense is due
    pub due_day: Option<i32>,
    /// 1-based position inside an installment plan
    pub installment_number: Option<i32>,
    /// Size of the installment plan
    pub total_installments: Option<i32>,
}

/// Defines relationships between Expense and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each expense belongs to one month
    #[sea_orm(
        belongs_to = "super::month::Entity",
        from = "Column::MonthId",
        to = "super::month::Column::Id"
    )]
    Month,
    /// Optional subcategory
    #[sea_orm(
        belongs_to = "super::subcategory::Entity",
        from = "Column::SubcategoryId",
        to = "super::subcategory::Column::Id"
    )]
    Subcategory,
    /// Optional recurring template
    #[sea_orm(
        belongs_to = "super::recurring_expense::Entity",
        from = "Column::RecurringExpenseId",
        to = "super::recurring_expense::Column::Id"
    )]
    RecurringExpense,
}

impl Related<super::month::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Month.def()
    }
}

impl Related<super::subcategory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subcategory.def()
    }
}

impl Related<super::recurring_expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringExpense.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
