//! Month entity - one budgeting period of a family.
//!
//! Offline month ids embed the family id (`<family>-<yyyy>-<mm>`), which lets a
//! migration derive the cloud month id deterministically.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Month database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "months")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning family
    pub family_id: String,
    /// Calendar year
    pub year: i32,
    /// Calendar month (1-12)
    pub month: i32,
    /// Total income for the month
    pub income: f64,
}

impl Model {
    /// `yyyy-mm` label used in progress and error messages.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }
}

/// Defines relationships between Month and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each month belongs to one family
    #[sea_orm(
        belongs_to = "super::family::Entity",
        from = "Column::FamilyId",
        to = "super::family::Column::Id"
    )]
    Family,
    /// One month has many expenses
    #[sea_orm(has_many = "super::expense::Entity")]
    Expenses,
    /// One month has many income sources
    #[sea_orm(has_many = "super::income_source::Entity")]
    IncomeSources,
    /// One month has many category limits
    #[sea_orm(has_many = "super::category_limit::Entity")]
    CategoryLimits,
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

impl Related<super::income_source::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IncomeSources.def()
    }
}

impl Related<super::category_limit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CategoryLimits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
