//! Category limit entity - budget percentage of one category for one month.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category limit database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category_limits")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Month the limit applies to
    pub month_id: String,
    /// Budget category key
    pub category_key: String,
    /// Share of the month's income, in percent
    pub percentage: f64,
}

/// Defines relationships between `CategoryLimit` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each limit belongs to one month
    #[sea_orm(
        belongs_to = "super::month::Entity",
        from = "Column::MonthId",
        to = "super::month::Column::Id"
    )]
    Month,
}

impl Related<super::month::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Month.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
