//! Entity module - Contains all SeaORM entity definitions for both storage tiers.
//! The local and cloud databases share these definitions; `family_members` is only
//! populated in the cloud and `sync_queue` only exists locally.

pub mod category_limit;
pub mod expense;
pub mod family;
pub mod family_member;
pub mod income_source;
pub mod month;
pub mod recurring_expense;
pub mod subcategory;
pub mod sync_queue;

// Re-export specific types to avoid conflicts
pub use category_limit::{
    Column as CategoryLimitColumn, Entity as CategoryLimit, Model as CategoryLimitModel,
};
pub use expense::{Column as ExpenseColumn, Entity as Expense, Model as ExpenseModel};
pub use family::{Column as FamilyColumn, Entity as Family, Model as FamilyModel};
pub use family_member::{
    Column as FamilyMemberColumn, Entity as FamilyMember, Model as FamilyMemberModel,
};
pub use income_source::{
    Column as IncomeSourceColumn, Entity as IncomeSource, Model as IncomeSourceModel,
};
pub use month::{Column as MonthColumn, Entity as Month, Model as MonthModel};
pub use recurring_expense::{
    Column as RecurringExpenseColumn, Entity as RecurringExpense, Model as RecurringExpenseModel,
};
pub use subcategory::{
    Column as SubcategoryColumn, Entity as Subcategory, Model as SubcategoryModel,
};
pub use sync_queue::{Column as SyncQueueColumn, Entity as SyncQueue, Model as SyncQueueModel};
