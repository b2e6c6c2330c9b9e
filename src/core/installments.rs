//! Installment projection - which calendar months a recurring expense lands in.

use crate::entities::recurring_expense;

/// How a recurring expense applies to one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Plain recurring expense, applies to every month
    Recurring,
    /// Installment `number` (1-based) of a `total`-installment plan
    Installment {
        /// Position inside the plan
        number: i32,
        /// Size of the plan
        total: i32,
    },
}

/// Months elapsed between two (year, month) pairs; negative when `to` is earlier.
#[must_use]
pub const fn months_between(from_year: i32, from_month: i32, to_year: i32, to_month: i32) -> i32 {
    (to_year - from_year) * 12 + (to_month - from_month)
}

/// Projects a recurring expense into `year`/`month`.
///
/// Installment plans apply to `total_installments` consecutive months starting at
/// `start_year`/`start_month`. A plan missing any of that metadata projects nowhere.
#[must_use]
pub fn project(
    recurring: &recurring_expense::Model,
    year: i32,
    month: i32,
) -> Option<Projection> {
    if !recurring.has_installments {
        return Some(Projection::Recurring);
    }

    let (Some(total), Some(start_year), Some(start_month)) = (
        recurring.total_installments,
        recurring.start_year,
        recurring.start_month,
    ) else {
        return None;
    };

    let offset = months_between(start_year, start_month, year, month);
    (0..total).contains(&offset).then_some(Projection::Installment {
        number: offset + 1,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(total: Option<i32>, start: Option<(i32, i32)>) -> recurring_expense::Model {
        recurring_expense::Model {
            id: "r".to_string(),
            family_id: "f".to_string(),
            subcategory_id: None,
            category_key: "essenciais".to_string(),
            description: "Fridge".to_string(),
            value: 300.0,
            due_day: Some(10),
            has_installments: total.is_some() || start.is_some(),
            total_installments: total,
            start_year: start.map(|(y, _)| y),
            start_month: start.map(|(_, m)| m),
        }
    }

    #[test]
    fn test_plain_recurring_projects_everywhere() {
        let rent = recurring_expense::Model {
            has_installments: false,
            ..plan(None, None)
        };
        assert_eq!(project(&rent, 1999, 1), Some(Projection::Recurring));
        assert_eq!(project(&rent, 2030, 12), Some(Projection::Recurring));
    }

    #[test]
    fn test_installments_cross_year_boundary() {
        let fridge = plan(Some(3), Some((2025, 11)));
        assert_eq!(project(&fridge, 2025, 10), None);
        assert_eq!(
            project(&fridge, 2025, 11),
            Some(Projection::Installment { number: 1, total: 3 })
        );
        assert_eq!(
            project(&fridge, 2026, 1),
            Some(Projection::Installment { number: 3, total: 3 })
        );
        assert_eq!(project(&fridge, 2026, 2), None);
    }

    #[test]
    fn test_incomplete_plan_projects_nowhere() {
        assert_eq!(project(&plan(Some(3), None), 2026, 1), None);
        assert_eq!(project(&plan(None, Some((2026, 1))), 2026, 1), None);
    }

    #[test]
    fn test_months_between() {
        assert_eq!(months_between(2025, 12, 2026, 1), 1);
        assert_eq!(months_between(2026, 3, 2026, 1), -2);
    }
}
