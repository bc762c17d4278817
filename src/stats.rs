//! Statistics derived from a month snapshot. Everything here is recomputed on each call.

use crate::cache::Snapshot;
use crate::model::{Amount, ExpenseType};
use crate::window::DateWindow;
use rust_decimal::Decimal;
use serde::Serialize;

/// Average spent per day so far this month, leaving out rent.
///
/// Returns `None` when there is no rent total yet, or when the totals are too large to compute
/// with.
pub fn average_daily_spend(snapshot: &Snapshot, window: &DateWindow) -> Option<Amount> {
    let rent = snapshot.category_total(ExpenseType::Rent)?;
    let excluding_rent = snapshot.grand_total().checked_sub(rent)?;
    let days = Decimal::from(window.days_elapsed());
    let average = excluding_rent.value().checked_div(days)?;
    Some(Amount::new(average).round_cents())
}

/// Projected spend for the whole month. Non-rent spending is extrapolated linearly from the days
/// elapsed to the full month; rent is a flat monthly charge and is added once.
///
/// Returns `None` when there is no rent total yet, or when the projection cannot be represented.
pub fn projected_monthly_spend(snapshot: &Snapshot, window: &DateWindow) -> Option<Amount> {
    let rent = snapshot.category_total(ExpenseType::Rent)?;
    let excluding_rent = snapshot.grand_total().checked_sub(rent)?;
    let projected = excluding_rent
        .value()
        .checked_mul(Decimal::from(window.days_in_month()))?
        .checked_div(Decimal::from(window.days_elapsed()))?;
    Some(rent.checked_add(Amount::new(projected))?.round_cents())
}

/// The sum of the category breakdown, shown beneath the month-to-date table. `None` if the sum
/// cannot be represented.
pub fn month_to_date_total(snapshot: &Snapshot) -> Option<Amount> {
    snapshot
        .category_totals()
        .iter()
        .try_fold(Amount::ZERO, |sum, t| sum.checked_add(t.amount))
}

/// A labelled figure ready for display.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Stat {
    pub label: String,
    pub value: Amount,
    /// The date range the figure covers, e.g. `October 1 - October 15`.
    pub help: String,
}

pub fn average_daily_stat(snapshot: &Snapshot, window: &DateWindow) -> Option<Stat> {
    let month = window.month_name();
    average_daily_spend(snapshot, window).map(|value| Stat {
        label: "Average daily spend (excl. rent)".to_string(),
        value,
        help: format!("{month} 1 - {month} {}", window.days_elapsed()),
    })
}

pub fn projected_monthly_stat(snapshot: &Snapshot, window: &DateWindow) -> Option<Stat> {
    let month = window.month_name();
    projected_monthly_spend(snapshot, window).map(|value| Stat {
        label: "Projected monthly spend (incl. rent)".to_string(),
        value,
        help: format!("{month} 1 - {month} {}", window.days_in_month()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::AggregationCache;
    use crate::model::{CategoryTotal, Expense};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    fn expense(t: ExpenseType, amount: &str, day: u32) -> Expense {
        Expense::new(
            t.to_string(),
            t,
            amt(amount),
            NaiveDate::from_ymd_opt(2025, 9, day).unwrap(),
            "",
        )
    }

    /// September has 30 days; the window is at day 10.
    fn window() -> DateWindow {
        DateWindow::new(NaiveDate::from_ymd_opt(2025, 9, 10).unwrap())
    }

    fn cache(totals: Vec<CategoryTotal>, expenses: Vec<Expense>) -> AggregationCache {
        let grand = expenses.iter().map(|e| e.amount).sum();
        let mut cache = AggregationCache::new(window());
        cache.load(expenses, totals, Some(grand)).unwrap();
        cache
    }

    fn with_rent() -> AggregationCache {
        cache(
            vec![
                CategoryTotal::new(ExpenseType::Rent, amt("200")),
                CategoryTotal::new(ExpenseType::Groceries, amt("110")),
            ],
            vec![
                expense(ExpenseType::Groceries, "110", 4),
                expense(ExpenseType::Rent, "200", 1),
            ],
        )
    }

    #[test]
    fn test_average_daily_spend() {
        let cache = with_rent();
        let avg = average_daily_spend(cache.snapshot().unwrap(), &window()).unwrap();
        assert_eq!(avg, amt("11.00"));
        assert_eq!(avg.to_string(), "$11.00");
    }

    #[test]
    fn test_projected_monthly_spend() {
        let cache = with_rent();
        let projected = projected_monthly_spend(cache.snapshot().unwrap(), &window()).unwrap();
        assert_eq!(projected, amt("530.00"));
    }

    #[test]
    fn test_no_rent_means_no_stats() {
        let cache = cache(
            vec![CategoryTotal::new(ExpenseType::Groceries, amt("110"))],
            vec![expense(ExpenseType::Groceries, "110", 4)],
        );
        let snapshot = cache.snapshot().unwrap();
        assert!(average_daily_spend(snapshot, &window()).is_none());
        assert!(projected_monthly_spend(snapshot, &window()).is_none());
        assert!(average_daily_stat(snapshot, &window()).is_none());
    }

    #[test]
    fn test_rent_only_month() {
        let cache = cache(
            vec![CategoryTotal::new(ExpenseType::Rent, amt("1200"))],
            vec![expense(ExpenseType::Rent, "1200", 1)],
        );
        let snapshot = cache.snapshot().unwrap();
        assert_eq!(average_daily_spend(snapshot, &window()), Some(Amount::ZERO));
        assert_eq!(
            projected_monthly_spend(snapshot, &window()),
            Some(amt("1200"))
        );
    }

    #[test]
    fn test_stats_follow_recorded_expenses() {
        let mut cache = with_rent();
        cache
            .record_expense(expense(ExpenseType::Leisure, "40", 9))
            .unwrap();
        let snapshot = cache.snapshot().unwrap();
        assert_eq!(average_daily_spend(snapshot, &window()), Some(amt("15")));
        assert_eq!(
            projected_monthly_spend(snapshot, &window()),
            Some(amt("650"))
        );
    }

    #[test]
    fn test_rounds_to_cents() {
        let cache = cache(
            vec![
                CategoryTotal::new(ExpenseType::Rent, amt("100")),
                CategoryTotal::new(ExpenseType::Travel, amt("10")),
            ],
            vec![
                expense(ExpenseType::Travel, "10", 2),
                expense(ExpenseType::Rent, "100", 1),
            ],
        );
        let window = DateWindow::new(NaiveDate::from_ymd_opt(2025, 9, 3).unwrap());
        let snapshot = cache.snapshot().unwrap();
        assert_eq!(average_daily_spend(snapshot, &window), Some(amt("3.33")));
        assert_eq!(projected_monthly_spend(snapshot, &window), Some(amt("200")));
    }

    #[test]
    fn test_stat_labels() {
        let cache = with_rent();
        let snapshot = cache.snapshot().unwrap();
        let avg = average_daily_stat(snapshot, &window()).unwrap();
        assert_eq!(avg.label, "Average daily spend (excl. rent)");
        assert_eq!(avg.help, "September 1 - September 10");
        let projected = projected_monthly_stat(snapshot, &window()).unwrap();
        assert_eq!(projected.label, "Projected monthly spend (incl. rent)");
        assert_eq!(projected.help, "September 1 - September 30");
        assert_eq!(projected.value, amt("530"));
    }

    #[test]
    fn test_month_to_date_total() {
        let cache = with_rent();
        assert_eq!(
            month_to_date_total(cache.snapshot().unwrap()),
            Some(amt("310"))
        );
    }

    #[test]
    fn test_huge_totals_give_no_figures() {
        // 1e28 of groceries, which overflows once scaled to the month
        let huge = amt("10000000000000000000000000000");
        let mut cache = AggregationCache::new(window());
        cache
            .load(
                vec![
                    expense(ExpenseType::Groceries, "10000000000000000000000000000", 4),
                    expense(ExpenseType::Rent, "0", 1),
                ],
                vec![
                    CategoryTotal::new(ExpenseType::Rent, Amount::ZERO),
                    CategoryTotal::new(ExpenseType::Groceries, huge),
                ],
                Some(huge),
            )
            .unwrap();
        let snapshot = cache.snapshot().unwrap();
        assert_eq!(projected_monthly_spend(snapshot, &window()), None);
        assert!(projected_monthly_stat(snapshot, &window()).is_none());
        assert_eq!(
            average_daily_spend(snapshot, &window()),
            Some(amt("1000000000000000000000000000"))
        );
    }

    #[test]
    fn test_month_to_date_total_overflow() {
        let cache = cache(
            vec![
                CategoryTotal::new(ExpenseType::Travel, Amount::new(Decimal::MAX)),
                CategoryTotal::new(ExpenseType::Leisure, amt("1")),
            ],
            vec![],
        );
        assert_eq!(month_to_date_total(cache.snapshot().unwrap()), None);
    }
}
