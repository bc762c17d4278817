use crate::api::{Mode, Store};
use crate::cache::AggregationCache;
use crate::commands::{connect, month, require_identity, Out};
use crate::model::{Amount, CategoryTotal, Expense};
use crate::session::Session;
use crate::stats::{self, Stat};
use crate::window::DateWindow;
use crate::{Config, Result};
use anyhow::bail;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Everything the dashboard shows. Parts that could not be loaded are `None`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Dashboard {
    /// e.g. `October 2025`
    pub month: String,
    pub category_totals: Option<Vec<CategoryTotal>>,
    pub stats: Vec<Stat>,
    pub expenses: Option<Vec<Expense>>,
    pub grand_total: Option<Amount>,
    /// The footer of the expense table: the sum of the category totals.
    pub month_to_date_total: Option<Amount>,
    pub failures: Vec<String>,
    /// The expense this run added, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<Expense>,
}

impl Dashboard {
    pub(super) fn new(cache: &AggregationCache, failures: Vec<String>) -> Self {
        let window = cache.window();
        let snapshot = cache.snapshot();
        let figures = snapshot
            .map(|s| {
                [
                    stats::average_daily_stat(s, window),
                    stats::projected_monthly_stat(s, window),
                ]
                .into_iter()
                .flatten()
                .collect()
            })
            .unwrap_or_default();
        Self {
            month: format!("{} {}", window.month_name(), window.year()),
            category_totals: cache.category_totals().map(<[CategoryTotal]>::to_vec),
            stats: figures,
            expenses: cache.expenses().map(<[Expense]>::to_vec),
            grand_total: snapshot.map(|s| s.grand_total()),
            month_to_date_total: snapshot.and_then(stats::month_to_date_total),
            failures,
            saved: None,
        }
    }

    /// Marks the dashboard as the result of adding `expense`, which the store has accepted.
    pub(super) fn with_saved(mut self, expense: Expense) -> Self {
        self.saved = Some(expense);
        self
    }

    /// Returns an error listing the failed fetches, if there were any.
    pub fn ensure_complete(&self) -> Result<()> {
        if self.failures.is_empty() {
            return Ok(());
        }
        match &self.saved {
            Some(expense) => bail!(
                "The expense '{}' was saved, but the dashboard is incomplete. Do not add it \
                 again.\n{}",
                expense.name,
                self.failures.join("\n")
            ),
            None => bail!(
                "Some of this month's data could not be loaded:\n{}",
                self.failures.join("\n")
            ),
        }
    }

    /// The dashboard as plain text.
    pub fn render(&self) -> String {
        self.to_string().trim_end().to_string()
    }
}

impl Display for Dashboard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.month)?;

        writeln!(f, "\nTotals by category")?;
        match &self.category_totals {
            None => writeln!(f, "  (unavailable)")?,
            Some(totals) if totals.is_empty() => writeln!(f, "  No expenses yet")?,
            Some(totals) => {
                for total in totals {
                    writeln!(
                        f,
                        "  {:<12} {:>12}",
                        total.r#type.to_string(),
                        total.amount.to_string()
                    )?;
                }
            }
        }

        writeln!(f, "\nStatistics")?;
        if self.stats.is_empty() {
            let reason = if self.grand_total.is_none() {
                "not available until the month has loaded"
            } else {
                "not available until this month's rent is recorded"
            };
            writeln!(f, "  {reason}")?;
        }
        for stat in &self.stats {
            writeln!(
                f,
                "  {:<38} {:>12}  ({})",
                stat.label,
                stat.value.to_string(),
                stat.help
            )?;
        }

        writeln!(f, "\nMonth to date")?;
        match &self.expenses {
            None => writeln!(f, "  (unavailable)")?,
            Some(expenses) => {
                writeln!(
                    f,
                    "  {:<10}  {:<24} {:<12} {:>12}  Notes",
                    "Date", "Name", "Type", "Amount"
                )?;
                for e in expenses {
                    writeln!(
                        f,
                        "  {:<10}  {:<24} {:<12} {:>12}  {}",
                        e.date.format("%Y-%m-%d").to_string(),
                        e.name,
                        e.r#type.to_string(),
                        e.amount.to_string(),
                        e.notes
                    )?;
                }
                if let Some(total) = self.month_to_date_total {
                    writeln!(
                        f,
                        "  {:<10}  {:<24} {:<12} {:>12}",
                        "Total",
                        "",
                        "",
                        total.to_string()
                    )?;
                }
            }
        }

        for failure in &self.failures {
            writeln!(f, "\n{failure}")?;
        }
        Ok(())
    }
}

/// Handles the `expenses show` command.
pub async fn show(config: Config, mode: Mode) -> Result<Out<Dashboard>> {
    let (session, store) = connect(&config, mode).await?;
    show_month(store.as_ref(), &session, DateWindow::now()).await
}

async fn show_month(
    store: &dyn Store,
    session: &Session,
    window: DateWindow,
) -> Result<Out<Dashboard>> {
    require_identity(store, session).await?;
    let month = month::open(store, window).await;
    let dashboard = Dashboard::new(&month.cache, month.failures);
    Ok(Out::new(dashboard.render(), dashboard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Operation;
    use crate::test::TestEnv;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn window() -> DateWindow {
        DateWindow::new(NaiveDate::from_ymd_opt(2025, 10, 20).unwrap())
    }

    #[tokio::test]
    async fn test_show_seeded_month() {
        let env = TestEnv::new().await;
        let store = env.store(window().today());
        let out = show_month(&store, &env.session(), window()).await.unwrap();
        let dashboard = out.structure().unwrap();

        assert_eq!(dashboard.month, "October 2025");
        assert!(dashboard.failures.is_empty());
        dashboard.ensure_complete().unwrap();
        assert_eq!(dashboard.stats.len(), 2);
        assert_eq!(dashboard.expenses.as_ref().map(Vec::len), Some(11));
        assert_eq!(dashboard.grand_total, dashboard.month_to_date_total);
        assert_eq!(
            dashboard.grand_total,
            Some(Amount::from_str("1913.18").unwrap())
        );

        let text = out.message();
        assert!(text.starts_with("October 2025"));
        assert!(text.contains("$1,450.00"));
        assert!(text.contains("Average daily spend (excl. rent)"));
        assert!(text.contains("October 1 - October 31"));
        assert!(text.contains("Hardware store"));
    }

    #[tokio::test]
    async fn test_show_with_failed_fetch() {
        let env = TestEnv::new().await;
        let store = env.store(window().today()).fail(Operation::Sum);
        let out = show_month(&store, &env.session(), window()).await.unwrap();
        let dashboard = out.structure().unwrap();

        assert!(dashboard.stats.is_empty());
        assert!(dashboard.category_totals.is_some());
        assert!(dashboard.expenses.is_some());
        assert_eq!(dashboard.month_to_date_total, None);
        assert!(out.message().contains("Unable to load the grand total"));
        assert!(out.message().contains("not available until the month has loaded"));
        let err = dashboard.ensure_complete().unwrap_err();
        assert!(err.to_string().contains("could not be loaded"));
    }

    #[tokio::test]
    async fn test_render_matches_display() {
        let env = TestEnv::new().await;
        let store = env.store(window().today()).fail(Operation::Expenses);
        let out = show_month(&store, &env.session(), window()).await.unwrap();
        let dashboard = out.structure().unwrap();
        let text = dashboard.to_string();
        assert!(text.ends_with('\n'));
        assert_eq!(dashboard.render(), text.trim_end());
        assert_eq!(out.message(), dashboard.render());
        let month_to_date = text.split("Month to date").nth(1).unwrap();
        assert!(month_to_date.starts_with("\n  (unavailable)"));
    }

    #[tokio::test]
    async fn test_show_without_rent() {
        let env = TestEnv::new().await;
        let expense = Expense::new(
            "Snacks",
            crate::model::ExpenseType::Groceries,
            Amount::from_str("9.99").unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 2).unwrap(),
            "",
        )
        .owned_by(env.uid());
        let store = env.store_with(vec![expense], true);
        let out = show_month(&store, &env.session(), window()).await.unwrap();
        assert!(out.structure().unwrap().stats.is_empty());
        assert!(out.message().contains("until this month's rent is recorded"));
    }

    #[tokio::test]
    async fn test_show_refuses_pending_user() {
        let env = TestEnv::new().await;
        let store = env.store_with(vec![], false);
        let err = show_month(&store, &env.session(), window())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not been approved"));
    }

    #[tokio::test]
    async fn test_show_registers_unknown_user() {
        let env = TestEnv::new().await;
        let store = crate::api::TestStore::new(vec![], vec![]);
        let err = show_month(&store, &env.session(), window())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("waiting for approval"));
        assert_eq!(store.users().len(), 1);
    }

    #[tokio::test]
    async fn test_show_from_home_dir() {
        let env = TestEnv::new().await;
        let out = show(env.config(), Mode::Test).await.unwrap();
        assert!(out.structure().unwrap().failures.is_empty());
    }
}
