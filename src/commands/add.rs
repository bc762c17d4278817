use crate::api::{Mode, Store};
use crate::args::AddArgs;
use crate::commands::{connect, month, require_identity, Dashboard, Out};
use crate::form::ExpenseForm;
use crate::session::Session;
use crate::window::DateWindow;
use crate::{Config, Result};
use anyhow::Context;
use tracing::{debug, warn};

/// Handles the `expenses add` command.
///
/// The form is checked before anything else happens and every problem is reported together. The
/// expense is then stored remotely and, only once the store has accepted it, added to this
/// session's view of the month.
pub async fn add(config: Config, mode: Mode, args: AddArgs) -> Result<Out<Dashboard>> {
    let form = ExpenseForm {
        name: args.name().map(str::to_string),
        r#type: args.r#type().map(str::to_string),
        amount: args.amount().map(str::to_string),
        date: args.date().map(str::to_string),
        notes: args.notes().map(str::to_string),
    };
    let (session, store) = connect(&config, mode).await?;
    add_expense(store.as_ref(), &session, DateWindow::now(), &form).await
}

async fn add_expense(
    store: &dyn Store,
    session: &Session,
    window: DateWindow,
    form: &ExpenseForm,
) -> Result<Out<Dashboard>> {
    let expense = form.validate(window.today())?;
    let identity = require_identity(store, session).await?;
    let mut month = month::open(store, window).await;

    let expense = expense.owned_by(identity.uid());
    store
        .insert_expense(&expense)
        .await
        .context("Unable to save the expense")?;
    debug!("Stored {expense:?}");

    let summary = format!("Added {} ({}, {})", expense.name, expense.r#type, expense.amount);
    if let Err(e) = month.cache.record_expense(expense.clone()) {
        warn!("The expense was saved but is not shown in this month's view: {e}");
    }

    let dashboard = Dashboard::new(&month.cache, month.failures).with_saved(expense);
    Ok(Out::new(
        format!("{summary}\n\n{}", dashboard.render()),
        dashboard,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Operation, TestStore};
    use crate::form::ValidationErrors;
    use crate::model::{Amount, ExpenseType};
    use crate::test::TestEnv;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn window() -> DateWindow {
        DateWindow::new(NaiveDate::from_ymd_opt(2025, 10, 20).unwrap())
    }

    fn form(name: &str, t: &str, amount: &str, date: Option<&str>) -> ExpenseForm {
        ExpenseForm {
            name: Some(name.to_string()),
            r#type: Some(t.to_string()),
            amount: Some(amount.to_string()),
            date: date.map(str::to_string),
            notes: None,
        }
    }

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_add_updates_every_view() {
        let env = TestEnv::new().await;
        let store = env.store(window().today());
        let out = add_expense(
            &store,
            &env.session(),
            window(),
            &form("Bakery", "groceries", "6.82", Some("2025-10-19")),
        )
        .await
        .unwrap();
        let dashboard = out.structure().unwrap();

        assert_eq!(dashboard.grand_total, Some(amt("1920.00")));
        assert_eq!(dashboard.grand_total, dashboard.month_to_date_total);
        let expenses = dashboard.expenses.as_ref().unwrap();
        assert_eq!(expenses.len(), 12);
        assert_eq!(expenses[0].name, "Bakery");
        let groceries = dashboard
            .category_totals
            .as_ref()
            .unwrap()
            .iter()
            .find(|t| t.r#type == ExpenseType::Groceries)
            .unwrap();
        assert_eq!(groceries.amount, amt("253.28"));
        assert!(out.message().starts_with("Added Bakery (Groceries, $6.82)"));

        let stored = store.expenses();
        assert_eq!(stored.len(), 12);
        assert_eq!(stored[11].uid, Some(env.uid()));
    }

    #[tokio::test]
    async fn test_add_new_category() {
        let env = TestEnv::new().await;
        let rent = crate::model::Expense::new(
            "Rent",
            ExpenseType::Rent,
            amt("1000"),
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            "",
        )
        .owned_by(env.uid());
        let store = env.store_with(vec![rent], true);
        let out = add_expense(
            &store,
            &env.session(),
            window(),
            &form("Cinema", "Leisure", "20", None),
        )
        .await
        .unwrap();
        let dashboard = out.structure().unwrap();
        assert_eq!(dashboard.category_totals.as_ref().unwrap().len(), 2);
        assert_eq!(dashboard.grand_total, Some(amt("1020")));
        assert_eq!(dashboard.month_to_date_total, Some(amt("1020")));
        assert_eq!(dashboard.expenses.as_ref().unwrap()[0].date, window().today());
    }

    #[tokio::test]
    async fn test_invalid_form_touches_nothing() {
        let env = TestEnv::new().await;
        let store = TestStore::new(vec![], vec![]);
        let err = add_expense(
            &store,
            &env.session(),
            window(),
            &form("", "Toys", "-1", None),
        )
        .await
        .unwrap_err();
        let errors = err.downcast_ref::<ValidationErrors>().unwrap();
        assert_eq!(errors.messages().len(), 3);
        // Validation happens before the user is even looked up
        assert!(store.users().is_empty());
        assert!(store.expenses().is_empty());
    }

    #[tokio::test]
    async fn test_failed_insert_is_an_error() {
        let env = TestEnv::new().await;
        let store = env
            .store(window().today())
            .fail(Operation::InsertExpense);
        let err = add_expense(
            &store,
            &env.session(),
            window(),
            &form("Taxi", "Travel", "30", None),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Unable to save the expense"));
        assert_eq!(store.expenses().len(), 11);
    }

    #[tokio::test]
    async fn test_expense_before_the_month_is_saved_but_not_shown() {
        let env = TestEnv::new().await;
        let store = env.store(window().today());
        let out = add_expense(
            &store,
            &env.session(),
            window(),
            &form("Old bill", "Errand", "12", Some("2025-09-30")),
        )
        .await
        .unwrap();
        let dashboard = out.structure().unwrap();
        assert_eq!(dashboard.expenses.as_ref().unwrap().len(), 11);
        assert_eq!(dashboard.grand_total, Some(amt("1913.18")));
        assert_eq!(store.expenses().len(), 12);
    }

    #[tokio::test]
    async fn test_incomplete_dashboard_after_save_says_not_to_retry() {
        let env = TestEnv::new().await;
        let store = env.store(window().today()).fail(Operation::Totals);
        let out = add_expense(
            &store,
            &env.session(),
            window(),
            &form("Taxi", "Travel", "30", None),
        )
        .await
        .unwrap();
        assert_eq!(store.expenses().len(), 12);

        let dashboard = out.structure().unwrap();
        assert_eq!(dashboard.saved.as_ref().map(|e| e.name.as_str()), Some("Taxi"));
        let err = dashboard.ensure_complete().unwrap_err().to_string();
        assert!(err.contains("'Taxi' was saved, but the dashboard is incomplete"));
        assert!(err.contains("Do not add it again"));
        assert!(err.contains("Unable to load the category totals"));
    }

    #[tokio::test]
    async fn test_oversized_amount_is_refused_before_saving() {
        let env = TestEnv::new().await;
        let store = env.store(window().today());
        let err = add_expense(
            &store,
            &env.session(),
            window(),
            &form("Everything", "Leisure", "79228162514264337593543950335", None),
        )
        .await
        .unwrap_err();
        let errors = err.downcast_ref::<ValidationErrors>().unwrap();
        assert_eq!(errors.messages(), ["Amount is too large."]);
        assert_eq!(store.expenses().len(), 11);
    }

    #[tokio::test]
    async fn test_unapproved_user_cannot_add() {
        let env = TestEnv::new().await;
        let store = env.store_with(vec![], false);
        let err = add_expense(
            &store,
            &env.session(),
            window(),
            &form("Taxi", "Travel", "30", None),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("not been approved"));
        assert!(store.expenses().is_empty());
    }

    #[tokio::test]
    async fn test_add_from_home_dir() {
        let env = TestEnv::new().await;
        let args = AddArgs::new("Coffee", "restaurants", "3.50", None, None);
        let out = add(env.config(), Mode::Test, args).await.unwrap();
        assert!(out.message().starts_with("Added Coffee"));
    }
}
