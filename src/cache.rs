//! The session's local copy of the current month.
//!
//! The cache holds three views of the same data: the expenses ordered newest first, the total per
//! category, and the grand total. The views arrive independently from the store and are only
//! exposed once all three are present. After that, recording a new expense updates every view in
//! one step so that the sums always agree with the list.

use crate::model::{Amount, CategoryTotal, Expense, ExpenseType};
use crate::window::DateWindow;
use chrono::NaiveDate;
use tracing::{debug, trace};

/// Reasons a cache operation is refused. A refused operation never changes the cache.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum CacheError {
    #[error("the month has not finished loading")]
    NotLoaded,
    #[error("an expense dated {date} is before the start of the month ({start})")]
    OutsideWindow { date: NaiveDate, start: NaiveDate },
    #[error("the month is already loaded")]
    AlreadyLoaded,
    #[error("adding {amount} would overflow the month's totals")]
    Overflow { amount: Amount },
}

/// A complete, consistent view of the month.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Snapshot {
    expenses: Vec<Expense>,
    category_totals: Vec<CategoryTotal>,
    grand_total: Amount,
}

impl Snapshot {
    /// Expenses ordered by date, newest first.
    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    /// One entry per category with at least one expense.
    pub fn category_totals(&self) -> &[CategoryTotal] {
        &self.category_totals
    }

    pub fn grand_total(&self) -> Amount {
        self.grand_total
    }

    /// The total for `category`, if it has any expenses.
    pub fn category_total(&self, category: ExpenseType) -> Option<Amount> {
        self.category_totals
            .iter()
            .find(|t| t.r#type == category)
            .map(|t| t.amount)
    }
}

/// Everything that can change the cache.
#[derive(Debug, Clone)]
pub enum Action {
    /// The month's expenses, newest first.
    Expenses(Vec<Expense>),
    /// The per-category sums.
    CategoryTotals(Vec<CategoryTotal>),
    /// The grand sum. The store reports `None` when there are no rows to sum.
    GrandTotal(Option<Amount>),
    /// An expense that the store has already accepted.
    Record(Expense),
}

/// The cache contents. Each part stays `None` until its fetch lands.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
enum State {
    #[default]
    Empty,
    Partial {
        expenses: Option<Vec<Expense>>,
        category_totals: Option<Vec<CategoryTotal>>,
        grand_total: Option<Amount>,
    },
    Loaded(Snapshot),
}

impl State {
    fn parts(
        &self,
    ) -> (
        Option<Vec<Expense>>,
        Option<Vec<CategoryTotal>>,
        Option<Amount>,
    ) {
        match self {
            State::Partial {
                expenses,
                category_totals,
                grand_total,
            } => (expenses.clone(), category_totals.clone(), *grand_total),
            State::Empty | State::Loaded(_) => (None, None, None),
        }
    }

    /// Promotes to `Loaded` once every part is present.
    fn from_parts(
        expenses: Option<Vec<Expense>>,
        category_totals: Option<Vec<CategoryTotal>>,
        grand_total: Option<Amount>,
    ) -> State {
        match (expenses, category_totals, grand_total) {
            (Some(expenses), Some(category_totals), Some(grand_total)) => {
                State::Loaded(Snapshot {
                    expenses,
                    category_totals,
                    grand_total,
                })
            }
            (expenses, category_totals, grand_total) => State::Partial {
                expenses,
                category_totals,
                grand_total,
            },
        }
    }
}

/// Computes the state that results from applying `action` to `state`. `state` itself is left as
/// it was, so a refused action has nothing to undo.
fn reduce(state: &State, window: &DateWindow, action: Action) -> Result<State, CacheError> {
    if matches!(state, State::Loaded(_)) && !matches!(action, Action::Record(_)) {
        return Err(CacheError::AlreadyLoaded);
    }
    let (expenses, category_totals, grand_total) = state.parts();
    match action {
        Action::Expenses(e) => Ok(State::from_parts(Some(e), category_totals, grand_total)),
        Action::CategoryTotals(c) => Ok(State::from_parts(expenses, Some(c), grand_total)),
        Action::GrandTotal(g) => Ok(State::from_parts(
            expenses,
            category_totals,
            g.or(grand_total),
        )),
        Action::Record(expense) => match state {
            State::Loaded(snapshot) => record(snapshot, window, expense).map(State::Loaded),
            State::Empty | State::Partial { .. } => Err(CacheError::NotLoaded),
        },
    }
}

fn record(
    snapshot: &Snapshot,
    window: &DateWindow,
    expense: Expense,
) -> Result<Snapshot, CacheError> {
    if !window.contains(expense.date) {
        return Err(CacheError::OutsideWindow {
            date: expense.date,
            start: window.first_of_month(),
        });
    }

    let mut next = snapshot.clone();

    // Before the first expense that is not newer, which puts it ahead of same-day expenses
    let position = next
        .expenses
        .iter()
        .position(|existing| expense.date >= existing.date)
        .unwrap_or(next.expenses.len());

    let overflow = CacheError::Overflow {
        amount: expense.amount,
    };
    match next
        .category_totals
        .iter_mut()
        .find(|t| t.r#type == expense.r#type)
    {
        Some(total) => {
            total.amount = total
                .amount
                .checked_add(expense.amount)
                .ok_or_else(|| overflow.clone())?
        }
        None => next
            .category_totals
            .push(CategoryTotal::new(expense.r#type, expense.amount)),
    }
    next.grand_total = next.grand_total.checked_add(expense.amount).ok_or(overflow)?;
    next.expenses.insert(position, expense);
    Ok(next)
}

/// The owned, per-session cache. Construct one per session and pass it to whatever needs it.
#[derive(Debug, Clone)]
pub struct AggregationCache {
    window: DateWindow,
    state: State,
}

impl AggregationCache {
    /// Creates an empty cache scoped to `window`.
    pub fn new(window: DateWindow) -> Self {
        Self {
            window,
            state: State::Empty,
        }
    }

    pub fn window(&self) -> &DateWindow {
        &self.window
    }

    /// Applies a single action. On error the cache is unchanged.
    pub fn apply(&mut self, action: Action) -> Result<(), CacheError> {
        trace!("apply {action:?}");
        self.state = reduce(&self.state, &self.window, action)?;
        Ok(())
    }

    /// Initializes all three views at once.
    pub fn load(
        &mut self,
        expenses: Vec<Expense>,
        category_totals: Vec<CategoryTotal>,
        grand_total: Option<Amount>,
    ) -> Result<(), CacheError> {
        let staged = [
            Action::Expenses(expenses),
            Action::CategoryTotals(category_totals),
            Action::GrandTotal(grand_total),
        ]
        .into_iter()
        .try_fold(self.state.clone(), |state, action| {
            reduce(&state, &self.window, action)
        })?;
        self.state = staged;
        debug!("Cache loaded: {}", self.is_loaded());
        Ok(())
    }

    /// Adds an expense that the store has already accepted to every view.
    pub fn record_expense(&mut self, expense: Expense) -> Result<(), CacheError> {
        self.apply(Action::Record(expense))
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, State::Loaded(_))
    }

    /// The complete month, or `None` while any part is still missing.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match &self.state {
            State::Loaded(snapshot) => Some(snapshot),
            State::Empty | State::Partial { .. } => None,
        }
    }

    /// The expenses, if they have arrived, even when the other parts have not.
    pub fn expenses(&self) -> Option<&[Expense]> {
        match &self.state {
            State::Loaded(s) => Some(s.expenses()),
            State::Partial { expenses, .. } => expenses.as_deref(),
            State::Empty => None,
        }
    }

    /// The category totals, if they have arrived, even when the other parts have not.
    pub fn category_totals(&self) -> Option<&[CategoryTotal]> {
        match &self.state {
            State::Loaded(s) => Some(s.category_totals()),
            State::Partial {
                category_totals, ..
            } => category_totals.as_deref(),
            State::Empty => None,
        }
    }
}
