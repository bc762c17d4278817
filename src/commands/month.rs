use crate::api::Store;
use crate::cache::{Action, AggregationCache};
use crate::window::DateWindow;
use crate::Result;
use tracing::{debug, warn};

/// The cache for the current month along with the fetches that did not make it into it.
pub(super) struct Month {
    pub(super) cache: AggregationCache,
    pub(super) failures: Vec<String>,
}

/// Fetches the month's expenses, category totals and grand total at the same time and applies
/// each to a new cache. A failed fetch leaves its part of the cache empty and is recorded in
/// `failures`; it does not stop the other parts from loading.
pub(super) async fn open(store: &dyn Store, window: DateWindow) -> Month {
    let since = window.first_of_month();
    debug!("Loading expenses since {}", window.date_param());
    let (expenses, totals, sum) = tokio::join!(
        store.expenses_since(since),
        store.totals_by_type(since),
        store.sum_since(since),
    );

    let mut month = Month {
        cache: AggregationCache::new(window),
        failures: Vec::new(),
    };
    month.apply("expenses", expenses.map(Action::Expenses));
    month.apply("category totals", totals.map(Action::CategoryTotals));
    month.apply("grand total", sum.map(Action::GrandTotal));
    month
}

impl Month {
    fn apply(&mut self, what: &str, fetched: Result<Action>) {
        match fetched {
            Ok(action) => {
                if let Err(e) = self.cache.apply(action) {
                    warn!("The {what} were not applied: {e}");
                }
            }
            Err(e) => {
                warn!("Unable to load the {what}: {e:#}");
                self.failures.push(format!("Unable to load the {what}: {e:#}"));
            }
        }
    }
}
