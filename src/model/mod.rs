//! Types that represent the core data model, such as `Expense` and `CategoryTotal`.
mod amount;
mod expense;

pub use amount::{Amount, AmountError};
pub use expense::{CategoryTotal, Expense, ExpenseType, User};
