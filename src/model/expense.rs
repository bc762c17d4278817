use crate::model::Amount;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single recorded expense. Expenses are never edited or deleted once recorded.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub name: String,
    pub r#type: ExpenseType,
    pub amount: Amount,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
    /// The owner. The month query does not select it, so it is usually absent on fetched rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<Uuid>,
    /// Assigned by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl Expense {
    pub fn new(
        name: impl Into<String>,
        r#type: ExpenseType,
        amount: Amount,
        date: NaiveDate,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            r#type,
            amount,
            date,
            notes: notes.into(),
            uid: None,
            id: None,
        }
    }

    /// Returns a copy of this expense tied to the owner `uid`.
    pub fn owned_by(mut self, uid: Uuid) -> Self {
        self.uid = Some(uid);
        self
    }
}

/// The fixed set of spending categories.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum ExpenseType {
    Rent,
    Groceries,
    Travel,
    Restaurants,
    Leisure,
    Errand,
}

serde_plain::derive_display_from_serialize!(ExpenseType);
serde_plain::derive_fromstr_from_deserialize!(ExpenseType);

impl ExpenseType {
    pub const ALL: [ExpenseType; 6] = [
        ExpenseType::Rent,
        ExpenseType::Groceries,
        ExpenseType::Travel,
        ExpenseType::Restaurants,
        ExpenseType::Leisure,
        ExpenseType::Errand,
    ];

    /// Parses user input without regard to case, e.g. `rent` or `RENT`.
    pub fn parse_loose(s: &str) -> Option<ExpenseType> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.to_string().eq_ignore_ascii_case(s))
    }
}

/// The running sum of one category for the current month.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub r#type: ExpenseType,
    pub amount: Amount,
}

impl CategoryTotal {
    pub fn new(r#type: ExpenseType, amount: Amount) -> Self {
        Self { r#type, amount }
    }
}

/// The provisioning row kept for every user who has signed in. Only users marked `valid` may see
/// the dashboard.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub uid: Uuid,
    pub valid: bool,
}
