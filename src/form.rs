//! The new-expense form: raw text as typed by the user, checked field by field.

use crate::model::{Amount, Expense, ExpenseType};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

/// The largest amount a single expense may have. Keeps the month's sums well inside `Decimal`.
const MAX_AMOUNT: i64 = 1_000_000_000;

/// Every problem found with a form, in field order.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("{}", .0.join("\n"))]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

/// A candidate expense before validation. Every field is exactly what the user typed.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ExpenseForm {
    pub name: Option<String>,
    pub r#type: Option<String>,
    pub amount: Option<String>,
    /// `YYYY-MM-DD`, today when absent.
    pub date: Option<String>,
    pub notes: Option<String>,
}

impl ExpenseForm {
    /// Checks every field and either builds the expense or reports all of the problems together.
    pub fn validate(&self, today: NaiveDate) -> Result<Expense, ValidationErrors> {
        let mut errors = Vec::new();

        let name = self.name.as_deref().map(str::trim).unwrap_or_default();
        if name.is_empty() {
            errors.push("Name must not be empty.".to_string());
        }

        let r#type = match non_blank(&self.r#type) {
            None => {
                errors.push("Type required.".to_string());
                None
            }
            Some(s) => {
                let parsed = ExpenseType::parse_loose(s);
                if parsed.is_none() {
                    let names: Vec<String> =
                        ExpenseType::ALL.iter().map(|t| t.to_string()).collect();
                    errors.push(format!("Type must be one of: {}.", names.join(", ")));
                }
                parsed
            }
        };

        let amount = match non_blank(&self.amount) {
            None => {
                errors.push("Amount required.".to_string());
                None
            }
            Some(s) => match Amount::from_str(s) {
                Err(_) => {
                    errors.push("Amount must be a number.".to_string());
                    None
                }
                Ok(a) if !a.is_positive() => {
                    errors.push("Amount must be greater than 0.".to_string());
                    None
                }
                Ok(a) if a.value() > Decimal::from(MAX_AMOUNT) => {
                    errors.push("Amount is too large.".to_string());
                    None
                }
                Ok(a) => Some(a),
            },
        };

        let date = match non_blank(&self.date) {
            None => Some(today),
            Some(s) => {
                let parsed = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
                if parsed.is_none() {
                    errors.push("Date must be in YYYY-MM-DD format.".to_string());
                }
                parsed
            }
        };

        let notes = self.notes.as_deref().map(str::trim).unwrap_or_default();

        match (r#type, amount, date) {
            (Some(r#type), Some(amount), Some(date)) if errors.is_empty() => {
                Ok(Expense::new(name, r#type, amount, date, notes))
            }
            _ => Err(ValidationErrors(errors)),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
