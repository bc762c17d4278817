//! Implements the `Store` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a network connection.

use crate::api::Store;
use crate::model::{Amount, CategoryTotal, Expense, ExpenseType, User};
use crate::Result;
use anyhow::{bail, Context};
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashSet};
use std::io::Cursor;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// The operations of a `TestStore` that can be made to fail.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub(crate) enum Operation {
    Expenses,
    Totals,
    Sum,
    InsertExpense,
    User,
    InsertUser,
}

/// An implementation of the `Store` trait that keeps its rows in memory. It computes the
/// per-category and grand sums itself, the way the hosted database's stored procedures do.
#[derive(Debug, Default)]
pub(crate) struct TestStore {
    data: Mutex<Data>,
    failures: HashSet<Operation>,
}

#[derive(Debug, Default, Clone)]
struct Data {
    expenses: Vec<Expense>,
    users: Vec<User>,
    next_id: i64,
}

impl TestStore {
    /// Creates a store holding `expenses` and `users`.
    pub(crate) fn new(expenses: Vec<Expense>, users: Vec<User>) -> Self {
        let next_id = expenses.len() as i64 + 1;
        Self {
            data: Mutex::new(Data {
                expenses,
                users,
                next_id,
            }),
            failures: HashSet::new(),
        }
    }

    /// Creates a store seeded with a month of expenses owned by `uid`, dated in the month of
    /// `today` and no later than `today`. `uid` is provisioned and valid.
    pub(crate) fn seeded(uid: Uuid, today: NaiveDate) -> Result<Self> {
        let expenses = load_seed(SEED_DATA, uid, today)?;
        Ok(Self::new(expenses, vec![User { uid, valid: true }]))
    }

    #[cfg(test)]
    /// Makes `operation` return an error from now on.
    pub(crate) fn fail(mut self, operation: Operation) -> Self {
        self.failures.insert(operation);
        self
    }

    #[cfg(test)]
    /// A copy of every stored expense, in insertion order.
    pub(crate) fn expenses(&self) -> Vec<Expense> {
        self.lock().expenses.clone()
    }

    #[cfg(test)]
    pub(crate) fn users(&self) -> Vec<User> {
        self.lock().users.clone()
    }

    fn check(&self, operation: Operation) -> Result<()> {
        if self.failures.contains(&operation) {
            bail!("The store is unavailable ({operation:?})");
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Data> {
        // A panic while holding the lock cannot leave `Data` half-written
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl Store for TestStore {
    async fn expenses_since(&self, since: NaiveDate) -> Result<Vec<Expense>> {
        self.check(Operation::Expenses)?;
        let mut expenses: Vec<Expense> = self
            .lock()
            .expenses
            .iter()
            .filter(|e| e.date >= since)
            .map(|e| Expense {
                uid: None,
                id: None,
                ..e.clone()
            })
            .collect();
        expenses.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(expenses)
    }

    async fn totals_by_type(&self, since: NaiveDate) -> Result<Vec<CategoryTotal>> {
        self.check(Operation::Totals)?;
        let mut totals: BTreeMap<ExpenseType, Amount> = BTreeMap::new();
        for expense in self.lock().expenses.iter().filter(|e| e.date >= since) {
            *totals.entry(expense.r#type).or_default() += expense.amount;
        }
        Ok(totals
            .into_iter()
            .map(|(t, amount)| CategoryTotal::new(t, amount))
            .collect())
    }

    async fn sum_since(&self, since: NaiveDate) -> Result<Option<Amount>> {
        self.check(Operation::Sum)?;
        let data = self.lock();
        let mut in_window = data.expenses.iter().filter(|e| e.date >= since).peekable();
        if in_window.peek().is_none() {
            return Ok(None);
        }
        Ok(Some(in_window.map(|e| e.amount).sum()))
    }

    async fn insert_expense(&self, expense: &Expense) -> Result<()> {
        self.check(Operation::InsertExpense)?;
        if expense.uid.is_none() {
            bail!("An expense must have an owner before it can be stored");
        }
        let mut data = self.lock();
        let id = data.next_id;
        data.next_id += 1;
        data.expenses.push(Expense {
            id: Some(id),
            ..expense.clone()
        });
        Ok(())
    }

    async fn user(&self, uid: Uuid) -> Result<Option<User>> {
        self.check(Operation::User)?;
        Ok(self.lock().users.iter().find(|u| u.uid == uid).copied())
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        self.check(Operation::InsertUser)?;
        let mut data = self.lock();
        if data.users.iter().any(|u| u.uid == user.uid) {
            bail!("A user row already exists for {}", user.uid);
        }
        data.users.push(*user);
        Ok(())
    }
}

/// Parses seed rows of `name,type,amount,day,notes`. `day` is a day of `today`'s month and is
/// pulled back to `today` when it lies in the future.
fn load_seed(csv_data: &str, uid: Uuid, today: NaiveDate) -> Result<Vec<Expense>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut expenses = Vec::new();
    for (ix, result) in rdr.records().enumerate() {
        let record = result?;
        let field = |i: usize| {
            record
                .get(i)
                .with_context(|| format!("Seed row {} is missing column {i}", ix + 1))
        };
        let r#type = ExpenseType::from_str(field(1)?)
            .with_context(|| format!("Seed row {} has an unknown type", ix + 1))?;
        let amount = Amount::from_str(field(2)?)?;
        let day: u32 = field(3)?.parse()?;
        let date = today
            .with_day(day.min(today.day()))
            .with_context(|| format!("Seed row {} has a bad day {day}", ix + 1))?;
        let mut expense = Expense::new(field(0)?, r#type, amount, date, field(4)?).owned_by(uid);
        expense.id = Some(ix as i64 + 1);
        expenses.push(expense);
    }
    Ok(expenses)
}

/// Seed expense data.
const SEED_DATA: &str = r##"name,type,amount,day,notes
Rent,Rent,1450.00,1,Monthly rent
Whole Foods Market,Groceries,87.43,2,
Chipotle,Restaurants,14.85,3,Lunch with Sam
Metro card,Travel,33.00,4,
Trader Joe's,Groceries,63.21,6,
Movie tickets,Leisure,28.00,7,Friday night
Dry cleaning,Errand,18.50,9,
Safeway,Groceries,95.82,11,
Olive Garden,Restaurants,42.30,13,Birthday dinner
Train to the coast,Travel,56.40,16,Weekend trip
Hardware store,Errand,23.67,19,Shelf brackets
"##;
