//! The calendar month that scopes every query and every local insert.

use chrono::{Datelike, Local, NaiveDate};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// The current calendar month, from its first day up to `today`. Every value is derived from the
/// single date passed to `new`, so a window never straddles a clock change mid-session.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DateWindow {
    today: NaiveDate,
    first_of_month: NaiveDate,
    days_in_month: u32,
}

impl DateWindow {
    /// Builds the window containing `today`.
    pub fn new(today: NaiveDate) -> Self {
        // Day 1 always exists
        let first_of_month = today.with_day(1).unwrap_or(today);
        Self {
            today,
            first_of_month,
            days_in_month: days_in_month(today.year(), today.month()),
        }
    }

    /// Reads the local wall clock once and builds the window around it.
    pub fn now() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.today.year()
    }

    /// The month number, 1 through 12.
    pub fn month(&self) -> u32 {
        self.today.month()
    }

    /// The month number, 0 through 11.
    pub fn month0(&self) -> u32 {
        self.today.month0()
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn first_of_month(&self) -> NaiveDate {
        self.first_of_month
    }

    /// Days elapsed in the month so far, counting today. Never less than 1.
    pub fn days_elapsed(&self) -> u32 {
        self.today.day().max(1)
    }

    pub fn days_in_month(&self) -> u32 {
        self.days_in_month
    }

    /// Whether `date` falls on or after the first of the month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_of_month
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[self.month0() as usize]
    }

    /// The first of the month formatted as `YYYY-MM-DD`, the form the store expects for its date
    /// filters.
    pub fn date_param(&self) -> String {
        self.first_of_month.format("%Y-%m-%d").to_string()
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}
