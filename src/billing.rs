use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::ExpenseError;
use crate::expenses::Entry;

/// Rounds to cents, midpoints away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// An unrounded amount of money in the configured currency.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub struct Money(Decimal);

impl Money {
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn rounded(&self) -> Decimal {
        round_cents(self.amount())
    }

    pub fn display<'a>(&self, currency: &'a str) -> MoneyDisplay<'a> {
        MoneyDisplay(currency, *self)
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_mul(self, other: Decimal) -> Option<Self> {
        self.0.checked_mul(other).map(Self)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rounded = self.rounded();
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let fixed = format!("{:.2}", rounded.abs());
        let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
        // A Decimal has at most 29 integer digits, well inside u128.
        let whole: u128 = whole.parse().map_err(|_| fmt::Error)?;
        write!(
            f,
            "{}{}.{}",
            sign,
            whole.to_formatted_string(&Locale::en),
            cents
        )
    }
}

/// Money prefixed with a currency symbol or code.
pub struct MoneyDisplay<'a>(&'a str, Money);

impl fmt::Display for MoneyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.0, self.1)
    }
}

/// One display row of an invoice.
#[derive(Debug, PartialEq, Clone)]
pub struct LineItem {
    pub date: Option<NaiveDate>,
    pub category: String,
    pub title: String,
    pub hours: Option<Decimal>,
    pub rate: Option<Money>,
    pub amount: Money,
}

impl LineItem {
    fn worked(
        title: &str,
        date: NaiveDate,
        hours: Decimal,
        rate: Decimal,
    ) -> Option<Self> {
        let rate = Money::new(rate);
        Some(Self {
            date: Some(date),
            category: title.to_string(),
            title: title.to_string(),
            hours: Some(hours),
            rate: Some(rate),
            amount: rate.checked_mul(hours)?,
        })
    }

    fn charge(category: &str, title: &str, amount: Decimal) -> Self {
        Self {
            date: None,
            category: category.to_string(),
            title: title.to_string(),
            hours: None,
            rate: None,
            amount: Money::new(amount),
        }
    }
}

impl fmt::Display for LineItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(date) = self.date {
            write!(f, "{} ", date)?;
        }
        write!(f, "{}", self.title)?;
        if let (Some(hours), Some(rate)) = (self.hours, self.rate) {
            write!(f, ", {} @ {}", hours.normalize(), rate)?;
        }
        write!(f, ": {}", self.amount)
    }
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Totals {
    pub total_hours: Decimal,
    pub rates: BTreeSet<Decimal>,
    pub total_amount: Money,
    pub line_items: Vec<LineItem>,
}

impl Totals {
    /// Accumulates every entry once, without intermediate rounding.
    ///
    /// Fails with the index of the first entry whose amounts no longer fit
    /// in a `Decimal`.
    pub fn calculate(entries: &[Entry]) -> Result<Self, ExpenseError> {
        let mut totals = Self::default();
        for (index, entry) in entries.iter().enumerate() {
            totals
                .accumulate(entry)
                .ok_or(ExpenseError::Overflow { index })?;
        }
        Ok(totals)
    }

    fn accumulate(&mut self, entry: &Entry) -> Option<()> {
        match entry {
            Entry::Hours { title, rate, hours } => {
                self.rates.insert(rate.normalize());
                for worked in hours {
                    self.total_hours = self.total_hours.checked_add(worked.hours)?;
                    self.push(LineItem::worked(
                        title,
                        worked.date,
                        worked.hours,
                        *rate,
                    )?)?;
                }
            }
            Entry::Itemized { title, items } => {
                for item in items {
                    self.push(LineItem::charge(title, &item.title, item.amount))?;
                }
            }
            Entry::Flat { title, amount } => {
                self.push(LineItem::charge(title, title, *amount))?;
            }
        }
        Some(())
    }

    fn push(&mut self, item: LineItem) -> Option<()> {
        self.total_amount = self.total_amount.checked_add(item.amount)?;
        self.line_items.push(item);
        Some(())
    }
}

impl fmt::Display for Totals {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for item in self.line_items.iter() {
            writeln!(f, "{}", item)?;
        }
        write!(
            f,
            "\nHours: {}\nTotal: {}",
            self.total_hours.normalize(),
            self.total_amount
        )
    }
}
