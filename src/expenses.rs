use std::io::Read;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};
use strum_macros::{Display, EnumString};

use crate::error::ExpenseError;

const HOURS_TITLE: &str = "Consulting";
const ITEMIZED_TITLE: &str = "Expenses";

// Keys that identify an untagged entry's shape.
const SHAPE_KEYS: [(&str, Kind); 3] = [
    ("hours", Kind::Hours),
    ("items", Kind::Itemized),
    ("amount", Kind::Flat),
];

#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct Worked {
    pub date: NaiveDate,
    pub hours: Decimal,
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct Item {
    pub title: String,
    pub amount: Decimal,
}

/// A billable line resolved from the input data.
#[derive(Debug, PartialEq, Clone)]
pub enum Entry {
    Hours {
        title: String,
        rate: Decimal,
        hours: Vec<Worked>,
    },
    Itemized {
        title: String,
        items: Vec<Item>,
    },
    Flat {
        title: String,
        amount: Decimal,
    },
}

impl Entry {
    pub fn kind(&self) -> Kind {
        match self {
            Entry::Hours { .. } => Kind::Hours,
            Entry::Itemized { .. } => Kind::Itemized,
            Entry::Flat { .. } => Kind::Flat,
        }
    }
}

#[derive(Display, EnumString, Debug, PartialEq, Clone, Copy)]
pub enum Kind {
    #[strum(serialize = "hours")]
    Hours,
    #[strum(to_string = "itemized", serialize = "expenses")]
    Itemized,
    #[strum(serialize = "flat")]
    Flat,
}

#[derive(Deserialize)]
struct RawHours {
    #[serde(default = "hours_title")]
    title: String,
    rate: Decimal,
    hours: Vec<Worked>,
}

#[derive(Deserialize)]
struct RawItemized {
    #[serde(default = "itemized_title")]
    title: String,
    items: Vec<Item>,
}

#[derive(Deserialize)]
struct RawFlat {
    title: String,
    amount: Decimal,
}

fn hours_title() -> String {
    HOURS_TITLE.to_string()
}

fn itemized_title() -> String {
    ITEMIZED_TITLE.to_string()
}

fn invalid(index: usize, reason: impl Into<String>) -> ExpenseError {
    ExpenseError::Validation {
        index,
        reason: reason.into(),
    }
}

pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Entry>, ExpenseError> {
    let document: Value = serde_json::from_reader(reader)?;
    from_value(document)
}

pub fn from_str(json: &str) -> Result<Vec<Entry>, ExpenseError> {
    let document: Value = serde_json::from_str(json)?;
    from_value(document)
}

pub fn from_value(document: Value) -> Result<Vec<Entry>, ExpenseError> {
    match document {
        Value::Array(values) => values
            .into_iter()
            .enumerate()
            .map(|(index, value)| entry(index, value))
            .collect(),
        _ => Err(ExpenseError::NotAnArray),
    }
}

fn kind_of(index: usize, object: &Map<String, Value>) -> Result<Kind, ExpenseError> {
    if let Some(tag) = object.get("type") {
        let tag = tag
            .as_str()
            .ok_or_else(|| invalid(index, "`type` must be a string"))?;
        return tag
            .parse()
            .map_err(|_| invalid(index, format!("unknown entry type '{}'", tag)));
    }

    let shapes: Vec<(&str, Kind)> = SHAPE_KEYS
        .iter()
        .copied()
        .filter(|(key, _)| object.contains_key(*key))
        .collect();

    match shapes.as_slice() {
        [(_, kind)] => Ok(*kind),
        [] => Err(invalid(
            index,
            "matches no entry shape, expected `hours`, `items` or `amount`",
        )),
        _ => {
            let keys: Vec<String> =
                shapes.iter().map(|(key, _)| format!("`{}`", key)).collect();
            Err(invalid(
                index,
                format!(
                    "ambiguous entry with {}, add a `type` tag",
                    keys.join(" and ")
                ),
            ))
        }
    }
}

fn entry(index: usize, value: Value) -> Result<Entry, ExpenseError> {
    let kind = match &value {
        Value::Object(object) => kind_of(index, object)?,
        _ => return Err(invalid(index, "entry is not an object")),
    };
    let reason = |e: serde_json::Error| invalid(index, format!("{} entry: {}", kind, e));

    let entry = match kind {
        Kind::Hours => {
            let RawHours { title, rate, hours } =
                serde_json::from_value(value).map_err(reason)?;
            if let Some(day) = hours.iter().find(|w| w.hours.is_sign_negative()) {
                return Err(invalid(
                    index,
                    format!("negative hours on {}", day.date),
                ));
            }
            Entry::Hours { title, rate, hours }
        }
        Kind::Itemized => {
            let RawItemized { title, items } =
                serde_json::from_value(value).map_err(reason)?;
            Entry::Itemized { title, items }
        }
        Kind::Flat => {
            let RawFlat { title, amount } =
                serde_json::from_value(value).map_err(reason)?;
            Entry::Flat { title, amount }
        }
    };

    Ok(entry)
}
