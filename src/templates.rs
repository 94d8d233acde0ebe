use std::fmt;

use askama::Template;
use askama_escape::Escaper;

use crate::billing::{LineItem, Money, Totals};
use crate::template::TemplateError;

const MIN_TITLE_WIDTH: usize = 24;
const AMOUNT_WIDTH: usize = 14;
// Date, hours and rate columns plus the separators between all five.
const FIXED_WIDTH: usize = 10 + 7 + 12 + AMOUNT_WIDTH + 4 * 2;

/// Markup a fragment is rendered into.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Markup {
    Text,
    Tex,
}

#[derive(Debug, PartialEq, Clone)]
struct Row {
    date: String,
    title: String,
    hours: String,
    rate: String,
    amount: String,
}

#[derive(Debug, PartialEq, Clone)]
struct Line {
    label: String,
    value: String,
}

#[derive(Template)]
#[template(path = "items.tex")]
struct ItemsTex<'a> {
    rows: &'a [Row],
}

#[derive(Template)]
#[template(path = "totals.tex")]
struct TotalsTex<'a> {
    lines: &'a [Line],
}

#[derive(Template)]
#[template(path = "items.txt")]
struct ItemsText<'a> {
    heading: String,
    rule: String,
    rows: &'a [Row],
}

#[derive(Template)]
#[template(path = "totals.txt")]
struct TotalsText<'a> {
    rule: String,
    lines: &'a [Line],
}

fn describe(item: &LineItem) -> String {
    if item.category == item.title {
        item.title.clone()
    } else {
        format!("{}: {}", item.category, item.title)
    }
}

fn rows(totals: &Totals, currency: &str) -> Vec<Row> {
    totals
        .line_items
        .iter()
        .map(|item| Row {
            date: item.date.map(|d| d.to_string()).unwrap_or_default(),
            title: describe(item),
            hours: item
                .hours
                .map(|h| h.normalize().to_string())
                .unwrap_or_default(),
            rate: item
                .rate
                .map(|r| format!("{}/h", r.display(currency)))
                .unwrap_or_default(),
            amount: item.amount.display(currency).to_string(),
        })
        .collect()
}

fn lines(totals: &Totals, currency: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    if !totals.total_hours.is_zero() {
        lines.push(Line {
            label: "Hours".to_string(),
            value: totals.total_hours.normalize().to_string(),
        });
    }
    if !totals.rates.is_empty() {
        let label = if totals.rates.len() == 1 { "Rate" } else { "Rates" };
        let rates: Vec<String> = totals
            .rates
            .iter()
            .map(|r| format!("{}/h", Money::new(*r).display(currency)))
            .collect();
        lines.push(Line {
            label: label.to_string(),
            value: rates.join(", "),
        });
    }
    lines.push(Line {
        label: "Total".to_string(),
        value: totals.total_amount.display(currency).to_string(),
    });
    lines
}

fn pad(s: &str, width: usize) -> String {
    format!("{:<width$}", s, width = width)
}

fn pad_left(s: &str, width: usize) -> String {
    format!("{:>width$}", s, width = width)
}

/// The line-item block of an invoice.
pub fn items(
    totals: &Totals,
    currency: &str,
    markup: Markup,
) -> Result<String, TemplateError> {
    let mut rows = rows(totals, currency);
    let rendered = match markup {
        Markup::Tex => ItemsTex { rows: &rows }.render()?,
        Markup::Text => {
            let width = title_width(&rows);
            for row in rows.iter_mut() {
                row.title = pad(&row.title, width);
            }
            ItemsText {
                heading: pad("Description", width),
                rule: "-".repeat(width + FIXED_WIDTH),
                rows: &rows,
            }
            .render()?
        }
    };
    Ok(rendered.trim_end().to_string())
}

/// The totals block of an invoice, aligned under the amount column.
pub fn totals(
    totals: &Totals,
    currency: &str,
    markup: Markup,
) -> Result<String, TemplateError> {
    let mut lines = lines(totals, currency);
    let rendered = match markup {
        Markup::Tex => TotalsTex { lines: &lines }.render()?,
        Markup::Text => {
            let width = title_width(&rows(totals, currency));
            let label_width = width + FIXED_WIDTH - AMOUNT_WIDTH - 2;
            for line in lines.iter_mut() {
                line.label = pad_left(&format!("{}:", line.label), label_width);
            }
            TotalsText {
                rule: "=".repeat(width + FIXED_WIDTH),
                lines: &lines,
            }
            .render()?
        }
    };
    Ok(rendered.trim_end().to_string())
}

fn title_width(rows: &[Row]) -> usize {
    rows.iter()
        .map(|r| r.title.chars().count())
        .max()
        .unwrap_or(0)
        .max(MIN_TITLE_WIDTH)
}

/// Escapes text for inclusion in LaTeX source.
pub fn escape_tex(s: &str) -> String {
    let mut buf = String::with_capacity(s.len());
    // Writing into a String cannot fail.
    let _ = Tex.write_escaped(&mut buf, s);
    buf
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Tex;

impl Escaper for Tex {
    fn write_escaped<W>(&self, mut fmt: W, string: &str) -> fmt::Result
    where
        W: fmt::Write,
    {
        for c in string.chars() {
            match c {
                '%' => fmt.write_str("\\%")?,
                '$' => fmt.write_str("\\$")?,
                '&' => fmt.write_str("\\&")?,
                '#' => fmt.write_str("\\#")?,
                '_' => fmt.write_str("\\_")?,
                '{' => fmt.write_str("\\{")?,
                '}' => fmt.write_str("\\}")?,
                '~' => fmt.write_str("\\textasciitilde{}")?,
                '^' => fmt.write_str("\\textasciicircum{}")?,
                '\\' => fmt.write_str("\\textbackslash{}")?,
                _ => fmt.write_char(c)?,
            }
        }
        Ok(())
    }
}
