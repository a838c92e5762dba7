use std::collections::BTreeMap;

use deposit_tracker_core::models::statement::FieldValue;
use rust_decimal::{Decimal, RoundingStrategy};

const SPACING: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Center,
    Right,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub id: &'static str,
    pub name: &'static str,
    pub align: Align,
    pub hide_if_empty: bool,
}

impl Column {
    pub const fn new(id: &'static str, name: &'static str) -> Self {
        Self {
            id,
            name,
            align: Align::Right,
            hide_if_empty: false,
        }
    }

    pub const fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    pub const fn hide_if_empty(mut self) -> Self {
        self.hide_if_empty = true;
        self
    }
}

/// Rows of named cells drawn as aligned text columns.
#[derive(Debug, Default)]
pub struct TextTable {
    rows: Vec<BTreeMap<&'static str, String>>,
}

impl TextTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, row: BTreeMap<&'static str, String>) {
        self.rows.push(row);
    }

    /// Render the table with a header line and a blank line after it.
    /// Columns flagged `hide_if_empty` are dropped when no row fills them.
    pub fn draw(&self, columns: &[Column]) -> String {
        let visible: Vec<(&Column, usize)> = columns
            .iter()
            .filter(|column| {
                !column.hide_if_empty
                    || self
                        .rows
                        .iter()
                        .any(|row| row.get(column.id).is_some_and(|v| !v.is_empty()))
            })
            .map(|column| {
                let width = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(column.id))
                    .map(|v| v.chars().count())
                    .fold(column.name.chars().count(), usize::max);
                (column, width)
            })
            .collect();

        let mut out = String::new();
        let header: Vec<String> = visible
            .iter()
            .map(|(column, width)| pad(column.name, *width, Align::Center))
            .collect();
        out.push_str(header.join(&" ".repeat(SPACING)).trim_end());
        out.push_str("\n\n");

        for row in &self.rows {
            let cells: Vec<String> = visible
                .iter()
                .map(|(column, width)| {
                    let value = row.get(column.id).map(String::as_str).unwrap_or("");
                    pad(value, *width, column.align)
                })
                .collect();
            out.push_str(cells.join(&" ".repeat(SPACING)).trim_end());
            out.push('\n');
        }

        out
    }
}

fn pad(value: &str, width: usize, align: Align) -> String {
    match align {
        Align::Center => format!("{value:^width$}"),
        Align::Right => format!("{value:>width$}"),
    }
}

/// Amounts are shown as whole units.
pub fn round_normal(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
}

/// Interest and percentages keep two decimal places.
pub fn round_precise(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(2);
    rounded
}

/// Render a statement cell, rounding decimals by their field.
pub fn format_cell(id: &str, value: &FieldValue) -> String {
    match value {
        FieldValue::Text(text) => text.clone(),
        FieldValue::Decimal(d) => match id {
            "interest" | "pure_profit_percent" => round_precise(*d).to_string(),
            _ => round_normal(*d).normalize().to_string(),
        },
    }
}
