use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::deposit::Deposit;
use crate::calendar::DATE_FORMAT;

/// Computed figures for one deposit at one valuation date.
///
/// Every `Option` field is `None` when a rate it depends on isn't available
/// (a data gap, not an error); consumers omit such fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingValuation {
    pub valuation_date: NaiveDate,

    /// Principal plus completions, without interest, in the deposit currency.
    pub cost: Decimal,

    /// Principal plus completions plus accrued interest, in the deposit currency.
    pub current_amount: Decimal,

    /// Local-currency value of the deposit when it was opened (plus completions).
    pub past_cost: Option<Decimal>,

    /// Local-currency value of `current_amount` at the valuation date.
    pub current_cost: Option<Decimal>,

    /// Gain caused by exchange-rate movement alone.
    pub rate_profit: Option<Decimal>,

    /// `current_cost - past_cost`.
    pub pure_profit: Option<Decimal>,

    /// `pure_profit` as an annualized percentage of `past_cost`.
    pub pure_profit_percent: Option<Decimal>,
}

impl HoldingValuation {
    /// Computed fields by name, present ones only.
    pub fn fields(&self) -> BTreeMap<&'static str, FieldValue> {
        let mut fields = BTreeMap::new();
        fields.insert("cost", FieldValue::Decimal(self.cost));
        fields.insert("current_amount", FieldValue::Decimal(self.current_amount));

        let optional = [
            ("past_cost", self.past_cost),
            ("current_cost", self.current_cost),
            ("rate_profit", self.rate_profit),
            ("pure_profit", self.pure_profit),
            ("pure_profit_percent", self.pure_profit_percent),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                fields.insert(name, FieldValue::Decimal(value));
            }
        }
        fields
    }
}

/// A statement cell: either text or an unrounded decimal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Decimal(Decimal),
}

impl FieldValue {
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            FieldValue::Decimal(d) => Some(*d),
            FieldValue::Text(_) => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Decimal(d) => write!(f, "{d}"),
        }
    }
}

/// One deposit line of an account statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRow {
    pub deposit: Deposit,

    /// The close date has passed; the deposit is valued at its close date.
    pub expired: bool,

    pub valuation: HoldingValuation,
}

impl StatementRow {
    /// Descriptive and computed fields by name.
    pub fn fields(&self) -> BTreeMap<&'static str, FieldValue> {
        let deposit = &self.deposit;
        let mut fields = self.valuation.fields();

        fields.insert("bank", FieldValue::Text(deposit.bank.clone()));
        fields.insert("currency", FieldValue::Text(deposit.currency.clone()));
        fields.insert(
            "open_date",
            FieldValue::Text(deposit.open_date.format(DATE_FORMAT).to_string()),
        );
        if let Some(close_date) = deposit.close_date {
            fields.insert(
                "close_date",
                FieldValue::Text(close_date.format(DATE_FORMAT).to_string()),
            );
        }
        if self.expired {
            fields.insert("expired", FieldValue::Text("Expired".into()));
        }
        if deposit.closed {
            fields.insert("closed", FieldValue::Text("x".into()));
        }
        fields.insert("amount", FieldValue::Decimal(deposit.amount));
        if let Some(interest) = deposit.interest {
            fields.insert("interest", FieldValue::Decimal(interest));
        }
        fields
    }
}

/// An account statement: rows plus totals over deposits that aren't closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub date: NaiveDate,
    pub rows: Vec<StatementRow>,
    pub total_current_cost: Decimal,
    pub total_pure_profit: Decimal,
}
