//! Loads the user's deposit list from a JSON file.
//!
//! Each record is validated field by field; problems are collected rather
//! than reported one at a time, so the user sees every mistake in one run.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::path::Path;
use std::str::FromStr;

use crate::calendar;
use crate::errors::CoreError;
use crate::models::currency;
use crate::models::deposit::{Completion, Deposit, DepositValidationError, FieldProblem};

const KNOWN_FIELDS: &[&str] = &[
    "bank",
    "open_date",
    "close_date",
    "currency",
    "source_currency",
    "amount",
    "source_amount",
    "interest",
    "capitalization",
    "completions",
    "closed",
];

const COMPLETION_FIELDS: &[&str] = &["date", "amount", "source_amount"];

/// Read and validate the deposit list stored at `path`.
pub fn load_from_file(path: &Path) -> Result<Vec<Deposit>, CoreError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CoreError::DepositFile {
                path: path.to_path_buf(),
                message: missing_file_message(path),
            })
        }
        Err(e) => {
            return Err(CoreError::DepositFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
    };

    parse_str(&contents).map_err(|e| match e {
        CoreError::DepositFile { message, .. } => CoreError::DepositFile {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    })
}

/// Parse and validate a JSON deposit list.
pub fn parse_str(contents: &str) -> Result<Vec<Deposit>, CoreError> {
    let value: Value = serde_json::from_str(contents).map_err(|e| CoreError::DepositFile {
        path: Default::default(),
        message: e.to_string(),
    })?;

    let Value::Array(records) = value else {
        return Err(CoreError::DepositFile {
            path: Default::default(),
            message: "the deposit list must be a JSON array of objects".into(),
        });
    };

    if records.is_empty() {
        return Err(CoreError::EmptyDepositList);
    }

    let mut deposits = Vec::with_capacity(records.len());
    let mut errors = Vec::new();
    for (index, record) in records.iter().enumerate() {
        match parse_deposit(index, record) {
            Ok(deposit) => deposits.push(deposit),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(deposits)
    } else {
        Err(CoreError::InvalidDeposits(errors))
    }
}

/// Validate one record into a [`Deposit`].
pub fn parse_deposit(index: usize, record: &Value) -> Result<Deposit, DepositValidationError> {
    let mut problems = Vec::new();

    let Some(fields) = record.as_object() else {
        return Err(DepositValidationError {
            index,
            bank: None,
            problems: vec![FieldProblem::new("record", "it is not a JSON object")],
        });
    };

    for name in fields.keys() {
        if !KNOWN_FIELDS.contains(&name.as_str()) {
            problems.push(FieldProblem::new(name.as_str(), "unknown field"));
        }
    }

    let bank = required(fields, "bank", &mut problems, string_field);
    let open_date = required(fields, "open_date", &mut problems, date_field);
    let close_date = optional(fields, "close_date", &mut problems, date_field);
    let currency = required(fields, "currency", &mut problems, currency_field);
    let source_currency = optional(fields, "source_currency", &mut problems, currency_field);
    let amount = required(fields, "amount", &mut problems, non_negative_decimal_field);
    let source_amount = optional(fields, "source_amount", &mut problems, non_negative_decimal_field);
    let interest = optional(fields, "interest", &mut problems, non_negative_decimal_field);
    let capitalization = optional(fields, "capitalization", &mut problems, positive_integer_field);
    let closed = optional(fields, "closed", &mut problems, bool_field).unwrap_or(false);
    let mut completions =
        optional(fields, "completions", &mut problems, completions_field).unwrap_or_default();

    if let (Some(open), Some(close)) = (open_date, close_date) {
        if close < open {
            problems.push(FieldProblem::new(
                "close_date",
                "the deposit is closed before it is opened",
            ));
        }
    }

    if let Some(open) = open_date {
        for completion in &completions {
            let too_late = close_date.is_some_and(|close| completion.date >= close);
            if completion.date < open || too_late {
                problems.push(FieldProblem::new(
                    "completions",
                    format!(
                        "completion date {} is outside of the deposit's lifetime",
                        completion.date.format(calendar::DATE_FORMAT)
                    ),
                ));
            }
        }
    }

    match (bank, open_date, currency, amount) {
        (Some(bank), Some(open_date), Some(currency), Some(amount)) if problems.is_empty() => {
            completions.sort_by_key(|c| c.date);
            Ok(Deposit {
                bank,
                open_date,
                close_date,
                currency,
                source_currency,
                amount,
                source_amount,
                interest,
                capitalization,
                completions,
                closed,
            })
        }
        (bank, ..) => Err(DepositValidationError {
            index,
            bank,
            problems,
        }),
    }
}

// ── Field parsers ───────────────────────────────────────────────────

type FieldParser<T> = fn(&Value) -> Result<T, String>;

fn required<T>(
    fields: &Map<String, Value>,
    name: &str,
    problems: &mut Vec<FieldProblem>,
    parse: FieldParser<T>,
) -> Option<T> {
    match fields.get(name) {
        None | Some(Value::Null) => {
            problems.push(FieldProblem::new(name, "there is no required field"));
            None
        }
        Some(value) => parse_or_record(name, value, problems, parse),
    }
}

fn optional<T>(
    fields: &Map<String, Value>,
    name: &str,
    problems: &mut Vec<FieldProblem>,
    parse: FieldParser<T>,
) -> Option<T> {
    match fields.get(name) {
        None | Some(Value::Null) => None,
        Some(value) => parse_or_record(name, value, problems, parse),
    }
}

fn parse_or_record<T>(
    name: &str,
    value: &Value,
    problems: &mut Vec<FieldProblem>,
    parse: FieldParser<T>,
) -> Option<T> {
    match parse(value) {
        Ok(parsed) => Some(parsed),
        Err(message) => {
            problems.push(FieldProblem::new(name, message));
            None
        }
    }
}

fn string_field(value: &Value) -> Result<String, String> {
    match value.as_str().map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        Some(_) => Err("must not be empty".into()),
        None => Err("must be a string".into()),
    }
}

fn currency_field(value: &Value) -> Result<String, String> {
    let code = string_field(value)?;
    if currency::is_valid_code(&code) {
        Ok(currency::normalize_code(&code))
    } else {
        Err(format!("invalid currency code '{code}'"))
    }
}

fn date_field(value: &Value) -> Result<NaiveDate, String> {
    let text = value.as_str().ok_or("must be a date string")?;
    calendar::parse_date(text)
        .ok_or_else(|| format!("invalid date '{text}' (expected DD.MM.YYYY or YYYY-MM-DD)"))
}

fn decimal_field(value: &Value) -> Result<Decimal, String> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err("must be a number".into()),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| format!("invalid number '{text}'"))
}

fn non_negative_decimal_field(value: &Value) -> Result<Decimal, String> {
    let d = decimal_field(value)?;
    if d.is_sign_negative() && !d.is_zero() {
        Err("must not be negative".into())
    } else {
        Ok(d)
    }
}

fn positive_integer_field(value: &Value) -> Result<u32, String> {
    match value.as_u64() {
        Some(n) if n > 0 => u32::try_from(n).map_err(|_| "is too large".to_string()),
        _ => Err("must be a positive integer (number of months)".into()),
    }
}

fn bool_field(value: &Value) -> Result<bool, String> {
    value.as_bool().ok_or_else(|| "must be true or false".into())
}

fn completions_field(value: &Value) -> Result<Vec<Completion>, String> {
    let items = value.as_array().ok_or("must be a list of completions")?;
    let mut completions = Vec::with_capacity(items.len());

    for (i, item) in items.iter().enumerate() {
        let fields = item
            .as_object()
            .ok_or_else(|| format!("completion #{} is not an object", i + 1))?;

        if let Some(unknown) = fields
            .keys()
            .find(|k| !COMPLETION_FIELDS.contains(&k.as_str()))
        {
            return Err(format!("completion #{}: unknown field {unknown}", i + 1));
        }

        let date = fields
            .get("date")
            .ok_or_else(|| format!("completion #{}: there is no date", i + 1))
            .and_then(|v| date_field(v).map_err(|e| format!("completion #{}: {e}", i + 1)))?;
        let amount = fields
            .get("amount")
            .ok_or_else(|| format!("completion #{}: there is no amount", i + 1))
            .and_then(|v| {
                non_negative_decimal_field(v).map_err(|e| format!("completion #{}: {e}", i + 1))
            })?;
        let source_amount = match fields.get("source_amount") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                non_negative_decimal_field(v)
                    .map_err(|e| format!("completion #{}: {e}", i + 1))?,
            ),
        };

        completions.push(Completion {
            date,
            amount,
            source_amount,
        });
    }

    Ok(completions)
}

fn missing_file_message(path: &Path) -> String {
    format!(
        r#"You haven't specified any deposit info.

Please create file {} and fill it up with information about your deposits.
It must contain a JSON list of deposits, for example:

[{{
    "bank":            "MKB",
    "open_date":       "06.12.2010",
    "close_date":      "06.06.2011",
    "currency":        "RUB",
    "amount":          100000,
    "interest":        9.75,
    "capitalization":  1
}}, {{
    "bank":            "ROST",
    "open_date":       "19.11.2010",
    "close_date":      "22.05.2011",
    "source_currency": "RUB",
    "currency":        "EUR",
    "amount":          2000,
    "interest":        7,
    "completions":     [{{ "date": "19.12.2010", "amount": 500, "source_amount": 20500 }}]
}}, {{
    "bank":            "Sberbank",
    "open_date":       "12.10.2009",
    "currency":        "AUR",
    "amount":          100,
    "source_currency": "RUB"
}}]

Fields:
  bank            - the bank name (required)
  open_date       - the date when the deposit was opened (required)
  close_date      - the date when the deposit will be closed
  currency        - the deposit currency: RUB, USD, EUR, ... or AUR, AGR, PTR,
                    PDR for gold, silver, platinum and palladium (per gram)
  source_currency - the currency your money was in before the deposit was opened
  amount          - amount of money on the deposit in its currency (required)
  source_amount   - what opening the deposit cost in source_currency
  interest        - the deposit's annual interest, percent
  capitalization  - number of months after which interest is capitalized
  completions     - additional contributions: date, amount and source_amount
  closed          - true if the deposit was closed before its close date"#,
        path.display()
    )
}
