use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An additional contribution to an already opened deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub date: NaiveDate,

    /// Amount added, in the deposit currency.
    pub amount: Decimal,

    /// What the contribution cost in the local currency, when the deposit
    /// is funded from the local currency but held in another one. Without
    /// it, `amount` is taken as the local cost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_amount: Option<Decimal>,
}

/// A bank deposit (or an impersonal metal account) tracked by the user.
///
/// Records are produced by [`crate::storage::deposit_file`], which
/// guarantees the invariants below; the services rely on them:
/// - `amount >= 0`, `capitalization > 0`;
/// - every completion date lies in `[open_date, close_date)`;
/// - completions are sorted by date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub bank: String,
    pub open_date: NaiveDate,
    pub close_date: Option<NaiveDate>,

    /// Deposit currency (ISO code or a [`super::currency::Metal`] code).
    pub currency: String,

    /// Currency the money was in before the deposit was opened.
    /// `None` means the deposit currency itself.
    pub source_currency: Option<String>,

    /// Principal, in the deposit currency.
    pub amount: Decimal,

    /// Opening cost stated directly in `source_currency`.
    pub source_amount: Option<Decimal>,

    /// Annual interest, percent.
    pub interest: Option<Decimal>,

    /// Number of months after which accrued interest is added to principal.
    pub capitalization: Option<u32>,

    pub completions: Vec<Completion>,

    /// Withdrawn/closed manually, independently of `close_date`.
    pub closed: bool,
}

impl Deposit {
    /// A minimal open-ended deposit; the remaining fields can be set directly.
    pub fn new(
        bank: impl Into<String>,
        open_date: NaiveDate,
        currency: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            bank: bank.into(),
            open_date,
            close_date: None,
            currency: currency.into().to_uppercase(),
            source_currency: None,
            amount,
            source_amount: None,
            interest: None,
            capitalization: None,
            completions: Vec::new(),
            closed: false,
        }
    }

    pub fn source_currency(&self) -> &str {
        self.source_currency.as_deref().unwrap_or(&self.currency)
    }

    /// Deposits whose close date has passed by `today`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.close_date.is_some_and(|close| close < today)
    }

    /// Completions that have arrived by `date` (inclusive).
    pub fn completions_until(&self, date: NaiveDate) -> impl Iterator<Item = &Completion> {
        self.completions.iter().filter(move |c| c.date <= date)
    }

    /// Principal plus completions received by `date`, without interest.
    pub fn face_amount(&self, date: NaiveDate) -> Decimal {
        self.amount
            + self
                .completions_until(date)
                .map(|c| c.amount)
                .sum::<Decimal>()
    }
}

/// One offending field of a deposit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldProblem {
    pub field: String,
    pub message: String,
}

impl FieldProblem {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All problems found in one deposit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositValidationError {
    /// Zero-based position of the record in the deposit list.
    pub index: usize,
    /// Bank name, when the record has a readable one.
    pub bank: Option<String>,
    pub problems: Vec<FieldProblem>,
}

impl std::fmt::Display for DepositValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "deposit #{}", self.index + 1)?;
        if let Some(bank) = &self.bank {
            write!(f, " ({bank})")?;
        }
        write!(f, ": ")?;
        for (i, problem) in self.problems.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", problem.field, problem.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for DepositValidationError {}
