use std::path::PathBuf;

use thiserror::Error;

use crate::models::deposit::DepositValidationError;

/// Unified error type for the entire deposit-tracker-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Storage / File ──────────────────────────────────────────────
    #[error("Unable to open database '{}'", path.display())]
    StorageOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Rate database query failed")]
    Storage(#[from] rusqlite::Error),

    #[error("Corrupted rate value in the database: '{0}'")]
    CorruptRate(String),

    #[error("File I/O error ({}): {message}", path.display())]
    FileIO { path: PathBuf, message: String },

    #[error("Invalid settings file: {0}")]
    InvalidSettings(String),

    // ── Deposit input ───────────────────────────────────────────────
    #[error("Invalid deposit info:\n{}", format_validation_errors(.0))]
    InvalidDeposits(Vec<DepositValidationError>),

    #[error("Failed to load deposit info from {}: {message}", path.display())]
    DepositFile { path: PathBuf, message: String },

    #[error("You specified an empty deposit list.")]
    EmptyDepositList,

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api { provider: String, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unable to get rate info from {provider} for {date}")]
    Source {
        provider: String,
        date: String,
        #[source]
        source: Box<CoreError>,
    },

    #[error("Unable to update rate info")]
    Backfill(#[source] Box<CoreError>),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Unsupported currency conversion for deposit '{bank}' ({currency}): {reason}")]
    UnsupportedConversion {
        bank: String,
        currency: String,
        reason: String,
    },

    #[error("Deposit '{bank}' can't be valued on {date}: it is opened on {open_date}")]
    ValuationBeforeOpen {
        bank: String,
        date: String,
        open_date: String,
    },
}

impl CoreError {
    /// Wrap an error raised while fetching rates from `provider` for `date`.
    pub fn source_failure(provider: &str, date: impl ToString, cause: CoreError) -> Self {
        CoreError::Source {
            provider: provider.to_string(),
            date: date.to_string(),
            source: Box::new(cause),
        }
    }
}

/// Render an error and all of its causes as one line: `outer: inner: root`.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        cause = inner.source();
    }
    message
}

fn format_validation_errors(errors: &[DepositValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  * {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors embed the full URL; keep the path, drop the query.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
