// ═══════════════════════════════════════════════════════════════════
// Error Tests — CoreError variants, Display formatting, error chains
// ═══════════════════════════════════════════════════════════════════

use std::path::PathBuf;

use deposit_tracker_core::errors::{error_chain, CoreError};
use deposit_tracker_core::models::deposit::{DepositValidationError, FieldProblem};

// ── Display formatting ──────────────────────────────────────────────

mod display {
    use super::*;

    #[test]
    fn corrupt_rate() {
        let err = CoreError::CorruptRate("3O.5".into());
        assert_eq!(err.to_string(), "Corrupted rate value in the database: '3O.5'");
    }

    #[test]
    fn file_io() {
        let err = CoreError::FileIO {
            path: PathBuf::from("/tmp/x"),
            message: "denied".into(),
        };
        assert_eq!(err.to_string(), "File I/O error (/tmp/x): denied");
    }

    #[test]
    fn empty_deposit_list() {
        assert_eq!(
            CoreError::EmptyDepositList.to_string(),
            "You specified an empty deposit list."
        );
    }

    #[test]
    fn api() {
        let err = CoreError::Api {
            provider: "CBRF".into(),
            message: "server returned unknown XML response".into(),
        };
        assert_eq!(
            err.to_string(),
            "API error (CBRF): server returned unknown XML response"
        );
    }

    #[test]
    fn unsupported_conversion() {
        let err = CoreError::UnsupportedConversion {
            bank: "ROST".into(),
            currency: "USD".into(),
            reason: "conversion from EUR to USD is not supported".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported currency conversion for deposit 'ROST' (USD): \
             conversion from EUR to USD is not supported"
        );
    }

    #[test]
    fn invalid_deposits_lists_every_record() {
        let err = CoreError::InvalidDeposits(vec![
            DepositValidationError {
                index: 0,
                bank: Some("MKB".into()),
                problems: vec![
                    FieldProblem::new("amount", "must not be negative"),
                    FieldProblem::new("colour", "unknown field"),
                ],
            },
            DepositValidationError {
                index: 2,
                bank: None,
                problems: vec![FieldProblem::new("bank", "there is no required field")],
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid deposit info:\n  \
             * deposit #1 (MKB): amount: must not be negative; colour: unknown field\n  \
             * deposit #3: bank: there is no required field"
        );
    }
}

// ── Error chains ────────────────────────────────────────────────────

mod chains {
    use super::*;
    use std::error::Error;

    #[test]
    fn source_failure_wraps_cause() {
        let err = CoreError::source_failure("CBRF", "2011-01-11", CoreError::Network("timeout".into()));
        assert_eq!(err.to_string(), "Unable to get rate info from CBRF for 2011-01-11");
        assert_eq!(err.source().map(|e| e.to_string()), Some("Network error: timeout".into()));
    }

    #[test]
    fn chain_joins_every_level() {
        let err = CoreError::Backfill(Box::new(CoreError::source_failure(
            "CBRF",
            "2011-01-11",
            CoreError::Api {
                provider: "CBRF".into(),
                message: "bad XML".into(),
            },
        )));
        assert_eq!(
            error_chain(&err),
            "Unable to update rate info: Unable to get rate info from CBRF for 2011-01-11: \
             API error (CBRF): bad XML"
        );
    }

    #[test]
    fn storage_error_is_not_repeated() {
        let err = CoreError::from(rusqlite::Error::InvalidQuery);
        let chain = error_chain(&err);
        assert!(chain.starts_with("Rate database query failed: "));
        assert_eq!(chain.matches("Rate database query failed").count(), 1);
    }

    #[test]
    fn errors_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CoreError>();
    }
}
