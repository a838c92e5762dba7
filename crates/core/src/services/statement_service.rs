use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use std::cmp::Ordering;

use super::rate_archive::RateLookup;
use super::valuation_service::ValuationService;
use crate::errors::CoreError;
use crate::models::deposit::Deposit;
use crate::models::statement::{Statement, StatementRow};

/// Builds account statements and expiration reminders over a deposit list.
pub struct StatementService {
    valuation: ValuationService,
}

impl StatementService {
    pub fn new(local_currency: &str) -> Self {
        Self {
            valuation: ValuationService::new(local_currency),
        }
    }

    pub fn valuation(&self) -> &ValuationService {
        &self.valuation
    }

    /// Account statement for `today`.
    ///
    /// Deposits opened after `today` are left out, and so are closed ones
    /// unless `show_all` is set. Expired deposits are valued at their close
    /// date. Totals cover deposits that aren't closed.
    pub fn build(
        &self,
        lookup: &dyn RateLookup,
        deposits: &[Deposit],
        today: NaiveDate,
        show_all: bool,
    ) -> Result<Statement, CoreError> {
        let mut sorted: Vec<&Deposit> = deposits.iter().collect();
        sorted.sort_by(|a, b| statement_order(a, b));

        let mut rows = Vec::new();
        let mut total_current_cost = Decimal::ZERO;
        let mut total_pure_profit = Decimal::ZERO;

        for deposit in sorted {
            if today < deposit.open_date || (!show_all && deposit.closed) {
                continue;
            }

            let expired = deposit.is_expired(today);
            let date = match deposit.close_date {
                Some(close) if expired => close,
                _ => today,
            };

            let valuation = self.valuation.value(lookup, deposit, date)?;

            if !deposit.closed {
                total_current_cost += valuation.current_cost.unwrap_or_default();
                total_pure_profit += valuation.pure_profit.unwrap_or_default();
            }

            rows.push(StatementRow {
                deposit: deposit.clone(),
                expired,
                valuation,
            });
        }

        Ok(Statement {
            date: today,
            rows,
            total_current_cost,
            total_pure_profit,
        })
    }

    /// Deposits that aren't closed and whose close date comes within `days`
    /// of `today`, soonest first. A window past the calendar's end covers
    /// every dated deposit.
    pub fn expiring<'a>(&self, deposits: &'a [Deposit], today: NaiveDate, days: u64) -> Vec<&'a Deposit> {
        let limit = today
            .checked_add_days(Days::new(days))
            .unwrap_or(NaiveDate::MAX);

        let mut expiring: Vec<&Deposit> = deposits
            .iter()
            .filter(|d| !d.closed && d.close_date.is_some_and(|close| close <= limit))
            .collect();
        expiring.sort_by(|a, b| statement_order(b, a));
        expiring
    }
}

/// Open-ended deposits first, then the latest close date, then bank name.
fn statement_order(a: &Deposit, b: &Deposit) -> Ordering {
    match (a.close_date, b.close_date) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a_close), Some(b_close)) => b_close.cmp(&a_close),
    }
    .then_with(|| a.bank.cmp(&b.bank))
}
