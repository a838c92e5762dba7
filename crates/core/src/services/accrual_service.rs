use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use std::collections::VecDeque;

use crate::calendar::{self, DATE_FORMAT};
use crate::errors::CoreError;
use crate::models::deposit::{Completion, Deposit};

/// Computes a deposit's balance (principal plus interest) at a date.
///
/// The balance is simulated by walking from the open date in one-month
/// periods anchored on the open date's day of month:
/// - interest accrues daily at `interest / 100 / days_in_year(open year)`;
/// - every `capitalization` periods the accrued profit joins the principal;
/// - a completion joins the principal at the start of its day, so it earns
///   interest for that day;
/// - profit still pending at the end date joins the principal unconditionally.
///
/// Spans without completions are accrued with a single multiplication.
pub struct AccrualService;

impl AccrualService {
    pub fn new() -> Self {
        Self
    }

    /// Balance of `deposit` at `date` in the deposit currency.
    ///
    /// Accrual stops at the close date when `date` is after it.
    pub fn current_amount(&self, deposit: &Deposit, date: NaiveDate) -> Result<Decimal, CoreError> {
        if date < deposit.open_date {
            return Err(CoreError::ValuationBeforeOpen {
                bank: deposit.bank.clone(),
                date: date.format(DATE_FORMAT).to_string(),
                open_date: deposit.open_date.format(DATE_FORMAT).to_string(),
            });
        }

        let Some(interest) = deposit.interest else {
            return Ok(deposit.face_amount(date));
        };

        let to = match deposit.close_date {
            Some(close) if close < date => close,
            _ => date,
        };
        let open = deposit.open_date;
        let per_day = interest / Decimal::ONE_HUNDRED / Decimal::from(calendar::days_in_year(open.year()));

        let mut pending: VecDeque<&Completion> = deposit
            .completions
            .iter()
            .filter(|c| c.date >= open && c.date <= to)
            .collect();

        let mut amount = deposit.amount;
        let mut profit = Decimal::ZERO;
        let mut month: i64 = -1;
        let mut cur = open;
        let mut next = cur;

        loop {
            if next > to {
                next = to;
            }

            if pending.front().is_some_and(|c| c.date <= next) {
                loop {
                    while pending.front().is_some_and(|c| c.date == cur) {
                        if let Some(completion) = pending.pop_front() {
                            amount += completion.amount;
                        }
                    }
                    if cur == next {
                        break;
                    }
                    profit += amount * per_day;
                    cur += Duration::days(1);
                }
            } else {
                profit += amount * per_day * Decimal::from((next - cur).num_days());
                cur = next;
            }

            if cur == to {
                amount += profit;
                break;
            }

            month += 1;
            if let Some(period) = deposit.capitalization {
                if month != 0 && month % i64::from(period) == 0 {
                    amount += profit;
                    profit = Decimal::ZERO;
                }
            }

            next = calendar::next_month_anchored(cur, open.day());
        }

        Ok(amount)
    }
}

impl Default for AccrualService {
    fn default() -> Self {
        Self::new()
    }
}
