use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use super::accrual_service::AccrualService;
use super::rate_archive::RateLookup;
use crate::calendar;
use crate::errors::CoreError;
use crate::models::currency;
use crate::models::deposit::Deposit;
use crate::models::statement::HoldingValuation;

/// Converts deposits into the local currency and derives profit figures.
///
/// Rate gaps are not errors: a figure that needs a missing rate is `None`,
/// and so is every figure derived from it.
pub struct ValuationService {
    local_currency: String,
    accrual: AccrualService,
}

impl ValuationService {
    pub fn new(local_currency: &str) -> Self {
        Self {
            local_currency: currency::normalize_code(local_currency),
            accrual: AccrualService::new(),
        }
    }

    pub fn local_currency(&self) -> &str {
        &self.local_currency
    }

    fn is_local(&self, code: &str) -> bool {
        code.eq_ignore_ascii_case(&self.local_currency)
    }

    /// Value every figure of `deposit` at `date`.
    pub fn value(
        &self,
        lookup: &dyn RateLookup,
        deposit: &Deposit,
        date: NaiveDate,
    ) -> Result<HoldingValuation, CoreError> {
        let current_amount = self.accrual.current_amount(deposit, date)?;
        let past_cost = self.past_cost(lookup, deposit, date)?;
        let current_cost = self.current_cost(lookup, deposit, current_amount, date)?;
        let rate_profit = self.rate_profit(lookup, deposit, past_cost, date)?;
        let pure_profit = Self::pure_profit(past_cost, current_cost);
        let pure_profit_percent = match (pure_profit, past_cost) {
            (Some(profit), Some(cost)) => Some(Self::pure_profit_percent(
                profit,
                cost,
                deposit.open_date,
                date,
            )),
            _ => None,
        };

        Ok(HoldingValuation {
            valuation_date: date,
            cost: deposit.face_amount(date),
            current_amount,
            past_cost,
            current_cost,
            rate_profit,
            pure_profit,
            pure_profit_percent,
        })
    }

    /// Local-currency cost of opening the deposit, plus the completions
    /// received by `date`.
    pub fn past_cost(
        &self,
        lookup: &dyn RateLookup,
        deposit: &Deposit,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, CoreError> {
        let source_currency = deposit.source_currency();
        let source_is_local = self.is_local(source_currency);
        let currency_is_local = self.is_local(&deposit.currency);

        if source_is_local && currency_is_local {
            let opening = deposit.source_amount.unwrap_or(deposit.amount);
            let completions: Decimal = deposit.completions_until(date).map(|c| c.amount).sum();
            return Ok(Some(opening + completions));
        }

        if !source_is_local && !source_currency.eq_ignore_ascii_case(&deposit.currency) {
            return Err(self.unsupported(
                deposit,
                format!(
                    "conversion from {source_currency} to {} is not supported",
                    deposit.currency
                ),
            ));
        }

        // Completions of a deposit funded in local currency are stated in
        // local money: `source_amount` when given, otherwise the face amount.
        let mut completion_cost = Decimal::ZERO;
        for completion in deposit.completions_until(date) {
            if !source_is_local {
                return Err(self.unsupported(
                    deposit,
                    format!(
                        "completion of {} is not stated in {}",
                        completion.date.format(calendar::DATE_FORMAT),
                        self.local_currency
                    ),
                ));
            }
            completion_cost += completion.source_amount.unwrap_or(completion.amount);
        }

        if source_is_local {
            if let Some(cost) = deposit.source_amount {
                return Ok(Some(cost + completion_cost));
            }
        }

        let Some(rates) = lookup.get_approx(&deposit.currency, deposit.open_date)? else {
            tracing::warn!(
                "There is no {} rate for {}: past cost of '{}' is unknown.",
                deposit.currency,
                deposit.open_date,
                deposit.bank
            );
            return Ok(None);
        };

        let rate = if source_is_local { rates.sell } else { rates.buy };
        Ok(Some(deposit.amount * rate + completion_cost))
    }

    /// Local-currency value of `current_amount` at `date`.
    pub fn current_cost(
        &self,
        lookup: &dyn RateLookup,
        deposit: &Deposit,
        current_amount: Decimal,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, CoreError> {
        let rates = lookup.get_approx(&deposit.currency, date)?;
        if rates.is_none() {
            tracing::warn!(
                "There is no {} rate for {date}: current cost of '{}' is unknown.",
                deposit.currency,
                deposit.bank
            );
        }
        Ok(rates.map(|r| current_amount * r.buy))
    }

    /// Gain caused by the exchange rate alone: the face amount at today's
    /// buy rate minus what it cost.
    pub fn rate_profit(
        &self,
        lookup: &dyn RateLookup,
        deposit: &Deposit,
        past_cost: Option<Decimal>,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, CoreError> {
        if self.is_local(&deposit.currency) && self.is_local(deposit.source_currency()) {
            return Ok(None);
        }
        let Some(past_cost) = past_cost else {
            return Ok(None);
        };

        let rates = lookup.get_approx(&deposit.currency, date)?;
        Ok(rates.map(|r| r.buy * deposit.face_amount(date) - past_cost))
    }

    pub fn pure_profit(past_cost: Option<Decimal>, current_cost: Option<Decimal>) -> Option<Decimal> {
        Some(current_cost? - past_cost?)
    }

    /// `pure_profit` annualized as a percentage of `past_cost`.
    /// Zero when `past_cost` is zero or no day has passed.
    pub fn pure_profit_percent(
        pure_profit: Decimal,
        past_cost: Decimal,
        open_date: NaiveDate,
        date: NaiveDate,
    ) -> Decimal {
        let days = (date - open_date).num_days();
        if past_cost.is_zero() || days == 0 {
            return Decimal::ZERO;
        }

        pure_profit / past_cost * Decimal::ONE_HUNDRED / Decimal::from(days)
            * Decimal::from(calendar::days_in_year(date.year()))
    }

    fn unsupported(&self, deposit: &Deposit, reason: String) -> CoreError {
        CoreError::UnsupportedConversion {
            bank: deposit.bank.clone(),
            currency: deposit.currency.clone(),
            reason,
        }
    }
}
