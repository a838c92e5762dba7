use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Exchange rates of one currency against the local currency.
///
/// `sell` is the price at which a bank sells the currency to a depositor,
/// `buy` the price at which it buys the currency back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatePair {
    pub sell: Decimal,
    pub buy: Decimal,
}

impl RatePair {
    /// Identity pair of the local currency.
    pub const ONE: RatePair = RatePair {
        sell: Decimal::ONE,
        buy: Decimal::ONE,
    };

    pub fn new(sell: Decimal, buy: Decimal) -> Self {
        Self { sell, buy }
    }

    /// A single official rate used for both directions.
    pub fn flat(rate: Decimal) -> Self {
        Self {
            sell: rate,
            buy: rate,
        }
    }
}

/// One persisted row of the rate archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateEntry {
    /// Day index (see [`crate::calendar::day_index`]).
    pub day: i64,
    pub currency: String,
    pub rates: RatePair,
}

/// Rates reported by a source: date → currency code → rates.
pub type RateTable = BTreeMap<NaiveDate, BTreeMap<String, RatePair>>;

/// Merge `incoming` into `table`. Currencies already present for a date
/// keep their rates, so sources merged first take priority.
pub fn merge_rate_tables(table: &mut RateTable, incoming: RateTable) {
    for (date, currencies) in incoming {
        let day = table.entry(date).or_default();
        for (currency, rates) in currencies {
            day.entry(currency).or_insert(rates);
        }
    }
}
