use chrono::{Months, NaiveDate};
use std::collections::BTreeMap;

use crate::calendar;
use crate::errors::CoreError;
use crate::models::currency;
use crate::models::rate::{merge_rate_tables, RatePair, RateTable};
use crate::models::settings::Settings;
use crate::providers::registry::RateSourceRegistry;
use crate::storage::rate_store::RateStore;

/// Anything that can answer nearest-date rate lookups.
///
/// The valuation layer depends on this rather than on [`RateArchive`], so
/// it can be driven by a fixed table in tests.
pub trait RateLookup {
    /// Rates of `currency` on `date` or on the nearest date within the
    /// accuracy window. `Ok(None)` is a data gap, not a failure.
    fn get_approx(&self, currency: &str, date: NaiveDate) -> Result<Option<RatePair>, CoreError>;
}

/// Result of downloading the missing part of the rate history.
///
/// `historical` is final and meant to be persisted; `today` may still change
/// during the day and must only be held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackfillOutcome {
    pub historical: RateTable,
    pub today: BTreeMap<String, RatePair>,
}

/// Persistent archive of historical rates with nearest-date lookups.
///
/// Construct it once per process with [`RateArchive::open`] and share it by
/// reference: opening performs the one-time backfill.
pub struct RateArchive {
    store: RateStore,
    todays_rates: BTreeMap<String, RatePair>,
    today: NaiveDate,
    local_currency: String,
    accuracy_window: i64,
    offline: bool,
}

impl RateArchive {
    /// Open the archive over `store`, downloading every rate missing since
    /// the last persisted day unless `settings.offline` is set.
    pub async fn open(
        mut store: RateStore,
        registry: &RateSourceRegistry,
        settings: &Settings,
        today: NaiveDate,
    ) -> Result<Self, CoreError> {
        let mut todays_rates = BTreeMap::new();

        if settings.offline {
            tracing::debug!("Offline mode: rate archive update is skipped.");
        } else {
            let outcome = Self::backfill(&store, registry, settings, today)
                .await
                .map_err(|e| CoreError::Backfill(Box::new(e)))?;

            let written = store
                .insert_table(&outcome.historical)
                .map_err(|e| CoreError::Backfill(Box::new(e)))?;
            tracing::debug!("Persisted {written} rates.");

            todays_rates = outcome.today;
        }

        Ok(Self::with_todays_rates(store, todays_rates, settings, today))
    }

    /// An archive over already persisted data; no sources are consulted.
    pub fn with_todays_rates(
        store: RateStore,
        todays_rates: BTreeMap<String, RatePair>,
        settings: &Settings,
        today: NaiveDate,
    ) -> Self {
        Self {
            store,
            todays_rates,
            today,
            local_currency: currency::normalize_code(&settings.local_currency),
            accuracy_window: settings.accuracy_window_days,
            offline: settings.offline,
        }
    }

    /// Fetch every day after the last persisted one through `today` from the
    /// registered sources, in priority order.
    ///
    /// Nothing is written: the caller persists `historical` and keeps `today`.
    pub async fn backfill(
        store: &RateStore,
        registry: &RateSourceRegistry,
        settings: &Settings,
        today: NaiveDate,
    ) -> Result<BackfillOutcome, CoreError> {
        let from = match store.max_day()? {
            Some(day) => calendar::date_from_day_index(day + 1),
            None => {
                tracing::info!("Downloading currency rate archive. It may take a while...");
                history_start(today, settings.history_years)
            }
        };

        if from > today {
            tracing::debug!("Rate archive is up to date.");
            return Ok(BackfillOutcome::default());
        }

        let dates = calendar::date_range(from, today);
        tracing::debug!("Updating rate archive for {from}..{today}.");

        let mut table = RateTable::new();
        for source in registry.sources() {
            let rates = source.get_rates(&dates).await?;
            merge_rate_tables(&mut table, rates);
        }

        let today_rates = table.remove(&today).unwrap_or_default();
        Ok(BackfillOutcome {
            historical: table,
            today: today_rates,
        })
    }

    pub fn todays_rates(&self) -> &BTreeMap<String, RatePair> {
        &self.todays_rates
    }

    pub fn store(&self) -> &RateStore {
        &self.store
    }

    pub fn local_currency(&self) -> &str {
        &self.local_currency
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Nearest rate to `date` within the accuracy window.
    ///
    /// Candidates are the persisted rates followed by today's in-memory
    /// rate; the first candidate at the smallest distance wins, so a
    /// persisted rate beats today's and an earlier day beats a later one.
    pub fn get_approx(
        &self,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Option<RatePair>, CoreError> {
        let currency = currency::normalize_code(currency);
        if currency == self.local_currency {
            return Ok(Some(RatePair::ONE));
        }

        let target = calendar::day_index(date);
        let window = self.accuracy_window;

        let mut candidates: Vec<(i64, RatePair)> = self
            .store
            .rates_in_window(&currency, target - window, target + window)?
            .into_iter()
            .map(|entry| (entry.day, entry.rates))
            .collect();

        if !self.offline {
            let today = calendar::day_index(self.today);
            if (today - target).abs() <= window {
                if let Some(rates) = self.todays_rates.get(&currency) {
                    candidates.push((today, *rates));
                }
            }
        }

        let mut nearest: Option<(i64, RatePair)> = None;
        for (day, rates) in candidates {
            let distance = (day - target).abs();
            if nearest.map_or(true, |(best, _)| distance < best) {
                nearest = Some((distance, rates));
            }
        }

        if nearest.is_none() {
            tracing::debug!("There is no {currency} rate for {date} within {window} days.");
        }
        Ok(nearest.map(|(_, rates)| rates))
    }
}

impl RateLookup for RateArchive {
    fn get_approx(&self, currency: &str, date: NaiveDate) -> Result<Option<RatePair>, CoreError> {
        RateArchive::get_approx(self, currency, date)
    }
}

/// First day of the history downloaded into an empty archive.
fn history_start(today: NaiveDate, years: u32) -> NaiveDate {
    today
        .checked_sub_months(Months::new(years.saturating_mul(12)))
        .unwrap_or(calendar::EPOCH)
}
