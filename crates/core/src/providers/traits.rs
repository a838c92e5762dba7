use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::rate::RateTable;

/// An external source of historical exchange rates against the local currency.
///
/// Implementations must:
/// - silently leave out dates they have no data for (holidays, dates before
///   the source's coverage starts, currencies the source doesn't quote);
/// - fail with [`CoreError::Source`] naming the source and the date being
///   fetched on any network error or unexpected upstream response.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// Rates for every date of `dates` (ascending) the source has data for.
    async fn get_rates(&self, dates: &[NaiveDate]) -> Result<RateTable, CoreError>;
}
