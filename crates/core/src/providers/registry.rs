use std::time::Duration;

use super::cbrf::CbrfCurrencySource;
use super::cbrf_metals::CbrfMetalSource;
use super::traits::RateSource;

/// Rate sources in priority order.
///
/// When two sources report the same currency for the same date, the one
/// registered first wins.
pub struct RateSourceRegistry {
    sources: Vec<Box<dyn RateSource>>,
}

impl RateSourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Create a registry with all default sources, each request limited by `timeout`.
    pub fn new_with_defaults(timeout: Duration) -> Self {
        let mut registry = Self::new();

        // CBRF official currency rates
        registry.register(Box::new(CbrfCurrencySource::new(timeout)));

        // CBRF precious metal prices, per gram
        registry.register(Box::new(CbrfMetalSource::new(timeout)));

        registry
    }

    /// Register a source with the lowest priority so far.
    pub fn register(&mut self, source: Box<dyn RateSource>) {
        self.sources.push(source);
    }

    pub fn sources(&self) -> impl Iterator<Item = &dyn RateSource> {
        self.sources.iter().map(|s| s.as_ref())
    }
}

impl Default for RateSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
