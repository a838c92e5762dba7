pub mod calendar;
pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::{Local, NaiveDate};
use std::path::Path;
use std::time::Duration;

use models::{deposit::Deposit, settings::Settings, statement::Statement};
use providers::registry::RateSourceRegistry;
use services::{rate_archive::RateArchive, statement_service::StatementService};
use storage::{deposit_file, rate_store::RateStore};

pub use errors::CoreError;

/// Main entry point for the deposit tracker core library.
/// Owns the rate archive (opened and brought up to date once) and the
/// services that value deposits against it.
#[must_use]
pub struct DepositTracker {
    settings: Settings,
    archive: RateArchive,
    statement_service: StatementService,
}

impl std::fmt::Debug for DepositTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepositTracker")
            .field("settings", &self.settings)
            .field("today", &self.archive.today())
            .field("todays_rates", &self.archive.todays_rates().len())
            .finish()
    }
}

impl DepositTracker {
    /// Open the rate archive in the settings' data directory and update it
    /// from the default CBRF sources (skipped in offline mode).
    ///
    /// The archive is always brought up to the clock date; reports for any
    /// other date go through [`statement`](Self::statement) and
    /// [`expiring`](Self::expiring).
    pub async fn open(settings: Settings) -> Result<Self, CoreError> {
        let store = RateStore::open(&settings.rates_path())?;
        let registry = RateSourceRegistry::new_with_defaults(Duration::from_secs(
            settings.network_timeout_secs,
        ));
        Self::open_with(settings, store, &registry, Local::now().date_naive()).await
    }

    /// Open over an explicit store and set of rate sources. `today` is the
    /// real current date: everything before it is persisted as final.
    pub async fn open_with(
        settings: Settings,
        store: RateStore,
        registry: &RateSourceRegistry,
        today: NaiveDate,
    ) -> Result<Self, CoreError> {
        let archive = RateArchive::open(store, registry, &settings, today).await?;
        let statement_service = StatementService::new(&settings.local_currency);

        Ok(Self {
            settings,
            archive,
            statement_service,
        })
    }

    // ── Deposits ────────────────────────────────────────────────────

    /// Load the deposit list from `path`, or from the data directory.
    pub fn load_deposits(&self, path: Option<&Path>) -> Result<Vec<Deposit>, CoreError> {
        match path {
            Some(path) => deposit_file::load_from_file(path),
            None => deposit_file::load_from_file(&self.settings.deposits_path()),
        }
    }

    // ── Reports ─────────────────────────────────────────────────────

    /// Account statement as of `date`.
    pub fn statement(
        &self,
        deposits: &[Deposit],
        date: NaiveDate,
        show_all: bool,
    ) -> Result<Statement, CoreError> {
        self.statement_service
            .build(&self.archive, deposits, date, show_all)
    }

    /// Deposits expiring within `days` of `date`.
    #[must_use]
    pub fn expiring<'a>(&self, deposits: &'a [Deposit], date: NaiveDate, days: u64) -> Vec<&'a Deposit> {
        self.statement_service.expiring(deposits, date, days)
    }

    // ── Accessors ───────────────────────────────────────────────────

    #[must_use]
    pub fn archive(&self) -> &RateArchive {
        &self.archive
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The date the archive was brought up to.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.archive.today()
    }
}
