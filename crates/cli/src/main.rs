mod table;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use deposit_tracker_core::calendar::{self, DATE_FORMAT};
use deposit_tracker_core::models::deposit::Deposit;
use deposit_tracker_core::models::settings::Settings;
use deposit_tracker_core::models::statement::{FieldValue, Statement};
use deposit_tracker_core::DepositTracker;

use crate::table::{format_cell, round_normal, Column, TextTable};

/// Tracks bank deposits: accrued interest, value in the local currency and profit.
#[derive(Debug, Parser)]
#[command(name = "deposit-tracker", version)]
struct Cli {
    /// Show all deposits, not only those that are not closed.
    #[arg(short = 'a', long = "all")]
    all: bool,

    /// Behave like today is DAY (DD.MM.YYYY).
    #[arg(short = 't', long = "today", value_name = "DAY", value_parser = parse_today)]
    today: Option<NaiveDate>,

    /// Print only deposits which will be expired in DAYS days (useful for running by cron).
    #[arg(short = 'e', long = "expiring", value_name = "DAYS")]
    expiring: Option<u32>,

    /// Don't connect to the Internet for currency rates.
    #[arg(short = 'o', long = "offline-mode")]
    offline_mode: bool,

    /// Verbose logging and full error traces.
    #[arg(short = 'd', long = "debug-mode")]
    debug_mode: bool,

    /// Directory with settings, the rate archive and the deposit list.
    #[arg(long = "data-dir", value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Deposit list to use instead of the one in the data directory.
    #[arg(long = "deposits", value_name = "PATH")]
    deposits: Option<PathBuf>,
}

fn parse_today(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| format!("Invalid today date ({value})."))
}

const STATEMENT_COLUMNS: [Column; 13] = [
    Column::new("expired", "Expiration").centered().hide_if_empty(),
    Column::new("open_date", "Open date").centered(),
    Column::new("close_date", "Close date").centered(),
    Column::new("closed", "Closed").centered().hide_if_empty(),
    Column::new("bank", "Bank").centered(),
    Column::new("currency", "Currency").centered(),
    Column::new("amount", "Amount"),
    Column::new("interest", "Interest"),
    Column::new("rate_profit", "Rate profit"),
    Column::new("current_amount", "Current amount"),
    Column::new("current_cost", "Current cost"),
    Column::new("pure_profit", "Pure profit"),
    Column::new("pure_profit_percent", "Pure profit percent"),
];

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug_mode);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: unable to start the runtime: {e}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(run(&cli)) {
        if cli.debug_mode {
            eprintln!("{err:?}");
        } else {
            eprintln!("Error: {err:#}");
        }
        std::process::exit(1);
    }
}

fn init_tracing(debug_mode: bool) {
    let default = if debug_mode {
        "deposit_tracker_core=debug,deposit_tracker=debug"
    } else {
        "deposit_tracker_core=warn,deposit_tracker=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug_mode)
        .init();
}

async fn run(cli: &Cli) -> Result<()> {
    let data_dir = cli.data_dir.clone().unwrap_or_else(Settings::default_data_dir);
    let mut settings = Settings::load(&data_dir).context("Unable to load settings")?;
    if cli.data_dir.is_some() {
        settings.data_dir = Some(data_dir);
    }
    settings.offline |= cli.offline_mode;

    let tracker = DepositTracker::open(settings)
        .await
        .context("Unable to open the currency rate archive")?;

    // `--today` only moves the report date; the archive follows the clock.
    let today = cli.today.unwrap_or_else(|| tracker.today());
    tracing::debug!("Reporting for {today} with {:?}.", tracker.settings());

    // The message already tells the user what to fix.
    let deposits = tracker
        .load_deposits(cli.deposits.as_deref())
        .map_err(|e| anyhow!("{e}"))?;

    match cli.expiring {
        Some(days) => print_expiring(&tracker, &deposits, today, days),
        None => {
            let statement = tracker
                .statement(&deposits, today, cli.all)
                .context("Unable to build the account statement")?;
            print_statement(&statement);
        }
    }

    Ok(())
}

fn print_statement(statement: &Statement) {
    let mut table = TextTable::new();

    for row in &statement.rows {
        let cells = row
            .fields()
            .iter()
            .map(|(id, value)| (*id, format_cell(id, value)))
            .collect();
        table.add_row(cells);
    }

    table.add_row(BTreeMap::new());
    let mut totals = BTreeMap::new();
    totals.insert(
        "current_cost",
        format_cell("current_cost", &FieldValue::Decimal(statement.total_current_cost)),
    );
    totals.insert(
        "pure_profit",
        round_normal(statement.total_pure_profit).normalize().to_string(),
    );
    table.add_row(totals);

    println!(
        "\nAccount statement for {}:\n",
        statement.date.format(calendar::DATE_FORMAT)
    );
    print!("{}", table.draw(&STATEMENT_COLUMNS));
}

fn print_expiring(tracker: &DepositTracker, deposits: &[Deposit], today: NaiveDate, days: u32) {
    let expiring = tracker.expiring(deposits, today, u64::from(days));
    if expiring.is_empty() {
        return;
    }

    println!("Following deposits will be expired in {days} days:");
    for deposit in expiring {
        let close = deposit
            .close_date
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default();
        println!("  * {close} {} ({})", deposit.bank, deposit.currency);
    }
}
