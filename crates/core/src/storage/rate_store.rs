use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::calendar;
use crate::errors::CoreError;
use crate::models::rate::{RateEntry, RatePair, RateTable};

/// Append-only archive of historical exchange rates.
///
/// Layout: one `rates` table of `(day, currency, sell_rate, buy_rate)` rows
/// indexed by `(day, currency)`. Rates are stored as decimal text so no
/// precision is lost. Rows are never updated or deleted.
///
/// Attention: the store is not safe for concurrent access; a process must
/// open it once and serialize every use of it.
pub struct RateStore {
    conn: Connection,
}

impl RateStore {
    /// Open (creating if needed) the archive at `path`.
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(|e| CoreError::FileIO {
                    path: dir.to_path_buf(),
                    message: e.to_string(),
                })?;
            }
        }

        let conn = Connection::open(path).map_err(|source| CoreError::StorageOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Self::init(conn).map_err(|source| CoreError::StorageOpen {
            path: path.to_path_buf(),
            source,
        })
    }

    /// A throwaway in-memory archive.
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::init(conn)?)
    }

    fn init(conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS rates (
                day INTEGER,
                currency TEXT,
                sell_rate TEXT,
                buy_rate TEXT
            );
            CREATE INDEX IF NOT EXISTS rate_index ON rates (day, currency);",
        )?;
        Ok(Self { conn })
    }

    /// Day index of the most recent persisted rate.
    pub fn max_day(&self) -> Result<Option<i64>, CoreError> {
        let day: Option<i64> = self
            .conn
            .query_row("SELECT MAX(day) FROM rates", [], |row| row.get(0))
            .optional()?
            .flatten();
        Ok(day)
    }

    /// Number of persisted rows.
    pub fn count(&self) -> Result<usize, CoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM rates", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Persist every rate of `table` in a single transaction.
    /// Returns the number of rows written.
    pub fn insert_table(&mut self, table: &RateTable) -> Result<usize, CoreError> {
        let tx = self.conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO rates (day, currency, sell_rate, buy_rate) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (date, currencies) in table {
                let day = calendar::day_index(*date);
                for (currency, rates) in currencies {
                    stmt.execute(params![
                        day,
                        currency,
                        rates.sell.to_string(),
                        rates.buy.to_string()
                    ])?;
                    written += 1;
                }
            }
        }
        tx.commit()?;
        Ok(written)
    }

    /// All rates of `currency` with `from_day <= day <= to_day`, oldest first.
    pub fn rates_in_window(
        &self,
        currency: &str,
        from_day: i64,
        to_day: i64,
    ) -> Result<Vec<RateEntry>, CoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT day, sell_rate, buy_rate FROM rates
             WHERE currency = ?1 AND day >= ?2 AND day <= ?3
             ORDER BY day",
        )?;
        let rows = stmt.query_map(params![currency, from_day, to_day], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (day, sell, buy) = row?;
            entries.push(RateEntry {
                day,
                currency: currency.to_string(),
                rates: RatePair::new(parse_rate(&sell)?, parse_rate(&buy)?),
            });
        }
        Ok(entries)
    }
}

fn parse_rate(text: &str) -> Result<Decimal, CoreError> {
    Decimal::from_str(text).map_err(|_| CoreError::CorruptRate(text.to_string()))
}
