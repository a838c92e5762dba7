use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use super::cbrf::parse_cbrf_decimal;
use super::traits::RateSource;
use crate::calendar;
use crate::errors::CoreError;
use crate::models::currency::Metal;
use crate::models::rate::{RatePair, RateTable};

const METALS_URL: &str = "https://www.cbr.ru/scripts/xml_metall.asp";

const PROVIDER: &str = "The Central Bank of the Russian Federation (precious metals)";

/// First date the CBRF publishes precious metal prices for.
pub const COVERAGE_START: NaiveDate = match NaiveDate::from_ymd_opt(2001, 7, 1) {
    Some(date) => date,
    None => panic!("invalid coverage start"),
};

/// Precious metal prices of the Central Bank of the Russian Federation,
/// per gram in the local currency.
///
/// - **Endpoint**: `xml_metall.asp?date_req1=..&date_req2=..`, a date range
///   per request, so requested dates are fetched in year-long chunks.
/// - **Codes**: 1 gold, 2 silver, 3 platinum, 4 palladium.
pub struct CbrfMetalSource {
    client: Client,
}

impl CbrfMetalSource {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    async fn fetch_range(&self, from: NaiveDate, to: NaiveDate) -> Result<RateTable, CoreError> {
        let body = self
            .client
            .get(METALS_URL)
            .query(&[
                ("date_req1", from.format("%d/%m/%Y").to_string()),
                ("date_req2", to.format("%d/%m/%Y").to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_metal_rates(&body)
    }
}

// ── CBRF XML response types ─────────────────────────────────────────

#[derive(Deserialize)]
struct Metall {
    #[serde(rename = "Record", default)]
    records: Vec<Record>,
}

#[derive(Deserialize)]
struct Record {
    #[serde(rename = "@Date")]
    date: String,
    #[serde(rename = "@Code")]
    code: String,
    #[serde(rename = "Buy")]
    buy: String,
    #[serde(rename = "Sell")]
    sell: String,
}

fn metal_for_code(code: &str) -> Option<Metal> {
    match code.trim() {
        "1" => Some(Metal::Gold),
        "2" => Some(Metal::Silver),
        "3" => Some(Metal::Platinum),
        "4" => Some(Metal::Palladium),
        _ => None,
    }
}

/// Parse an `xml_metall.asp` document into a rate table keyed by metal code.
pub fn parse_metal_rates(xml: &str) -> Result<RateTable, CoreError> {
    if !xml.contains("<Metall") {
        return Err(CoreError::Api {
            provider: PROVIDER.into(),
            message: "server returned unknown XML response".into(),
        });
    }

    let doc: Metall = quick_xml::de::from_str(xml).map_err(|e| CoreError::Api {
        provider: PROVIDER.into(),
        message: format!("server returned unknown XML response: {e}"),
    })?;

    let mut table = RateTable::new();
    for record in doc.records {
        let date = calendar::parse_date(&record.date).ok_or_else(|| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("invalid record date '{}'", record.date),
        })?;
        let metal = metal_for_code(&record.code).ok_or_else(|| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("unknown metal code '{}'", record.code),
        })?;
        let (Some(sell), Some(buy)) = (
            parse_cbrf_decimal(&record.sell),
            parse_cbrf_decimal(&record.buy),
        ) else {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("unable to find {metal:?}'s rate for {date}"),
            });
        };

        table
            .entry(date)
            .or_insert_with(BTreeMap::new)
            .insert(metal.code().to_string(), RatePair::new(sell, buy));
    }

    Ok(table)
}

/// Split ascending `dates` into runs that stay within one calendar year.
fn year_chunks(dates: &[NaiveDate]) -> Vec<&[NaiveDate]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    for i in 1..=dates.len() {
        if i == dates.len() || dates[i].year() != dates[start].year() {
            chunks.push(&dates[start..i]);
            start = i;
        }
    }
    chunks
}

#[async_trait]
impl RateSource for CbrfMetalSource {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_rates(&self, dates: &[NaiveDate]) -> Result<RateTable, CoreError> {
        let mut dates: Vec<NaiveDate> = dates
            .iter()
            .copied()
            .filter(|d| *d >= COVERAGE_START)
            .collect();
        dates.sort();
        dates.dedup();

        let mut table = RateTable::new();

        for chunk in year_chunks(&dates) {
            let (Some(&from), Some(&to)) = (chunk.first(), chunk.last()) else {
                continue;
            };
            tracing::info!("Getting CBRF's precious metal rates for {from}..{to}...");

            let fetched = self
                .fetch_range(from, to)
                .await
                .map_err(|e| CoreError::source_failure(PROVIDER, format!("{from}..{to}"), e))?;

            let wanted: BTreeSet<NaiveDate> = chunk.iter().copied().collect();
            for (date, rates) in fetched {
                if wanted.contains(&date) && !rates.is_empty() {
                    table.insert(date, rates);
                }
            }
        }

        Ok(table)
    }
}
