use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use super::traits::RateSource;
use crate::errors::CoreError;
use crate::models::currency;
use crate::models::rate::{RatePair, RateTable};

const DAILY_URL: &str = "https://www.cbr.ru/scripts/XML_daily.asp";

const PROVIDER: &str = "The Central Bank of the Russian Federation";

/// Official currency rates of the Central Bank of the Russian Federation.
///
/// - **Free**: no API key.
/// - **Endpoint**: `XML_daily.asp?date_req=DD/MM/YYYY`, one request per date.
/// - **Rates**: one official rate per currency, used for both selling and
///   buying; quoted per `Nominal` units (e.g. 100 JPY), normalized to one unit.
pub struct CbrfCurrencySource {
    client: Client,
}

impl CbrfCurrencySource {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    async fn fetch_date(&self, date: NaiveDate) -> Result<BTreeMap<String, RatePair>, CoreError> {
        let body = self
            .client
            .get(DAILY_URL)
            .query(&[("date_req", date.format("%d/%m/%Y").to_string())])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_daily_rates(&body)
    }
}

// ── CBRF XML response types ─────────────────────────────────────────

#[derive(Deserialize)]
struct ValCurs {
    #[serde(rename = "Valute", default)]
    valutes: Vec<Valute>,
}

#[derive(Deserialize)]
struct Valute {
    #[serde(rename = "CharCode")]
    char_code: String,
    #[serde(rename = "Nominal")]
    nominal: String,
    #[serde(rename = "Value")]
    value: String,
}

/// Parse an `XML_daily.asp` document into per-unit rates by currency code.
pub fn parse_daily_rates(xml: &str) -> Result<BTreeMap<String, RatePair>, CoreError> {
    // The deserializer doesn't check the root element name.
    if !xml.contains("<ValCurs") {
        return Err(CoreError::Api {
            provider: PROVIDER.into(),
            message: "server returned unknown XML response".into(),
        });
    }

    let doc: ValCurs = quick_xml::de::from_str(xml).map_err(|e| CoreError::Api {
        provider: PROVIDER.into(),
        message: format!("server returned unknown XML response: {e}"),
    })?;

    let mut rates = BTreeMap::new();
    for valute in doc.valutes {
        let code = currency::normalize_code(&valute.char_code);
        if code.is_empty() {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: "unable to get currency name".into(),
            });
        }

        let value = parse_cbrf_decimal(&valute.value).ok_or_else(|| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("unable to get currency rate for {code}: '{}'", valute.value),
        })?;
        let nominal = parse_cbrf_decimal(&valute.nominal)
            .filter(|n| !n.is_zero())
            .ok_or_else(|| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("invalid nominal for {code}: '{}'", valute.nominal),
            })?;

        rates.insert(code, RatePair::flat(value / nominal));
    }

    Ok(rates)
}

/// CBRF writes decimals with a comma separator ("16,0102").
pub(crate) fn parse_cbrf_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(&text.trim().replace(',', ".")).ok()
}

#[async_trait]
impl RateSource for CbrfCurrencySource {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_rates(&self, dates: &[NaiveDate]) -> Result<RateTable, CoreError> {
        let mut table = RateTable::new();

        for &date in dates {
            tracing::info!("Getting CBRF's currency rates for {date}...");

            let rates = self
                .fetch_date(date)
                .await
                .map_err(|e| CoreError::source_failure(PROVIDER, date, e))?;

            if rates.is_empty() {
                tracing::debug!("There is no CBRF's currency rates for {date}.");
                continue;
            }

            table.insert(date, rates);
        }

        Ok(table)
    }
}
