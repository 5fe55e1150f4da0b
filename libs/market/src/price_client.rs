use std::{collections::HashMap, time::Duration};

use anyhow::{Result, ensure};
use async_trait::async_trait;
use reqwest::{
    Client, StatusCode,
    header::{HeaderMap, HeaderValue},
};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::{PricePoint, SymbolId};

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection failure, timeout, or a body that could not be read.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed response ({source}): {body}")]
    Malformed {
        source: serde_json::Error,
        body: String,
    },

    #[error("no price history returned for {0}")]
    Empty(SymbolId),
}

/// Source of current and historical USD prices.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// One batched request for every id. Ids absent from the response are
    /// absent from the returned map.
    async fn fetch_current(&self, ids: &[SymbolId]) -> Result<HashMap<SymbolId, f32>, FetchError>;

    /// Price history covering the last `range_days` days, oldest first.
    async fn fetch_history(
        &self,
        id: &SymbolId,
        range_days: u32,
    ) -> Result<Vec<PricePoint>, FetchError>;
}

#[derive(Clone)]
pub struct PriceClient {
    client: Client,
    base_api: String,
}

impl PriceClient {
    /// Refuses to build without an API key.
    pub fn new(base_api: String, api_key: &str, timeout: Duration) -> Result<Self> {
        let api_key = api_key.trim();
        ensure!(!api_key.is_empty(), "price API key is empty");

        let mut key = HeaderValue::from_str(api_key)?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_api })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_api.trim_end_matches('/'), path)
    }

    async fn get_body(&self, request: reqwest::RequestBuilder) -> Result<String, FetchError> {
        let res = request.send().await?;
        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status { status, body });
        }

        Ok(body)
    }
}

#[async_trait]
impl PriceSource for PriceClient {
    async fn fetch_current(&self, ids: &[SymbolId]) -> Result<HashMap<SymbolId, f32>, FetchError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let joined = ids
            .iter()
            .map(SymbolId::as_str)
            .collect::<Vec<_>>()
            .join(",");

        debug!(ids = %joined, "requesting current prices");

        let body = self
            .get_body(
                self.client
                    .get(self.endpoint("simple/price"))
                    .query(&[("ids", joined.as_str()), ("vs_currencies", "usd")]),
            )
            .await?;

        parse_current(ids, &body)
    }

    async fn fetch_history(
        &self,
        id: &SymbolId,
        range_days: u32,
    ) -> Result<Vec<PricePoint>, FetchError> {
        debug!(%id, range_days, "requesting price history");

        let body = self
            .get_body(
                self.client
                    .get(self.endpoint(&format!("coins/{id}/market_chart")))
                    .query(&[
                        ("vs_currency", "usd".to_string()),
                        ("days", range_days.to_string()),
                    ]),
            )
            .await?;

        parse_history(id, &body)
    }
}

//
// Match CoinGecko API JSON
// https://docs.coingecko.com/reference/simple-price
// https://docs.coingecko.com/reference/coins-id-market-chart
//
#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct MarketChart {
    prices: Vec<(f64, f64)>,
}

fn parse_current(ids: &[SymbolId], body: &str) -> Result<HashMap<SymbolId, f32>, FetchError> {
    let quotes: HashMap<String, SimplePrice> =
        serde_json::from_str(body).map_err(|source| FetchError::Malformed {
            source,
            body: body.to_string(),
        })?;

    Ok(ids
        .iter()
        .filter_map(|id| {
            let usd = quotes.get(id.as_str())?.usd?;
            Some((id.clone(), usd))
        })
        .collect())
}

fn parse_history(id: &SymbolId, body: &str) -> Result<Vec<PricePoint>, FetchError> {
    let chart: MarketChart =
        serde_json::from_str(body).map_err(|source| FetchError::Malformed {
            source,
            body: body.to_string(),
        })?;

    if chart.prices.is_empty() {
        return Err(FetchError::Empty(id.clone()));
    }

    Ok(chart
        .prices
        .into_iter()
        .map(|(ms, price)| PricePoint::new(ms / 1000.0, price as f32))
        .collect())
}
