use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;
use crate::filters::FilterSet;

pub const DEFAULT_FEED_URL: &str = "https://api.al-in.fr/api/dmo/public_housing_offers";
pub const DEFAULT_MIN_RENT: u32 = 2;

/// One housing offer as returned by the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: String,
    /// `offer_status_updated_at`; any change means the offer changed.
    pub version: String,
    pub address: String,
    pub rent: String,
    pub availability_date: String,
    pub published_at: String,
}

#[derive(Debug, Deserialize)]
struct OfferPage {
    #[serde(default)]
    data: Option<Vec<RawOffer>>,
}

#[derive(Debug, Deserialize)]
struct RawOffer {
    id: Value,
    attributes: RawAttributes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAttributes {
    address: Value,
    rent_with_charges: Value,
    availability_date: Value,
    date_publication_start: Value,
    offer_status_updated_at: Value,
}

impl From<RawOffer> for Entry {
    fn from(raw: RawOffer) -> Self {
        let attrs = raw.attributes;
        Self {
            id: plain_text(&raw.id),
            version: plain_text(&attrs.offer_status_updated_at),
            address: plain_text(&attrs.address),
            rent: plain_text(&attrs.rent_with_charges),
            availability_date: plain_text(&attrs.availability_date),
            published_at: plain_text(&attrs.date_publication_start),
        }
    }
}

// Strings without their JSON quotes, numbers as written, null as empty.
fn plain_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Decodes a feed response body into entries, keeping response order.
pub fn parse_offers(body: &[u8]) -> Result<Vec<Entry>, FetchError> {
    let page: OfferPage = serde_json::from_slice(body)?;
    let offers = page.data.ok_or(FetchError::MissingData)?;
    Ok(offers.into_iter().map(Entry::from).collect())
}

/// Query string for one poll: publication window around `today`, the rent
/// floor and one `$or` clause per postal code.
pub fn query_params(
    filters: &FilterSet,
    today: NaiveDate,
    min_rent: u32,
) -> Vec<(String, String)> {
    let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    let mut params = vec![
        (
            "publication_end_date[$gte]".to_owned(),
            yesterday.format("%Y-%m-%d").to_string(),
        ),
        (
            "date_publication_start[$lte]".to_owned(),
            today.format("%Y-%m-%d").to_string(),
        ),
        ("rent_with_charges[$gte]".to_owned(), min_rent.to_string()),
    ];
    for (index, code) in filters.tokens().iter().enumerate() {
        params.push((format!("$or[{index}][postal_code]"), code.clone()));
    }
    params
}

/// Anything able to produce the current offers for a filter set.
#[async_trait]
pub trait OfferSource: Send + Sync {
    async fn fetch(&self, filters: &FilterSet) -> Result<Vec<Entry>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    endpoint: String,
    min_rent: u32,
    timeout: Duration,
}

impl FeedClient {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            min_rent: DEFAULT_MIN_RENT,
            timeout: Duration::from_secs(3),
        }
    }

    pub fn with_min_rent(mut self, min_rent: u32) -> Self {
        self.min_rent = min_rent;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl OfferSource for FeedClient {
    async fn fetch(&self, filters: &FilterSet) -> Result<Vec<Entry>, FetchError> {
        // Recomputed on every call so the window follows the local calendar.
        let today = Local::now().date_naive();
        let params = query_params(filters, today, self.min_rent);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .timeout(self.timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let bytes = response.bytes().await?;
        let entries = parse_offers(&bytes)?;
        debug!(filters = %filters, count = entries.len(), "fetched offers");
        Ok(entries)
    }
}
