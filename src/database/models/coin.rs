use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dexscreener::MarketData;

/// Chain the token lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Chain {
    #[default]
    Sol,
}

/// Coin entity - one listed token and its latest known market metrics
///
/// Market fields and `last_sync_at` stay `None` until the first successful sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Coin {
    pub id: String,

    /// Ticker symbol (e.g., "PARE")
    pub symbol: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Token mint address, used as the DexScreener lookup key
    pub contract_address: String,

    #[serde(default)]
    pub chain: Chain,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dex_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holders: Option<u64>,

    /// USD price, kept exact as reported upstream
    #[schema(value_type = Option<String>, example = "0.000123")]
    #[serde(default)]
    pub price: Option<Decimal>,

    #[serde(default, rename = "volume24h")]
    pub volume_24h: Option<f64>,

    #[serde(default)]
    pub liquidity: Option<f64>,

    #[serde(default)]
    pub market_cap: Option<f64>,

    #[serde(default, rename = "priceChange24h")]
    pub price_change_24h: Option<f64>,

    /// Timestamp of last successful market data sync
    #[serde(default)]
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl Coin {
    /// Create a new coin with no market data yet
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        name: impl Into<String>,
        contract_address: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
            description: None,
            contract_address: contract_address.into(),
            chain: Chain::Sol,
            created_at: Utc::now(),
            website: None,
            twitter: None,
            telegram: None,
            dex_url: None,
            explorer_url: None,
            holders: None,
            price: None,
            volume_24h: None,
            liquidity: None,
            market_cap: None,
            price_change_24h: None,
            last_sync_at: None,
        }
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set creation timestamp
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Overwrite the market fields with a fetched snapshot, leaving everything else alone
    pub fn apply_market_data(&mut self, data: &MarketData) {
        self.price = data.price;
        self.volume_24h = data.volume_24h;
        self.liquidity = data.liquidity;
        self.market_cap = data.market_cap;
        self.price_change_24h = data.price_change_24h;
        self.last_sync_at = Some(data.last_sync_at);
    }

    /// Age badge derived from `created_at`
    pub fn status_at(&self, now: DateTime<Utc>) -> CoinStatus {
        let age = now.signed_duration_since(self.created_at);

        if age < chrono::Duration::hours(24) {
            CoinStatus::New
        } else if age < chrono::Duration::days(7) {
            CoinStatus::Early
        } else {
            CoinStatus::Established
        }
    }
}

/// Age-based listing badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum CoinStatus {
    New,
    Early,
    Established,
}

impl CoinStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "NEW" => Some(Self::New),
            "EARLY" => Some(Self::Early),
            "ESTABLISHED" => Some(Self::Established),
            _ => None,
        }
    }
}

/// Coin plus its derived status, as served to readers
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CoinWithStatus {
    #[serde(flatten)]
    pub coin: Coin,
    pub status: CoinStatus,
}

impl CoinWithStatus {
    pub fn new(coin: Coin, now: DateTime<Utc>) -> Self {
        let status = coin.status_at(now);
        Self { coin, status }
    }
}
