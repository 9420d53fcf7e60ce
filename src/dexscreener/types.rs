use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// DexScreener `/tokens/{address}` response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexScreenerResponse {
    #[serde(default)]
    pub schema_version: Option<String>,
    #[serde(default)]
    pub pairs: Option<Vec<DexPair>>,
}

/// One trading pair as reported upstream; only the fields we read are modelled
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexPair {
    #[serde(default)]
    pub chain_id: String,
    #[serde(default)]
    pub dex_id: String,
    #[serde(default)]
    pub pair_address: String,
    #[serde(default)]
    pub price_usd: Option<String>,
    #[serde(default)]
    pub volume: Option<PairWindow>,
    #[serde(default)]
    pub price_change: Option<PairWindow>,
    #[serde(default)]
    pub liquidity: Option<PairLiquidity>,
    #[serde(default)]
    pub fdv: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairWindow {
    #[serde(default)]
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairLiquidity {
    #[serde(default)]
    pub usd: Option<f64>,
}

impl DexPair {
    fn liquidity_usd(&self) -> Option<f64> {
        self.liquidity.as_ref().and_then(|l| l.usd)
    }

    fn volume_24h(&self) -> Option<f64> {
        self.volume.as_ref().and_then(|v| v.h24)
    }

    fn price_change_24h(&self) -> Option<f64> {
        self.price_change.as_ref().and_then(|p| p.h24)
    }

    /// `priceUsd` as an exact decimal; plain and scientific notation are accepted
    fn price(&self) -> Option<Decimal> {
        let raw = self.price_usd.as_deref()?.trim();
        Decimal::from_str(raw)
            .or_else(|_| Decimal::from_scientific(raw))
            .ok()
    }
}

/// Pick the most representative pair: highest USD liquidity, then highest
/// 24h volume. Missing values count as zero and full ties keep the earlier pair.
pub fn select_best_pair(pairs: &[DexPair]) -> Option<&DexPair> {
    let mut iter = pairs.iter();
    let mut best = iter.next()?;

    for pair in iter {
        let best_liquidity = best.liquidity_usd().unwrap_or(0.0);
        let liquidity = pair.liquidity_usd().unwrap_or(0.0);

        if liquidity > best_liquidity
            || (liquidity == best_liquidity
                && pair.volume_24h().unwrap_or(0.0) > best.volume_24h().unwrap_or(0.0))
        {
            best = pair;
        }
    }

    Some(best)
}

/// Canonical market snapshot for one token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[serde(rename = "volume24h")]
    pub volume_24h: Option<f64>,
    pub liquidity: Option<f64>,
    pub market_cap: Option<f64>,
    #[serde(rename = "priceChange24h")]
    pub price_change_24h: Option<f64>,
    /// When this snapshot was fetched
    pub last_sync_at: DateTime<Utc>,
}

impl MarketData {
    pub fn from_pair(pair: &DexPair, fetched_at: DateTime<Utc>) -> Self {
        Self {
            price: pair.price(),
            volume_24h: pair.volume_24h(),
            liquidity: pair.liquidity_usd(),
            market_cap: pair.market_cap.or(pair.fdv),
            price_change_24h: pair.price_change_24h(),
            last_sync_at: fetched_at,
        }
    }
}

/// Per-token fetch outcome
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SyncResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<MarketData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncResult {
    pub fn ok(data: MarketData) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pair(address: &str, liquidity: Option<f64>, volume: Option<f64>) -> DexPair {
        DexPair {
            pair_address: address.to_string(),
            liquidity: Some(PairLiquidity { usd: liquidity }),
            volume: Some(PairWindow { h24: volume }),
            ..DexPair::default()
        }
    }

    #[test]
    fn test_select_prefers_liquidity() {
        let pairs = vec![
            pair("a", Some(100.0), Some(900.0)),
            pair("b", Some(500.0), Some(10.0)),
        ];

        assert_eq!(select_best_pair(&pairs).unwrap().pair_address, "b");
    }

    #[test]
    fn test_select_breaks_liquidity_tie_by_volume() {
        let pairs = vec![
            pair("a", Some(100.0), Some(50.0)),
            pair("b", Some(100.0), Some(200.0)),
        ];

        assert_eq!(select_best_pair(&pairs).unwrap().pair_address, "b");
    }

    #[test]
    fn test_select_missing_values_count_as_zero() {
        let pairs = vec![pair("a", None, None), pair("b", Some(1.0), None)];
        assert_eq!(select_best_pair(&pairs).unwrap().pair_address, "b");

        let pairs = vec![pair("a", Some(0.0), Some(5.0)), pair("b", None, None)];
        assert_eq!(select_best_pair(&pairs).unwrap().pair_address, "a");
    }

    #[test]
    fn test_select_full_tie_keeps_first() {
        let pairs = vec![
            pair("a", Some(100.0), Some(50.0)),
            pair("b", Some(100.0), Some(50.0)),
        ];

        assert_eq!(select_best_pair(&pairs).unwrap().pair_address, "a");
        assert!(select_best_pair(&[]).is_none());
    }

    #[test]
    fn test_market_data_from_upstream_json() {
        let json = r#"{
            "schemaVersion": "1.0.0",
            "pairs": [{
                "chainId": "solana",
                "dexId": "raydium",
                "pairAddress": "PairA",
                "priceNative": "0.0000001",
                "priceUsd": "0.00001234",
                "volume": { "h24": 15234.5, "h6": 1.0, "h1": 1.0, "m5": 0.0 },
                "priceChange": { "m5": 0, "h1": 1, "h6": 2, "h24": -12.5 },
                "liquidity": { "usd": 40210.0, "base": 1, "quote": 2 },
                "fdv": 99000
            }]
        }"#;

        let response: DexScreenerResponse = serde_json::from_str(json).unwrap();
        let pairs = response.pairs.unwrap();
        let now = Utc::now();
        let data = MarketData::from_pair(select_best_pair(&pairs).unwrap(), now);

        assert_eq!(data.price, Some(dec!(0.00001234)));
        assert_eq!(data.volume_24h, Some(15234.5));
        assert_eq!(data.liquidity, Some(40210.0));
        assert_eq!(data.market_cap, Some(99000.0));
        assert_eq!(data.price_change_24h, Some(-12.5));
        assert_eq!(data.last_sync_at, now);
    }

    #[test]
    fn test_market_cap_preferred_over_fdv() {
        let pair = DexPair {
            market_cap: Some(10.0),
            fdv: Some(20.0),
            price_usd: Some("not-a-number".to_string()),
            ..DexPair::default()
        };

        let data = MarketData::from_pair(&pair, Utc::now());
        assert_eq!(data.market_cap, Some(10.0));
        assert_eq!(data.price, None);
    }

    #[test]
    fn test_null_pairs_deserialize() {
        let response: DexScreenerResponse =
            serde_json::from_str(r#"{"schemaVersion":"1.0.0","pairs":null}"#).unwrap();
        assert!(response.pairs.is_none());
    }
}
