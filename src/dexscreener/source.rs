use crate::dexscreener::error::FetchError;
use crate::dexscreener::types::DexScreenerResponse;
use crate::sync::config::SyncConfig;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;

/// Upstream transport: exactly one request per call, no retries or caching
#[async_trait]
pub trait PairSource: Send + Sync {
    /// Fetch every trading pair for a token address
    async fn fetch_pairs(&self, address: &str) -> Result<DexScreenerResponse, FetchError>;

    /// Succeeds iff the upstream answers the lookup with a 2xx status
    async fn probe(&self, address: &str) -> Result<(), FetchError> {
        self.fetch_pairs(address).await.map(|_| ())
    }
}

/// DexScreener over HTTPS
pub struct HttpPairSource {
    client: Client,
    api_base: String,
}

impl HttpPairSource {
    pub fn new(config: &SyncConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn token_url(&self, address: &str) -> String {
        format!("{}/tokens/{}", self.api_base, address)
    }

    async fn get(&self, address: &str) -> Result<reqwest::Response, FetchError> {
        let url = self.token_url(address);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::status(response.status()));
        }

        Ok(response)
    }
}

#[async_trait]
impl PairSource for HttpPairSource {
    async fn fetch_pairs(&self, address: &str) -> Result<DexScreenerResponse, FetchError> {
        let body = self.get(address).await?.bytes().await?;

        serde_json::from_slice(&body).map_err(|e| {
            FetchError::InvalidResponse(format!("Failed to parse DexScreener response: {}", e))
        })
    }

    async fn probe(&self, address: &str) -> Result<(), FetchError> {
        self.get(address).await.map(|_| ())
    }
}
