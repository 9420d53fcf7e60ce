/// DexScreener market data client
///
/// - `types`: upstream response shapes, pair selection, market snapshots
/// - `source`: the transport seam (`PairSource`) and its reqwest implementation
/// - `client`: caching, retry with backoff, and batched fan-out

pub mod client;
pub mod error;
pub mod source;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use client::DexScreenerClient;
pub use error::FetchError;
pub use source::{HttpPairSource, PairSource};
pub use types::{select_best_pair, DexPair, DexScreenerResponse, MarketData, SyncResult};
