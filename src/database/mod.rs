/// Coin record store
///
/// This module provides:
/// - The persisted document model (coins plus burn events)
/// - Repository pattern implementation over a single JSON file

pub mod error;
pub mod models;
pub mod repositories;

pub use error::StoreError;
pub use repositories::{CoinRepository, JsonFileCoinRepository};
