/// Repository implementations
///
/// Callers depend on the `CoinRepository` trait, not on the file-backed type.

pub mod coin_repository;

pub use coin_repository::{CoinRepository, CoinsMutation, JsonFileCoinRepository};
