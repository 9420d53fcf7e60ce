/// Short-lived in-memory caches
///
/// - `TtlCache`: per-key expiry, checked lazily on read

pub mod ttl_cache;

pub use ttl_cache::TtlCache;
