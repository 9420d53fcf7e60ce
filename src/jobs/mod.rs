/// Scheduled background jobs
///
/// - Periodic market data sync (warm-up pass plus fixed interval)

pub mod sync_scheduler;

pub use sync_scheduler::{SchedulerError, SchedulerStatus, SyncScheduler};
