//! Service-wide constants.

use std::time::Duration;

/// How long a resolved price stays in the cache.
pub const PRICE_CACHE_TTL: Duration = Duration::from_secs(300);

/// Number of day buckets fetched concurrently by one backfill batch.
pub const BACKFILL_BATCH_SIZE: usize = 5;

/// Pause between backfill batches, to stay inside upstream rate limits.
pub const BACKFILL_BATCH_DELAY: Duration = Duration::from_secs(3);

/// Granularity at which the inter-batch delay re-checks for cancellation.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Bracket span (in days) beyond which interpolation confidence bottoms
/// out.
pub const MAX_INTERPOLATION_GAP_DAYS: f64 = 30.0;

/// Seconds in one UTC day.
pub const SECONDS_PER_DAY: i64 = 86_400;
