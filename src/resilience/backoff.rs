//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Delay before the next attempt after `failures` consecutive failures.
///
/// Doubles from `base` per failure, capped at `max`, plus up to 10% jitter.
pub fn retry_delay(failures: u32, base: Duration, max: Duration) -> Duration {
    if failures == 0 {
        return base;
    }

    let factor = 2u32.saturating_pow(failures - 1);
    let capped = base.saturating_mul(factor).min(max);

    let jitter_range = capped.as_millis() as u64 / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    capped + Duration::from_millis(jitter)
}
