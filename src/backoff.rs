use std::time::Duration;

/// Compute an exponential backoff without jitter: `min * factor^attempt`, capped at `max`.
///
/// The growth saturates at `max` instead of overflowing, so any `attempt` up to `u32::MAX` is safe.
pub fn compute_delay(min: Duration, max: Duration, factor: f64, attempt: u32) -> Duration {
    if min.is_zero() {
        return std::cmp::min(min, max);
    }

    // nanosecond precision keeps whole-millisecond inputs exact for integer factors
    let nanos = min.as_nanos() as f64 * factor.powf(f64::from(attempt));

    // also catches inf and NaN
    if !(nanos < max.as_nanos() as f64) {
        return max;
    }

    if nanos < u64::MAX as f64 {
        Duration::from_nanos(nanos as u64)
    } else {
        Duration::try_from_secs_f64(nanos / 1e9).map_or(max, |delay| std::cmp::min(delay, max))
    }
}
