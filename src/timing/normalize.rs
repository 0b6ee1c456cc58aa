//! Number hygiene for produced wait times.

use std::time::Duration;

use rand::Rng;

/// Clean up a raw millisecond value.
///
/// Negative values become their absolute value; `None`, NaN and infinities
/// fall back to `default`.
///
/// # Examples
///
/// ```rust
/// use tidewater::timing::normalize_millis;
///
/// assert_eq!(normalize_millis(Some(250.0), 1000.0), 250.0);
/// assert_eq!(normalize_millis(Some(-250.0), 1000.0), 250.0);
/// assert_eq!(normalize_millis(Some(f64::NAN), 1000.0), 1000.0);
/// assert_eq!(normalize_millis(Some(f64::INFINITY), 1000.0), 1000.0);
/// assert_eq!(normalize_millis(None, 1000.0), 1000.0);
/// ```
pub fn normalize_millis(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(ms) if ms.is_finite() => ms.abs(),
        _ => default,
    }
}

/// Pick a uniformly distributed whole number of milliseconds in `[min, max]`.
///
/// Inverted bounds are swapped. Bounds are expected to be normalized already.
pub fn sample_millis(min: f64, max: f64) -> f64 {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    let low = low.round() as u64;
    let high = high.round() as u64;

    if low >= high {
        return low as f64;
    }

    rand::rng().random_range(low..=high) as f64
}

/// Convert normalized milliseconds into a [`Duration`], saturating at
/// [`Duration::MAX`].
pub fn millis_to_duration(ms: f64) -> Duration {
    Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::MAX)
}

pub(crate) fn duration_to_millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod normalize_tests {
    use super::*;

    #[test]
    fn test_sample_swaps_inverted_bounds() {
        for _ in 0..50 {
            let ms = sample_millis(200.0, 100.0);
            assert!((100.0..=200.0).contains(&ms));
            assert_eq!(ms.fract(), 0.0);
        }
    }

    #[test]
    fn test_sample_collapsed_range() {
        assert_eq!(sample_millis(300.0, 300.0), 300.0);
    }

    #[test]
    fn test_millis_to_duration() {
        assert_eq!(millis_to_duration(1500.0), Duration::from_millis(1500));
        assert_eq!(millis_to_duration(0.0), Duration::ZERO);
        assert_eq!(millis_to_duration(f64::MAX), Duration::MAX);
    }

    #[test]
    fn test_duration_to_millis() {
        assert_eq!(duration_to_millis(Duration::from_millis(250)), 250.0);
    }
}
