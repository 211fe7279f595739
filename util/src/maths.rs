//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
///
/// The source range must not be degenerate (`source_range.0 != source_range.1`).
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Wrap an angle in degrees into the range (-180, 180].
pub fn wrap_deg_180<T>(value: T) -> T
where
    T: Float,
{
    let full = T::from(360.0).unwrap_or_else(T::nan);
    let half = T::from(180.0).unwrap_or_else(T::nan);

    let mut wrapped = value % full;

    if wrapped > half {
        wrapped = wrapped - full;
    }
    if wrapped <= -half {
        wrapped = wrapped + full;
    }

    wrapped
}
