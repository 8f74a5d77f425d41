/// Checks that a numerical value is in the provided interval `[a,b]` and returns early
/// with an [`Error::Config`](crate::Error::Config) naming the offending variable if not
///
/// ### Example
/// ```ignore
/// let gamma = 2.0;
/// check_interval!(gamma, 0.0, 1.0);
/// ```
/// This returns `Err(Error::Config("Invalid value for `gamma`. Must be in the interval [0, 1]."))`.
#[macro_export]
macro_rules! check_interval {
    ($var:expr, $a:expr, $b:expr) => {
        if !($var >= $a && $var <= $b) {
            return Err($crate::Error::Config(format!(
                "Invalid value for `{}`. Must be in the interval [{}, {}].",
                stringify!($var),
                $a,
                $b,
            )));
        }
    };
}

/// Index of the largest value, with ties going to the lowest index
///
/// NaN entries are skipped unless every entry is NaN, in which case index 0 is returned.
/// Returns `None` for an empty slice.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, max)| v > max) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
        .or_else(|| (!values.is_empty()).then_some(0))
}

/// Largest value in the slice, or `f32::NEG_INFINITY` if empty
pub fn max_value(values: &[f32]) -> f32 {
    values.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}
