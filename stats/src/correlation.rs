/// Pearson correlation coefficient of paired observations.
///
/// # Outputs
/// - `f64::NAN` when fewer than two pairs are given, or when either side has
///   zero variance. The correlation is undefined in both cases and callers are
///   expected to carry the NaN rather than treat it as an error.
///
/// # Example
/// ```rust
/// use stats::pearson;
/// assert!((pearson([(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)]) - 1.0).abs() < 1e-12);
/// assert!(pearson([(1.0, 2.0)]).is_nan());
/// ```
pub fn pearson(pairs: impl IntoIterator<Item = (f64, f64)>) -> f64 {
    let mut n = 0usize;
    let (mut mean_x, mut mean_y) = (0f64, 0f64);
    let (mut m2_x, mut m2_y, mut co) = (0f64, 0f64, 0f64);
    for (x, y) in pairs {
        n += 1;
        let dx = x - mean_x;
        mean_x += dx / n as f64;
        let dy = y - mean_y;
        mean_y += dy / n as f64;
        m2_x += dx * (x - mean_x);
        m2_y += dy * (y - mean_y);
        co += dx * (y - mean_y);
    }
    if n < 2 || m2_x <= 0.0 || m2_y <= 0.0 {
        return f64::NAN;
    }
    (co / (m2_x * m2_y).sqrt()).clamp(-1.0, 1.0)
}
