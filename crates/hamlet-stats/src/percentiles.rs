/// Linearly interpolated percentile of sorted data.
///
/// The rank is `p / 100 * (n - 1)`; the result interpolates between the values at the
/// floor and ceiling of that rank. `percentile` is clamped to `[0, 100]`.
/// Returns `f32::NAN` for an empty slice.
///
/// ```
/// use hamlet_stats::percentiles::compute_percentile_linear;
///
/// let values = vec![0.0, 10.0, 20.0, 30.0, 40.0];
/// assert_eq!(compute_percentile_linear(&values, 50.0), 20.0);
/// assert_eq!(compute_percentile_linear(&values, 25.0), 10.0);
/// assert_eq!(compute_percentile_linear(&values, 62.5), 25.0);
/// assert_eq!(compute_percentile_linear(&values, 100.0), 40.0);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn compute_percentile_linear(sorted_values: &[f32], percentile: f32) -> f32 {
    let Some(&first) = sorted_values.first() else {
        return f32::NAN;
    };
    if sorted_values.len() == 1 {
        return first;
    }
    let rank = percentile.clamp(0.0, 100.0) / 100.0 * (sorted_values.len() - 1) as f32;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let lo_value = sorted_values[lo];
    let hi_value = sorted_values[hi];
    lo_value + (hi_value - lo_value) * (rank - lo as f32)
}
