/// Shift `values` so the minimum is zero, then scale them to sum to 1.
///
/// Relative spacing is kept. When every value is equal the result is an
/// even split.
pub fn normalize_values(values: &[f32]) -> Vec<f32> {
    let Some(min) = values.iter().copied().reduce(f32::min) else {
        return Vec::new();
    };

    let shifted: Vec<f32> = values.iter().map(|v| v - min).collect();
    let total: f32 = shifted.iter().sum();

    if total == 0.0 {
        return vec![1.0 / values.len() as f32; values.len()];
    }

    shifted.into_iter().map(|v| v / total).collect()
}
