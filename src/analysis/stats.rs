//! Population moments and order statistics over `f64` slices.

pub(super) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// `k`-th central moment with `1 / n` normalization.
pub(super) fn central_moment(values: &[f64], mean: f64, k: i32) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| (v - mean).powi(k)).sum::<f64>() / values.len() as f64
}

pub(super) fn std(values: &[f64]) -> f64 {
    central_moment(values, mean(values), 2).sqrt()
}

/// Middle value, or the mean of the two middle values for even lengths.
pub(super) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub(super) fn first_difference(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_handles_odd_and_even_lengths() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn std_is_population_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std(&values) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn first_difference_is_one_shorter() {
        assert_eq!(first_difference(&[1.0, 4.0, 2.0]), vec![3.0, -2.0]);
        assert!(first_difference(&[1.0]).is_empty());
    }
}
