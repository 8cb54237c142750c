//! Descriptive statistics over numeric columns.
//!
//! All functions ignore non-finite values and return `None` instead of NaN
//! when a statistic is undefined (empty input, zero variance, ...).

use serde::{Deserialize, Serialize};

/// Finite values of `values`, sorted ascending.
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Quantile `p` (0..=1) of already sorted data using linear interpolation
/// between order statistics (position `p * (n - 1)`).
///
/// # Examples
///
/// ```
/// use sfp_rust::algorithms::quantile_sorted;
///
/// let sorted = [9.0, 9.0, 10.0, 10.0, 11.0, 11.0, 12.0, 100.0];
/// assert_eq!(quantile_sorted(&sorted, 0.25), Some(9.75));
/// assert_eq!(quantile_sorted(&sorted, 0.75), Some(11.25));
/// ```
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let pos = p * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    let value = sorted[lower] + (sorted[upper] - sorted[lower]) * weight;
    // Keep rounding from stepping outside the bracketing order statistics.
    Some(value.clamp(sorted[lower], sorted[upper]))
}

/// Quantile of unsorted data.
pub fn quantile(values: &[f64], p: f64) -> Option<f64> {
    quantile_sorted(&sorted_finite(values), p)
}

/// First and third quartile.
pub fn quartiles(values: &[f64]) -> Option<(f64, f64)> {
    let sorted = sorted_finite(values);
    Some((quantile_sorted(&sorted, 0.25)?, quantile_sorted(&sorted, 0.75)?))
}

pub fn mean(values: &[f64]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Sample standard deviation (`n - 1` denominator). `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.len() < 2 {
        return None;
    }
    let m = mean(&finite)?;
    let ss: f64 = finite.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (finite.len() - 1) as f64).sqrt())
}

/// Minimum and maximum of the finite values.
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Pearson correlation coefficient of two aligned columns.
///
/// Pairs where either side is non-finite are skipped. Returns `None` with
/// fewer than two pairs or when either column has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Per-column summary in the shape of a dataframe `describe()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Describe {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q25: Option<f64>,
    #[serde(rename = "50%")]
    pub median: Option<f64>,
    #[serde(rename = "75%")]
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

pub fn describe(values: &[f64]) -> Describe {
    let sorted = sorted_finite(values);
    Describe {
        count: sorted.len(),
        mean: mean(&sorted),
        std: sample_std(&sorted),
        min: sorted.first().copied(),
        q25: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q75: quantile_sorted(&sorted, 0.75),
        max: sorted.last().copied(),
    }
}
