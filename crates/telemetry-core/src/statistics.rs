use serde::{Deserialize, Serialize};

// ── Order statistics ──────────────────────────────────────────────────────────

/// Compute the `p`-th percentile of a **sorted** slice using linear
/// interpolation between closest ranks.
///
/// Returns `None` for an empty slice.
pub fn percentile(sorted_data: &[f64], p: f64) -> Option<f64> {
    let len = sorted_data.len();
    if len == 0 {
        return None;
    }
    if len == 1 {
        return Some(sorted_data[0]);
    }
    let rank = (p / 100.0).clamp(0.0, 1.0) * (len as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return Some(sorted_data[lo]);
    }
    let frac = rank - lo as f64;
    Some(sorted_data[lo] + frac * (sorted_data[hi] - sorted_data[lo]))
}

/// Sorted copy of the finite values in `values`.
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    v.sort_by(f64::total_cmp);
    v
}

/// Median of the finite values, or `None` when there are none.
pub fn median(values: &[f64]) -> Option<f64> {
    percentile(&sorted_finite(values), 50.0)
}

/// First differences: `out[i] = values[i + 1] - values[i]`.
pub fn diff(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

// ── Moments ───────────────────────────────────────────────────────────────────

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (`n - 1` denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    Some((ss / (n as f64 - 1.0)).sqrt())
}

/// Biased central moments `(m2, m3, m4)`.
fn central_moments(values: &[f64]) -> Option<(f64, f64, f64)> {
    let m = mean(values)?;
    let n = values.len() as f64;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for x in values {
        let d = x - m;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    Some((m2 / n, m3 / n, m4 / n))
}

/// Adjusted Fisher–Pearson skewness. Needs at least 3 values; a constant
/// sample has skewness 0.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let (m2, m3, _) = central_moments(values)?;
    if m2 == 0.0 {
        return Some(0.0);
    }
    let n = n as f64;
    let g1 = m3 / m2.powf(1.5);
    Some(g1 * (n * (n - 1.0)).sqrt() / (n - 2.0))
}

/// Unbiased excess kurtosis. Needs at least 4 values; a constant sample has
/// kurtosis 0.
pub fn kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 4 {
        return None;
    }
    let (m2, _, m4) = central_moments(values)?;
    if m2 == 0.0 {
        return Some(0.0);
    }
    let n = n as f64;
    let g2 = m4 / (m2 * m2) - 3.0;
    Some(((n + 1.0) * g2 + 6.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0)))
}

// ── Summary ───────────────────────────────────────────────────────────────────

/// Descriptive statistics of one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub q25: f64,
    pub q75: f64,
    pub range: f64,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
}

impl Summary {
    /// Summarise the finite values in `values`; `None` when there are none.
    pub fn describe(values: &[f64]) -> Option<Self> {
        let sorted = sorted_finite(values);
        let (&min, &max) = (sorted.first()?, sorted.last()?);
        Some(Self {
            count: sorted.len(),
            mean: mean(&sorted)?,
            std: sample_std(&sorted),
            min,
            max,
            median: percentile(&sorted, 50.0)?,
            q25: percentile(&sorted, 25.0)?,
            q75: percentile(&sorted, 75.0)?,
            range: max - min,
            skewness: skewness(&sorted),
            kurtosis: kurtosis(&sorted),
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
