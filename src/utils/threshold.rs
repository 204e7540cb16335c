//! Automatic thresholding
//!
//! Maximum-entropy (Kapur) threshold selection on a coarse histogram.

/// Histogram of `data` over [min, max] with `num_bins` equal bins.
///
/// Returns (counts, min, bin_width); the maximum falls into the last bin.
fn histogram(data: &[f64], num_bins: usize) -> (Vec<usize>, f64, f64) {
    let min_val = data.iter().fold(f64::MAX, |a, &b| a.min(b));
    let max_val = data.iter().fold(f64::MIN, |a, &b| a.max(b));
    let bin_width = (max_val - min_val) / num_bins as f64;

    let mut counts = vec![0usize; num_bins];
    for &v in data {
        let bin = ((v - min_val) / bin_width).floor() as usize;
        counts[bin.min(num_bins - 1)] += 1;
    }
    (counts, min_val, bin_width)
}

/// Maximum-entropy threshold selection
///
/// Picks the histogram split maximizing the sum of background and
/// foreground entropies, and returns the center of the last background bin.
/// Voxels strictly above the returned value are foreground. Ties keep the
/// first split.
///
/// # Arguments
/// * `data` - Input data (e.g. flattened 3D image)
/// * `num_bins` - Number of histogram bins
pub fn max_entropy_threshold(data: &[f64], num_bins: usize) -> f64 {
    if data.is_empty() || num_bins == 0 {
        return 0.0;
    }

    let (counts, min_val, bin_width) = histogram(data, num_bins);
    if bin_width.abs() < 1e-12 {
        return min_val;
    }

    let total = data.len() as f64;
    let norm: Vec<f64> = counts.iter().map(|&c| c as f64 / total).collect();

    // Cumulative background probability
    let mut p1 = vec![0.0; num_bins];
    let mut acc = 0.0;
    for (t, &p) in norm.iter().enumerate() {
        acc += p;
        p1[t] = acc;
    }
    // Foreground mass as a suffix sum so the last bin is exactly empty
    let mut p2 = vec![0.0; num_bins];
    let mut acc = 0.0;
    for t in (0..num_bins - 1).rev() {
        acc += norm[t + 1];
        p2[t] = acc;
    }

    let eps = f64::EPSILON;
    let first_bin = p1.iter().position(|&p| p.abs() >= eps).unwrap_or(0);
    let last_bin = p2.iter().rposition(|&p| p.abs() >= eps).unwrap_or(num_bins - 1);

    let entropy = |range: std::ops::Range<usize>, mass: f64| -> f64 {
        norm[range]
            .iter()
            .filter(|&&p| p > 0.0)
            .map(|&p| {
                let q = p / mass;
                -q * q.ln()
            })
            .sum()
    };

    let mut best_bin = first_bin;
    let mut max_ent = f64::MIN;
    for t in first_bin..=last_bin.max(first_bin) {
        let total_ent = entropy(0..t + 1, p1[t]) + entropy(t + 1..num_bins, p2[t]);
        if total_ent > max_ent {
            max_ent = total_ent;
            best_bin = t;
        }
    }

    min_val + (best_bin as f64 + 0.5) * bin_width
}
