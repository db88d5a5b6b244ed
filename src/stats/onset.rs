//! Activity onset detection
//!
//! Each day is binarized against a percentile of its non-zero bins and
//! correlated with a step template: `before` bins of `-1` followed by `after`
//! bins of `+1`. The onset is the earliest bin with the largest response.

use super::DaySignal;
use crate::error::{Result, RhythmError};

/// Onset bin index for every day of `signal`
pub fn activity_onset(
    signal: &DaySignal<'_>,
    percentile: f64,
    before: usize,
    after: usize,
) -> Result<Vec<usize>> {
    if !(0.0..=100.0).contains(&percentile) {
        return Err(RhythmError::InvalidParameter(format!(
            "percentile must be within [0, 100], got {percentile}"
        )));
    }
    if before == 0 || after == 0 {
        return Err(RhythmError::InvalidParameter(
            "onset template windows must be positive".to_string(),
        ));
    }

    Ok(signal
        .rows()
        .map(|day| day_onset(day, percentile, before, after))
        .collect())
}

fn day_onset(day: &[f64], percentile: f64, before: usize, after: usize) -> usize {
    let mut nonzero: Vec<f64> = day.iter().copied().filter(|v| *v != 0.0).collect();
    if nonzero.is_empty() {
        return 0;
    }
    nonzero.sort_by(|a, b| a.total_cmp(b));
    let threshold = higher_percentile(&nonzero, percentile);

    // prefix[i] = sum of the first i binarized bins
    let mut prefix = Vec::with_capacity(day.len() + 1);
    prefix.push(0i64);
    for v in day {
        let b = if *v >= threshold { 1 } else { -1 };
        prefix.push(prefix[prefix.len() - 1] + b);
    }

    let n = day.len();
    let mut best = (0usize, i64::MIN);
    for j in 0..n {
        let lead = prefix[j] - prefix[j.saturating_sub(before)];
        let follow = prefix[(j + after).min(n)] - prefix[j];
        let response = follow - lead;
        if response > best.1 {
            best = (j, response);
        }
    }
    best.0
}

/// Percentile of sorted data, rounding the rank up to the next sample
fn higher_percentile(sorted: &[f64], percentile: f64) -> f64 {
    let rank = percentile / 100.0 * (sorted.len() - 1) as f64;
    let index = (rank.ceil() as usize).min(sorted.len() - 1);
    sorted[index]
}
