//! Chi-square periodogram
//!
//! For each candidate period `P` (in bins) the zero-padded signal is folded
//! into `K` rows of `P` bins and
//! `Qp = N * (P - 1) * Var(phase means) / Var(folded samples)` with
//! `N = K * P`.

use super::{mean, variance};
use chrono::TimeDelta;

/// Candidate periods and their chi-square power
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Periodogram {
    pub periods: Vec<TimeDelta>,
    pub powers: Vec<f64>,
}

impl Periodogram {
    /// Period with the highest power; the shortest wins ties.
    pub fn best_period(&self) -> Option<TimeDelta> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &p) in self.powers.iter().enumerate() {
            if best.map_or(true, |(_, b)| p > b) {
                best = Some((i, p));
            }
        }
        best.map(|(i, _)| self.periods[i])
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// Power for each period of `min_bins..=max_bins` over `values`
///
/// `values` is padded with `max_bins - 1` zeros before folding.
pub fn chi_square_periodogram(values: &[f64], min_bins: usize, max_bins: usize) -> Vec<f64> {
    if values.is_empty() || min_bins == 0 || max_bins < min_bins {
        return Vec::new();
    }

    let mut padded = values.to_vec();
    padded.resize(values.len() + max_bins - 1, 0.0);

    (min_bins..=max_bins)
        .map(|p| fold_power(&padded, p))
        .collect()
}

fn fold_power(signal: &[f64], period: usize) -> f64 {
    let rows = signal.len() / period;
    if rows == 0 {
        return 0.0;
    }
    let n = rows * period;
    let folded = &signal[..n];

    let var_all = variance(folded);
    if var_all <= 0.0 {
        return 0.0;
    }

    let phase_means: Vec<f64> = (0..period)
        .map(|phase| {
            let column: Vec<f64> = folded.iter().skip(phase).step_by(period).copied().collect();
            mean(&column)
        })
        .collect();

    n as f64 * (period - 1) as f64 * variance(&phase_means) / var_all
}
