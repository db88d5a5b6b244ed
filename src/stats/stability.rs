//! Interdaily stability and intradaily variability

use super::{variance, DailyStat, DaySignal};

/// Variance of the mean daily profile over the variance of every bin
///
/// A perfectly repeating (including constant) signal gives `1.0`; no valid
/// days gives `0.0`.
pub fn interdaily_stability(signal: &DaySignal<'_>) -> f64 {
    if signal.days() == 0 {
        return 0.0;
    }
    let var_all = variance(signal.values());
    if var_all <= 0.0 {
        return 1.0;
    }
    (variance(&signal.mean_profile()) / var_all).clamp(0.0, 1.0)
}

/// Mean squared successive difference over the variance, per day and pooled
pub fn intradaily_variability(signal: &DaySignal<'_>) -> DailyStat {
    DailyStat {
        daily: signal.rows().map(variability).collect(),
        total: variability(signal.values()),
    }
}

fn variability(x: &[f64]) -> f64 {
    if x.len() < 2 {
        return 0.0;
    }
    let var = variance(x);
    if var <= 0.0 {
        return 0.0;
    }
    let diffs: f64 = x.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    diffs / (x.len() - 1) as f64 / var
}
