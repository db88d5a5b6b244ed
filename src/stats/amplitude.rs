//! Relative amplitude
//!
//! For each day the most active window of `most` bins is located first, then
//! the least active window of `least` bins that does not overlap it. When no
//! such window fits, the search runs the other way round.

use super::{DailyStat, DaySignal};
use crate::error::{Result, RhythmError};

/// `(M - L) / (M + L)` per day and pooled over days
pub fn relative_amplitude(
    signal: &DaySignal<'_>,
    most: usize,
    least: usize,
) -> Result<DailyStat> {
    let steps = signal.steps_per_day();
    if most == 0 || least == 0 {
        return Err(RhythmError::InvalidParameter(
            "most and least active windows must be positive".to_string(),
        ));
    }
    if most + least + most.min(least) > steps {
        return Err(RhythmError::InvalidParameter(format!(
            "windows of {most} and {least} bins do not fit twice into a day of {steps} bins"
        )));
    }

    let mut daily = Vec::with_capacity(signal.days());
    let mut total_most = 0.0;
    let mut total_least = 0.0;

    for day in signal.rows() {
        let (m, l) = day_extremes(day, most, least);
        total_most += m;
        total_least += l;
        daily.push(ratio(m, l));
    }

    Ok(DailyStat {
        daily,
        total: ratio(total_most, total_least),
    })
}

fn ratio(most: f64, least: f64) -> f64 {
    if most != 0.0 {
        (most - least) / (most + least)
    } else {
        0.0
    }
}

/// Mean activity of the most and least active non-overlapping windows
fn day_extremes(day: &[f64], most: usize, least: usize) -> (f64, f64) {
    let most_means = window_means(day, most);
    let (mi, m) = extreme(&most_means, |a, b| a > b).unwrap_or((0, 0.0));

    if let Some(l) = best_outside(day, mi, most, least, |a, b| a < b) {
        return (m, l);
    }

    let least_means = window_means(day, least);
    let (li, l) = extreme(&least_means, |a, b| a < b).unwrap_or((0, 0.0));
    let m = best_outside(day, li, least, most, |a, b| a > b).unwrap_or(m);
    (m, l)
}

/// Best window of `width` bins entirely before or after `[at, at + taken)`
fn best_outside(
    day: &[f64],
    at: usize,
    taken: usize,
    width: usize,
    better: fn(f64, f64) -> bool,
) -> Option<f64> {
    let before = (at >= width).then(|| window_means(&day[..at], width));
    let after = (at + taken + width <= day.len()).then(|| window_means(&day[at + taken..], width));

    before
        .into_iter()
        .chain(after)
        .filter_map(|means| extreme(&means, better).map(|(_, v)| v))
        .reduce(|a, b| if better(b, a) { b } else { a })
}

/// First index holding the extreme value under `better`
fn extreme(x: &[f64], better: fn(f64, f64) -> bool) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in x.iter().enumerate() {
        if best.map_or(true, |(_, b)| better(v, b)) {
            best = Some((i, v));
        }
    }
    best
}

/// Mean of every window of `width` consecutive bins
fn window_means(x: &[f64], width: usize) -> Vec<f64> {
    if width == 0 || width > x.len() {
        return Vec::new();
    }
    let mut sum: f64 = x[..width].iter().sum();
    let mut means = Vec::with_capacity(x.len() - width + 1);
    means.push(sum / width as f64);
    for i in width..x.len() {
        sum += x[i] - x[i - width];
        means.push(sum / width as f64);
    }
    means
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day_with_active_hours(active: std::ops::Range<usize>) -> Vec<f64> {
        (0..24).map(|h| if active.contains(&h) { 10.0 } else { 0.0 }).collect()
    }

    #[test]
    fn test_fully_rhythmic_day() {
        let values = day_with_active_hours(8..18);
        let signal = DaySignal::new(&values, 24);
        let ra = relative_amplitude(&signal, 10, 5).unwrap();

        assert!((ra.daily[0] - 1.0).abs() < 1e-12);
        assert!((ra.total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_flat_day() {
        let values = vec![3.0; 24];
        let signal = DaySignal::new(&values, 24);
        let ra = relative_amplitude(&signal, 10, 5).unwrap();
        assert_eq!(ra.daily, vec![0.0]);
    }

    #[test]
    fn test_inactive_day() {
        let values = vec![0.0; 48];
        let signal = DaySignal::new(&values, 24);
        let ra = relative_amplitude(&signal, 10, 5).unwrap();
        assert_eq!(ra.daily, vec![0.0, 0.0]);
        assert_eq!(ra.total, 0.0);
    }

    #[test]
    fn test_partial_amplitude() {
        let mut values = day_with_active_hours(8..18);
        for v in values.iter_mut().take(8) {
            *v = 2.0;
        }
        for v in values.iter_mut().skip(18) {
            *v = 2.0;
        }
        let signal = DaySignal::new(&values, 24);
        let ra = relative_amplitude(&signal, 10, 5).unwrap();

        // M = 10, L = 2
        assert!((ra.daily[0] - 8.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_window_constraints() {
        let values = vec![0.0; 24];
        let signal = DaySignal::new(&values, 24);
        assert!(relative_amplitude(&signal, 0, 5).is_err());
        assert!(relative_amplitude(&signal, 12, 8).is_err());
        assert!(relative_amplitude(&signal, 10, 7).is_ok());
    }

    #[test]
    fn test_window_means() {
        assert_eq!(window_means(&[1.0, 2.0, 3.0, 4.0], 2), vec![1.5, 2.5, 3.5]);
        assert!(window_means(&[1.0], 2).is_empty());
    }
}
