//! Daily bout statistics

use crate::bouts::Bout;
use crate::error::{Result, RhythmError};
use crate::timespec::nanos;
use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// Bout count and mean bout duration for each valid day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyBouts {
    pub counts: Vec<usize>,
    /// Mean duration in units of the requested timescale, 0 for days without bouts
    pub mean_durations: Vec<f64>,
}

/// Count bouts by the day their start falls in.
///
/// `days` holds the `[start, end)` bounds of each valid day in order.
pub fn daily_bouts(
    bouts: &[Bout],
    days: &[(NaiveDateTime, NaiveDateTime)],
    timescale: TimeDelta,
) -> Result<DailyBouts> {
    let scale = scale_nanos(timescale)?;
    let mut result = DailyBouts::default();

    for (start, end) in days {
        let lo = bouts.partition_point(|b| b.start < *start);
        let hi = bouts.partition_point(|b| b.start < *end);
        let day = &bouts[lo..hi.max(lo)];

        let count = day.len();
        let total: i64 = day.iter().map(|b| nanos(b.duration())).sum();
        result.counts.push(count);
        result.mean_durations.push(if count > 0 {
            total as f64 / count as f64 / scale
        } else {
            0.0
        });
    }

    Ok(result)
}

/// Duration of every bout in units of `timescale`
pub fn bout_durations(bouts: &[Bout], timescale: TimeDelta) -> Result<Vec<f64>> {
    let scale = scale_nanos(timescale)?;
    Ok(bouts
        .iter()
        .map(|b| nanos(b.duration()) as f64 / scale)
        .collect())
}

fn scale_nanos(timescale: TimeDelta) -> Result<f64> {
    if timescale <= TimeDelta::zero() {
        return Err(RhythmError::InvalidParameter(format!(
            "timescale must be positive, got {timescale}"
        )));
    }
    Ok(nanos(timescale) as f64)
}
