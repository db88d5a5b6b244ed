//! Actogram rows for double-plot renderers

use super::DaySignal;
use crate::night::NightInterval;
use crate::timespec::nanos;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One valid day of binned activity with its night shading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActogramRow {
    pub day: usize,
    pub start: NaiveDateTime,
    pub values: Vec<f64>,
    /// Night intervals as `(start, end)` hours from the start of the calendar day
    pub night_hours: Vec<(f64, f64)>,
}

/// Pair each row of `signal` with its day number, start and night.
///
/// `days` lists `(day number, day start, night intervals)` for each row.
pub fn actogram(
    signal: &DaySignal<'_>,
    days: &[(usize, NaiveDateTime, &[NightInterval])],
) -> Vec<ActogramRow> {
    signal
        .rows()
        .zip(days)
        .map(|(values, (day, start, night))| ActogramRow {
            day: *day,
            start: *start,
            values: values.to_vec(),
            night_hours: night
                .iter()
                .map(|n| (hours(n.start), hours(n.end)))
                .collect(),
        })
        .collect()
}

fn hours(offset: chrono::TimeDelta) -> f64 {
    nanos(offset) as f64 / 3_600_000_000_000.0
}
