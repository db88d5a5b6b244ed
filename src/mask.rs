//! Day mask
//!
//! Marks which days of the analysis window carry enough activity to be used
//! by the statistic engines, and derives contiguous runs of valid days.

use crate::frame::{select_events, AnalysisWindow};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Per-day validity flags over the analysis window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayMask {
    valid: Vec<bool>,
}

impl DayMask {
    /// Mask with every one of `total_days` days valid
    pub fn all(total_days: usize) -> Self {
        Self {
            valid: vec![true; total_days],
        }
    }

    /// Day `d` is valid when `counts[d] >= threshold`.
    pub fn from_counts(counts: &[usize], threshold: usize) -> Self {
        Self {
            valid: counts.iter().map(|&c| c >= threshold).collect(),
        }
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.valid
    }

    pub fn total_days(&self) -> usize {
        self.valid.len()
    }

    pub fn valid_days(&self) -> usize {
        self.valid.iter().filter(|v| **v).count()
    }

    pub fn is_valid(&self, day: usize) -> bool {
        self.valid.get(day).copied().unwrap_or(false)
    }

    /// Indices of valid days in ascending order
    pub fn valid_day_numbers(&self) -> impl Iterator<Item = usize> + '_ {
        self.valid
            .iter()
            .enumerate()
            .filter_map(|(d, v)| v.then_some(d))
    }

    /// Contiguous runs of valid days as half-open day ranges
    pub fn day_indices(&self) -> Vec<Range<usize>> {
        let mut runs = Vec::new();
        let mut open: Option<usize> = None;

        for (day, &valid) in self.valid.iter().enumerate() {
            match (valid, open) {
                (true, None) => open = Some(day),
                (false, Some(first)) => {
                    runs.push(first..day);
                    open = None;
                }
                _ => {}
            }
        }
        if let Some(first) = open {
            runs.push(first..self.valid.len());
        }

        runs
    }
}

/// Number of sorted `activity` instants falling in each day of `window`
pub fn daily_counts(activity: &[NaiveDateTime], window: &AnalysisWindow) -> Vec<usize> {
    (0..window.total_days)
        .map(|day| {
            let (start, end) = window.day_bounds(day);
            select_events(activity, Some(start), Some(end)).len()
        })
        .collect()
}

/// Instants of `activity` lying in valid days, in order
pub fn masked_activity(
    activity: &[NaiveDateTime],
    window: &AnalysisWindow,
    mask: &DayMask,
) -> Vec<NaiveDateTime> {
    mask.day_indices()
        .into_iter()
        .flat_map(|run| {
            let start = window.day_start(run.start);
            let end = window.day_start(run.end);
            select_events(activity, Some(start), Some(end)).iter().copied()
        })
        .collect()
}
