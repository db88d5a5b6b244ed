//! Statistic engines
//!
//! Every engine works on the discretized signal of the valid days only. Day
//! shaped engines view that signal as a matrix with one row per valid day.

pub mod actogram;
pub mod amplitude;
pub mod daily;
pub mod light;
pub mod onset;
pub mod periodogram;
pub mod stability;

pub use actogram::{actogram, ActogramRow};
pub use amplitude::relative_amplitude;
pub use daily::{bout_durations, daily_bouts, DailyBouts};
pub use light::{light_activity_bouts, light_activity_events};
pub use onset::activity_onset;
pub use periodogram::{chi_square_periodogram, Periodogram};
pub use stability::{interdaily_stability, intradaily_variability};

use crate::error::{Result, RhythmError};
use crate::timespec::{nanos, NANOS_PER_DAY};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Per-day values plus the statistic pooled over every valid day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyStat {
    pub daily: Vec<f64>,
    pub total: f64,
}

/// Valid-day signal viewed as `days x steps_per_day`
#[derive(Debug, Clone, Copy)]
pub struct DaySignal<'a> {
    values: &'a [f64],
    steps_per_day: usize,
}

impl<'a> DaySignal<'a> {
    /// Trailing values that do not fill a whole day are ignored.
    pub fn new(values: &'a [f64], steps_per_day: usize) -> Self {
        let days = if steps_per_day == 0 {
            0
        } else {
            values.len() / steps_per_day
        };
        Self {
            values: &values[..days * steps_per_day],
            steps_per_day,
        }
    }

    pub fn days(&self) -> usize {
        if self.steps_per_day == 0 {
            0
        } else {
            self.values.len() / self.steps_per_day
        }
    }

    pub fn steps_per_day(&self) -> usize {
        self.steps_per_day
    }

    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [f64]> {
        self.values.chunks_exact(self.steps_per_day.max(1))
    }

    /// Mean of each phase bin across days
    pub fn mean_profile(&self) -> Vec<f64> {
        let days = self.days();
        if days == 0 {
            return Vec::new();
        }
        let mut profile = vec![0.0; self.steps_per_day];
        for row in self.rows() {
            for (p, v) in profile.iter_mut().zip(row) {
                *p += v;
            }
        }
        for p in &mut profile {
            *p /= days as f64;
        }
        profile
    }
}

/// Number of `step` bins in one day; `step` must divide a day.
pub fn steps_per_day(step: TimeDelta) -> Result<usize> {
    steps_in(TimeDelta::nanoseconds(NANOS_PER_DAY), step, "one day")
}

/// Number of `step` bins in `span`; `step` must divide `span`.
pub(crate) fn steps_in(span: TimeDelta, step: TimeDelta, what: &str) -> Result<usize> {
    let step_ns = nanos(step);
    let span_ns = nanos(span);
    if step_ns <= 0 {
        return Err(RhythmError::InvalidParameter(format!(
            "step must be positive, got {step}"
        )));
    }
    if span_ns < 0 || span_ns % step_ns != 0 {
        return Err(RhythmError::InvalidParameter(format!(
            "{what} ({span}) must be a non-negative multiple of the step ({step})"
        )));
    }
    Ok((span_ns / step_ns) as usize)
}

pub(crate) fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    x.iter().sum::<f64>() / x.len() as f64
}

/// Population variance
pub(crate) fn variance(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let m = mean(x);
    x.iter().map(|v| (v - m).powi(2)).sum::<f64>() / x.len() as f64
}
