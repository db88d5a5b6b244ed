//! Day-frame construction
//!
//! Computes the analysis window from raw activity instants and an optional
//! start/stop request. The window always spans a whole number of days; its
//! stop is rounded up to the next day boundary, but activity at or after the
//! requested stop is never retained.

use crate::error::{Result, RhythmError};
use crate::timespec::{midnight, nanos, one_day, NANOS_PER_DAY};
use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// Day-aligned analysis window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    /// Inclusive start of day 0
    pub start: NaiveDateTime,
    /// Exclusive end of the last day, `start + total_days * 1 day`
    pub stop: NaiveDateTime,
    /// Stop requested by the caller, before rounding to a day boundary
    pub requested_stop: Option<NaiveDateTime>,
    /// Number of days between `start` and `stop`
    pub total_days: usize,
}

impl AnalysisWindow {
    /// Start instant of day `day`
    pub fn day_start(&self, day: usize) -> NaiveDateTime {
        self.start + TimeDelta::nanoseconds(NANOS_PER_DAY.saturating_mul(day as i64))
    }

    /// `[start, end)` bounds of day `day`
    pub fn day_bounds(&self, day: usize) -> (NaiveDateTime, NaiveDateTime) {
        let start = self.day_start(day);
        (start, start + one_day())
    }

    /// Day number containing `t`, if `t` lies inside the window
    pub fn day_of(&self, t: NaiveDateTime) -> Option<usize> {
        if t < self.start || t >= self.stop {
            return None;
        }
        Some((nanos(t - self.start) / NANOS_PER_DAY) as usize)
    }

    /// Window length
    pub fn span(&self) -> TimeDelta {
        self.stop - self.start
    }
}

/// Analysis window together with the activity retained inside it
#[derive(Debug, Clone, PartialEq)]
pub struct DayFrame {
    pub window: AnalysisWindow,
    pub activity: Vec<NaiveDateTime>,
}

impl DayFrame {
    /// Build the window for sorted `activity` and an optional start/stop.
    pub fn build(
        activity: &[NaiveDateTime],
        start: Option<NaiveDateTime>,
        stop: Option<NaiveDateTime>,
    ) -> Result<Self> {
        if let (Some(start), Some(stop)) = (start, stop) {
            if stop <= start {
                return Err(RhythmError::InvalidWindow(format!(
                    "stop {stop} must be after start {start}"
                )));
            }
        }

        let retained = select_events(activity, start, stop).to_vec();

        let start = match (start, retained.first()) {
            (Some(start), _) => start,
            (None, Some(first)) => midnight(*first),
            (None, None) => {
                return Err(RhythmError::InvalidWindow(
                    "no activity inside the requested range and no explicit start".to_string(),
                ))
            }
        };

        let provisional_stop = match (stop, retained.last()) {
            (Some(stop), _) => stop,
            // End of the window day containing the last instant
            (None, Some(last)) => *last + TimeDelta::nanoseconds(1),
            (None, None) => {
                return Err(RhythmError::InvalidWindow(
                    "no activity inside the requested range and no explicit stop".to_string(),
                ))
            }
        };
        if provisional_stop <= start {
            return Err(RhythmError::InvalidWindow(format!(
                "stop {provisional_stop} must be after start {start}"
            )));
        }

        let span = nanos(provisional_stop - start);
        let total_days = span / NANOS_PER_DAY + i64::from(span % NANOS_PER_DAY != 0);
        let stop_adjusted = start + TimeDelta::nanoseconds(total_days.saturating_mul(NANOS_PER_DAY));

        log::debug!(
            "analysis window {start} .. {stop_adjusted} ({total_days} days, {} events retained)",
            retained.len()
        );

        Ok(Self {
            window: AnalysisWindow {
                start,
                stop: stop_adjusted,
                requested_stop: stop,
                total_days: total_days as usize,
            },
            activity: retained,
        })
    }
}

/// Sorted instants in `[start, stop)`; a missing bound is unbounded.
pub fn select_events(
    events: &[NaiveDateTime],
    start: Option<NaiveDateTime>,
    stop: Option<NaiveDateTime>,
) -> &[NaiveDateTime] {
    let lo = start.map_or(0, |s| events.partition_point(|t| *t < s));
    let hi = stop.map_or(events.len(), |s| events.partition_point(|t| *t < s));
    if hi <= lo {
        &[]
    } else {
        &events[lo..hi]
    }
}
