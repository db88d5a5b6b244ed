//! Activity bout segmentation
//!
//! A bout is a maximal run of activity instants whose consecutive gaps never
//! exceed a maximum gap. Runs that are too short or contain too few instants
//! are discarded.

use crate::error::{Result, RhythmError};
use crate::timespec::Timespec;
use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// Closed activity period `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bout {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Bout {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Length of the intersection with `[start, end)`
    pub fn overlap(&self, start: NaiveDateTime, end: NaiveDateTime) -> TimeDelta {
        let lo = self.start.max(start);
        let hi = self.end.min(end);
        if hi > lo {
            hi - lo
        } else {
            TimeDelta::zero()
        }
    }
}

/// Resolved segmentation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoutParams {
    /// Largest gap between consecutive instants inside one bout (inclusive)
    pub max_gap: TimeDelta,
    /// Shortest bout kept
    pub min_duration: TimeDelta,
    /// Fewest instants a bout must contain
    pub min_count: usize,
}

impl Default for BoutParams {
    fn default() -> Self {
        Self {
            max_gap: TimeDelta::minutes(1),
            min_duration: TimeDelta::zero(),
            min_count: 2,
        }
    }
}

impl BoutParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_gap < TimeDelta::zero() {
            return Err(RhythmError::InvalidParameter(format!(
                "max_gap must not be negative, got {}",
                self.max_gap
            )));
        }
        if self.min_duration < TimeDelta::zero() {
            return Err(RhythmError::InvalidParameter(format!(
                "min_duration must not be negative, got {}",
                self.min_duration
            )));
        }
        if self.min_count < 1 {
            return Err(RhythmError::InvalidParameter(
                "min_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-call bout overrides; unset fields fall back to the analyzer defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoutOptions {
    #[serde(default)]
    pub max_gap: Option<Timespec>,
    #[serde(default)]
    pub min_duration: Option<Timespec>,
    #[serde(default)]
    pub min_count: Option<usize>,
}

impl BoutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_gap(mut self, max_gap: impl Into<Timespec>) -> Self {
        self.max_gap = Some(max_gap.into());
        self
    }

    pub fn with_min_duration(mut self, min_duration: impl Into<Timespec>) -> Self {
        self.min_duration = Some(min_duration.into());
        self
    }

    pub fn with_min_count(mut self, min_count: usize) -> Self {
        self.min_count = Some(min_count);
        self
    }

    /// Resolve against `defaults`, normalizing and validating the result.
    pub fn resolve(&self, defaults: &BoutParams) -> Result<BoutParams> {
        let params = BoutParams {
            max_gap: match &self.max_gap {
                Some(t) => t.to_duration()?,
                None => defaults.max_gap,
            },
            min_duration: match &self.min_duration {
                Some(t) => t.to_duration()?,
                None => defaults.min_duration,
            },
            min_count: self.min_count.unwrap_or(defaults.min_count),
        };
        params.validate()?;
        Ok(params)
    }
}

/// Segment sorted `activity` into bouts.
pub fn segment(activity: &[NaiveDateTime], params: &BoutParams) -> Result<Vec<Bout>> {
    params.validate()?;

    let mut bouts = Vec::new();
    let mut iter = activity.iter().copied();
    let Some(mut first) = iter.next() else {
        return Ok(bouts);
    };
    let mut last = first;
    let mut count = 1usize;

    for t in iter {
        if t - last <= params.max_gap {
            last = t;
            count += 1;
            continue;
        }
        if let Some(bout) = keep(first, last, count, params) {
            bouts.push(bout);
        }
        first = t;
        last = t;
        count = 1;
    }
    if let Some(bout) = keep(first, last, count, params) {
        bouts.push(bout);
    }

    log::debug!(
        "segmented {} instants into {} bouts (max_gap {}, min_duration {}, min_count {})",
        activity.len(),
        bouts.len(),
        params.max_gap,
        params.min_duration,
        params.min_count
    );
    Ok(bouts)
}

fn keep(
    first: NaiveDateTime,
    last: NaiveDateTime,
    count: usize,
    params: &BoutParams,
) -> Option<Bout> {
    (count >= params.min_count && last - first >= params.min_duration)
        .then(|| Bout::new(first, last))
}

/// Bouts overlapping `[start, stop)`, with the outermost ones clipped to it.
pub fn select_bouts(
    bouts: &[Bout],
    start: Option<NaiveDateTime>,
    stop: Option<NaiveDateTime>,
) -> Vec<Bout> {
    bouts
        .iter()
        .filter(|b| start.map_or(true, |s| b.end >= s) && stop.map_or(true, |s| b.start < s))
        .map(|b| Bout {
            start: start.map_or(b.start, |s| b.start.max(s)),
            end: stop.map_or(b.end, |s| b.end.min(s - TimeDelta::nanoseconds(1))),
        })
        .collect()
}
