//! Fixed-step discretization of events and bouts
//!
//! Bins run from the window start in steps of `step`; the last edge is always
//! the window stop, so a window that is not a multiple of the step ends with a
//! shorter bin.

use crate::bouts::Bout;
use crate::error::{Result, RhythmError};
use crate::timespec::{nanos, NANOS_PER_DAY};
use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// Binned signal: bin start instants and one value per bin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Discretized {
    pub starts: Vec<NaiveDateTime>,
    pub values: Vec<f64>,
}

impl Discretized {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keep only the bins whose start satisfies `keep`.
    pub fn retain_bins(self, mut keep: impl FnMut(NaiveDateTime) -> bool) -> Self {
        let (starts, values) = self
            .starts
            .into_iter()
            .zip(self.values)
            .filter(|(start, _)| keep(*start))
            .unzip();
        Self { starts, values }
    }
}

pub(crate) fn validate_step(step: TimeDelta) -> Result<()> {
    if step <= TimeDelta::zero() {
        return Err(RhythmError::InvalidParameter(format!(
            "step must be positive, got {step}"
        )));
    }
    if nanos(step) > NANOS_PER_DAY {
        return Err(RhythmError::InvalidParameter(format!(
            "step must not exceed one day, got {step}"
        )));
    }
    Ok(())
}

/// Bin edges `start, start + step, ..., stop`
pub fn bin_edges(
    start: NaiveDateTime,
    stop: NaiveDateTime,
    step: TimeDelta,
) -> Result<Vec<NaiveDateTime>> {
    validate_step(step)?;
    if stop < start {
        return Err(RhythmError::InvalidWindow(format!(
            "stop {stop} is before start {start}"
        )));
    }

    let mut edges = Vec::new();
    let mut edge = start;
    while edge < stop {
        edges.push(edge);
        edge += step;
    }
    edges.push(stop);
    Ok(edges)
}

/// Count of sorted `events` per bin, `edges[i] <= t < edges[i + 1]`
pub fn discretize_events(
    events: &[NaiveDateTime],
    start: NaiveDateTime,
    stop: NaiveDateTime,
    step: TimeDelta,
) -> Result<Discretized> {
    let edges = bin_edges(start, stop, step)?;
    let bins = edges.len() - 1;
    let mut values = vec![0.0; bins];

    for t in events {
        if *t < start || *t >= stop {
            continue;
        }
        let bin = edges.partition_point(|e| e <= t) - 1;
        values[bin] += 1.0;
    }

    Ok(Discretized {
        starts: edges[..bins].to_vec(),
        values,
    })
}

/// Fraction of each bin covered by `bouts`, clamped to `[0, 1]`
pub fn discretize_bouts(
    bouts: &[Bout],
    start: NaiveDateTime,
    stop: NaiveDateTime,
    step: TimeDelta,
) -> Result<Discretized> {
    let edges = bin_edges(start, stop, step)?;
    let bins = edges.len() - 1;
    let mut values = vec![0.0; bins];

    for bout in bouts {
        let lo = bout.start.max(start);
        let hi = bout.end.min(stop);
        if hi <= lo {
            continue;
        }

        let mut bin = edges.partition_point(|e| *e <= lo) - 1;
        while bin < bins && edges[bin] < hi {
            let width = nanos(edges[bin + 1] - edges[bin]) as f64;
            let covered = nanos(hi.min(edges[bin + 1]) - lo.max(edges[bin])) as f64;
            if width > 0.0 && covered > 0.0 {
                values[bin] += covered / width;
            }
            bin += 1;
        }
    }

    for v in &mut values {
        *v = v.clamp(0.0, 1.0);
    }

    Ok(Discretized {
        starts: edges[..bins].to_vec(),
        values,
    })
}
