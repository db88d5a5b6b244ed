//! Night-schedule resolution
//!
//! Expands a user night specification into a concrete per-day table of
//! non-wrapping night intervals, each expressed as offsets from the start of
//! the calendar day.
//!
//! A shared pattern such as `["18:00", "06:00"]` applies to every day and
//! wraps around midnight. A per-day pattern lists boundaries for each day; a
//! day may hold an odd number of boundaries when its night continues into the
//! following day, e.g. `[["22"], ["04", "20"], ["04", "18", "24"]]`.

use crate::error::{Result, RhythmError};
use crate::timespec::{one_day, Timespec};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// User-supplied night specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NightSpec {
    /// One boundary list applied to every day
    Shared(Vec<Timespec>),
    /// One boundary list per day of the analysis window
    PerDay(Vec<Vec<Timespec>>),
}

impl Default for NightSpec {
    fn default() -> Self {
        NightSpec::shared(["18:00", "06:00"])
    }
}

impl NightSpec {
    /// Shared pattern from anything convertible to [`Timespec`]
    pub fn shared<T: Into<Timespec>>(boundaries: impl IntoIterator<Item = T>) -> Self {
        NightSpec::Shared(boundaries.into_iter().map(Into::into).collect())
    }

    /// Per-day pattern from nested boundary lists
    pub fn per_day<T, D>(days: impl IntoIterator<Item = D>) -> Self
    where
        T: Into<Timespec>,
        D: IntoIterator<Item = T>,
    {
        NightSpec::PerDay(
            days.into_iter()
                .map(|day| day.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    /// No night at all
    pub fn none() -> Self {
        NightSpec::Shared(Vec::new())
    }

    fn boundary_count(&self) -> usize {
        match self {
            NightSpec::Shared(boundaries) => boundaries.len(),
            NightSpec::PerDay(days) => days.iter().map(Vec::len).sum(),
        }
    }
}

/// Night interval `[start, end)` as offsets from the start of a calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightInterval {
    pub start: TimeDelta,
    pub end: TimeDelta,
}

impl NightInterval {
    pub fn new(start: TimeDelta, end: TimeDelta) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Whether a time-of-day offset falls inside the interval
    pub fn contains(&self, offset: TimeDelta) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Length of the overlap with `[start, end)` offsets
    pub fn overlap(&self, start: TimeDelta, end: TimeDelta) -> TimeDelta {
        let lo = self.start.max(start);
        let hi = self.end.min(end);
        if hi > lo {
            hi - lo
        } else {
            TimeDelta::zero()
        }
    }
}

/// Resolved per-day night table, indexed by day number of the analysis window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NightSchedule {
    days: Vec<Vec<NightInterval>>,
}

impl NightSchedule {
    /// Resolve a night specification for a window of `total_days` days.
    pub fn resolve(spec: &NightSpec, total_days: usize) -> Result<Self> {
        let count = spec.boundary_count();
        if count % 2 != 0 {
            return Err(RhythmError::InvalidNightSchedule(format!(
                "night needs an even number of boundaries, got {count}"
            )));
        }

        let days = match spec {
            NightSpec::Shared(boundaries) => {
                let pattern = resolve_shared(boundaries)?;
                vec![pattern; total_days]
            }
            NightSpec::PerDay(days) => {
                if days.len() != total_days {
                    return Err(RhythmError::InvalidNightSchedule(format!(
                        "per-day night lists {} days but the window spans {} days",
                        days.len(),
                        total_days
                    )));
                }
                resolve_per_day(days)?
            }
        };

        Ok(Self { days })
    }

    /// Night intervals of day `day`; empty for days outside the table
    pub fn day(&self, day: usize) -> &[NightInterval] {
        self.days.get(day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_days(&self) -> usize {
        self.days.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[NightInterval]> {
        self.days.iter().map(Vec::as_slice)
    }

    /// Total night duration of day `day`
    pub fn night_duration(&self, day: usize) -> TimeDelta {
        self.day(day)
            .iter()
            .fold(TimeDelta::zero(), |acc, interval| acc + interval.duration())
    }
}

fn offsets(boundaries: &[Timespec]) -> Result<Vec<TimeDelta>> {
    boundaries.iter().map(Timespec::to_clock_offset).collect()
}

fn overlapping() -> RhythmError {
    RhythmError::InvalidNightSchedule("overlapping night intervals".to_string())
}

fn resolve_shared(boundaries: &[Timespec]) -> Result<Vec<NightInterval>> {
    if boundaries.is_empty() {
        return Ok(Vec::new());
    }
    let mut pos = offsets(boundaries)?;
    let n = pos.len();

    // Every pair but the last must be ordered and follow the previous pair
    let mut last = TimeDelta::zero();
    for pair in pos[..n - 2].chunks(2) {
        if pair[1] < pair[0] || pair[0] < last {
            return Err(overlapping());
        }
        last = pair[1];
    }
    if pos[n - 2] < last {
        return Err(overlapping());
    }

    if pos[n - 1] == TimeDelta::zero() {
        pos[n - 1] = one_day();
    }

    if pos[n - 1] < pos[n - 2] {
        // Last night wraps midnight: its tail becomes the first interval
        let wrap_end = pos[n - 1];
        if n > 2 && pos[0] < wrap_end {
            return Err(overlapping());
        }
        let mut wrapped = Vec::with_capacity(n + 2);
        wrapped.push(TimeDelta::zero());
        wrapped.push(wrap_end);
        wrapped.extend_from_slice(&pos[..n - 1]);
        wrapped.push(one_day());
        pos = wrapped;
    }

    Ok(pairs(&pos))
}

fn resolve_per_day(days: &[Vec<Timespec>]) -> Result<Vec<Vec<NightInterval>>> {
    let mut pos = days
        .iter()
        .map(|day| offsets(day))
        .collect::<Result<Vec<_>>>()?;
    let total_days = pos.len();
    let mut resolved = Vec::with_capacity(total_days);
    // A night opened on a previous day that has not been closed yet
    let mut carry = false;

    for d in 0..total_days {
        let mut day = std::mem::take(&mut pos[d]);

        if day.is_empty() {
            if carry {
                resolved.push(vec![NightInterval::new(TimeDelta::zero(), one_day())]);
            } else {
                resolved.push(Vec::new());
            }
            continue;
        }

        let n = day.len();
        if day[n - 1] == TimeDelta::zero() && (n > 1 || carry) {
            day[n - 1] = one_day();
        }

        if n >= 2 && day[n - 1] < day[n - 2] {
            // Wrapping end boundary belongs to the next day
            if let Some(wrap) = day.pop() {
                if let Some(next) = pos.get_mut(d + 1) {
                    next.insert(0, wrap);
                }
            }
        }

        if day.windows(2).any(|w| w[1] < w[0]) {
            return Err(overlapping());
        }

        if day.len() % 2 != 0 {
            if carry {
                day.insert(0, TimeDelta::zero());
                carry = false;
            } else {
                day.push(one_day());
                carry = true;
            }
        } else if carry {
            day.insert(0, TimeDelta::zero());
            day.push(one_day());
        }

        resolved.push(pairs(&day));
    }

    Ok(resolved)
}

fn pairs(pos: &[TimeDelta]) -> Vec<NightInterval> {
    pos.chunks_exact(2)
        .map(|pair| NightInterval::new(pair[0], pair[1]))
        .filter(|interval| interval.end > interval.start)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hours(h: i64) -> TimeDelta {
        TimeDelta::hours(h)
    }

    #[test]
    fn test_shared_wrapping_night() {
        let schedule = NightSchedule::resolve(&NightSpec::shared(["18:00", "06:00"]), 3).unwrap();

        assert_eq!(schedule.total_days(), 3);
        for day in 0..3 {
            assert_eq!(
                schedule.day(day),
                &[
                    NightInterval::new(hours(0), hours(6)),
                    NightInterval::new(hours(18), hours(24)),
                ]
            );
            assert_eq!(schedule.night_duration(day), hours(12));
        }
    }

    #[test]
    fn test_shared_non_wrapping_nights() {
        let schedule =
            NightSchedule::resolve(&NightSpec::shared(["1", "3", "20:30", "0"]), 1).unwrap();
        assert_eq!(
            schedule.day(0),
            &[
                NightInterval::new(hours(1), hours(3)),
                NightInterval::new(TimeDelta::minutes(20 * 60 + 30), hours(24)),
            ]
        );
    }

    #[test]
    fn test_empty_night() {
        let schedule = NightSchedule::resolve(&NightSpec::none(), 2).unwrap();
        assert_eq!(schedule.total_days(), 2);
        assert!(schedule.day(0).is_empty());
        assert_eq!(schedule.night_duration(1), TimeDelta::zero());
    }

    #[test]
    fn test_odd_boundary_count_rejected() {
        let result = NightSchedule::resolve(&NightSpec::shared(["18:00"]), 1);
        assert!(matches!(result, Err(RhythmError::InvalidNightSchedule(_))));
    }

    #[test]
    fn test_overlapping_shared_rejected() {
        let result = NightSchedule::resolve(&NightSpec::shared(["10", "12", "11", "13"]), 1);
        assert!(matches!(result, Err(RhythmError::InvalidNightSchedule(_))));
    }

    #[test]
    fn test_per_day_carry_over() {
        let spec = NightSpec::per_day([vec!["22"], vec!["04", "20"], vec!["04", "18", "24"]]);
        let schedule = NightSchedule::resolve(&spec, 3).unwrap();

        assert_eq!(schedule.day(0), &[NightInterval::new(hours(22), hours(24))]);
        assert_eq!(
            schedule.day(1),
            &[
                NightInterval::new(hours(0), hours(4)),
                NightInterval::new(hours(20), hours(24)),
            ]
        );
        assert_eq!(
            schedule.day(2),
            &[
                NightInterval::new(hours(0), hours(4)),
                NightInterval::new(hours(18), hours(24)),
            ]
        );
    }

    #[test]
    fn test_per_day_wrapping_pair_moves_to_next_day() {
        let spec = NightSpec::per_day([vec!["18", "06"], vec!["19", "05"]]);
        let schedule = NightSchedule::resolve(&spec, 2).unwrap();

        assert_eq!(schedule.day(0), &[NightInterval::new(hours(18), hours(24))]);
        assert_eq!(
            schedule.day(1),
            &[
                NightInterval::new(hours(0), hours(6)),
                NightInterval::new(hours(19), hours(24)),
            ]
        );
    }

    #[test]
    fn test_per_day_empty_day_inside_carried_night() {
        let spec = NightSpec::per_day([vec!["22"], vec![], vec!["06"]]);
        let schedule = NightSchedule::resolve(&spec, 3).unwrap();

        assert_eq!(schedule.day(1), &[NightInterval::new(hours(0), hours(24))]);
        assert_eq!(schedule.day(2), &[NightInterval::new(hours(0), hours(6))]);
    }

    #[test]
    fn test_per_day_midnight_end_closes_the_day() {
        let spec = NightSpec::per_day([vec!["22", "0"], vec![], vec!["1", "2"]]);
        let schedule = NightSchedule::resolve(&spec, 3).unwrap();

        assert_eq!(schedule.day(0), &[NightInterval::new(hours(22), hours(24))]);
        assert!(schedule.day(1).is_empty());
        assert_eq!(schedule.day(2), &[NightInterval::new(hours(1), hours(2))]);

        let shared = NightSchedule::resolve(&NightSpec::shared(["22", "00:00"]), 1).unwrap();
        assert_eq!(schedule.day(0), shared.day(0));
    }

    #[test]
    fn test_per_day_length_must_match_window() {
        let spec = NightSpec::per_day([vec!["22", "23"]]);
        let result = NightSchedule::resolve(&spec, 2);
        assert!(matches!(result, Err(RhythmError::InvalidNightSchedule(_))));
    }

    #[test]
    fn test_night_spec_deserialization() {
        let shared: NightSpec = serde_json::from_str(r#"["18:00", "06:00"]"#).unwrap();
        assert_eq!(shared, NightSpec::shared(["18:00", "06:00"]));

        let per_day: NightSpec = serde_json::from_str(r#"[["22"], ["04"]]"#).unwrap();
        assert_eq!(per_day, NightSpec::per_day([vec!["22"], vec!["04"]]));
    }
}
