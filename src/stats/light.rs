//! Light-phase activity
//!
//! Share of activity falling outside the night intervals of each day, as
//! `1 - night_activity / activity`. Night offsets are matched against the
//! time of day of each instant.

use super::DailyStat;
use crate::bouts::Bout;
use crate::night::NightInterval;
use crate::timespec::{midnight, nanos, one_day, time_of_day};
use chrono::{NaiveDateTime, TimeDelta};

/// One analysed day: its events or bouts plus its night intervals
pub struct LightDay<'a, T> {
    pub items: &'a [T],
    pub night: &'a [NightInterval],
}

/// Light-phase share of event counts
pub fn light_activity_events(days: &[LightDay<'_, NaiveDateTime>]) -> DailyStat {
    let tallies = days.iter().map(|day| {
        let total = day.items.len() as f64;
        let night = day
            .items
            .iter()
            .filter(|t| in_night(day.night, time_of_day(**t)))
            .count() as f64;
        (night, total)
    });
    pool(tallies)
}

/// Light-phase share of bout durations
pub fn light_activity_bouts(days: &[LightDay<'_, Bout>]) -> DailyStat {
    let tallies = days.iter().map(|day| {
        let mut total = 0i64;
        let mut night = 0i64;
        for bout in day.items {
            total += nanos(bout.duration());
            night += calendar_pieces(bout.start, bout.end)
                .map(|(lo, hi)| {
                    day.night
                        .iter()
                        .map(|interval| nanos(interval.overlap(lo, hi)))
                        .sum::<i64>()
                })
                .sum::<i64>();
        }
        (night as f64, total as f64)
    });
    pool(tallies)
}

fn in_night(night: &[NightInterval], offset: TimeDelta) -> bool {
    night.iter().any(|interval| interval.contains(offset))
}

fn pool(tallies: impl Iterator<Item = (f64, f64)>) -> DailyStat {
    let mut daily = Vec::new();
    let mut night_sum = 0.0;
    let mut total_sum = 0.0;

    for (night, total) in tallies {
        night_sum += night;
        total_sum += total;
        daily.push(light_share(night, total));
    }

    DailyStat {
        daily,
        total: light_share(night_sum, total_sum),
    }
}

fn light_share(night: f64, total: f64) -> f64 {
    if total > 0.0 {
        1.0 - night / total
    } else {
        0.0
    }
}

/// Split `[start, end]` at calendar midnights into time-of-day offset pairs.
fn calendar_pieces(
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> impl Iterator<Item = (TimeDelta, TimeDelta)> {
    let mut cursor = start;
    std::iter::from_fn(move || {
        if cursor >= end {
            return None;
        }
        let day_start = midnight(cursor);
        let piece_end = end.min(day_start + one_day());
        let piece = (cursor - day_start, piece_end - day_start);
        cursor = piece_end;
        Some(piece)
    })
}
