//! Timespec normalization
//!
//! Every timespan parameter of the analyzer (bin widths, bout gaps, periods,
//! night boundaries) goes through [`Timespec`], which accepts duration strings,
//! integer nanosecond counts or native [`TimeDelta`] values and produces one
//! canonical [`TimeDelta`].
//!
//! Two parsers live here:
//! - [`Timespec::to_duration`] reads durations: clock-style `"HH:MM:SS"` and
//!   unit-suffixed forms such as `"5m"`, `"1h30m"` or `"2 hours"`.
//! - [`Timespec::to_clock_offset`] reads a clock time of day (`"6"`, `"06"`,
//!   `"6:00"`, `"06:00"`, `"24:00"`) and returns the offset from midnight.

use crate::error::{Result, RhythmError};
use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Nanoseconds in one day
pub const NANOS_PER_DAY: i64 = 86_400_000_000_000;

const NANOS_PER_HOUR: i128 = 3_600_000_000_000;
const NANOS_PER_MINUTE: i128 = 60_000_000_000;
const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// A time-like parameter before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timespec {
    /// Integer count of nanoseconds
    Nanos(i64),
    /// Duration or clock string, e.g. `"06:00"` or `"5m"`
    Text(String),
    /// Native duration, written out as nanoseconds
    #[serde(skip_deserializing, serialize_with = "serialize_span")]
    Span(TimeDelta),
}

fn serialize_span<S>(span: &TimeDelta, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_i64(nanos(*span))
}

impl Timespec {
    /// Normalize to a duration.
    pub fn to_duration(&self) -> Result<TimeDelta> {
        match self {
            Timespec::Nanos(n) => Ok(TimeDelta::nanoseconds(*n)),
            Timespec::Span(d) => Ok(*d),
            Timespec::Text(text) => parse_duration(text),
        }
    }

    /// Normalize to an offset from the start of a calendar day, in `[0, 24h]`.
    ///
    /// Text is read as a clock time of day; integers and native durations are
    /// reduced modulo one day.
    pub fn to_clock_offset(&self) -> Result<TimeDelta> {
        match self {
            Timespec::Nanos(n) => Ok(TimeDelta::nanoseconds(n.rem_euclid(NANOS_PER_DAY))),
            Timespec::Span(d) => Ok(TimeDelta::nanoseconds(
                nanos(*d).rem_euclid(NANOS_PER_DAY),
            )),
            Timespec::Text(text) => parse_clock_of_day(text),
        }
    }
}

impl fmt::Display for Timespec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timespec::Nanos(n) => write!(f, "{n}ns"),
            Timespec::Text(text) => write!(f, "{text}"),
            Timespec::Span(d) => write!(f, "{d}"),
        }
    }
}

impl From<&str> for Timespec {
    fn from(value: &str) -> Self {
        Timespec::Text(value.to_string())
    }
}

impl From<String> for Timespec {
    fn from(value: String) -> Self {
        Timespec::Text(value)
    }
}

impl From<i64> for Timespec {
    fn from(value: i64) -> Self {
        Timespec::Nanos(value)
    }
}

impl From<TimeDelta> for Timespec {
    fn from(value: TimeDelta) -> Self {
        Timespec::Span(value)
    }
}

/// Normalize anything convertible into a [`Timespec`] to a duration.
pub fn normalize(value: impl Into<Timespec>) -> Result<TimeDelta> {
    value.into().to_duration()
}

/// One day as a duration
pub fn one_day() -> TimeDelta {
    TimeDelta::nanoseconds(NANOS_PER_DAY)
}

/// Duration as whole nanoseconds, saturating outside the `i64` range
pub(crate) fn nanos(d: TimeDelta) -> i64 {
    d.num_nanoseconds()
        .unwrap_or(if d < TimeDelta::zero() { i64::MIN } else { i64::MAX })
}

/// Midnight of the calendar day containing `t`
pub(crate) fn midnight(t: NaiveDateTime) -> NaiveDateTime {
    t.date().and_time(NaiveTime::MIN)
}

/// Offset of `t` from the midnight of its calendar day
pub(crate) fn time_of_day(t: NaiveDateTime) -> TimeDelta {
    t - midnight(t)
}

fn parse_duration(text: &str) -> Result<TimeDelta> {
    let invalid = || RhythmError::InvalidTimespec(format!("cannot parse duration '{text}'"));

    let trimmed = text.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed).trim_start()),
    };
    if body.is_empty() {
        return Err(invalid());
    }

    let total = if body.contains(':') || body.chars().all(|c| c.is_ascii_digit()) {
        let parts = split_clock(body).ok_or_else(invalid)?;
        if parts.minutes >= 60 || parts.nanos_of_minute >= NANOS_PER_MINUTE {
            return Err(invalid());
        }
        parts.total_nanos()
    } else {
        parse_unit_terms(body).ok_or_else(invalid)?
    };

    let total = if negative { -total } else { total };
    let total = i64::try_from(total).map_err(|_| invalid())?;
    Ok(TimeDelta::nanoseconds(total))
}

fn parse_clock_of_day(text: &str) -> Result<TimeDelta> {
    let trimmed = text.trim();
    let parts = split_clock(trimmed).ok_or_else(|| {
        RhythmError::InvalidTimespec(format!("cannot parse clock time '{text}'"))
    })?;

    if parts.hour_digits > 2 || parts.minutes >= 60 || parts.nanos_of_minute >= NANOS_PER_MINUTE {
        return Err(RhythmError::InvalidTimespec(format!(
            "clock time '{text}' is out of range"
        )));
    }
    if parts.hours > 24 || (parts.hours == 24 && (parts.minutes != 0 || parts.nanos_of_minute != 0))
    {
        return Err(RhythmError::InvalidNightSchedule(format!(
            "day-end marker '{text}' must be exactly 24:00"
        )));
    }

    // Bounded above by 24h, so the cast cannot truncate
    Ok(TimeDelta::nanoseconds(parts.total_nanos() as i64))
}

struct ClockParts {
    hours: i128,
    hour_digits: usize,
    minutes: i128,
    nanos_of_minute: i128,
}

impl ClockParts {
    fn total_nanos(&self) -> i128 {
        self.hours * NANOS_PER_HOUR + self.minutes * NANOS_PER_MINUTE + self.nanos_of_minute
    }
}

/// Split `H[:MM[:SS[.fffffffff]]]` into its parts without range checks
fn split_clock(body: &str) -> Option<ClockParts> {
    let mut fields = body.split(':');
    let hours_text = fields.next()?;
    let minutes_text = fields.next();
    let seconds_text = fields.next();
    if fields.next().is_some() {
        return None;
    }

    let hours = parse_digits(hours_text)?;
    let minutes = match minutes_text {
        Some(m) if m.len() <= 2 => parse_digits(m)?,
        Some(_) => return None,
        None => 0,
    };
    let nanos_of_minute = match seconds_text {
        Some(s) => {
            let (whole, frac) = match s.split_once('.') {
                Some((whole, frac)) => (whole, frac),
                None => (s, ""),
            };
            if whole.len() > 2 {
                return None;
            }
            parse_digits(whole)? * NANOS_PER_SECOND + parse_fraction(frac, NANOS_PER_SECOND)?
        }
        None => 0,
    };

    Some(ClockParts {
        hours,
        hour_digits: hours_text.len(),
        minutes,
        nanos_of_minute,
    })
}

/// Sum of `<number><unit>` terms, e.g. `1h30m` or `5 minutes`
fn parse_unit_terms(body: &str) -> Option<i128> {
    let mut rest = body.trim_start();
    let mut total: i128 = 0;
    let mut terms = 0;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return None;
        }
        let (number, tail) = rest.split_at(number_len);

        let tail = tail.trim_start();
        let unit_len = tail
            .find(|c: char| !c.is_alphabetic())
            .unwrap_or(tail.len());
        if unit_len == 0 {
            return None;
        }
        let (unit, tail) = tail.split_at(unit_len);

        let scale = unit_nanos(unit)?;
        let (whole, frac) = match number.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (number, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        let whole = if whole.is_empty() { 0 } else { parse_digits(whole)? };
        let term = whole.checked_mul(scale)?.checked_add(parse_fraction(frac, scale)?)?;

        total = total.checked_add(term)?;
        terms += 1;
        rest = tail.trim_start();
    }

    (terms > 0).then_some(total)
}

fn unit_nanos(unit: &str) -> Option<i128> {
    let scale = match unit.to_ascii_lowercase().as_str() {
        "d" | "day" | "days" => 24 * NANOS_PER_HOUR,
        "h" | "hr" | "hrs" | "hour" | "hours" => NANOS_PER_HOUR,
        "m" | "min" | "mins" | "minute" | "minutes" => NANOS_PER_MINUTE,
        "s" | "sec" | "secs" | "second" | "seconds" => NANOS_PER_SECOND,
        "ms" | "milli" | "millis" | "millisecond" | "milliseconds" => 1_000_000,
        "us" | "µs" | "micro" | "micros" | "microsecond" | "microseconds" => 1_000,
        "ns" | "nano" | "nanos" | "nanosecond" | "nanoseconds" => 1,
        _ => return None,
    };
    Some(scale)
}

fn parse_digits(text: &str) -> Option<i128> {
    if text.is_empty() || text.len() > 30 || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Decimal fraction digits scaled by `scale`, truncated to whole nanoseconds
fn parse_fraction(digits: &str, scale: i128) -> Option<i128> {
    if digits.is_empty() {
        return Some(0);
    }
    if digits.len() > 18 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let value: i128 = digits.parse().ok()?;
    Some(value * scale / 10_i128.pow(digits.len() as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_string_matches_nanos() {
        assert_eq!(
            normalize("06:00").unwrap(),
            normalize(21_600_000_000_000_i64).unwrap()
        );
        assert_eq!(normalize("06:00").unwrap(), TimeDelta::hours(6));
    }

    #[test]
    fn test_representations_agree() {
        let from_text = normalize("01:30:15").unwrap();
        let from_span = normalize(TimeDelta::seconds(5415)).unwrap();
        let from_nanos = normalize(5_415_000_000_000_i64).unwrap();
        assert_eq!(from_text, from_span);
        assert_eq!(from_span, from_nanos);
    }

    #[test]
    fn test_unit_suffixed_strings() {
        assert_eq!(normalize("5m").unwrap(), TimeDelta::minutes(5));
        assert_eq!(normalize("20m").unwrap(), TimeDelta::minutes(20));
        assert_eq!(normalize("1s").unwrap(), TimeDelta::seconds(1));
        assert_eq!(normalize("16h").unwrap(), TimeDelta::hours(16));
        assert_eq!(normalize("1d").unwrap(), one_day());
        assert_eq!(normalize("1h30m").unwrap(), TimeDelta::minutes(90));
        assert_eq!(normalize("5 minutes").unwrap(), TimeDelta::minutes(5));
        assert_eq!(normalize("1.5h").unwrap(), TimeDelta::minutes(90));
        assert_eq!(normalize("250ms").unwrap(), TimeDelta::milliseconds(250));
        assert_eq!(normalize("0m").unwrap(), TimeDelta::zero());
    }

    #[test]
    fn test_clock_style_partial_forms() {
        assert_eq!(normalize("6").unwrap(), TimeDelta::hours(6));
        assert_eq!(normalize("6:30").unwrap(), TimeDelta::minutes(390));
        assert_eq!(
            normalize("00:00:01.5").unwrap(),
            TimeDelta::milliseconds(1500)
        );
        assert_eq!(normalize("-01:00").unwrap(), TimeDelta::hours(-1));
    }

    #[test]
    fn test_invalid_durations() {
        for bad in ["", "abc", "5x", "1:2:3:4", "00:75", "m5", "1..5h"] {
            assert!(
                matches!(normalize(bad), Err(RhythmError::InvalidTimespec(_))),
                "expected '{bad}' to be rejected"
            );
        }
    }

    #[test]
    fn test_clock_offsets_equivalent_forms() {
        let expected = TimeDelta::hours(6);
        for form in ["6", "06", "6:00", "06:00"] {
            assert_eq!(Timespec::from(form).to_clock_offset().unwrap(), expected);
        }
    }

    #[test]
    fn test_clock_offsets_day_boundaries() {
        for form in ["0", "00", "0:00", "00:00"] {
            assert_eq!(
                Timespec::from(form).to_clock_offset().unwrap(),
                TimeDelta::zero()
            );
        }
        for form in ["24", "24:00"] {
            assert_eq!(Timespec::from(form).to_clock_offset().unwrap(), one_day());
        }
    }

    #[test]
    fn test_clock_offset_rejects_misaligned_day_end() {
        assert!(matches!(
            Timespec::from("24:30").to_clock_offset(),
            Err(RhythmError::InvalidNightSchedule(_))
        ));
        assert!(matches!(
            Timespec::from("25:00").to_clock_offset(),
            Err(RhythmError::InvalidNightSchedule(_))
        ));
        assert!(matches!(
            Timespec::from("six").to_clock_offset(),
            Err(RhythmError::InvalidTimespec(_))
        ));
    }

    #[test]
    fn test_clock_offset_wraps_integers() {
        let offset = Timespec::from(NANOS_PER_DAY + 3_600_000_000_000)
            .to_clock_offset()
            .unwrap();
        assert_eq!(offset, TimeDelta::hours(1));
    }

    #[test]
    fn test_timespec_deserialization() {
        let specs: Vec<Timespec> = serde_json::from_str(r#"["18:00", 21600000000000]"#).unwrap();
        assert_eq!(specs[0], Timespec::Text("18:00".to_string()));
        assert_eq!(specs[1], Timespec::Nanos(21_600_000_000_000));
    }

    #[test]
    fn test_span_serializes_as_nanos() {
        let json = serde_json::to_string(&Timespec::from(TimeDelta::minutes(5))).unwrap();
        assert_eq!(json, "300000000000");

        let back: Timespec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Timespec::Nanos(300_000_000_000));
    }
}
