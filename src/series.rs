//! Activity series input
//!
//! Holds the three aligned arrays a recording database produces (instants,
//! activity values, night markers) and reads them from JSON records.
//!
//! A record looks like:
//! ```json
//! {"time": "2020-01-01T01:05:00", "value": 3.0, "night": true}
//! ```
//! `value` defaults to `1.0` and `night` to `false`.

use crate::error::{Result, RhythmError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One timestamped activity sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub time: NaiveDateTime,
    #[serde(default = "default_value")]
    pub value: f64,
    #[serde(default)]
    pub night: bool,
}

fn default_value() -> f64 {
    1.0
}

/// Problem found in a record batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordIssue {
    pub index: usize,
    pub message: String,
}

/// Aligned activity arrays in ascending time order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivitySeries {
    time: Vec<NaiveDateTime>,
    values: Vec<f64>,
    night: Vec<bool>,
}

impl ActivitySeries {
    /// Wrap aligned arrays; `time` must be ascending.
    pub fn new(time: Vec<NaiveDateTime>, values: Vec<f64>, night: Vec<bool>) -> Result<Self> {
        if time.len() != values.len() || time.len() != night.len() {
            return Err(RhythmError::InvalidParameter(format!(
                "aligned arrays differ in length: {} instants, {} values, {} night markers",
                time.len(),
                values.len(),
                night.len()
            )));
        }
        if let Some(i) = time.windows(2).position(|w| w[1] < w[0]) {
            return Err(RhythmError::InvalidParameter(format!(
                "instants are not ascending at index {}",
                i + 1
            )));
        }
        Ok(Self {
            time,
            values,
            night,
        })
    }

    /// Build from records, sorting them by time.
    pub fn from_records(mut records: Vec<ActivityRecord>) -> Self {
        records.sort_by(|a, b| a.time.cmp(&b.time));
        let mut series = Self::default();
        for record in records {
            series.time.push(record.time);
            series.values.push(record.value);
            series.night.push(record.night);
        }
        series
    }

    /// Parse a JSON array of records
    pub fn parse_array(json: &str) -> Result<Vec<ActivityRecord>> {
        let records: Vec<ActivityRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse newline-delimited JSON records, skipping blank lines
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<ActivityRecord>> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<ActivityRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(RhythmError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Report out-of-order instants and non-finite or negative values.
    pub fn validate_records(records: &[ActivityRecord]) -> Vec<RecordIssue> {
        let mut issues = Vec::new();
        for (index, record) in records.iter().enumerate() {
            if index > 0 && record.time < records[index - 1].time {
                issues.push(RecordIssue {
                    index,
                    message: format!(
                        "instant {} precedes the previous record {}",
                        record.time,
                        records[index - 1].time
                    ),
                });
            }
            if !record.value.is_finite() || record.value < 0.0 {
                issues.push(RecordIssue {
                    index,
                    message: format!("activity value {} is not a non-negative number", record.value),
                });
            }
        }
        issues
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[NaiveDateTime] {
        &self.time
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn night(&self) -> &[bool] {
        &self.night
    }

    /// Samples in `[start, stop)`
    pub fn select(&self, start: Option<NaiveDateTime>, stop: Option<NaiveDateTime>) -> Self {
        let lo = start.map_or(0, |s| self.time.partition_point(|t| *t < s));
        let hi = stop.map_or(self.len(), |s| self.time.partition_point(|t| *t < s));
        let hi = hi.max(lo);
        Self {
            time: self.time[lo..hi].to_vec(),
            values: self.values[lo..hi].to_vec(),
            night: self.night[lo..hi].to_vec(),
        }
    }

    /// Every instant of the series
    pub fn events(&self) -> Vec<NaiveDateTime> {
        self.time.clone()
    }

    /// Instants whose activity value is positive
    pub fn active_events(&self) -> Vec<NaiveDateTime> {
        self.time
            .iter()
            .zip(&self.values)
            .filter(|(_, v)| **v > 0.0)
            .map(|(t, _)| *t)
            .collect()
    }
}
