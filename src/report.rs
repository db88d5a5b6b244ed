//! Rhythm report encoder
//!
//! Bundles the analysis window, day mask and every statistic of a
//! [`CycleAnalyzer`] into one serializable payload.

use crate::analyzer::CycleAnalyzer;
use crate::config::{
    AmplitudeOptions, DailyBoutOptions, OnsetOptions, PeriodogramOptions, SignalOptions,
};
use crate::error::{Result, RhythmError};
use crate::stats::{DailyBouts, DailyStat};
use crate::timespec::nanos;
use crate::{PRODUCER_NAME, RHYTHM_VERSION};
use chrono::{NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RhythmReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub description: String,
    pub window: ReportWindow,
    pub signal: ReportSignal,
    pub periodogram: ReportPeriodogram,
    pub interdaily_stability: f64,
    pub intradaily_variability: DailyStat,
    pub relative_amplitude: DailyStat,
    pub light_phase_activity: DailyStat,
    pub daily_bouts: DailyBouts,
    pub activity_onset: Vec<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportWindow {
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
    pub total_days: usize,
    pub valid_days: usize,
    /// Validity flag of every day of the window
    pub day_mask: Vec<bool>,
    pub activity_threshold: usize,
    /// Instants counted on valid days
    pub activity_events: usize,
    /// Cached bouts on valid days
    pub bouts: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSignal {
    /// `"events"` or `"bouts"`
    pub source: String,
    pub step_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPeriodogram {
    pub periods_hours: Vec<f64>,
    pub powers: Vec<f64>,
    pub best_period_hours: Option<f64>,
}

/// Report encoder
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Compute every statistic on `signal` and collect them into a report
    pub fn encode(&self, analyzer: &CycleAnalyzer, signal: &SignalOptions) -> Result<RhythmReport> {
        let step = match &signal.step {
            Some(step) => step.to_duration()?,
            None => analyzer.step(),
        };

        let periodogram = analyzer.periodogram(&PeriodogramOptions {
            signal: signal.clone(),
            ..PeriodogramOptions::default()
        })?;
        let relative_amplitude = analyzer.relative_amplitude(&AmplitudeOptions {
            signal: signal.clone(),
            ..AmplitudeOptions::default()
        })?;
        let activity_onset = analyzer.activity_onset(&OnsetOptions {
            signal: signal.clone(),
            ..OnsetOptions::default()
        })?;

        let window = analyzer.window();
        Ok(RhythmReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: RHYTHM_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            description: analyzer.descr().to_string(),
            window: ReportWindow {
                start: window.start,
                stop: window.stop,
                total_days: window.total_days,
                valid_days: analyzer.valid_days(),
                day_mask: analyzer.mask().as_slice().to_vec(),
                activity_threshold: analyzer.activity_threshold(),
                activity_events: analyzer.activity().len(),
                bouts: analyzer.bouts().len(),
            },
            signal: ReportSignal {
                source: if signal.bouts { "bouts" } else { "events" }.to_string(),
                step_seconds: seconds(step),
            },
            periodogram: ReportPeriodogram {
                periods_hours: periodogram.periods.iter().map(|p| hours(*p)).collect(),
                best_period_hours: periodogram.best_period().map(hours),
                powers: periodogram.powers,
            },
            interdaily_stability: analyzer.interdaily_stability(signal)?,
            intradaily_variability: analyzer.intradaily_variability(signal)?,
            relative_amplitude,
            light_phase_activity: analyzer.light_activity(signal.bouts),
            daily_bouts: analyzer.daily_bouts(&DailyBoutOptions::default())?,
            activity_onset,
        })
    }

    /// Encode to JSON string
    pub fn encode_to_json(&self, analyzer: &CycleAnalyzer, signal: &SignalOptions) -> Result<String> {
        let report = self.encode(analyzer, signal)?;
        serde_json::to_string_pretty(&report).map_err(RhythmError::JsonError)
    }
}

fn seconds(d: TimeDelta) -> f64 {
    nanos(d) as f64 / 1e9
}

fn hours(d: TimeDelta) -> f64 {
    nanos(d) as f64 / 3.6e12
}
