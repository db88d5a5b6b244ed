//! Analyzer configuration and per-call statistic options
//!
//! All durations are [`Timespec`] values so configuration files may use
//! `"5m"`, `"06:00"` or raw nanosecond integers interchangeably.

use crate::bouts::BoutOptions;
use crate::night::NightSpec;
use crate::timespec::Timespec;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Construction parameters of a [`crate::CycleAnalyzer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Night boundaries, shared by every day or listed per day
    pub night: NightSpec,
    /// Default discretization step
    pub step: Timespec,
    /// Explicit window start; midnight of the first instant when unset
    pub start: Option<NaiveDateTime>,
    /// Explicit window stop; end of the last active day when unset
    pub stop: Option<NaiveDateTime>,
    /// Largest gap inside one bout
    pub max_gap: Timespec,
    /// Shortest bout kept
    pub min_duration: Timespec,
    /// Fewest instants per bout
    pub min_count: usize,
    /// Fewest instants a day needs to count as valid
    pub activity_threshold: usize,
    /// Free-text description carried into reports
    pub descr: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            night: NightSpec::default(),
            step: Timespec::from("5m"),
            start: None,
            stop: None,
            max_gap: Timespec::from("1m"),
            min_duration: Timespec::from("0m"),
            min_count: 2,
            activity_threshold: 1,
            descr: String::new(),
        }
    }
}

impl AnalyzerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_night(mut self, night: NightSpec) -> Self {
        self.night = night;
        self
    }

    pub fn with_step(mut self, step: impl Into<Timespec>) -> Self {
        self.step = step.into();
        self
    }

    pub fn with_window(mut self, start: Option<NaiveDateTime>, stop: Option<NaiveDateTime>) -> Self {
        self.start = start;
        self.stop = stop;
        self
    }

    pub fn with_bouts(
        mut self,
        max_gap: impl Into<Timespec>,
        min_duration: impl Into<Timespec>,
        min_count: usize,
    ) -> Self {
        self.max_gap = max_gap.into();
        self.min_duration = min_duration.into();
        self.min_count = min_count;
        self
    }

    pub fn with_activity_threshold(mut self, threshold: usize) -> Self {
        self.activity_threshold = threshold;
        self
    }

    pub fn with_descr(mut self, descr: impl Into<String>) -> Self {
        self.descr = descr.into();
        self
    }
}

/// Which signal a statistic runs on and at what resolution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalOptions {
    /// Step override; the analyzer default when unset
    pub step: Option<Timespec>,
    /// Use bout coverage instead of event counts
    pub bouts: bool,
}

impl SignalOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(mut self, step: impl Into<Timespec>) -> Self {
        self.step = Some(step.into());
        self
    }

    pub fn with_bouts(mut self, bouts: bool) -> Self {
        self.bouts = bouts;
        self
    }
}

/// Periodogram period range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodogramOptions {
    pub signal: SignalOptions,
    pub min_period: Timespec,
    pub max_period: Timespec,
}

impl Default for PeriodogramOptions {
    fn default() -> Self {
        Self {
            signal: SignalOptions::default(),
            min_period: Timespec::from("16h"),
            max_period: Timespec::from("32h"),
        }
    }
}

/// Relative amplitude window lengths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmplitudeOptions {
    pub signal: SignalOptions,
    pub most_active: Timespec,
    pub least_active: Timespec,
}

impl Default for AmplitudeOptions {
    fn default() -> Self {
        Self {
            signal: SignalOptions::default(),
            most_active: Timespec::from("10h"),
            least_active: Timespec::from("5h"),
        }
    }
}

/// Activity onset template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnsetOptions {
    pub signal: SignalOptions,
    /// Percentile of a day's non-zero bins that counts as active
    pub percentile: f64,
    /// Inactive span before the onset
    pub before: Timespec,
    /// Active span after the onset
    pub after: Timespec,
}

impl Default for OnsetOptions {
    fn default() -> Self {
        Self {
            signal: SignalOptions::default(),
            percentile: 20.0,
            before: Timespec::from("6h"),
            after: Timespec::from("6h"),
        }
    }
}

/// Daily bout statistics parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyBoutOptions {
    pub bouts: BoutOptions,
    /// Unit of the reported mean durations
    pub timescale: Timespec,
}

impl Default for DailyBoutOptions {
    fn default() -> Self {
        Self {
            bouts: BoutOptions::default(),
            timescale: Timespec::from("1s"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.step, Timespec::from("5m"));
        assert_eq!(config.min_count, 2);
        assert_eq!(config.activity_threshold, 1);
        assert_eq!(config.night, NightSpec::default());
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: AnalyzerConfig = serde_json::from_str(
            r#"{
                "night": [["22"], ["04", "20"], ["04", "18", "24"]],
                "step": "1h",
                "start": "2020-01-01T00:00:00",
                "activity_threshold": 10
            }"#,
        )
        .unwrap();

        assert_eq!(config.step, Timespec::from("1h"));
        assert_eq!(config.activity_threshold, 10);
        assert!(matches!(config.night, NightSpec::PerDay(ref days) if days.len() == 3));
        assert!(config.start.is_some());
        assert_eq!(config.max_gap, Timespec::from("1m"));
    }

    #[test]
    fn test_option_defaults() {
        assert_eq!(PeriodogramOptions::default().min_period, Timespec::from("16h"));
        assert_eq!(AmplitudeOptions::default().least_active, Timespec::from("5h"));
        assert_eq!(OnsetOptions::default().percentile, 20.0);
        assert!(!SignalOptions::default().bouts);
        assert_eq!(DailyBoutOptions::default().timescale, Timespec::from("1s"));
    }

    #[test]
    fn test_config_with_native_step_round_trips() {
        let config = AnalyzerConfig::default().with_step(chrono::TimeDelta::minutes(5));
        let json = serde_json::to_string(&config).unwrap();

        let back: AnalyzerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.step, Timespec::Nanos(300_000_000_000));
        assert_eq!(back.step.to_duration().unwrap(), chrono::TimeDelta::minutes(5));
    }
}
