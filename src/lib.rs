//! Synheart Rhythm - Circadian activity-rhythm analysis engine
//!
//! Rhythm turns raw activity instants (wheel revolutions, beam breaks, step
//! events) into day-aligned, gap-filtered signals and derives the classic
//! chronobiology statistics: chi-square periodogram, interdaily stability,
//! intradaily variability, relative amplitude, light-phase activity, daily
//! bout statistics and activity onset.
//!
//! ## Pipeline
//!
//! timespec normalization → night schedule → day frame → day mask → bouts →
//! discretization → statistic engines → report encoding
//!
//! ```ignore
//! let analyzer = CycleAnalyzer::new(instants, AnalyzerConfig::default())?;
//! let is = analyzer.interdaily_stability(&SignalOptions::new().with_step("1h"))?;
//! ```

pub mod analyzer;
pub mod bouts;
pub mod config;
pub mod discretize;
pub mod error;
pub mod frame;
pub mod mask;
pub mod night;
pub mod report;
pub mod series;
pub mod stats;
pub mod timespec;

pub use analyzer::CycleAnalyzer;
pub use bouts::{Bout, BoutOptions, BoutParams};
pub use config::{
    AmplitudeOptions, AnalyzerConfig, DailyBoutOptions, OnsetOptions, PeriodogramOptions,
    SignalOptions,
};
pub use discretize::Discretized;
pub use error::{Result, RhythmError};
pub use frame::AnalysisWindow;
pub use mask::DayMask;
pub use night::{NightInterval, NightSchedule, NightSpec};
pub use report::{ReportEncoder, RhythmReport};
pub use series::{ActivityRecord, ActivitySeries};
pub use stats::{ActogramRow, DailyBouts, DailyStat, Periodogram};
pub use timespec::{normalize, Timespec};

/// Rhythm version embedded in every report
pub const RHYTHM_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "synheart-rhythm";
