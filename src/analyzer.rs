//! Circadian cycle analyzer
//!
//! Owns the analysis window, the day mask, the cached bouts and the resolved
//! night schedule for one recording, and exposes every statistic over the
//! valid days of that recording.

use crate::bouts::{segment, select_bouts, Bout, BoutOptions, BoutParams};
use crate::config::{
    AmplitudeOptions, AnalyzerConfig, DailyBoutOptions, OnsetOptions, PeriodogramOptions,
    SignalOptions,
};
use crate::discretize::{discretize_bouts, discretize_events, validate_step, Discretized};
use crate::error::{Result, RhythmError};
use crate::frame::{select_events, AnalysisWindow, DayFrame};
use crate::mask::{daily_counts, masked_activity, DayMask};
use crate::night::NightSchedule;
use crate::series::ActivitySeries;
use crate::stats::{
    self, light::LightDay, steps_in, steps_per_day, ActogramRow, DailyBouts, DailyStat, DaySignal,
    Periodogram,
};
use crate::timespec::nanos;
use chrono::{NaiveDateTime, TimeDelta};
use log::{debug, warn};
use std::ops::Range;

/// Stateful analyzer over one activity recording.
///
/// Only [`CycleAnalyzer::filter_inactive`] and [`CycleAnalyzer::update_bouts`]
/// mutate state; every statistic is a pure query.
#[derive(Debug, Clone)]
pub struct CycleAnalyzer {
    window: AnalysisWindow,
    /// Instants retained inside the window, before masking
    events: Vec<NaiveDateTime>,
    /// Instants of valid days only
    activity: Vec<NaiveDateTime>,
    mask: DayMask,
    bouts: Vec<Bout>,
    bout_params: BoutParams,
    night: NightSchedule,
    step: TimeDelta,
    activity_threshold: usize,
    descr: String,
}

impl CycleAnalyzer {
    /// Build an analyzer from activity instants.
    ///
    /// Instants are sorted when they do not arrive in ascending order.
    pub fn new(mut timestamps: Vec<NaiveDateTime>, config: AnalyzerConfig) -> Result<Self> {
        if !timestamps.windows(2).all(|w| w[0] <= w[1]) {
            warn!(
                "activity instants are not in ascending order, sorting {} instants",
                timestamps.len()
            );
            timestamps.sort_unstable();
        }

        let frame = DayFrame::build(&timestamps, config.start, config.stop)?;

        let step = config.step.to_duration()?;
        validate_step(step)?;

        let bout_params = BoutParams {
            max_gap: config.max_gap.to_duration()?,
            min_duration: config.min_duration.to_duration()?,
            min_count: config.min_count,
        };
        bout_params.validate()?;

        let night = NightSchedule::resolve(&config.night, frame.window.total_days)?;

        let mut analyzer = Self {
            mask: DayMask::all(frame.window.total_days),
            window: frame.window,
            events: frame.activity,
            activity: Vec::new(),
            bouts: Vec::new(),
            bout_params,
            night,
            step,
            activity_threshold: config.activity_threshold,
            descr: config.descr,
        };
        analyzer.filter_inactive(config.activity_threshold)?;
        Ok(analyzer)
    }

    /// Build an analyzer from the instants of a series with positive values.
    pub fn from_series(series: &ActivitySeries, config: AnalyzerConfig) -> Result<Self> {
        Self::new(series.active_events(), config)
    }

    pub fn window(&self) -> &AnalysisWindow {
        &self.window
    }

    pub fn start(&self) -> NaiveDateTime {
        self.window.start
    }

    pub fn stop(&self) -> NaiveDateTime {
        self.window.stop
    }

    pub fn total_days(&self) -> usize {
        self.window.total_days
    }

    pub fn valid_days(&self) -> usize {
        self.mask.valid_days()
    }

    pub fn step(&self) -> TimeDelta {
        self.step
    }

    pub fn mask(&self) -> &DayMask {
        &self.mask
    }

    /// Contiguous runs of valid days
    pub fn day_indices(&self) -> Vec<Range<usize>> {
        self.mask.day_indices()
    }

    /// Activity of valid days
    pub fn activity(&self) -> &[NaiveDateTime] {
        &self.activity
    }

    /// Every instant retained inside the window, masked or not
    pub fn events(&self) -> &[NaiveDateTime] {
        &self.events
    }

    /// Cached bouts computed with the current default parameters
    pub fn bouts(&self) -> &[Bout] {
        &self.bouts
    }

    pub fn bout_params(&self) -> &BoutParams {
        &self.bout_params
    }

    pub fn night(&self) -> &NightSchedule {
        &self.night
    }

    pub fn activity_threshold(&self) -> usize {
        self.activity_threshold
    }

    pub fn descr(&self) -> &str {
        &self.descr
    }

    /// Valid-day activity in `[start, stop)`
    pub fn select_dates(
        &self,
        start: Option<NaiveDateTime>,
        stop: Option<NaiveDateTime>,
    ) -> &[NaiveDateTime] {
        select_events(&self.activity, start, stop)
    }

    /// Cached bouts overlapping `[start, stop)`, clipped to it
    pub fn select_bouts(
        &self,
        start: Option<NaiveDateTime>,
        stop: Option<NaiveDateTime>,
    ) -> Vec<Bout> {
        select_bouts(&self.bouts, start, stop)
    }

    /// Mark days with fewer than `threshold` instants invalid.
    ///
    /// Recomputes the masked activity and the cached bouts. Calling it again
    /// with the same threshold leaves the state unchanged.
    pub fn filter_inactive(&mut self, threshold: usize) -> Result<()> {
        let counts = daily_counts(&self.events, &self.window);
        let mask = DayMask::from_counts(&counts, threshold);
        let activity = masked_activity(&self.events, &self.window, &mask);
        let bouts = segment(&activity, &self.bout_params)?;

        debug!(
            "activity threshold {threshold}: {} of {} days valid, {} instants, {} bouts",
            mask.valid_days(),
            mask.total_days(),
            activity.len(),
            bouts.len()
        );
        if mask.valid_days() == 0 && mask.total_days() > 0 {
            warn!("every day of the window was masked out by threshold {threshold}");
        }

        self.mask = mask;
        self.activity = activity;
        self.bouts = bouts;
        self.activity_threshold = threshold;
        Ok(())
    }

    /// Segment valid-day activity into bouts without touching the cache.
    pub fn activity_bouts(&self, options: &BoutOptions) -> Result<Vec<Bout>> {
        let params = options.resolve(&self.bout_params)?;
        segment(&self.activity, &params)
    }

    /// Recompute the cached bouts and keep the resolved parameters as defaults.
    pub fn update_bouts(&mut self, options: &BoutOptions) -> Result<&[Bout]> {
        let params = options.resolve(&self.bout_params)?;
        self.bouts = segment(&self.activity, &params)?;
        self.bout_params = params;
        Ok(&self.bouts)
    }

    /// Binned signal of the valid days
    pub fn discretize(&self, options: &SignalOptions) -> Result<Discretized> {
        let step = self.resolve_step(options)?;
        let binned = if options.bouts {
            discretize_bouts(&self.bouts, self.window.start, self.window.stop, step)?
        } else {
            discretize_events(&self.activity, self.window.start, self.window.stop, step)?
        };

        let window = self.window;
        let mask = &self.mask;
        Ok(binned.retain_bins(|start| window.day_of(start).is_some_and(|d| mask.is_valid(d))))
    }

    /// Chi-square periodogram of the valid-day signal
    pub fn periodogram(&self, options: &PeriodogramOptions) -> Result<Periodogram> {
        let step = self.resolve_step(&options.signal)?;
        let min_period = options.min_period.to_duration()?;
        let max_period = options.max_period.to_duration()?;
        let min_bins = steps_in(min_period, step, "min_period")?;
        let max_bins = steps_in(max_period, step, "max_period")?;
        if min_bins == 0 || max_bins < min_bins {
            return Err(RhythmError::InvalidParameter(format!(
                "period range {min_period} .. {max_period} is empty"
            )));
        }

        let binned = self.discretize(&options.signal)?;
        if binned.is_empty() {
            return Ok(Periodogram::default());
        }

        let powers = stats::chi_square_periodogram(&binned.values, min_bins, max_bins);
        let periods = (min_bins..=max_bins)
            .map(|p| TimeDelta::nanoseconds(nanos(step).saturating_mul(p as i64)))
            .collect();
        Ok(Periodogram { periods, powers })
    }

    pub fn interdaily_stability(&self, options: &SignalOptions) -> Result<f64> {
        let (_, spd, values) = self.day_values(options)?;
        Ok(stats::interdaily_stability(&DaySignal::new(&values, spd)))
    }

    pub fn intradaily_variability(&self, options: &SignalOptions) -> Result<DailyStat> {
        let (_, spd, values) = self.day_values(options)?;
        Ok(stats::intradaily_variability(&DaySignal::new(&values, spd)))
    }

    pub fn relative_amplitude(&self, options: &AmplitudeOptions) -> Result<DailyStat> {
        let (step, spd, values) = self.day_values(&options.signal)?;
        let most = steps_in(options.most_active.to_duration()?, step, "most active window")?;
        let least = steps_in(options.least_active.to_duration()?, step, "least active window")?;
        stats::relative_amplitude(&DaySignal::new(&values, spd), most, least)
    }

    /// Share of activity outside the night, from event counts or bout durations
    pub fn light_activity(&self, bouts: bool) -> DailyStat {
        let valid: Vec<usize> = self.mask.valid_day_numbers().collect();

        if bouts {
            let per_day: Vec<Vec<Bout>> = valid
                .iter()
                .map(|&d| {
                    let (start, end) = self.window.day_bounds(d);
                    select_bouts(&self.bouts, Some(start), Some(end))
                })
                .collect();
            let days: Vec<LightDay<'_, Bout>> = valid
                .iter()
                .zip(&per_day)
                .map(|(&d, items)| LightDay {
                    items: items.as_slice(),
                    night: self.night.day(d),
                })
                .collect();
            stats::light_activity_bouts(&days)
        } else {
            let days: Vec<LightDay<'_, NaiveDateTime>> = valid
                .iter()
                .map(|&d| {
                    let (start, end) = self.window.day_bounds(d);
                    LightDay {
                        items: select_events(&self.activity, Some(start), Some(end)),
                        night: self.night.day(d),
                    }
                })
                .collect();
            stats::light_activity_events(&days)
        }
    }

    /// Bout count and mean bout duration per valid day
    pub fn daily_bouts(&self, options: &DailyBoutOptions) -> Result<DailyBouts> {
        let bouts = self.activity_bouts(&options.bouts)?;
        let days: Vec<(NaiveDateTime, NaiveDateTime)> = self
            .mask
            .valid_day_numbers()
            .map(|d| self.window.day_bounds(d))
            .collect();
        stats::daily_bouts(&bouts, &days, options.timescale.to_duration()?)
    }

    /// Every bout duration in units of the timescale
    pub fn bout_durations(&self, options: &DailyBoutOptions) -> Result<Vec<f64>> {
        let bouts = self.activity_bouts(&options.bouts)?;
        stats::bout_durations(&bouts, options.timescale.to_duration()?)
    }

    /// Onset instant of each valid day
    pub fn activity_onset(&self, options: &OnsetOptions) -> Result<Vec<NaiveDateTime>> {
        let (step, spd, values) = self.day_values(&options.signal)?;
        let before = steps_in(options.before.to_duration()?, step, "onset lead window")?;
        let after = steps_in(options.after.to_duration()?, step, "onset follow window")?;
        let onsets =
            stats::activity_onset(&DaySignal::new(&values, spd), options.percentile, before, after)?;

        Ok(self
            .mask
            .valid_day_numbers()
            .zip(onsets)
            .map(|(d, bin)| {
                self.window.day_start(d) + TimeDelta::nanoseconds(nanos(step) * bin as i64)
            })
            .collect())
    }

    /// Per-day binned rows with night intervals
    pub fn actogram(&self, options: &SignalOptions) -> Result<Vec<ActogramRow>> {
        let (_, spd, values) = self.day_values(options)?;
        let days: Vec<_> = self
            .mask
            .valid_day_numbers()
            .map(|d| (d, self.window.day_start(d), self.night.day(d)))
            .collect();
        Ok(stats::actogram(&DaySignal::new(&values, spd), &days))
    }

    fn resolve_step(&self, options: &SignalOptions) -> Result<TimeDelta> {
        let step = match &options.step {
            Some(step) => step.to_duration()?,
            None => self.step,
        };
        validate_step(step)?;
        Ok(step)
    }

    /// Step, bins per day and the valid-day values for day-shaped engines
    fn day_values(&self, options: &SignalOptions) -> Result<(TimeDelta, usize, Vec<f64>)> {
        let step = self.resolve_step(options)?;
        let spd = steps_per_day(step)?;
        let binned = self.discretize(options)?;
        Ok((step, spd, binned.values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::night::NightSpec;
    use chrono::{Datelike, NaiveDate, Timelike};
    use pretty_assertions::assert_eq;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    /// One instant every 10 minutes from 08:00 to 19:50 on `days` days
    fn regular_activity(days: u32) -> Vec<NaiveDateTime> {
        (1..=days)
            .flat_map(|d| (0..72).map(move |i| at(d, 8, 0) + TimeDelta::minutes(10 * i)))
            .collect()
    }

    fn hourly() -> SignalOptions {
        SignalOptions::new().with_step("1h")
    }

    #[test]
    fn test_window_is_whole_days_and_excludes_requested_stop() {
        let config = AnalyzerConfig::default().with_window(None, Some(at(3, 12, 0)));
        let analyzer = CycleAnalyzer::new(regular_activity(5), config).unwrap();

        assert_eq!(analyzer.start(), at(1, 0, 0));
        assert_eq!(analyzer.stop(), at(4, 0, 0));
        assert_eq!(analyzer.total_days(), 3);
        assert_eq!(nanos(analyzer.stop() - analyzer.start()) % nanos(TimeDelta::days(1)), 0);
        assert!(analyzer.events().iter().all(|t| *t < at(3, 12, 0)));
        assert_eq!(analyzer.events().last(), Some(&at(3, 11, 50)));
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let mut activity = regular_activity(2);
        activity.reverse();
        let analyzer = CycleAnalyzer::new(activity, AnalyzerConfig::default()).unwrap();
        assert!(analyzer.activity().windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(analyzer.total_days(), 2);
    }

    #[test]
    fn test_bouts_follow_max_gap() {
        let activity = vec![at(1, 1, 30), at(1, 1, 45), at(1, 3, 0)];
        let analyzer = CycleAnalyzer::new(activity, AnalyzerConfig::default()).unwrap();

        let split = analyzer
            .activity_bouts(&BoutOptions::new().with_max_gap("20m").with_min_count(1))
            .unwrap();
        assert_eq!(
            split,
            vec![Bout::new(at(1, 1, 30), at(1, 1, 45)), Bout::new(at(1, 3, 0), at(1, 3, 0))]
        );

        let merged = analyzer
            .activity_bouts(&BoutOptions::new().with_max_gap("75m").with_min_count(1))
            .unwrap();
        assert_eq!(merged, vec![Bout::new(at(1, 1, 30), at(1, 3, 0))]);

        // Transient options leave the cache alone
        assert!(analyzer.bouts().is_empty());
    }

    #[test]
    fn test_update_bouts_sets_new_defaults() {
        let activity = vec![at(1, 1, 30), at(1, 1, 45), at(1, 3, 0)];
        let mut analyzer = CycleAnalyzer::new(activity, AnalyzerConfig::default()).unwrap();

        let options = BoutOptions::new().with_max_gap("20m").with_min_count(1);
        let first = analyzer.update_bouts(&options).unwrap().to_vec();
        let second = analyzer.update_bouts(&options).unwrap().to_vec();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(analyzer.bout_params().max_gap, TimeDelta::minutes(20));
        assert_eq!(analyzer.bout_params().min_count, 1);
        assert_eq!(analyzer.activity_bouts(&BoutOptions::new()).unwrap(), first);
    }

    #[test]
    fn test_filter_inactive_is_idempotent() {
        let mut activity = regular_activity(3);
        activity.retain(|t| t.date().day0() != 1 || t.time().hour() < 9);
        let mut analyzer = CycleAnalyzer::new(activity, AnalyzerConfig::default()).unwrap();

        analyzer.filter_inactive(10).unwrap();
        let mask = analyzer.mask().clone();
        let masked = analyzer.activity().to_vec();
        let bouts = analyzer.bouts().to_vec();

        analyzer.filter_inactive(10).unwrap();
        assert_eq!(analyzer.mask(), &mask);
        assert_eq!(analyzer.activity(), &masked[..]);
        assert_eq!(analyzer.bouts(), &bouts[..]);

        assert_eq!(mask.as_slice(), &[true, false, true]);
        assert_eq!(analyzer.day_indices(), vec![0..1, 2..3]);
        assert!(analyzer.activity().iter().all(|t| t.date().day0() != 1));

        analyzer.filter_inactive(1).unwrap();
        assert_eq!(analyzer.valid_days(), 3);
    }

    #[test]
    fn test_discretize_keeps_valid_days_only() {
        let mut activity = regular_activity(3);
        activity.retain(|t| t.date().day0() != 1);
        let analyzer = CycleAnalyzer::new(activity, AnalyzerConfig::default()).unwrap();

        let binned = analyzer.discretize(&hourly()).unwrap();
        assert_eq!(binned.len(), 48);
        assert_eq!(binned.starts[24], at(3, 0, 0));
        assert_eq!(binned.values[8], 6.0);
        assert_eq!(binned.values.iter().sum::<f64>(), 144.0);
    }

    #[test]
    fn test_select_dates_and_bouts() {
        let analyzer = CycleAnalyzer::new(regular_activity(2), AnalyzerConfig::default()).unwrap();

        let selected = analyzer.select_dates(Some(at(1, 8, 0)), Some(at(1, 9, 0)));
        assert_eq!(selected.len(), 6);
        assert_eq!(selected[0], at(1, 8, 0));

        assert!(analyzer.bouts().is_empty());
        let bouts = analyzer.select_bouts(Some(at(1, 0, 0)), Some(at(2, 0, 0)));
        assert!(bouts.is_empty());
    }

    #[test]
    fn test_constant_signal() {
        let activity: Vec<NaiveDateTime> = (1..=3)
            .flat_map(|d| (0..24).map(move |h| at(d, h, 30)))
            .collect();
        let analyzer = CycleAnalyzer::new(activity, AnalyzerConfig::default()).unwrap();

        assert_eq!(analyzer.interdaily_stability(&hourly()).unwrap(), 1.0);
        let iv = analyzer.intradaily_variability(&hourly()).unwrap();
        assert_eq!(iv.daily, vec![0.0, 0.0, 0.0]);
        assert_eq!(iv.total, 0.0);
    }

    #[test]
    fn test_regular_rhythm_statistics() {
        let analyzer = CycleAnalyzer::new(regular_activity(5), AnalyzerConfig::default()).unwrap();

        let periodogram = analyzer
            .periodogram(&PeriodogramOptions {
                signal: hourly(),
                ..PeriodogramOptions::default()
            })
            .unwrap();
        assert_eq!(periodogram.periods.len(), 17);
        assert_eq!(periodogram.best_period(), Some(TimeDelta::hours(24)));

        assert!((analyzer.interdaily_stability(&hourly()).unwrap() - 1.0).abs() < 1e-9);

        let ra = analyzer
            .relative_amplitude(&AmplitudeOptions {
                signal: hourly(),
                ..AmplitudeOptions::default()
            })
            .unwrap();
        assert_eq!(ra.daily.len(), 5);
        assert!((ra.total - 1.0).abs() < 1e-12);

        let onsets = analyzer
            .activity_onset(&OnsetOptions {
                signal: hourly(),
                ..OnsetOptions::default()
            })
            .unwrap();
        assert_eq!(onsets, (1..=5).map(|d| at(d, 8, 0)).collect::<Vec<_>>());

        // 18:00 to 19:50 falls in the default night
        let light = analyzer.light_activity(false);
        assert_eq!(light.daily.len(), 5);
        assert!((light.total - 60.0 / 72.0).abs() < 1e-12);

        let rows = analyzer.actogram(&hourly()).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].values.len(), 24);
        assert_eq!(rows[0].night_hours, vec![(0.0, 6.0), (18.0, 24.0)]);
    }

    #[test]
    fn test_bout_statistics() {
        let config = AnalyzerConfig::default().with_bouts("10m", "0m", 2);
        let analyzer = CycleAnalyzer::new(regular_activity(2), config).unwrap();

        // One bout per day from 08:00 to 19:50
        assert_eq!(analyzer.bouts().len(), 2);

        let daily = analyzer
            .daily_bouts(&DailyBoutOptions {
                timescale: "1h".into(),
                ..DailyBoutOptions::default()
            })
            .unwrap();
        assert_eq!(daily.counts, vec![1, 1]);
        assert!((daily.mean_durations[0] - 11.0 - 50.0 / 60.0).abs() < 1e-9);

        let durations = analyzer.bout_durations(&DailyBoutOptions::default()).unwrap();
        assert_eq!(durations, vec![42600.0, 42600.0]);

        // 08:00-18:00 light, 18:00-19:50 night
        let light = analyzer.light_activity(true);
        assert!((light.daily[0] - 600.0 / 710.0).abs() < 1e-9);

        let coverage = analyzer
            .discretize(&SignalOptions::new().with_step("1h").with_bouts(true))
            .unwrap();
        assert_eq!(coverage.values[8], 1.0);
        assert!((coverage.values[19] - 50.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_window_gives_empty_results() {
        let config = AnalyzerConfig::default().with_window(Some(at(1, 0, 0)), Some(at(3, 0, 0)));
        let analyzer = CycleAnalyzer::new(Vec::new(), config).unwrap();
        assert_eq!(analyzer.total_days(), 2);
        assert_eq!(analyzer.valid_days(), 0);

        assert!(analyzer.discretize(&hourly()).unwrap().is_empty());
        assert!(analyzer
            .periodogram(&PeriodogramOptions {
                signal: hourly(),
                ..PeriodogramOptions::default()
            })
            .unwrap()
            .is_empty());
        assert_eq!(analyzer.interdaily_stability(&hourly()).unwrap(), 0.0);
        assert!(analyzer.intradaily_variability(&hourly()).unwrap().daily.is_empty());
        assert!(analyzer.light_activity(false).daily.is_empty());
        assert!(analyzer
            .activity_onset(&OnsetOptions {
                signal: hourly(),
                ..OnsetOptions::default()
            })
            .unwrap()
            .is_empty());
        assert!(analyzer
            .daily_bouts(&DailyBoutOptions::default())
            .unwrap()
            .counts
            .is_empty());
    }

    #[test]
    fn test_step_must_divide_day_for_day_statistics() {
        let analyzer = CycleAnalyzer::new(regular_activity(2), AnalyzerConfig::default()).unwrap();
        let odd = SignalOptions::new().with_step("7m");

        assert!(analyzer.discretize(&odd).is_ok());
        assert!(matches!(
            analyzer.interdaily_stability(&odd),
            Err(RhythmError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_invalid_construction() {
        let bad_night = AnalyzerConfig::default().with_night(NightSpec::shared(["18:00"]));
        assert!(matches!(
            CycleAnalyzer::new(regular_activity(1), bad_night),
            Err(RhythmError::InvalidNightSchedule(_))
        ));

        let bad_step = AnalyzerConfig::default().with_step("soon");
        assert!(matches!(
            CycleAnalyzer::new(regular_activity(1), bad_step),
            Err(RhythmError::InvalidTimespec(_))
        ));

        assert!(matches!(
            CycleAnalyzer::new(Vec::new(), AnalyzerConfig::default()),
            Err(RhythmError::InvalidWindow(_))
        ));
    }

    #[test]
    fn test_per_day_night_schedule() {
        let config = AnalyzerConfig::default()
            .with_night(NightSpec::per_day([vec!["20:00"], vec!["06:00", "20:00"], vec!["06:00"]]));
        let analyzer = CycleAnalyzer::new(regular_activity(3), config).unwrap();

        assert_eq!(analyzer.night().total_days(), 3);
        assert_eq!(analyzer.night().night_duration(1), TimeDelta::hours(10));
    }
}
