//! The acquisition session.
//!
//! A [`Session`] owns everything a run produces: the fixed instrument configuration,
//! the sample log, the alert log and the control output. It is mutated only by
//! [`Session::acquire_sample`] (or [`Session::record_reading`] for readings that come
//! from somewhere other than the simulated sensor), one sample per call.
//!
//! ## Invariants
//!
//! - `samples().len() == sample_count()` after every call.
//! - `session_start()` is `None` until the first sample and never changes afterwards.
//! - An [`Alert`] is appended only for a valid reading above the threshold while the
//!   control output was inactive.
//! - Elapsed time is non-decreasing across samples, even if the wall clock steps back.
//!
//! The session has no timer of its own; [`crate::acquisition`] decides when to call it.

use crate::config::AcquisitionConfig;
use crate::control::{ControlState, Edge, ThresholdController};
use crate::error::AppResult;
use crate::integrity::integrity_tag;
use crate::synthesis::TemperatureSynthesizer;
use crate::validation::is_valid_reading;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Text format of sample and metadata timestamps (local time, microseconds).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Formats `timestamp` with [`TIMESTAMP_FORMAT`].
pub fn format_timestamp(timestamp: &DateTime<Local>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Source of sample timestamps.
pub trait Clock: Send {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Local>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Local>>>,
}

impl ManualClock {
    /// Clock frozen at `start`.
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
    }

    /// Sets the clock to `at` (may move backwards).
    pub fn set(&self, at: DateTime<Local>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// One logged reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    /// Position in the session, starting at 0
    pub index: u64,
    /// Wall-clock time of the reading
    pub timestamp: DateTime<Local>,
    /// `timestamp` rendered with [`TIMESTAMP_FORMAT`]; the integrity tag covers this text
    pub timestamp_text: String,
    /// Seconds since the first sample
    pub elapsed_s: f64,
    /// Reading in °C
    pub temperature: f64,
    /// Result of [`is_valid_reading`]
    pub valid: bool,
    /// 8-digit hex integrity tag
    pub tag: String,
}

/// A threshold crossing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    /// When the crossing was recorded
    pub timestamp: DateTime<Local>,
    /// Index of the sample that crossed
    pub sample_index: u64,
    /// Temperature of that sample
    pub temperature: f64,
    /// Human readable notification
    pub message: String,
}

/// What a single acquisition step hands back for immediate display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquiredSample {
    /// Index of the new sample
    pub index: u64,
    /// Reading in °C
    pub temperature: f64,
    /// Seconds since the first sample
    pub elapsed_s: f64,
    /// Whether the reading passed validation
    pub valid: bool,
    /// Control transition caused by the reading
    pub edge: Edge,
}

/// Descriptive statistics over every logged temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Smallest reading
    pub min: f64,
    /// Largest reading
    pub max: f64,
}

/// Alert notification text.
pub fn alert_message(temperature: f64, threshold: f64) -> String {
    format!("ALERT: Temperature {temperature:.2}°C exceeded threshold {threshold}°C")
}

/// Single acquisition run.
pub struct Session {
    config: AcquisitionConfig,
    clock: Box<dyn Clock>,
    synthesizer: TemperatureSynthesizer,
    controller: ThresholdController,
    session_start: Option<DateTime<Local>>,
    sample_count: u64,
    samples: Vec<Sample>,
    alerts: Vec<Alert>,
}

impl Session {
    /// Session on the system clock with a sensor seeded from `config.seed`.
    pub fn new(config: AcquisitionConfig) -> AppResult<Self> {
        Self::with_clock(config, SystemClock)
    }

    /// Session on a caller-supplied clock.
    pub fn with_clock(config: AcquisitionConfig, clock: impl Clock + 'static) -> AppResult<Self> {
        let synthesizer = TemperatureSynthesizer::new(config.base_temperature_c, config.seed);
        Self::with_parts(config, Box::new(clock), synthesizer)
    }

    /// Session from explicit parts.
    pub fn with_parts(
        config: AcquisitionConfig,
        clock: Box<dyn Clock>,
        synthesizer: TemperatureSynthesizer,
    ) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            controller: ThresholdController::new(config.threshold_c),
            config,
            clock,
            synthesizer,
            session_start: None,
            sample_count: 0,
            samples: Vec::new(),
            alerts: Vec::new(),
        })
    }

    /// Takes one reading from the simulated sensor and logs it.
    pub fn acquire_sample(&mut self) -> AcquiredSample {
        let (timestamp, elapsed_s) = self.begin_sample();
        let temperature = self.synthesizer.sample(elapsed_s);
        self.commit_sample(timestamp, elapsed_s, temperature)
    }

    /// Logs an externally supplied reading, timestamped by the session clock.
    ///
    /// Goes through the same validation, tagging and control logic as
    /// [`Session::acquire_sample`].
    pub fn record_reading(&mut self, temperature: f64) -> AcquiredSample {
        let (timestamp, elapsed_s) = self.begin_sample();
        self.commit_sample(timestamp, elapsed_s, temperature)
    }

    fn begin_sample(&mut self) -> (DateTime<Local>, f64) {
        let timestamp = self.clock.now();
        let start = *self.session_start.get_or_insert(timestamp);
        let last = self.samples.last().map_or(0.0, |s| s.elapsed_s);
        let elapsed_s = (timestamp - start)
            .to_std()
            .map_or(0.0, |d| d.as_secs_f64())
            .max(last);
        (timestamp, elapsed_s)
    }

    fn commit_sample(
        &mut self,
        timestamp: DateTime<Local>,
        elapsed_s: f64,
        temperature: f64,
    ) -> AcquiredSample {
        let index = self.sample_count;
        let valid = is_valid_reading(temperature);
        let timestamp_text = format_timestamp(&timestamp);
        let tag = integrity_tag(temperature, &timestamp_text);

        debug!(
            index,
            temperature,
            elapsed_s,
            valid,
            tag = %tag,
            "Sample acquired"
        );

        self.samples.push(Sample {
            index,
            timestamp,
            timestamp_text,
            elapsed_s,
            temperature,
            valid,
            tag,
        });

        let edge = self.controller.update(temperature, valid);
        if edge == Edge::Rising {
            let message = alert_message(temperature, self.config.threshold_c);
            warn!(sample = index, temperature, threshold = self.config.threshold_c, "{}", message);
            self.alerts.push(Alert {
                timestamp: self.clock.now(),
                sample_index: index,
                temperature,
                message,
            });
        } else if !valid {
            debug!(index, temperature, "Invalid reading, control output forced inactive");
        }

        self.sample_count += 1;

        AcquiredSample {
            index,
            temperature,
            elapsed_s,
            valid,
            edge,
        }
    }

    /// Instrument configuration.
    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    /// Time of the first sample.
    pub fn session_start(&self) -> Option<DateTime<Local>> {
        self.session_start
    }

    /// Number of samples taken.
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Current control output state.
    pub fn control_state(&self) -> ControlState {
        self.controller.state()
    }

    /// `true` while the control output is driven.
    pub fn control_output(&self) -> bool {
        self.controller.state().is_active()
    }

    /// Sample log in acquisition order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Alert log in acquisition order.
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// Number of samples that passed validation.
    pub fn valid_count(&self) -> usize {
        self.samples.iter().filter(|s| s.valid).count()
    }

    /// Valid samples as a percentage of all samples; 0 when nothing was sampled.
    pub fn data_quality_percent(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.valid_count() as f64 / self.samples.len() as f64 * 100.0
        }
    }

    /// Statistics over all logged temperatures, `None` for an empty session.
    pub fn statistics(&self) -> Option<Statistics> {
        if self.samples.is_empty() {
            return None;
        }
        let n = self.samples.len() as f64;
        let temps = self.samples.iter().map(|s| s.temperature);
        let mean = temps.clone().sum::<f64>() / n;
        let variance = temps.clone().map(|t| (t - mean).powi(2)).sum::<f64>() / n;
        let min = temps.clone().fold(f64::INFINITY, f64::min);
        let max = temps.fold(f64::NEG_INFINITY, f64::max);
        Some(Statistics {
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
        })
    }

    /// Read-only snapshot for presentation.
    pub fn view(&self) -> SessionView<'_> {
        SessionView {
            samples: &self.samples,
            control_state: self.controller.state(),
            alert_count: self.alerts.len(),
            threshold_c: self.config.threshold_c,
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("session_start", &self.session_start)
            .field("sample_count", &self.sample_count)
            .field("control_state", &self.controller.state())
            .field("alerts", &self.alerts.len())
            .finish_non_exhaustive()
    }
}

/// Borrowed view of a session between ticks.
#[derive(Debug, Clone, Copy)]
pub struct SessionView<'a> {
    samples: &'a [Sample],
    control_state: ControlState,
    alert_count: usize,
    threshold_c: f64,
}

impl<'a> SessionView<'a> {
    /// Number of samples in the view.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Elapsed-time series (s).
    pub fn elapsed_series(&self) -> impl Iterator<Item = f64> + 'a {
        self.samples.iter().map(|s| s.elapsed_s)
    }

    /// Temperature series (°C).
    pub fn temperature_series(&self) -> impl Iterator<Item = f64> + 'a {
        self.samples.iter().map(|s| s.temperature)
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<&'a Sample> {
        self.samples.last()
    }

    /// Control output state.
    pub fn control_state(&self) -> ControlState {
        self.control_state
    }

    /// Alerts raised so far.
    pub fn alert_count(&self) -> usize {
        self.alert_count
    }

    /// Alert threshold (°C).
    pub fn threshold_c(&self) -> f64 {
        self.threshold_c
    }
}
