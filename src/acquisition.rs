//! Fixed-rate acquisition loop.
//!
//! [`run_for_duration`] calls [`Session::acquire_sample`] once per sampling interval
//! until the configured duration has elapsed or [`RunControl::stop`] is called. The
//! only await point is the wait for the next tick, and a stop request cancels that
//! wait immediately; a sample that is already being taken always completes.
//!
//! With live view enabled the [`TickObserver`] is handed a [`SessionView`] after every
//! sample. Without it, a progress line is logged every [`PROGRESS_EVERY`] samples.
//!
//! # Example
//!
//! ```no_run
//! use thermo_daq::acquisition::{run_for_duration, LiveStatus, RunControl, RunOptions};
//! use thermo_daq::config::AcquisitionConfig;
//! use thermo_daq::session::Session;
//! use std::time::Duration;
//!
//! # async fn demo() -> thermo_daq::error::AppResult<()> {
//! let mut session = Session::new(AcquisitionConfig::new(26.0, 35.0, 0.5))?;
//! let control = RunControl::new();
//! let options = RunOptions::new(Duration::from_secs(10), true);
//! let summary = run_for_duration(&mut session, &options, &control, &mut LiveStatus).await;
//! println!("{} samples, {} alerts", summary.samples, summary.alerts);
//! # Ok(())
//! # }
//! ```

use crate::config::RunConfig;
use crate::session::{Session, SessionView};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;

/// Samples between progress lines when live view is off.
pub const PROGRESS_EVERY: u64 = 10;

/// Options for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOptions {
    /// Upper bound on run time
    pub duration: Duration,
    /// Hand a view to the observer after every sample
    pub live_view: bool,
}

impl RunOptions {
    /// Options for a run of `duration`.
    pub fn new(duration: Duration, live_view: bool) -> Self {
        Self {
            duration,
            live_view,
        }
    }

    /// Options taken from the `[run]` configuration section.
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.duration(), config.live_view)
    }
}

/// Presentation hook, called between ticks with read-only access to the session.
pub trait TickObserver {
    /// Called after each sample while live view is enabled.
    fn on_tick(&mut self, view: &SessionView<'_>);
}

impl<F> TickObserver for F
where
    F: FnMut(&SessionView<'_>),
{
    fn on_tick(&mut self, view: &SessionView<'_>) {
        self(view)
    }
}

/// Logs a status line per tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveStatus;

impl TickObserver for LiveStatus {
    fn on_tick(&mut self, view: &SessionView<'_>) {
        if let Some(latest) = view.latest() {
            info!(
                samples = view.sample_count(),
                control = %view.control_state(),
                alerts = view.alert_count(),
                "Current Temp: {:.2}°C",
                latest.temperature
            );
        }
    }
}

/// Ignores every tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDisplay;

impl TickObserver for NoDisplay {
    fn on_tick(&mut self, _view: &SessionView<'_>) {}
}

/// Handle for stopping a run from elsewhere (a signal handler, another task).
///
/// Use one control per run; once stopped it stays stopped.
#[derive(Debug, Clone)]
pub struct RunControl {
    running: Arc<watch::Sender<bool>>,
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

impl RunControl {
    /// A control in the running state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(true);
        Self {
            running: Arc::new(tx),
        }
    }

    /// Requests the run to stop before its next tick.
    pub fn stop(&self) {
        self.running.send_replace(false);
    }

    /// `false` once [`RunControl::stop`] has been called.
    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.running.subscribe()
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Samples in the session at the end of the run
    pub samples: u64,
    /// Samples that passed validation
    pub valid: usize,
    /// Alerts raised
    pub alerts: usize,
    /// `valid / samples` as a percentage
    pub data_quality_percent: f64,
    /// Wall time the loop ran for
    pub elapsed: Duration,
    /// `true` if the run ended because of [`RunControl::stop`]
    pub stopped: bool,
}

/// Drives `session` at its sampling rate for `options.duration`.
pub async fn run_for_duration<O>(
    session: &mut Session,
    options: &RunOptions,
    control: &RunControl,
    observer: &mut O,
) -> RunSummary
where
    O: TickObserver + ?Sized,
{
    let config = session.config().clone();
    info!(
        base_temperature_c = config.base_temperature_c,
        threshold_c = config.threshold_c,
        sampling_rate_hz = config.sampling_rate_hz,
        duration_s = options.duration.as_secs_f64(),
        "Starting acquisition"
    );

    let mut running = control.subscribe();
    let mut ticker = tokio::time::interval(config.sampling_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;

    let started = Instant::now();
    let mut stopped = false;

    loop {
        if !*running.borrow_and_update() {
            stopped = true;
            break;
        }
        if started.elapsed() >= options.duration {
            break;
        }

        let acquired = session.acquire_sample();

        if options.live_view {
            observer.on_tick(&session.view());
        } else if session.sample_count() % PROGRESS_EVERY == 0 {
            info!(
                samples = session.sample_count(),
                control = %session.control_state(),
                "Last temp: {:.2}°C",
                acquired.temperature
            );
        }

        tokio::select! {
            _ = ticker.tick() => {}
            changed = running.changed() => {
                if changed.is_err() {
                    stopped = true;
                    break;
                }
            }
        }
    }

    let summary = RunSummary {
        samples: session.sample_count(),
        valid: session.valid_count(),
        alerts: session.alerts().len(),
        data_quality_percent: session.data_quality_percent(),
        elapsed: started.elapsed(),
        stopped,
    };
    info!(
        samples = summary.samples,
        alerts = summary.alerts,
        stopped = summary.stopped,
        "Acquisition complete, data quality {:.1}%",
        summary.data_quality_percent
    );
    summary
}
