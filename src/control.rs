//! Threshold control output.
//!
//! A two-state trigger on a single threshold. Only the rising edge
//! (`Inactive -> Active`) is reported, so a temperature that stays above the
//! threshold produces one alert, not one per sample.
//!
//! | current  | reading                     | next     | edge         |
//! |----------|-----------------------------|----------|--------------|
//! | Inactive | valid, `> threshold`        | Active   | `Rising`     |
//! | Active   | valid, `> threshold`        | Active   | `Held`       |
//! | Active   | valid `<= threshold`/invalid| Inactive | `Cleared`    |
//! | Inactive | valid `<= threshold`/invalid| Inactive | `Idle`       |

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of the control output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ControlState {
    /// Temperature at or below threshold, or last reading invalid.
    #[default]
    Inactive,
    /// Temperature above threshold.
    Active,
}

impl ControlState {
    /// `true` when the output is driven.
    pub fn is_active(self) -> bool {
        matches!(self, ControlState::Active)
    }
}

impl fmt::Display for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlState::Inactive => write!(f, "INACTIVE"),
            ControlState::Active => write!(f, "ACTIVE"),
        }
    }
}

/// Outcome of feeding one reading to a [`ThresholdController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Inactive -> Active. The caller should raise an alert.
    Rising,
    /// Stayed Active.
    Held,
    /// Active -> Inactive.
    Cleared,
    /// Stayed Inactive.
    Idle,
}

/// Single-threshold controller with rising-edge reporting.
#[derive(Debug, Clone)]
pub struct ThresholdController {
    threshold: f64,
    state: ControlState,
}

impl ThresholdController {
    /// New controller, initially [`ControlState::Inactive`].
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            state: ControlState::Inactive,
        }
    }

    /// Alert threshold (°C).
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Current output state.
    pub fn state(&self) -> ControlState {
        self.state
    }

    /// Feeds a reading. Invalid readings are not compared against the threshold and
    /// always force the output inactive.
    pub fn update(&mut self, temperature: f64, valid: bool) -> Edge {
        let above = valid && temperature > self.threshold;
        let edge = match (self.state, above) {
            (ControlState::Inactive, true) => Edge::Rising,
            (ControlState::Active, true) => Edge::Held,
            (ControlState::Active, false) => Edge::Cleared,
            (ControlState::Inactive, false) => Edge::Idle,
        };
        self.state = if above {
            ControlState::Active
        } else {
            ControlState::Inactive
        };
        edge
    }
}
