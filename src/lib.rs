//! # Temperature DAQ Core Library
//!
//! A simulated temperature data-acquisition instrument: a noisy sensor sampled at a
//! fixed rate, validated, checked against an alert threshold that drives a control
//! output, tagged for integrity and exported to CSV with run metadata.
//!
//! ## Crate Structure
//!
//! - **`session`**: The `Session` aggregate that owns all sampled state, plus the
//!   `Clock` seam used to timestamp samples.
//! - **`synthesis`**: The seeded sensor model (noise, drift, spikes).
//! - **`validation`**: Reading classification and configuration checks.
//! - **`integrity`**: FNV-1a based integrity tags.
//! - **`control`**: The threshold controller and its rising-edge reporting.
//! - **`acquisition`**: The fixed-interval run loop, `RunControl` for stopping it and
//!   the `TickObserver` presentation hook.
//! - **`data`**: CSV export.
//! - **`config`**: Layered configuration (defaults, TOML, environment) via `figment`.
//! - **`logging`**: `tracing-subscriber` initialization.
//! - **`error`**: The `DaqError` enum.

pub mod acquisition;
pub mod config;
pub mod control;
pub mod data;
pub mod error;
pub mod integrity;
pub mod logging;
pub mod session;
pub mod synthesis;
pub mod validation;

pub use error::{AppResult, DaqError};
pub use session::Session;
