//! Synthetic temperature sensor.
//!
//! Readings are composed of:
//! - the configured base temperature
//! - Gaussian noise, mean 0, σ = 0.25 °C
//! - a slow sinusoidal drift, `2 · sin(elapsed / 10)` (period ≈ 62.8 s)
//! - an occasional spike: with probability 0.05 a value drawn uniformly from
//!   [-1.5, 1.5) °C is added
//!
//! # Random draw order
//!
//! Each sample consumes, in order: one standard-normal draw, one Bernoulli draw for
//! the spike selection, and one uniform draw for the spike magnitude *only if* the
//! spike was selected. Seeded runs are reproducible under that order.
//!
//! # Example
//!
//! ```
//! use thermo_daq::synthesis::TemperatureSynthesizer;
//!
//! let mut a = TemperatureSynthesizer::new(26.0, Some(7));
//! let mut b = TemperatureSynthesizer::new(26.0, Some(7));
//! assert_eq!(a.sample(1.5), b.sample(1.5));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

/// Parameters of the reading model.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseModel {
    /// Standard deviation of the Gaussian noise (°C)
    pub noise_std_dev: f64,
    /// Peak amplitude of the sinusoidal drift (°C)
    pub drift_amplitude: f64,
    /// Divisor applied to elapsed seconds to get the drift phase in radians
    pub drift_time_constant_s: f64,
    /// Probability that a sample carries a spike (0.0 to 1.0)
    pub spike_probability: f64,
    /// Spikes are drawn from `[-spike_magnitude, spike_magnitude]` (°C)
    pub spike_magnitude: f64,
}

impl NoiseModel {
    /// Model with every disturbance switched off; readings equal the base temperature.
    pub fn none() -> Self {
        Self {
            noise_std_dev: 0.0,
            drift_amplitude: 0.0,
            drift_time_constant_s: 10.0,
            spike_probability: 0.0,
            spike_magnitude: 0.0,
        }
    }

    /// Deterministic drift component at `elapsed_s`.
    pub fn drift(&self, elapsed_s: f64) -> f64 {
        (elapsed_s / self.drift_time_constant_s).sin() * self.drift_amplitude
    }

    /// Largest possible absolute deviation from the base, ignoring the unbounded
    /// Gaussian tail.
    pub fn bounded_excursion(&self) -> f64 {
        self.drift_amplitude.abs() + self.spike_magnitude.abs()
    }
}

impl Default for NoiseModel {
    fn default() -> Self {
        Self {
            noise_std_dev: 0.25,
            drift_amplitude: 2.0,
            drift_time_constant_s: 10.0,
            spike_probability: 0.05,
            spike_magnitude: 1.5,
        }
    }
}

/// Seeded source of simulated temperature readings.
pub struct TemperatureSynthesizer {
    base_temperature: f64,
    model: NoiseModel,
    rng: ChaCha8Rng,
}

impl TemperatureSynthesizer {
    /// Creates a synthesizer using the default [`NoiseModel`].
    ///
    /// If `seed` is `None` the generator is seeded from OS entropy.
    pub fn new(base_temperature: f64, seed: Option<u64>) -> Self {
        Self::with_model(base_temperature, NoiseModel::default(), seed)
    }

    /// Creates a synthesizer with a custom model.
    pub fn with_model(base_temperature: f64, mut model: NoiseModel, seed: Option<u64>) -> Self {
        model.spike_probability = finite_or_zero(model.spike_probability).clamp(0.0, 1.0);
        model.spike_magnitude = finite_or_zero(model.spike_magnitude).abs();
        model.noise_std_dev = finite_or_zero(model.noise_std_dev).abs();
        model.drift_amplitude = finite_or_zero(model.drift_amplitude);
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            base_temperature,
            model,
            rng,
        }
    }

    /// Base temperature (°C).
    pub fn base_temperature(&self) -> f64 {
        self.base_temperature
    }

    /// Active model.
    pub fn model(&self) -> &NoiseModel {
        &self.model
    }

    /// Produces one reading for a sample taken `elapsed_s` seconds into the session.
    pub fn sample(&mut self, elapsed_s: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        let noise = z * self.model.noise_std_dev;
        let drift = self.model.drift(elapsed_s);
        let spike = if self.rng.gen_bool(self.model.spike_probability) {
            let u: f64 = self.rng.gen();
            self.model.spike_magnitude * (2.0 * u - 1.0)
        } else {
            0.0
        };
        self.base_temperature + noise + drift + spike
    }
}

/// Non-finite model parameters disable their component.
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

impl std::fmt::Debug for TemperatureSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemperatureSynthesizer")
            .field("base_temperature", &self.base_temperature)
            .field("model", &self.model)
            .field("rng", &"<ChaCha8Rng>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_synthesis_is_reproducible() {
        let mut a = TemperatureSynthesizer::new(26.0, Some(42));
        let mut b = TemperatureSynthesizer::new(26.0, Some(42));
        for i in 0..500 {
            let t = i as f64 * 0.5;
            assert_eq!(a.sample(t), b.sample(t));
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = TemperatureSynthesizer::new(26.0, Some(1));
        let mut b = TemperatureSynthesizer::new(26.0, Some(2));
        let same = (0..50).filter(|&i| a.sample(i as f64) == b.sample(i as f64)).count();
        assert!(same < 50);
    }

    #[test]
    fn quiet_model_returns_base() {
        let mut s = TemperatureSynthesizer::with_model(26.0, NoiseModel::none(), Some(3));
        for i in 0..20 {
            assert_eq!(s.sample(i as f64), 26.0);
        }
    }

    #[test]
    fn drift_follows_sine() {
        let model = NoiseModel::default();
        assert_eq!(model.drift(0.0), 0.0);
        let quarter = 10.0 * std::f64::consts::FRAC_PI_2;
        assert!((model.drift(quarter) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn drift_only_model_is_exact() {
        let model = NoiseModel {
            noise_std_dev: 0.0,
            spike_probability: 0.0,
            ..NoiseModel::default()
        };
        let mut s = TemperatureSynthesizer::with_model(20.0, model.clone(), Some(9));
        for i in 0..30 {
            let t = i as f64 * 3.0;
            assert!((s.sample(t) - (20.0 + model.drift(t))).abs() < 1e-12);
        }
    }

    #[test]
    fn spikes_stay_within_magnitude() {
        let model = NoiseModel {
            noise_std_dev: 0.0,
            drift_amplitude: 0.0,
            spike_probability: 1.0,
            ..NoiseModel::default()
        };
        let mut s = TemperatureSynthesizer::with_model(0.0, model, Some(11));
        for _ in 0..1000 {
            let v = s.sample(0.0);
            assert!((-1.5..=1.5).contains(&v), "spike {v} out of range");
        }
    }

    #[test]
    fn noise_statistics_are_plausible() {
        let model = NoiseModel {
            drift_amplitude: 0.0,
            spike_probability: 0.0,
            ..NoiseModel::default()
        };
        let mut s = TemperatureSynthesizer::with_model(0.0, model, Some(5));
        let n = 20_000;
        let values: Vec<f64> = (0..n).map(|_| s.sample(0.0)).collect();
        let mean = values.iter().sum::<f64>() / n as f64;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.02, "mean {mean}");
        assert!((var.sqrt() - 0.25).abs() < 0.02, "std {}", var.sqrt());
    }

    #[test]
    fn spike_rate_is_about_five_percent() {
        let model = NoiseModel {
            noise_std_dev: 0.0,
            drift_amplitude: 0.0,
            ..NoiseModel::default()
        };
        let mut s = TemperatureSynthesizer::with_model(0.0, model, Some(21));
        let n = 20_000;
        let spikes = (0..n).filter(|_| s.sample(0.0) != 0.0).count();
        let rate = spikes as f64 / n as f64;
        assert!((rate - 0.05).abs() < 0.01, "spike rate {rate}");
    }

    #[test]
    fn non_finite_parameters_are_disabled() {
        let model = NoiseModel {
            noise_std_dev: f64::NAN,
            drift_amplitude: f64::INFINITY,
            spike_probability: f64::NAN,
            spike_magnitude: f64::INFINITY,
            ..NoiseModel::default()
        };
        let mut s = TemperatureSynthesizer::with_model(26.0, model, Some(4));
        assert_eq!(s.model().spike_probability, 0.0);
        assert_eq!(s.model().spike_magnitude, 0.0);
        for i in 0..100 {
            assert_eq!(s.sample(i as f64), 26.0);
        }
    }

    #[test]
    fn extreme_spike_magnitude_stays_finite() {
        let model = NoiseModel {
            spike_probability: 1.0,
            spike_magnitude: f64::MAX,
            ..NoiseModel::default()
        };
        let mut s = TemperatureSynthesizer::with_model(0.0, model, Some(8));
        for _ in 0..100 {
            assert!(s.sample(0.0).is_finite());
        }
    }

    #[test]
    fn probability_is_clamped() {
        let model = NoiseModel {
            spike_probability: 3.0,
            ..NoiseModel::default()
        };
        let s = TemperatureSynthesizer::with_model(0.0, model, Some(1));
        assert_eq!(s.model().spike_probability, 1.0);
    }
}
