//! Sampled execution primitives for discrete-time controllers.
//!
//! A controller is evaluated once per sample period. [`SampleConfig`] holds the
//! validated period and [`StepClock`] counts executed samples.

use crate::error::{ControlError, ControlResult};
use nalgebra::ComplexField;
use ss_core::Scalar;

/// Sample configuration for a controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleConfig<T: Scalar> {
    dt: T,
}

impl<T: Scalar> SampleConfig<T> {
    /// Create a new sample configuration.
    ///
    /// # Arguments
    ///
    /// * `dt` - Sample period in seconds (must be positive and finite)
    pub fn new(dt: T) -> ControlResult<Self> {
        if !ComplexField::is_finite(&dt) || dt <= nalgebra::zero() {
            return Err(ControlError::InvalidArg {
                what: "time step must be positive and finite",
            });
        }
        Ok(Self { dt })
    }

    /// Create a sample configuration from frequency in Hz.
    pub fn from_frequency(freq_hz: T) -> ControlResult<Self> {
        if !ComplexField::is_finite(&freq_hz) || freq_hz <= nalgebra::zero() {
            return Err(ControlError::InvalidArg {
                what: "frequency must be positive and finite",
            });
        }
        Self::new(nalgebra::one::<T>() / freq_hz)
    }

    /// Sample period in seconds.
    pub fn dt(&self) -> T {
        self.dt
    }

    /// Get the sample frequency in Hz.
    pub fn frequency(&self) -> T {
        nalgebra::one::<T>() / self.dt
    }
}

/// One second.
impl<T: Scalar> Default for SampleConfig<T> {
    fn default() -> Self {
        Self {
            dt: nalgebra::one(),
        }
    }
}

/// Counts executed samples and the simulated time they cover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepClock<T: Scalar> {
    iteration: u64,
    elapsed: T,
}

impl<T: Scalar> Default for StepClock<T> {
    fn default() -> Self {
        Self {
            iteration: 0,
            elapsed: nalgebra::zero(),
        }
    }
}

impl<T: Scalar> StepClock<T> {
    /// Number of executed samples.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Simulated time covered by the executed samples (seconds).
    pub fn elapsed(&self) -> T {
        self.elapsed
    }

    /// Advance by one sample of length `dt`.
    ///
    /// Returns the iteration index and time stamp of the sample just taken.
    pub fn tick(&mut self, dt: T) -> (u64, T) {
        let stamp = (self.iteration, self.elapsed);
        self.iteration += 1;
        self.elapsed = self.elapsed + dt;
        stamp
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
