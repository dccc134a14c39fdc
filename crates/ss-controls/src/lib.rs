//! Discrete-time state-space controllers for statespace.
//!
//! A [`StateSpaceController`] owns a linear model (A, B, C, D), a sample period
//! and a state vector, and advances that state one sample at a time under a
//! supplied input, optionally clamped by a [`Saturation`].
//!
//! # Architecture
//!
//! - Matrices and vectors come from `ss-core` and are generic over [`ss_core::Scalar`]
//! - Every mutator validates before committing; failures are [`ControlError`]s
//! - Model files are read through the [`ModelParser`] seam, implemented elsewhere
//! - Each step leaves a [`StepRecord`] that a [`TraceWriter`] can render as CSV
//!
//! The controller holds no locks. `step` takes `&mut self`, so concurrent use
//! of one instance has to be serialized by the caller.

pub mod controller;
pub mod error;
pub mod parser;
pub mod sampled;
pub mod saturation;
pub mod trace;

pub use controller::StateSpaceController;
pub use error::{ControlError, ControlResult};
pub use parser::{ModelData, ModelParser};
pub use sampled::{SampleConfig, StepClock};
pub use saturation::Saturation;
pub use trace::{StepRecord, TraceWriter, TrackingSignals};
