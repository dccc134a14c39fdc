//! ss-core: stable foundation for statespace.
//!
//! Contains:
//! - numeric (Scalar bound + tolerances + float helpers)
//! - matrix (dense matrix with dimension-checked arithmetic)
//! - timing (opt-in wall clock timers)
//! - error (shared error types)

pub mod error;
pub mod matrix;
pub mod numeric;
pub mod timing;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use matrix::*;
pub use numeric::*;
