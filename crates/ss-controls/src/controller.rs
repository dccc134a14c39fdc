//! Discrete-time linear state-space controller.
//!
//! The controller holds the model
//!
//! ```text
//! y[k]   = C x[k] + D u[k]
//! x[k+1] = A x[k] + B u[k]
//! ```
//!
//! with `A` n×n, `B` n×m, `C` p×n and `D` p×m, plus a state vector `x` of
//! length n. Each call to [`StateSpaceController::step`] clamps the input (if
//! saturation is configured), computes the output from the current state and
//! only then advances the state.

use crate::error::{ControlError, ControlResult};
use crate::parser::{ModelData, ModelParser};
use crate::sampled::{SampleConfig, StepClock};
use crate::saturation::Saturation;
use crate::trace::{StepRecord, TrackingSignals};
use ss_core::{Matrix, Scalar, Vector, ensure_finite, vector_add, vector_sub};
use std::fmt;
use std::path::Path;
use tracing::{debug, trace, warn};

/// State-space controller over a generic scalar.
///
/// `Clone` is a deep copy: matrices, time step, saturation, current state and
/// step counter are all duplicated, and the two controllers evolve
/// independently afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSpaceController<T: Scalar> {
    a: Matrix<T>,
    b: Matrix<T>,
    c: Matrix<T>,
    d: Matrix<T>,
    sample: SampleConfig<T>,
    saturation: Option<Saturation<T>>,
    x: Vector<T>,
    clock: StepClock<T>,
    last_step: Option<StepRecord<T>>,
}

impl<T: Scalar> StateSpaceController<T> {
    /// Create a controller from its matrices and sample period.
    ///
    /// # Arguments
    ///
    /// * `a` - State transition matrix (n×n)
    /// * `b` - Input matrix (n×m)
    /// * `c` - Output matrix (p×n)
    /// * `d` - Feed-through matrix (p×m)
    /// * `time_step` - Sample period in seconds
    ///
    /// The state starts at zero.
    pub fn new(
        a: Matrix<T>,
        b: Matrix<T>,
        c: Matrix<T>,
        d: Matrix<T>,
        time_step: T,
    ) -> ControlResult<Self> {
        check_model(&a, &b, &c, &d)?;
        let sample = SampleConfig::new(time_step)?;
        let n = a.nrows();
        debug!(
            nx = n,
            nu = b.ncols(),
            ny = c.nrows(),
            time_step = %time_step,
            "state-space controller created"
        );
        Ok(Self {
            a,
            b,
            c,
            d,
            sample,
            saturation: None,
            x: Vector::zeros(n),
            clock: StepClock::default(),
            last_step: None,
        })
    }

    /// Create a controller from parsed model content, applying its saturation.
    pub fn from_model(model: ModelData<T>) -> ControlResult<Self> {
        let mut controller = Self::new(model.a, model.b, model.c, model.d, model.time_step)?;
        if let Some(saturation) = model.saturation {
            controller.install_saturation(saturation)?;
        }
        Ok(controller)
    }

    /// Create a controller from a model file.
    ///
    /// Parsing is delegated to `parser`; malformed files surface as
    /// [`ControlError::FileFormat`], inconsistent matrices as
    /// [`ControlError::DimensionMismatch`].
    pub fn from_file<P>(path: impl AsRef<Path>, parser: &P) -> ControlResult<Self>
    where
        P: ModelParser<T> + ?Sized,
    {
        let path = path.as_ref();
        let model = parser.parse(path)?;
        debug!(path = %path.display(), "model file parsed");
        Self::from_model(model)
    }

    pub fn a(&self) -> &Matrix<T> {
        &self.a
    }

    pub fn b(&self) -> &Matrix<T> {
        &self.b
    }

    pub fn c(&self) -> &Matrix<T> {
        &self.c
    }

    pub fn d(&self) -> &Matrix<T> {
        &self.d
    }

    /// Sample period in seconds.
    pub fn time_step(&self) -> T {
        self.sample.dt()
    }

    pub fn sample_config(&self) -> SampleConfig<T> {
        self.sample
    }

    /// Current state vector.
    pub fn state(&self) -> &Vector<T> {
        &self.x
    }

    /// n
    pub fn state_dim(&self) -> usize {
        self.a.nrows()
    }

    /// m
    pub fn input_dim(&self) -> usize {
        self.b.ncols()
    }

    /// p
    pub fn output_dim(&self) -> usize {
        self.c.nrows()
    }

    /// Number of steps taken since construction or the last reset.
    pub fn iteration(&self) -> u64 {
        self.clock.iteration()
    }

    /// Simulated time covered by the steps taken (seconds).
    pub fn elapsed(&self) -> T {
        self.clock.elapsed()
    }

    pub fn saturation(&self) -> Option<&Saturation<T>> {
        self.saturation.as_ref()
    }

    /// Record of the most recent step, if any.
    pub fn last_step(&self) -> Option<&StepRecord<T>> {
        self.last_step.as_ref()
    }

    pub fn set_a(&mut self, a: Matrix<T>) -> ControlResult<()> {
        check_model(&a, &self.b, &self.c, &self.d)?;
        self.a = a;
        debug!(shape = %self.a.shape(), "A replaced");
        Ok(())
    }

    pub fn set_b(&mut self, b: Matrix<T>) -> ControlResult<()> {
        check_model(&self.a, &b, &self.c, &self.d)?;
        self.b = b;
        debug!(shape = %self.b.shape(), "B replaced");
        Ok(())
    }

    pub fn set_c(&mut self, c: Matrix<T>) -> ControlResult<()> {
        check_model(&self.a, &self.b, &c, &self.d)?;
        self.c = c;
        debug!(shape = %self.c.shape(), "C replaced");
        Ok(())
    }

    pub fn set_d(&mut self, d: Matrix<T>) -> ControlResult<()> {
        check_model(&self.a, &self.b, &self.c, &d)?;
        self.d = d;
        debug!(shape = %self.d.shape(), "D replaced");
        Ok(())
    }

    /// Replace all four matrices at once.
    ///
    /// Unlike the single-matrix setters this may change n, m and p. The state
    /// is kept when n is unchanged and reset to zero otherwise. Per-element
    /// saturation bounds must still match the new input dimension; clear them
    /// first when m changes.
    pub fn set_model(
        &mut self,
        a: Matrix<T>,
        b: Matrix<T>,
        c: Matrix<T>,
        d: Matrix<T>,
    ) -> ControlResult<()> {
        check_model(&a, &b, &c, &d)?;
        if let Some(saturation) = &self.saturation {
            if !saturation.fits(b.ncols()) {
                return Err(ControlError::dimension(format!(
                    "saturation bounds do not match new input dimension {}",
                    b.ncols()
                )));
            }
        }

        let old_n = self.state_dim();
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        if self.state_dim() != old_n {
            warn!(
                old = old_n,
                new = self.state_dim(),
                "state dimension changed, state reset to zero"
            );
            self.x = Vector::zeros(self.state_dim());
        }
        debug!(
            nx = self.state_dim(),
            nu = self.input_dim(),
            ny = self.output_dim(),
            "model replaced"
        );
        Ok(())
    }

    pub fn set_time_step(&mut self, time_step: T) -> ControlResult<()> {
        self.sample = SampleConfig::new(time_step)?;
        debug!(time_step = %time_step, "time step replaced");
        Ok(())
    }

    /// Per-element input bounds. Both slices must have one entry per input.
    pub fn set_saturation(&mut self, u_min: &[T], u_max: &[T]) -> ControlResult<()> {
        let m = self.input_dim();
        if u_min.len() != m || u_max.len() != m {
            return Err(ControlError::InvalidArg {
                what: "saturation bounds must have one entry per input",
            });
        }
        let saturation = Saturation::per_element(
            Vector::from_column_slice(u_min),
            Vector::from_column_slice(u_max),
        )?;
        self.install_saturation(saturation)
    }

    /// Same bounds for every input element.
    pub fn set_uniform_saturation(&mut self, u_min: T, u_max: T) -> ControlResult<()> {
        let saturation = Saturation::uniform(u_min, u_max)?;
        self.install_saturation(saturation)
    }

    pub fn clear_saturation(&mut self) {
        if self.saturation.take().is_some() {
            debug!("saturation cleared");
        }
    }

    fn install_saturation(&mut self, saturation: Saturation<T>) -> ControlResult<()> {
        if !saturation.fits(self.input_dim()) {
            return Err(ControlError::InvalidArg {
                what: "saturation bounds must have one entry per input",
            });
        }
        debug!(?saturation, "saturation set");
        self.saturation = Some(saturation);
        Ok(())
    }

    /// Advance the controller by one sample.
    ///
    /// Clamps `u` to the saturation bounds, returns `y = C x + D u` computed
    /// from the current state, then commits `x = A x + B u`.
    pub fn step(&mut self, u: &Vector<T>) -> ControlResult<Vector<T>> {
        self.advance(u, None)
    }

    /// Step on the tracking error `reference - measurement`.
    ///
    /// Both vectors must have one entry per input. The reference and
    /// measurement are kept in the step record.
    pub fn step_tracking(
        &mut self,
        reference: &Vector<T>,
        measurement: &Vector<T>,
    ) -> ControlResult<Vector<T>> {
        let m = self.input_dim();
        check_len("reference", reference, m)?;
        check_len("measurement", measurement, m)?;
        let error = vector_sub(reference, measurement)?;
        self.advance(
            &error,
            Some(TrackingSignals {
                reference: reference.clone(),
                measurement: measurement.clone(),
            }),
        )
    }

    /// Zero the state and the step counter.
    pub fn reset(&mut self) {
        self.x = Vector::zeros(self.state_dim());
        self.clock.reset();
        self.last_step = None;
        debug!("controller reset");
    }

    fn advance(
        &mut self,
        u: &Vector<T>,
        tracking: Option<TrackingSignals<T>>,
    ) -> ControlResult<Vector<T>> {
        check_len("input", u, self.input_dim())?;
        for v in u.iter() {
            ensure_finite(*v, "input")?;
        }

        let applied = match &self.saturation {
            Some(saturation) => saturation.clamp(u)?,
            None => u.clone(),
        };

        // Output first: it must see the pre-update state.
        let y = vector_add(&self.c.mul_vector(&self.x)?, &self.d.mul_vector(&applied)?)?;
        let next = vector_add(&self.a.mul_vector(&self.x)?, &self.b.mul_vector(&applied)?)?;
        self.x = next;

        let (iteration, time) = self.clock.tick(self.sample.dt());
        trace!(iteration, time = %time, "controller step");
        self.last_step = Some(StepRecord {
            iteration,
            time,
            tracking,
            input: applied,
            output: y.clone(),
            state: self.x.clone(),
        });
        Ok(y)
    }
}

/// Unity static gain: 1x1 model with `A = B = C = 0`, `D = 1` and a one second
/// sample period.
impl<T: Scalar> Default for StateSpaceController<T> {
    fn default() -> Self {
        let zero = Matrix::zeros(1, 1);
        Self {
            a: zero.clone(),
            b: zero.clone(),
            c: zero,
            d: Matrix::identity(1),
            sample: SampleConfig::default(),
            saturation: None,
            x: Vector::zeros(1),
            clock: StepClock::default(),
            last_step: None,
        }
    }
}

impl<T: Scalar> fmt::Display for StateSpaceController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "State-space representation of the controller (time step: {} s)",
            self.time_step()
        )?;
        writeln!(f)?;
        for (name, m) in [("A", &self.a), ("B", &self.b), ("C", &self.c), ("D", &self.d)] {
            writeln!(f, "{name} = ")?;
            write!(f, "{}", m.representation())?;
        }
        Ok(())
    }
}

fn check_model<T: Scalar>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    c: &Matrix<T>,
    d: &Matrix<T>,
) -> ControlResult<()> {
    if !a.is_square() {
        return Err(ControlError::dimension(format!(
            "A must be square, got {}",
            a.shape()
        )));
    }
    let n = a.nrows();
    if b.nrows() != n {
        return Err(ControlError::dimension(format!(
            "B has {} rows, A is {n}x{n}",
            b.nrows()
        )));
    }
    if c.ncols() != n {
        return Err(ControlError::dimension(format!(
            "C has {} columns, A is {n}x{n}",
            c.ncols()
        )));
    }
    if d.nrows() != c.nrows() {
        return Err(ControlError::dimension(format!(
            "D has {} rows, C has {}",
            d.nrows(),
            c.nrows()
        )));
    }
    if d.ncols() != b.ncols() {
        return Err(ControlError::dimension(format!(
            "D has {} columns, B has {}",
            d.ncols(),
            b.ncols()
        )));
    }
    a.ensure_finite("A")?;
    b.ensure_finite("B")?;
    c.ensure_finite("C")?;
    d.ensure_finite("D")?;
    Ok(())
}

fn check_len<T: Scalar>(what: &str, v: &Vector<T>, expected: usize) -> ControlResult<()> {
    if v.len() != expected {
        return Err(ControlError::dimension(format!(
            "{what} has {} elements, expected {expected}",
            v.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ss_core::{Tolerances, nearly_equal};

    fn rows(data: &[&[f64]]) -> Matrix<f64> {
        Matrix::from_rows(data).unwrap()
    }

    /// Integrator: x += u, y = x + 0.5 u.
    fn integrator() -> StateSpaceController<f64> {
        StateSpaceController::new(
            rows(&[&[1.0]]),
            rows(&[&[1.0]]),
            rows(&[&[1.0]]),
            rows(&[&[0.5]]),
            0.1,
        )
        .unwrap()
    }

    fn v(data: &[f64]) -> Vector<f64> {
        Vector::from_column_slice(data)
    }

    #[test]
    fn new_starts_at_zero_state() {
        let ctrl = integrator();
        assert_eq!(ctrl.state(), &v(&[0.0]));
        assert_eq!(ctrl.iteration(), 0);
        assert_eq!((ctrl.state_dim(), ctrl.input_dim(), ctrl.output_dim()), (1, 1, 1));
    }

    #[test]
    fn output_uses_pre_update_state() {
        let mut ctrl = integrator();
        let y0 = ctrl.step(&v(&[2.0])).unwrap();
        // x was 0, so only feed-through contributes
        assert_eq!(y0, v(&[1.0]));
        assert_eq!(ctrl.state(), &v(&[2.0]));

        let y1 = ctrl.step(&v(&[2.0])).unwrap();
        assert_eq!(y1, v(&[3.0]));
        assert_eq!(ctrl.state(), &v(&[4.0]));
    }

    #[test]
    fn step_rejects_wrong_input_length() {
        let mut ctrl = integrator();
        let err = ctrl.step(&v(&[1.0, 2.0])).unwrap_err();
        assert!(matches!(err, ControlError::DimensionMismatch { .. }));
        assert_eq!(ctrl.iteration(), 0);
    }

    #[test]
    fn step_rejects_nan_input() {
        let mut ctrl = integrator();
        let err = ctrl.step(&v(&[f64::NAN])).unwrap_err();
        assert!(matches!(err, ControlError::NonFinite { what: "input", .. }));
        assert_eq!(ctrl.state(), &v(&[0.0]));
    }

    #[test]
    fn saturation_clamps_before_feedthrough_and_state() {
        let mut ctrl = integrator();
        ctrl.set_uniform_saturation(-1.0, 1.0).unwrap();
        let y = ctrl.step(&v(&[10.0])).unwrap();
        assert_eq!(y, v(&[0.5]));
        assert_eq!(ctrl.state(), &v(&[1.0]));
        assert_eq!(ctrl.last_step().unwrap().input, v(&[1.0]));
    }

    #[test]
    fn set_saturation_validates() {
        let mut ctrl = integrator();
        assert!(matches!(
            ctrl.set_saturation(&[0.0, 0.0], &[1.0, 1.0]),
            Err(ControlError::InvalidArg { .. })
        ));
        assert!(matches!(
            ctrl.set_saturation(&[2.0], &[1.0]),
            Err(ControlError::InvalidArg { .. })
        ));
        assert!(ctrl.saturation().is_none());
        ctrl.set_saturation(&[-1.0], &[1.0]).unwrap();
        assert!(ctrl.saturation().is_some());
        ctrl.clear_saturation();
        assert!(ctrl.saturation().is_none());
    }

    #[test]
    fn setters_validate_against_other_matrices() {
        let mut ctrl = integrator();
        let before = ctrl.clone();
        assert!(ctrl.set_a(Matrix::zeros(2, 2)).is_err());
        assert!(ctrl.set_b(Matrix::zeros(2, 1)).is_err());
        assert!(ctrl.set_c(Matrix::zeros(1, 2)).is_err());
        assert!(ctrl.set_d(Matrix::zeros(1, 2)).is_err());
        assert_eq!(ctrl, before);
    }

    #[test]
    fn setters_keep_state() {
        let mut ctrl = integrator();
        ctrl.step(&v(&[1.0])).unwrap();
        ctrl.set_a(rows(&[&[0.5]])).unwrap();
        ctrl.set_d(rows(&[&[0.0]])).unwrap();
        assert_eq!(ctrl.state(), &v(&[1.0]));
        assert_eq!(ctrl.step(&v(&[0.0])).unwrap(), v(&[1.0]));
        assert_eq!(ctrl.state(), &v(&[0.5]));
    }

    #[test]
    fn set_model_resets_state_when_n_changes() {
        let mut ctrl = integrator();
        ctrl.step(&v(&[1.0])).unwrap();

        ctrl.set_model(
            rows(&[&[0.0]]),
            rows(&[&[1.0]]),
            rows(&[&[2.0]]),
            rows(&[&[0.0]]),
        )
        .unwrap();
        assert_eq!(ctrl.state(), &v(&[1.0]));

        ctrl.set_model(
            Matrix::identity(2),
            rows(&[&[1.0], &[0.0]]),
            rows(&[&[1.0, 1.0]]),
            rows(&[&[0.0]]),
        )
        .unwrap();
        assert_eq!(ctrl.state(), &v(&[0.0, 0.0]));
    }

    #[test]
    fn set_model_keeps_per_element_bounds_consistent() {
        let mut ctrl = integrator();
        ctrl.set_saturation(&[-1.0], &[1.0]).unwrap();
        let err = ctrl
            .set_model(
                rows(&[&[1.0]]),
                rows(&[&[1.0, 1.0]]),
                rows(&[&[1.0]]),
                rows(&[&[0.0, 0.0]]),
            )
            .unwrap_err();
        assert!(matches!(err, ControlError::DimensionMismatch { .. }));
        assert_eq!(ctrl.input_dim(), 1);
    }

    #[test]
    fn time_step_validation() {
        let mut ctrl = integrator();
        assert!(ctrl.set_time_step(0.0).is_err());
        assert!(ctrl.set_time_step(-1.0).is_err());
        assert_eq!(ctrl.time_step(), 0.1);
        ctrl.set_time_step(0.01).unwrap();
        assert_eq!(ctrl.time_step(), 0.01);
    }

    #[test]
    fn tracking_step_uses_error() {
        let mut direct = integrator();
        let mut tracking = integrator();
        let y_direct = direct.step(&v(&[0.75])).unwrap();
        let y_tracking = tracking.step_tracking(&v(&[1.0]), &v(&[0.25])).unwrap();
        assert_eq!(y_direct, y_tracking);
        assert_eq!(direct.state(), tracking.state());

        let record = tracking.last_step().unwrap();
        let signals = record.tracking.as_ref().unwrap();
        assert_eq!(signals.reference, v(&[1.0]));
        assert_eq!(signals.measurement, v(&[0.25]));
    }

    #[test]
    fn reset_clears_state_and_clock() {
        let mut ctrl = integrator();
        ctrl.step(&v(&[1.0])).unwrap();
        ctrl.step(&v(&[1.0])).unwrap();
        assert_eq!(ctrl.iteration(), 2);
        assert!(nearly_equal(ctrl.elapsed(), 0.2, Tolerances::default()));
        assert!(nearly_equal(ctrl.last_step().unwrap().time, 0.1, Tolerances::default()));

        ctrl.reset();
        assert_eq!(ctrl.state(), &v(&[0.0]));
        assert_eq!(ctrl.iteration(), 0);
        assert_eq!(ctrl.elapsed(), 0.0);
        assert!(ctrl.last_step().is_none());
    }

    #[test]
    fn default_is_unity_gain() {
        let mut ctrl = StateSpaceController::<f64>::default();
        assert_eq!(ctrl.step(&v(&[3.0])).unwrap(), v(&[3.0]));
        assert_eq!(ctrl.time_step(), 1.0);
    }

    #[test]
    fn non_square_a_rejected() {
        let err = StateSpaceController::new(
            Matrix::<f64>::zeros(2, 3),
            Matrix::zeros(2, 1),
            Matrix::zeros(1, 2),
            Matrix::zeros(1, 1),
            0.1,
        )
        .unwrap_err();
        assert!(matches!(err, ControlError::DimensionMismatch { .. }));
    }

    #[test]
    fn display_lists_matrices() {
        let text = integrator().to_string();
        assert!(text.starts_with("State-space representation of the controller (time step: 0.1 s)"));
        assert!(text.contains("A = \n1\n"));
        assert!(text.contains("D = \n0.5\n"));
    }

    #[test]
    fn works_with_f32() {
        let mut ctrl = StateSpaceController::<f32>::new(
            Matrix::identity(1),
            Matrix::identity(1),
            Matrix::identity(1),
            Matrix::zeros(1, 1),
            0.5,
        )
        .unwrap();
        ctrl.step(&Vector::from_column_slice(&[1.0_f32])).unwrap();
        assert_eq!(ctrl.state()[0], 1.0_f32);
    }
}
