//! Per-step records and their CSV rendering.

use ss_core::{Scalar, Vector};
use std::io::{self, Write};

/// Reference and measurement that produced a tracking-mode input.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingSignals<T: Scalar> {
    pub reference: Vector<T>,
    pub measurement: Vector<T>,
}

/// Snapshot of one executed controller step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord<T: Scalar> {
    /// Zero-based step index.
    pub iteration: u64,
    /// Simulated time at which the step was taken (seconds).
    pub time: T,
    /// Present when the step was driven by `step_tracking`.
    pub tracking: Option<TrackingSignals<T>>,
    /// Input actually applied, after saturation.
    pub input: Vector<T>,
    /// Output computed from the pre-update state.
    pub output: Vector<T>,
    /// State after the update.
    pub state: Vector<T>,
}

impl<T: Scalar> StepRecord<T> {
    /// Column names matching [`StepRecord::values`].
    pub fn header(&self) -> Vec<String> {
        let mut cols = vec!["t".to_string()];
        if let Some(tracking) = &self.tracking {
            push_names(&mut cols, "ref", tracking.reference.len());
            push_names(&mut cols, "meas", tracking.measurement.len());
        }
        push_names(&mut cols, "u", self.input.len());
        push_names(&mut cols, "y", self.output.len());
        push_names(&mut cols, "x", self.state.len());
        cols
    }

    pub fn values(&self) -> Vec<T> {
        let mut vals = vec![self.time];
        if let Some(tracking) = &self.tracking {
            vals.extend(tracking.reference.iter().copied());
            vals.extend(tracking.measurement.iter().copied());
        }
        vals.extend(self.input.iter().copied());
        vals.extend(self.output.iter().copied());
        vals.extend(self.state.iter().copied());
        vals
    }
}

fn push_names(cols: &mut Vec<String>, prefix: &str, n: usize) {
    cols.extend((0..n).map(|i| format!("{prefix}{i}")));
}

/// Writes step records as CSV.
///
/// A header line is emitted before the first record and again whenever the
/// column layout changes (switching between direct and tracking steps, or a
/// model with different dimensions).
#[derive(Debug)]
pub struct TraceWriter<W: Write> {
    out: W,
    header: Option<Vec<String>>,
    rows: usize,
}

impl<W: Write> TraceWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            header: None,
            rows: 0,
        }
    }

    pub fn write<T: Scalar>(&mut self, record: &StepRecord<T>) -> io::Result<()> {
        let header = record.header();
        if self.header.as_ref() != Some(&header) {
            writeln!(self.out, "{}", header.join(","))?;
            self.header = Some(header);
        }
        let row: Vec<String> = record.values().iter().map(|v| v.to_string()).collect();
        writeln!(self.out, "{}", row.join(","))?;
        self.rows += 1;
        Ok(())
    }

    /// Number of data rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct_record() -> StepRecord<f64> {
        StepRecord {
            iteration: 0,
            time: 0.0,
            tracking: None,
            input: Vector::from_vec(vec![1.0]),
            output: Vector::from_vec(vec![2.0, 3.0]),
            state: Vector::from_vec(vec![0.5]),
        }
    }

    #[test]
    fn direct_header_and_row() {
        let mut writer = TraceWriter::new(Vec::new());
        writer.write(&direct_record()).unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(text, "t,u0,y0,y1,x0\n0,1,2,3,0.5\n");
    }

    #[test]
    fn header_written_once_per_layout() {
        let mut writer = TraceWriter::new(Vec::new());
        let mut rec = direct_record();
        writer.write(&rec).unwrap();
        rec.time = 0.1;
        writer.write(&rec).unwrap();
        rec.tracking = Some(TrackingSignals {
            reference: Vector::from_vec(vec![1.0]),
            measurement: Vector::from_vec(vec![0.0]),
        });
        writer.write(&rec).unwrap();
        assert_eq!(writer.rows(), 3);

        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[3], "t,ref0,meas0,u0,y0,y1,x0");
        assert_eq!(lines[4], "0.1,1,0,1,2,3,0.5");
    }
}
