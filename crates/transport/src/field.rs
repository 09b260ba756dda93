use crate::layout::{SpaceTimeLayout, TimeIdx};

use manifold::TriangleIdx;

/// A field with `ncomps` values on every (time slice, triangle) cell.
///
/// Stored time-major: the values of cell `(k, t)` are
/// `values[(k * ntriangles + t) * ncomps..][..ncomps]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeCellField {
  ntime: usize,
  ntriangles: usize,
  ncomps: usize,
  values: Vec<f64>,
}

impl TimeCellField {
  pub fn new(ntime: usize, ntriangles: usize, ncomps: usize, values: Vec<f64>) -> Self {
    assert_eq!(values.len(), ntime * ntriangles * ncomps);
    Self {
      ntime,
      ntriangles,
      ncomps,
      values,
    }
  }
  pub fn from_layout(layout: &SpaceTimeLayout, ncomps: usize, values: &na::DVector<f64>) -> Self {
    Self::new(
      layout.ntime(),
      layout.ntriangles(),
      ncomps,
      values.as_slice().to_vec(),
    )
  }

  pub fn ntime(&self) -> usize {
    self.ntime
  }
  pub fn ntriangles(&self) -> usize {
    self.ntriangles
  }
  pub fn ncomps(&self) -> usize {
    self.ncomps
  }

  pub fn get(&self, itime: TimeIdx, itriangle: TriangleIdx) -> &[f64] {
    let start = (itime * self.ntriangles + itriangle) * self.ncomps;
    &self.values[start..start + self.ncomps]
  }
  pub fn time_slice(&self, itime: TimeIdx) -> &[f64] {
    let len = self.ntriangles * self.ncomps;
    &self.values[itime * len..(itime + 1) * len]
  }

  pub fn values(&self) -> &[f64] {
    &self.values
  }
  pub fn into_values(self) -> Vec<f64> {
    self.values
  }
}
