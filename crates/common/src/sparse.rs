use crate::linalg::nalgebra::{CooMatrix, CsrMatrix, Matrix, Vector};

/// Triplet builder for sparse matrices.
///
/// Duplicate entries are summed on conversion.
#[derive(Default, Debug, Clone)]
pub struct SparseMatrix {
  nrows: usize,
  ncols: usize,
  triplets: Vec<(usize, usize, f64)>,
}

impl SparseMatrix {
  pub fn zeros(nrows: usize, ncols: usize) -> Self {
    Self::new(nrows, ncols, Vec::new())
  }
  pub fn new(nrows: usize, ncols: usize, triplets: Vec<(usize, usize, f64)>) -> Self {
    assert!(
      triplets.iter().all(|&(r, c, _)| r < nrows && c < ncols),
      "Triplet out of bounds."
    );
    Self {
      nrows,
      ncols,
      triplets,
    }
  }

  pub fn from_csr(csr: &CsrMatrix) -> Self {
    let triplets = csr.triplet_iter().map(|(r, c, &v)| (r, c, v)).collect();
    Self::new(csr.nrows(), csr.ncols(), triplets)
  }

  pub fn nrows(&self) -> usize {
    self.nrows
  }
  pub fn ncols(&self) -> usize {
    self.ncols
  }
  pub fn nnz(&self) -> usize {
    self.triplets.len()
  }
  pub fn triplets(&self) -> &[(usize, usize, f64)] {
    &self.triplets
  }

  pub fn push(&mut self, r: usize, c: usize, v: f64) {
    assert!(r < self.nrows() && c < self.ncols());
    if v != 0.0 {
      self.triplets.push((r, c, v));
    }
  }

  pub fn set_zero<F>(&mut self, predicate: F)
  where
    F: Fn(usize, usize) -> bool,
  {
    self.triplets.retain(|&(r, c, _)| !predicate(r, c));
  }

  pub fn to_nalgebra_coo(&self) -> CooMatrix {
    let rows = self.triplets.iter().map(|t| t.0).collect();
    let cols = self.triplets.iter().map(|t| t.1).collect();
    let vals = self.triplets.iter().map(|t| t.2).collect();
    CooMatrix::try_from_triplets(self.nrows, self.ncols, rows, cols, vals)
      .expect("Triplets are checked to be in bounds.")
  }

  pub fn to_nalgebra_csr(&self) -> CsrMatrix {
    (&self.to_nalgebra_coo()).into()
  }

  pub fn to_nalgebra_dense(&self) -> Matrix {
    (&self.to_nalgebra_coo()).into()
  }

  /// Scales row `i` by `diagonal[i]`, i.e. computes `diag(d) * A`.
  pub fn mul_left_by_diagonal(&self, diagonal: &Vector) -> Self {
    assert_eq!(diagonal.len(), self.nrows);
    let triplets = self
      .triplets
      .iter()
      .map(|&(r, c, v)| (r, c, v * diagonal[r]))
      .collect();
    Self::new(self.nrows, self.ncols, triplets)
  }
}
