use faer::linalg::solvers::Solve;

use super::nalgebra::{CsrMatrix, Vector};

type SparseMatrixFaer = faer::sparse::SparseRowMat<usize, f64>;

pub fn nalgebra2faer(m: CsrMatrix) -> SparseMatrixFaer {
  let nrows = m.nrows();
  let ncols = m.ncols();
  let (row_ptrs, col_indices, values) = m.disassemble();

  let symbolic =
    faer::sparse::SymbolicSparseRowMat::new_checked(nrows, ncols, row_ptrs, None, col_indices);
  faer::sparse::SparseRowMat::new(symbolic, values)
}

/// Sparse Cholesky factorization of a symmetric positive definite matrix.
///
/// Factorize once, solve many times.
pub struct FaerCholesky {
  raw: faer::sparse::linalg::solvers::Llt<usize, f64>,
  nrows: usize,
}
impl FaerCholesky {
  /// Returns `Err` with a description if the matrix is not positive definite.
  pub fn new(a: CsrMatrix) -> Result<Self, String> {
    let nrows = a.nrows();
    if nrows != a.ncols() {
      return Err(format!("matrix is not square ({}x{})", a.nrows(), a.ncols()));
    }
    let raw = nalgebra2faer(a)
      .sp_cholesky(faer::Side::Upper)
      .map_err(|err| format!("{err:?}"))?;
    Ok(Self { raw, nrows })
  }

  pub fn nrows(&self) -> usize {
    self.nrows
  }

  pub fn solve(&self, b: &Vector) -> Vector {
    assert_eq!(b.nrows(), self.nrows);
    let b = faer::Col::from_fn(b.nrows(), |i| b[i]);
    let x = self.raw.solve(b);
    Vector::from_iterator(x.nrows(), x.iter().copied())
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::sparse::SparseMatrix;

  use approx::assert_relative_eq;

  fn tridiagonal(n: usize) -> SparseMatrix {
    let mut mat = SparseMatrix::zeros(n, n);
    for i in 0..n {
      mat.push(i, i, 2.0);
      if i > 0 {
        mat.push(i, i - 1, -1.0);
        mat.push(i - 1, i, -1.0);
      }
    }
    mat
  }

  #[test]
  fn cholesky_solves_spd_system() {
    let n = 10;
    let mat = tridiagonal(n).to_nalgebra_csr();
    let x_exact = Vector::from_fn(n, |i, _| (i as f64).sin());
    let b = &mat * &x_exact;

    let cholesky = FaerCholesky::new(mat).unwrap();
    let x = cholesky.solve(&b);
    for i in 0..n {
      assert_relative_eq!(x[i], x_exact[i], epsilon = 1e-12);
    }
  }

  #[test]
  fn cholesky_rejects_indefinite() {
    let mut mat = tridiagonal(4);
    mat.set_zero(|r, c| r == 2 && c == 2);
    mat.push(2, 2, -5.0);
    assert!(FaerCholesky::new(mat.to_nalgebra_csr()).is_err());
  }
}
