use std::{io::Write, path::Path};

pub type Vector<T = f64> = na::DVector<T>;
pub type Matrix<T = f64> = na::DMatrix<T>;
pub type CooMatrix<T = f64> = nas::CooMatrix<T>;
pub type CsrMatrix<T = f64> = nas::CsrMatrix<T>;

pub fn bilinear_form(mat: &CsrMatrix, u: &Vector, v: &Vector) -> f64 {
  (mat * v).dot(u)
}
pub fn quadratic_form_sparse(mat: &CsrMatrix, u: &Vector) -> f64 {
  bilinear_form(mat, u, u)
}

/// $sum_i w_i u_i^2$
pub fn weighted_norm_squared(u: &Vector, weights: &Vector) -> f64 {
  assert_eq!(u.len(), weights.len());
  u.iter().zip(weights.iter()).map(|(u, w)| w * u * u).sum()
}

pub fn all_finite<'a>(values: impl IntoIterator<Item = &'a f64>) -> bool {
  values.into_iter().all(|v| v.is_finite())
}

/// Writes the entries of `vector`, one per line.
pub fn save_vector(vector: &Vector, path: impl AsRef<Path>) -> std::io::Result<()> {
  let file = std::fs::File::create(path)?;
  let mut writer = std::io::BufWriter::new(file);
  for v in vector.iter() {
    writeln!(writer, "{v}")?;
  }
  writer.flush()
}

/// Writes the rows of `matrix`, one row per line with space separated entries.
pub fn save_matrix(matrix: &Matrix, path: impl AsRef<Path>) -> std::io::Result<()> {
  let file = std::fs::File::create(path)?;
  let mut writer = std::io::BufWriter::new(file);
  for row in matrix.row_iter() {
    let line = row.iter().map(|v| format!("{v:e}")).collect::<Vec<_>>().join(" ");
    writeln!(writer, "{line}")?;
  }
  writer.flush()
}

/// Structural and numerical equality of two CSR matrices.
pub fn csr_bitwise_eq(a: &CsrMatrix, b: &CsrMatrix) -> bool {
  a.nrows() == b.nrows()
    && a.ncols() == b.ncols()
    && a.row_offsets() == b.row_offsets()
    && a.col_indices() == b.col_indices()
    && a
      .values()
      .iter()
      .zip(b.values())
      .all(|(x, y)| x.to_bits() == y.to_bits())
}
