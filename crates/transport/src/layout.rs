//! Index conventions of the staggered space-time discretization.
//!
//! - The potential lives on the `ntime + 1` instants $s_i = i / N$ at every vertex.
//! - Densities, fluxes and the consensus variables live on cells: a cell is a
//!   pair (time slice $k$ centered at $t_k = (k + 1/2) / N$, triangle $T$).
//! - A corner is a (cell, local vertex) pair.

use manifold::{TriangleIdx, VertexIdx};

/// Index of a time slice of cells, in `0..ntime`.
pub type TimeIdx = usize;
/// Index of a potential instant, in `0..=ntime`.
pub type InstantIdx = usize;
pub type CellIdx = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceTimeLayout {
  ntime: usize,
  nvertices: usize,
  ntriangles: usize,
}

impl SpaceTimeLayout {
  pub fn new(ntime: usize, nvertices: usize, ntriangles: usize) -> Self {
    assert!(ntime > 0, "Need at least one time slice.");
    Self {
      ntime,
      nvertices,
      ntriangles,
    }
  }

  pub fn ntime(&self) -> usize {
    self.ntime
  }
  pub fn ninstants(&self) -> usize {
    self.ntime + 1
  }
  pub fn nvertices(&self) -> usize {
    self.nvertices
  }
  pub fn ntriangles(&self) -> usize {
    self.ntriangles
  }

  pub fn dt(&self) -> f64 {
    1.0 / self.ntime as f64
  }
  /// Center $t_k$ of time slice `itime`.
  pub fn time_center(&self, itime: TimeIdx) -> f64 {
    (itime as f64 + 0.5) / self.ntime as f64
  }
  /// Potential instant $s_i$.
  pub fn instant(&self, iinstant: InstantIdx) -> f64 {
    iinstant as f64 / self.ntime as f64
  }

  /// Number of potential unknowns.
  pub fn nphi(&self) -> usize {
    self.ninstants() * self.nvertices
  }
  pub fn phi_idx(&self, iinstant: InstantIdx, ivertex: VertexIdx) -> usize {
    debug_assert!(iinstant <= self.ntime && ivertex < self.nvertices);
    iinstant * self.nvertices + ivertex
  }

  pub fn ncells(&self) -> usize {
    self.ntime * self.ntriangles
  }
  pub fn cell_idx(&self, itime: TimeIdx, itriangle: TriangleIdx) -> CellIdx {
    debug_assert!(itime < self.ntime && itriangle < self.ntriangles);
    itime * self.ntriangles + itriangle
  }
  pub fn cell_time_triangle(&self, icell: CellIdx) -> (TimeIdx, TriangleIdx) {
    (icell / self.ntriangles, icell % self.ntriangles)
  }

  /// Length of per-corner fields (three values per cell), also used for the
  /// three components of per-cell tangent vectors.
  pub fn ncorners(&self) -> usize {
    3 * self.ncells()
  }
  pub fn corner_idx(&self, itime: TimeIdx, itriangle: TriangleIdx, ilocal: usize) -> usize {
    debug_assert!(ilocal < 3);
    3 * self.cell_idx(itime, itriangle) + ilocal
  }
}

#[cfg(test)]
mod test {
  use super::SpaceTimeLayout;

  #[test]
  fn indices() {
    let layout = SpaceTimeLayout::new(3, 4, 2);
    assert_eq!(layout.ninstants(), 4);
    assert_eq!(layout.nphi(), 16);
    assert_eq!(layout.ncells(), 6);
    assert_eq!(layout.ncorners(), 18);
    assert_eq!(layout.phi_idx(3, 1), 13);
    assert_eq!(layout.cell_idx(2, 1), 5);
    assert_eq!(layout.cell_time_triangle(5), (2, 1));
    assert_eq!(layout.corner_idx(1, 0, 2), 8);
  }

  #[test]
  fn staggered_grid() {
    let layout = SpaceTimeLayout::new(4, 1, 1);
    assert_eq!(layout.dt(), 0.25);
    assert_eq!(layout.time_center(0), 0.125);
    assert_eq!(layout.time_center(3), 0.875);
    assert_eq!(layout.instant(0), 0.0);
    assert_eq!(layout.instant(4), 1.0);
  }
}
