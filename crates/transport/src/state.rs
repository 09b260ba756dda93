use crate::{measure::BoundaryMeasure, operators::SpaceTimeOperator};

use common::linalg::nalgebra::Vector;
use manifold::SurfaceGeometry;

/// The ADMM iterate.
///
/// - `phi`: potential on the staggered instants (primal variable of the projection)
/// - `a`, `b`, `e`: consensus variables $q = (A, B)$ and epigraph variable $E$,
///   three values per cell each
/// - `sigma_a`, `sigma_b`: multipliers, the corner densities and the momentum
/// - `density`, `momentum`: the multipliers after the last projection, which
///   satisfy the continuity equation
#[derive(Debug, Clone)]
pub struct AdmmState {
  pub phi: Vector,
  pub a: Vector,
  pub b: Vector,
  pub e: Vector,
  pub sigma_a: Vector,
  pub sigma_b: Vector,
  pub density: Vector,
  pub momentum: Vector,
}

impl AdmmState {
  /// Zero potential and consensus variables. The densities linearly interpolate
  /// the boundary densities in time, the momentum vanishes.
  pub fn new(
    geometry: &SurfaceGeometry,
    operator: &SpaceTimeOperator,
    source: &BoundaryMeasure,
    target: &BoundaryMeasure,
  ) -> Self {
    let layout = operator.layout();
    let ncorners = layout.ncorners();

    let source_densities = source.densities(geometry);
    let target_densities = target.densities(geometry);
    let mut sigma_a = Vector::zeros(ncorners);
    for itime in 0..layout.ntime() {
      let t = layout.time_center(itime);
      for (itriangle, triangle) in operator.triangles().iter().enumerate() {
        for (ilocal, &ivertex) in triangle.iter().enumerate() {
          sigma_a[layout.corner_idx(itime, itriangle, ilocal)] =
            (1.0 - t) * source_densities[ivertex] + t * target_densities[ivertex];
        }
      }
    }

    Self {
      phi: Vector::zeros(layout.nphi()),
      a: Vector::zeros(ncorners),
      b: Vector::zeros(ncorners),
      e: Vector::zeros(ncorners),
      density: sigma_a.clone(),
      sigma_a,
      sigma_b: Vector::zeros(ncorners),
      momentum: Vector::zeros(ncorners),
    }
  }

  /// $sigma <- sigma + r (Lambda phi - q)$
  pub fn update_multipliers(&mut self, lambda_a: &Vector, lambda_b: &Vector, penalty: f64) {
    self.sigma_a += penalty * (lambda_a - &self.a);
    self.sigma_b += penalty * (lambda_b - &self.b);
  }
}
