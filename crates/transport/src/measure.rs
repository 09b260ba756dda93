//! Boundary measures: validation and construction from vertex densities.
//!
//! A measure is a vector of nonnegative vertex masses with total mass one.

use crate::error::GeodesicError;

use manifold::{Coord, SurfaceGeometry, SurfaceTopology};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureRole {
  Source,
  Target,
}
impl std::fmt::Display for MeasureRole {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      MeasureRole::Source => f.write_str("source"),
      MeasureRole::Target => f.write_str("target"),
    }
  }
}

/// A validated probability measure on the mesh vertices, normalized to unit mass.
#[derive(Debug, Clone)]
pub struct BoundaryMeasure {
  role: MeasureRole,
  masses: na::DVector<f64>,
}

impl BoundaryMeasure {
  pub fn new(
    role: MeasureRole,
    masses: &[f64],
    nvertices: usize,
    tolerance: f64,
  ) -> Result<Self, GeodesicError> {
    let invalid = |reason: String| GeodesicError::invalid_measure(role, reason);

    if masses.len() != nvertices {
      return Err(invalid(format!(
        "expected {nvertices} vertex masses, got {}",
        masses.len()
      )));
    }
    if let Some(ivertex) = masses.iter().position(|m| !m.is_finite()) {
      return Err(invalid(format!("non-finite mass at vertex {ivertex}")));
    }
    if let Some(ivertex) = masses.iter().position(|&m| m < 0.0) {
      return Err(invalid(format!(
        "negative mass {:e} at vertex {ivertex}",
        masses[ivertex]
      )));
    }
    let total: f64 = masses.iter().sum();
    if total <= 0.0 {
      return Err(invalid("vanishing total mass".into()));
    }
    if (total - 1.0).abs() > tolerance {
      return Err(invalid(format!(
        "total mass {total} deviates from 1 by more than {tolerance:e}"
      )));
    }
    if (total - 1.0).abs() > 1e-12 {
      tracing::warn!("renormalizing {role} measure with total mass {total}");
    }

    let masses = na::DVector::from_iterator(nvertices, masses.iter().map(|m| m / total));
    Ok(Self { role, masses })
  }

  pub fn role(&self) -> MeasureRole {
    self.role
  }
  pub fn masses(&self) -> &na::DVector<f64> {
    &self.masses
  }

  /// Mass per area at every vertex.
  pub fn densities(&self, geometry: &SurfaceGeometry) -> na::DVector<f64> {
    na::DVector::from_iterator(
      self.masses.len(),
      self
        .masses
        .iter()
        .zip(geometry.vertex_areas())
        .map(|(m, a)| m / a),
    )
  }

  pub fn component_masses(&self, topology: &SurfaceTopology) -> Vec<f64> {
    let mut masses = vec![0.0; topology.ncomponents()];
    for (ivertex, &icomponent) in topology.vertex_components().iter().enumerate() {
      masses[icomponent] += self.masses[ivertex];
    }
    masses
  }
}

/// Mass cannot move between connected components, so source and target
/// must agree on every component.
pub fn check_component_balance(
  source: &BoundaryMeasure,
  target: &BoundaryMeasure,
  topology: &SurfaceTopology,
  tolerance: f64,
) -> Result<(), GeodesicError> {
  let source_masses = source.component_masses(topology);
  let target_masses = target.component_masses(topology);
  for (icomponent, (s, t)) in source_masses.iter().zip(&target_masses).enumerate() {
    if (s - t).abs() > tolerance {
      return Err(GeodesicError::invalid_measure(
        target.role(),
        format!("component {icomponent} carries mass {t}, but the source carries {s}"),
      ));
    }
  }
  Ok(())
}

/// Smooth cut-off: one for $x <= 0$, zero for $x >= "width"$ and a
/// $C^oo$ transition in between.
pub fn cut_off(x: f64, width: f64) -> f64 {
  assert!(width > 0.0);
  fn bump(t: f64) -> f64 {
    if t > 0.0 {
      (-1.0 / t).exp()
    } else {
      0.0
    }
  }
  let t = x / width;
  let up = bump(1.0 - t);
  up / (up + bump(t))
}

/// Gaussian blob $exp(-|p - c|^2 / w^2)$.
pub fn gaussian(p: &Coord, center: &Coord, width: f64) -> f64 {
  (-(p - center).norm_squared() / (width * width)).exp()
}

/// Builds a probability measure from a density function of the vertex
/// positions: every vertex gets `density(p) * |v|`, then the result is
/// normalized to unit mass.
pub fn from_density<F>(
  geometry: &SurfaceGeometry,
  role: MeasureRole,
  density: F,
) -> Result<Vec<f64>, GeodesicError>
where
  F: Fn(&Coord) -> f64,
{
  let masses: Vec<f64> = geometry
    .mesh()
    .coords()
    .iter()
    .zip(geometry.vertex_areas())
    .map(|(p, a)| density(p) * a)
    .collect();
  let total: f64 = masses.iter().sum();
  if !(total.is_finite() && total > 0.0) {
    return Err(GeodesicError::invalid_measure(
      role,
      format!("density has total mass {total}"),
    ));
  }
  Ok(masses.into_iter().map(|m| m / total).collect())
}

#[cfg(test)]
mod test {
  use super::*;

  use approx::assert_relative_eq;
  use manifold::gen;

  #[test]
  fn cut_off_profile() {
    assert_eq!(cut_off(-1.0, 0.3), 1.0);
    assert_eq!(cut_off(0.0, 0.3), 1.0);
    assert_eq!(cut_off(0.3, 0.3), 0.0);
    assert_eq!(cut_off(2.0, 0.3), 0.0);
    assert_relative_eq!(cut_off(0.15, 0.3), 0.5);
    let samples: Vec<_> = (0..=30).map(|i| cut_off(i as f64 * 0.01, 0.3)).collect();
    assert!(samples.windows(2).all(|w| w[0] >= w[1]));
  }

  #[test]
  fn validation() {
    let ok = BoundaryMeasure::new(MeasureRole::Source, &[0.5, 0.25, 0.25 + 1e-9], 3, 1e-6).unwrap();
    assert_relative_eq!(ok.masses().sum(), 1.0, epsilon = 1e-15);

    let cases: [(&[f64], _); 4] = [
      (&[0.5, 0.5], "expected 3"),
      (&[0.5, f64::NAN, 0.5], "non-finite"),
      (&[1.5, -0.5, 0.0], "negative"),
      (&[0.5, 0.25, 0.2], "total mass"),
    ];
    for (masses, message) in cases {
      let err = BoundaryMeasure::new(MeasureRole::Target, masses, 3, 1e-6).unwrap_err();
      assert!(matches!(
        err,
        GeodesicError::InvalidMeasure {
          which: MeasureRole::Target,
          ..
        }
      ));
      assert!(err.to_string().contains(message), "{err}");
    }
  }

  #[test]
  fn vanishing_measure_with_loose_tolerance() {
    let err = BoundaryMeasure::new(MeasureRole::Source, &[0.0; 3], 3, 2.0).unwrap_err();
    assert!(err.to_string().contains("vanishing total mass"), "{err}");
  }

  #[test]
  fn component_balance() {
    let coords = vec![
      Coord::zeros(),
      Coord::x(),
      Coord::y(),
      Coord::new(5.0, 0.0, 0.0),
      Coord::new(6.0, 0.0, 0.0),
      Coord::new(5.0, 1.0, 0.0),
    ];
    let mesh = manifold::SurfaceMesh::new(coords, vec![[0, 1, 2], [3, 4, 5]]).unwrap();
    let topology = mesh.topology();

    let source = [0.5, 0.0, 0.0, 0.5, 0.0, 0.0];
    let balanced = [0.0, 0.25, 0.25, 0.0, 0.0, 0.5];
    let unbalanced = [0.0, 0.0, 1.0, 0.0, 0.0, 0.0];
    let source = BoundaryMeasure::new(MeasureRole::Source, &source, 6, 1e-6).unwrap();
    let balanced = BoundaryMeasure::new(MeasureRole::Target, &balanced, 6, 1e-6).unwrap();
    let unbalanced = BoundaryMeasure::new(MeasureRole::Target, &unbalanced, 6, 1e-6).unwrap();

    assert!(check_component_balance(&source, &balanced, topology, 1e-6).is_ok());
    assert!(check_component_balance(&source, &unbalanced, topology, 1e-6).is_err());
  }

  #[test]
  fn density_measures() {
    let geometry = SurfaceGeometry::new(gen::unit_square(8)).unwrap();

    let uniform = from_density(&geometry, MeasureRole::Source, |_| 1.0).unwrap();
    assert_relative_eq!(uniform.iter().sum::<f64>(), 1.0, epsilon = 1e-14);
    for (m, a) in uniform.iter().zip(geometry.vertex_areas()) {
      assert_relative_eq!(*m, *a, epsilon = 1e-14);
    }

    let center = Coord::new(0.25, 0.25, 0.0);
    let blob = from_density(&geometry, MeasureRole::Target, |p| gaussian(p, &center, 0.1)).unwrap();
    let imax = (0..blob.len())
      .max_by(|&i, &j| blob[i].total_cmp(&blob[j]))
      .unwrap();
    assert_relative_eq!(*geometry.mesh().coord(imax), center, epsilon = 1e-14);

    assert!(from_density(&geometry, MeasureRole::Source, |_| 0.0).is_err());
  }
}
