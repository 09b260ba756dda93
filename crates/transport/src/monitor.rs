//! Convergence monitoring: residuals and the primal objective.

use crate::operators::SpaceTimeOperator;

use common::linalg::nalgebra::Vector;

use rayon::prelude::*;

/// Cells whose mean density is at most this carry no kinetic energy.
pub const DENSITY_FLOOR: f64 = 1e-12;

/// Per-iteration history of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
  /// Objective values, recorded at `objective_iterations`.
  pub objective: Vec<f64>,
  pub objective_iterations: Vec<usize>,
  /// $||Lambda^T W sigma + g||$, one entry per iteration.
  pub primal_residual: Vec<f64>,
  /// $r ||q^(k+1) - q^k||_W$, one entry per iteration.
  pub dual_residual: Vec<f64>,
}

impl Diagnostics {
  pub fn niterations(&self) -> usize {
    self.primal_residual.len()
  }
}

pub struct ConvergenceMonitor {
  tolerance: Option<f64>,
  diagnostics: Diagnostics,
}

impl ConvergenceMonitor {
  pub fn new(tolerance: Option<f64>, niterations: usize) -> Self {
    let diagnostics = Diagnostics {
      primal_residual: Vec::with_capacity(niterations),
      dual_residual: Vec::with_capacity(niterations),
      ..Default::default()
    };
    Self {
      tolerance,
      diagnostics,
    }
  }

  /// Records the residuals of one iteration. Returns whether both are below
  /// the tolerance, if there is one.
  pub fn record_residuals(&mut self, primal: f64, dual: f64) -> bool {
    self.diagnostics.primal_residual.push(primal);
    self.diagnostics.dual_residual.push(dual);
    self
      .tolerance
      .is_some_and(|tolerance| primal < tolerance && dual < tolerance)
  }

  pub fn record_objective(&mut self, iteration: usize, value: f64) {
    self.diagnostics.objective.push(value);
    self.diagnostics.objective_iterations.push(iteration);
  }

  pub fn diagnostics(&self) -> &Diagnostics {
    &self.diagnostics
  }
  pub fn into_diagnostics(self) -> Diagnostics {
    self.diagnostics
  }
}

/// $sum_"cells" "dt" |T| (|m|^2 / (2 macron(rho)) + c/2 macron(rho^2))$
/// with $rho$ the corner densities and $m$ the momentum of each cell.
pub fn objective(
  operator: &SpaceTimeOperator,
  density: &Vector,
  momentum: &Vector,
  congestion: f64,
) -> f64 {
  density
    .as_slice()
    .par_chunks(3)
    .zip(momentum.as_slice().par_chunks(3))
    .zip(operator.cell_weights().as_slice().par_iter())
    .map(|((rho, m), &weight)| {
      let rho_mean = (rho[0] + rho[1] + rho[2]) / 3.0;
      let m_sq = m[0] * m[0] + m[1] * m[1] + m[2] * m[2];
      let kinetic = if rho_mean > DENSITY_FLOOR {
        m_sq / (2.0 * rho_mean)
      } else {
        0.0
      };
      let rho_sq_mean = rho.iter().map(|r| r.max(0.0).powi(2)).sum::<f64>() / 3.0;
      weight * (kinetic + 0.5 * congestion * rho_sq_mean)
    })
    .sum()
}

/// $r ||q^(k+1) - q^k||_W$
pub fn dual_residual(
  operator: &SpaceTimeOperator,
  (a_old, b_old): (&Vector, &Vector),
  (a_new, b_new): (&Vector, &Vector),
  penalty: f64,
) -> f64 {
  penalty * operator.weighted_norm_squared(&(a_new - a_old), &(b_new - b_old)).sqrt()
}

#[cfg(test)]
mod test {
  use super::*;

  use approx::assert_relative_eq;
  use manifold::{gen, SurfaceGeometry};

  #[test]
  fn static_congestion_objective() {
    let geometry = SurfaceGeometry::new(gen::rectangle(2.0, 1.0, 3, 2)).unwrap();
    let operator = SpaceTimeOperator::new(&geometry, 4);
    let n = operator.layout().ncorners();

    // uniform density $1/|Omega|$ at rest costs $c / (2 |Omega|)$
    let density = Vector::from_element(n, 0.5);
    let momentum = Vector::zeros(n);
    assert_relative_eq!(objective(&operator, &density, &momentum, 3.0), 0.75, epsilon = 1e-14);
    assert_relative_eq!(objective(&operator, &density, &momentum, 0.0), 0.0);
  }

  #[test]
  fn kinetic_objective() {
    let geometry = SurfaceGeometry::new(gen::unit_square(2)).unwrap();
    let operator = SpaceTimeOperator::new(&geometry, 2);
    let n = operator.layout().ncorners();

    // constant velocity $(1, 0, 0)$ at unit density: $|m|^2 / (2 rho) = 1/2$
    let density = Vector::from_element(n, 1.0);
    let momentum = Vector::from_fn(n, |i, _| if i % 3 == 0 { 1.0 } else { 0.0 });
    assert_relative_eq!(objective(&operator, &density, &momentum, 0.0), 0.5, epsilon = 1e-14);

    // vacuum carries no kinetic energy
    let vacuum = Vector::zeros(n);
    assert_eq!(objective(&operator, &vacuum, &momentum, 1.0), 0.0);
  }

  #[test]
  fn residual_bookkeeping() {
    let mut monitor = ConvergenceMonitor::new(Some(1e-3), 3);
    assert!(!monitor.record_residuals(1.0, 1e-4));
    assert!(!monitor.record_residuals(1e-4, 1e-2));
    assert!(monitor.record_residuals(1e-4, 1e-5));
    monitor.record_objective(0, 2.5);
    let diagnostics = monitor.into_diagnostics();
    assert_eq!(diagnostics.niterations(), 3);
    assert_eq!(diagnostics.objective, vec![2.5]);
    assert_eq!(diagnostics.objective_iterations, vec![0]);

    let mut untoleranced = ConvergenceMonitor::new(None, 1);
    assert!(!untoleranced.record_residuals(0.0, 0.0));
  }
}
