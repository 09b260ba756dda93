use crate::error::GeodesicError;

/// ADMM step size $r$ used when none is given.
pub const DEFAULT_PENALTY: f64 = 1.0;
/// Allowed deviation of a boundary measure's total mass from one.
pub const DEFAULT_MEASURE_TOLERANCE: f64 = 1e-6;
/// Without detailed study the objective is evaluated every this many iterations.
pub const OBJECTIVE_STRIDE: usize = 10;

/// Parameters of a geodesic computation.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
  /// Number of time slices $N$ of the density.
  pub ntime: usize,
  /// Congestion coefficient $c >= 0$ of the penalty $c/2 integral rho^2$.
  pub congestion: f64,
  /// Weight $epsilon >= 0$ of the spatial stiffness added to the potential system.
  pub eps: f64,
  /// Number of ADMM iterations.
  pub niterations: usize,
  /// Record the objective at every iteration instead of every tenth.
  pub detail_study: bool,
  /// ADMM penalty (step size) $r > 0$.
  pub penalty: f64,
  /// Stop early once both residuals drop below this value.
  pub tolerance: Option<f64>,
  pub measure_tolerance: f64,
}

impl SolverConfig {
  pub fn new(
    ntime: usize,
    congestion: f64,
    eps: f64,
    niterations: usize,
    detail_study: bool,
  ) -> Self {
    Self {
      ntime,
      congestion,
      eps,
      niterations,
      detail_study,
      penalty: DEFAULT_PENALTY,
      tolerance: None,
      measure_tolerance: DEFAULT_MEASURE_TOLERANCE,
    }
  }

  pub fn with_penalty(mut self, penalty: f64) -> Self {
    self.penalty = penalty;
    self
  }
  pub fn with_tolerance(mut self, tolerance: f64) -> Self {
    self.tolerance = Some(tolerance);
    self
  }
  pub fn with_measure_tolerance(mut self, measure_tolerance: f64) -> Self {
    self.measure_tolerance = measure_tolerance;
    self
  }

  pub fn records_objective(&self, iteration: usize) -> bool {
    self.detail_study || iteration % OBJECTIVE_STRIDE == 0
  }

  pub fn validate(&self) -> Result<(), GeodesicError> {
    if self.ntime == 0 {
      return Err(GeodesicError::invalid_config("number of time slices must be positive"));
    }
    if self.niterations == 0 {
      return Err(GeodesicError::invalid_config("number of iterations must be positive"));
    }
    let nonnegative = [
      ("congestion", self.congestion),
      ("eps", self.eps),
      ("measure tolerance", self.measure_tolerance),
    ];
    for (name, value) in nonnegative {
      if !(value.is_finite() && value >= 0.0) {
        return Err(GeodesicError::invalid_config(format!(
          "{name} must be finite and nonnegative, got {value}"
        )));
      }
    }
    if !(self.penalty.is_finite() && self.penalty > 0.0) {
      return Err(GeodesicError::invalid_config(format!(
        "penalty must be finite and positive, got {}",
        self.penalty
      )));
    }
    if self.measure_tolerance >= 1.0 {
      return Err(GeodesicError::invalid_config(format!(
        "measure tolerance must be below 1, got {}",
        self.measure_tolerance
      )));
    }
    if let Some(tolerance) = self.tolerance {
      if !(tolerance.is_finite() && tolerance > 0.0) {
        return Err(GeodesicError::invalid_config(format!(
          "tolerance must be finite and positive, got {tolerance}"
        )));
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn defaults() {
    let config = SolverConfig::new(31, 0.1, 0.0, 1000, false);
    assert_eq!(config.penalty, DEFAULT_PENALTY);
    assert_eq!(config.tolerance, None);
    assert!(config.validate().is_ok());
    assert!(config.records_objective(0));
    assert!(!config.records_objective(5));
    assert!(config.records_objective(20));
    assert!(SolverConfig::new(2, 0.0, 0.0, 3, true).records_objective(1));
  }

  #[test]
  fn rejects_invalid() {
    let invalid = [
      SolverConfig::new(0, 0.0, 0.0, 10, false),
      SolverConfig::new(4, 0.0, 0.0, 0, false),
      SolverConfig::new(4, -1.0, 0.0, 10, false),
      SolverConfig::new(4, 0.0, f64::NAN, 10, false),
      SolverConfig::new(4, 0.0, 0.0, 10, false).with_penalty(0.0),
      SolverConfig::new(4, 0.0, 0.0, 10, false).with_tolerance(-1e-3),
      SolverConfig::new(4, 0.0, 0.0, 10, false).with_measure_tolerance(1.0),
    ];
    for config in invalid {
      assert!(matches!(
        config.validate(),
        Err(GeodesicError::InvalidConfig { .. })
      ));
    }
  }
}
