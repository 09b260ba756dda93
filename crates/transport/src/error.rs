use crate::measure::MeasureRole;

use manifold::{MeshError, TriangleIdx};

/// Pipeline stage in which a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  Build,
  Validate,
  Project,
  Prox,
}
impl std::fmt::Display for Stage {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      Stage::Build => "build",
      Stage::Validate => "validate",
      Stage::Project => "project",
      Stage::Prox => "prox",
    };
    f.write_str(name)
  }
}

/// All errors are fatal for the run. No partial results are returned.
#[derive(thiserror::Error, Debug)]
pub enum GeodesicError {
  #[error("degenerate mesh: {0}")]
  DegenerateMesh(#[from] MeshError),
  #[error("invalid configuration: {reason}")]
  InvalidConfig { reason: String },
  #[error("invalid {which} measure: {reason}")]
  InvalidMeasure { which: MeasureRole, reason: String },
  #[error("singular potential system in {stage} stage{}: {reason}", fmt_iteration(.iteration))]
  SingularSystem {
    stage: Stage,
    iteration: Option<usize>,
    reason: String,
  },
  #[error(
    "numerical instability in proximal step at iteration {iteration}, time slice {itime}, triangle {itriangle}"
  )]
  NumericalInstability {
    iteration: usize,
    itime: usize,
    itriangle: TriangleIdx,
  },
}

impl GeodesicError {
  pub fn stage(&self) -> Stage {
    match self {
      Self::DegenerateMesh(_) => Stage::Build,
      Self::InvalidConfig { .. } | Self::InvalidMeasure { .. } => Stage::Validate,
      Self::SingularSystem { stage, .. } => *stage,
      Self::NumericalInstability { .. } => Stage::Prox,
    }
  }

  pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
    Self::InvalidConfig {
      reason: reason.into(),
    }
  }
  pub(crate) fn invalid_measure(which: MeasureRole, reason: impl Into<String>) -> Self {
    Self::InvalidMeasure {
      which,
      reason: reason.into(),
    }
  }
}

fn fmt_iteration(iteration: &Option<usize>) -> String {
  iteration
    .map(|k| format!(" at iteration {k}"))
    .unwrap_or_default()
}
