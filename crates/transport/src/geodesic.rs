//! The ADMM loop: a solver state machine and the `geodesic` entry point.

use crate::{
  config::SolverConfig,
  error::GeodesicError,
  field::TimeCellField,
  measure::{self, BoundaryMeasure, MeasureRole},
  monitor::{self, ConvergenceMonitor, Diagnostics},
  operators::{self, SpaceTimeOperator},
  projection::{self, PotentialSolver},
  prox,
  state::AdmmState,
};

use common::linalg::nalgebra::{self as linalg, Matrix, Vector};
use manifold::SurfaceGeometry;

use std::path::Path;

/// Progress of a [`GeodesicSolver`].
///
/// Constructing the solver is the transition out of `Uninitialized`, so a
/// solver is first observed in `OperatorsBuilt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Uninitialized,
  OperatorsBuilt,
  /// The given number of iterations has been completed.
  Iterating(usize),
  Done,
}

pub struct GeodesicSolver<'g> {
  geometry: &'g SurfaceGeometry,
  config: SolverConfig,
  phase: Phase,
  operator: SpaceTimeOperator,
  potential: PotentialSolver,
  boundary_source: Vector,
  state: AdmmState,
  monitor: ConvergenceMonitor,
}

impl<'g> GeodesicSolver<'g> {
  /// Validates the inputs, assembles the space-time operators and factorizes
  /// the potential system.
  pub fn new(
    geometry: &'g SurfaceGeometry,
    mub0: &[f64],
    mub1: &[f64],
    config: SolverConfig,
  ) -> Result<Self, GeodesicError> {
    config.validate()?;

    let nvertices = geometry.nvertices();
    let tolerance = config.measure_tolerance;
    let source = BoundaryMeasure::new(MeasureRole::Source, mub0, nvertices, tolerance)?;
    let target = BoundaryMeasure::new(MeasureRole::Target, mub1, nvertices, tolerance)?;
    measure::check_component_balance(&source, &target, geometry.topology(), tolerance)?;

    let operator = SpaceTimeOperator::new(geometry, config.ntime);
    let potential = PotentialSolver::new(&operator, geometry.topology(), config.eps)?;
    let boundary_source = operators::boundary_source(operator.layout(), &source, &target);
    let state = AdmmState::new(geometry, &operator, &source, &target);
    let monitor = ConvergenceMonitor::new(config.tolerance, config.niterations);

    tracing::info!(
      "geodesic solver ready: {} time slices, {} vertices, {} triangles, c = {}, eps = {}, r = {}",
      config.ntime,
      nvertices,
      geometry.ntriangles(),
      config.congestion,
      config.eps,
      config.penalty,
    );

    Ok(Self {
      geometry,
      config,
      phase: Phase::OperatorsBuilt,
      operator,
      potential,
      boundary_source,
      state,
      monitor,
    })
  }

  pub fn geometry(&self) -> &'g SurfaceGeometry {
    self.geometry
  }
  pub fn config(&self) -> &SolverConfig {
    &self.config
  }
  pub fn phase(&self) -> Phase {
    self.phase
  }
  pub fn operator(&self) -> &SpaceTimeOperator {
    &self.operator
  }
  pub fn state(&self) -> &AdmmState {
    &self.state
  }
  pub fn diagnostics(&self) -> &Diagnostics {
    self.monitor.diagnostics()
  }

  /// Runs one ADMM iteration: projection, proximal step, dual update and
  /// monitoring. Does nothing once the solver is done.
  ///
  /// Any error leaves the iterate corrupted, the solver must not be stepped again.
  pub fn step(&mut self) -> Result<Phase, GeodesicError> {
    let iteration = match self.phase {
      Phase::Uninitialized | Phase::OperatorsBuilt => 0,
      Phase::Iterating(k) => k,
      Phase::Done => return Ok(Phase::Done),
    };
    let penalty = self.config.penalty;

    let a_old = self.state.a.clone();
    let b_old = self.state.b.clone();

    let projection = projection::project(
      &mut self.state,
      &self.operator,
      &self.potential,
      &self.boundary_source,
      penalty,
      iteration,
    )?;

    prox::prox_step(
      &mut self.state,
      self.operator.layout(),
      &projection.lambda_a,
      &projection.lambda_b,
      self.config.congestion,
      penalty,
      iteration,
    )?;

    self
      .state
      .update_multipliers(&projection.lambda_a, &projection.lambda_b, penalty);

    let dual_residual = monitor::dual_residual(
      &self.operator,
      (&a_old, &b_old),
      (&self.state.a, &self.state.b),
      penalty,
    );
    let converged = self
      .monitor
      .record_residuals(projection.primal_residual, dual_residual);

    if self.config.records_objective(iteration) {
      let objective = monitor::objective(
        &self.operator,
        &self.state.density,
        &self.state.momentum,
        self.config.congestion,
      );
      self.monitor.record_objective(iteration, objective);
      tracing::debug!(
        "iteration {iteration}: primal residual {:.3e}, dual residual {dual_residual:.3e}, objective {objective:.6e}",
        projection.primal_residual,
      );
    } else {
      tracing::trace!(
        "iteration {iteration}: primal residual {:.3e}, dual residual {dual_residual:.3e}",
        projection.primal_residual,
      );
    }

    let ncompleted = iteration + 1;
    self.phase = if converged {
      tracing::info!("residuals below tolerance after {ncompleted} iterations");
      Phase::Done
    } else if ncompleted == self.config.niterations {
      Phase::Done
    } else {
      Phase::Iterating(ncompleted)
    };
    Ok(self.phase)
  }

  /// Iterates until done and returns the final fields.
  pub fn run(mut self) -> Result<Geodesic, GeodesicError> {
    let timer = std::time::Instant::now();
    while self.step()? != Phase::Done {}
    tracing::info!(
      "finished {} iterations in {:.2?}",
      self.diagnostics().niterations(),
      timer.elapsed()
    );
    Ok(self.into_geodesic())
  }

  fn into_geodesic(self) -> Geodesic {
    let layout = *self.operator.layout();
    let phi = Matrix::from_row_slice(
      layout.ninstants(),
      layout.nvertices(),
      self.state.phi.as_slice(),
    );
    let mu = self.operator.vertex_masses(&self.state.density);
    Geodesic {
      phi,
      mu,
      a: TimeCellField::from_layout(&layout, 3, &self.state.a),
      b: TimeCellField::from_layout(&layout, 3, &self.state.b),
      e: TimeCellField::from_layout(&layout, 3, &self.state.e),
      density: TimeCellField::from_layout(&layout, 3, &self.state.density),
      momentum: TimeCellField::from_layout(&layout, 3, &self.state.momentum),
      diagnostics: self.monitor.into_diagnostics(),
    }
  }
}

/// Result of a geodesic computation.
#[derive(Debug, Clone)]
pub struct Geodesic {
  /// Potential at the instants $t_i = i / N$, one row per instant.
  pub phi: Matrix,
  /// Vertex masses of the density at the time centers, one row per time slice.
  pub mu: Matrix,
  /// Consensus variable for the time derivative, one value per cell corner.
  pub a: TimeCellField,
  /// Consensus variable for the gradient, three components per cell.
  pub b: TimeCellField,
  /// Epigraph variable of the congestion cost, one value per cell corner.
  pub e: TimeCellField,
  /// Corner densities, satisfying the continuity equation with `momentum`.
  pub density: TimeCellField,
  pub momentum: TimeCellField,
  pub diagnostics: Diagnostics,
}

impl Geodesic {
  pub fn ntime(&self) -> usize {
    self.mu.nrows()
  }
  pub fn objective_value(&self) -> &[f64] {
    &self.diagnostics.objective
  }
  pub fn primal_residual(&self) -> &[f64] {
    &self.diagnostics.primal_residual
  }
  pub fn dual_residual(&self) -> &[f64] {
    &self.diagnostics.dual_residual
  }

  /// Vertex masses of time slice `itime`.
  pub fn mu_slice(&self, itime: usize) -> Vector {
    self.mu.row(itime).transpose()
  }

  pub fn save_mu(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
    linalg::save_matrix(&self.mu, path)
  }
  pub fn save_phi(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
    linalg::save_matrix(&self.phi, path)
  }
}

/// Computes the congested transport geodesic between `mub0` and `mub1`.
pub fn geodesic(
  geometry: &SurfaceGeometry,
  mub0: &[f64],
  mub1: &[f64],
  config: &SolverConfig,
) -> Result<Geodesic, GeodesicError> {
  GeodesicSolver::new(geometry, mub0, mub1, config.clone())?.run()
}
