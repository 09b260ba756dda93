//! Projection step: the least-squares solve for the potential.
//!
//! Minimizes $<phi_0, mu_0> - <phi_N, mu_1> + r/2 ||Lambda phi - q + sigma/r||_W^2$
//! (plus $epsilon/2 phi^T K phi$), i.e. solves
//! $(Lambda^T W Lambda + epsilon K) phi = Lambda^T W q - (Lambda^T W sigma + g) / r$
//! with $K$ the spatial stiffness at every instant.

use crate::{
  error::{GeodesicError, Stage},
  layout::SpaceTimeLayout,
  operators::SpaceTimeOperator,
  state::AdmmState,
};

use common::{
  linalg::{faer::FaerCholesky, nalgebra::Vector},
  sparse::SparseMatrix,
  util,
};
use manifold::SurfaceTopology;

/// The factorized potential system, reused by every iteration.
pub struct PotentialSolver {
  cholesky: FaerCholesky,
  layout: SpaceTimeLayout,
  pinned: Vec<usize>,
}

impl PotentialSolver {
  /// Both $Lambda^T W Lambda$ and $K$ vanish on potentials that are constant
  /// on a connected component, so the potential of the smallest vertex of
  /// every component is fixed to zero at the first instant.
  pub fn new(
    operator: &SpaceTimeOperator,
    topology: &SurfaceTopology,
    eps: f64,
  ) -> Result<Self, GeodesicError> {
    let layout = *operator.layout();
    let mut system = SparseMatrix::from_csr(operator.laplacian());
    if eps > 0.0 {
      for (i, j, &v) in operator.regularization().triplet_iter() {
        system.push(i, j, eps * v);
      }
    }

    let pinned: Vec<_> = topology
      .component_representatives()
      .into_iter()
      .map(|ivertex| layout.phi_idx(0, ivertex))
      .collect();
    fix_dofs_zero(&pinned, &mut system);

    let cholesky =
      FaerCholesky::new(system.to_nalgebra_csr()).map_err(|reason| GeodesicError::SingularSystem {
        stage: Stage::Build,
        iteration: None,
        reason,
      })?;
    tracing::info!(
      "factorized potential system of size {} ({} pinned potentials)",
      cholesky.nrows(),
      pinned.len()
    );

    Ok(Self {
      cholesky,
      layout,
      pinned,
    })
  }

  pub fn pinned(&self) -> &[usize] {
    &self.pinned
  }

  pub fn solve(&self, mut rhs: Vector, iteration: usize) -> Result<Vector, GeodesicError> {
    for &i in &self.pinned {
      rhs[i] = 0.0;
    }
    let phi = self.cholesky.solve(&rhs);
    if let Some(i) = phi.iter().position(|v| !v.is_finite()) {
      let nvertices = self.layout.nvertices();
      return Err(GeodesicError::SingularSystem {
        stage: Stage::Project,
        iteration: Some(iteration),
        reason: format!(
          "non-finite potential at instant {}, vertex {}",
          i / nvertices,
          i % nvertices
        ),
      });
    }
    Ok(phi)
  }
}

/// Replaces the rows and columns of `dofs` by identity rows.
pub fn fix_dofs_zero(dofs: &[usize], system: &mut SparseMatrix) {
  let dof_flags = util::indicies_to_flags(dofs, system.nrows());
  system.set_zero(|i, j| dof_flags[i] || dof_flags[j]);
  for &idof in dofs {
    system.push(idof, idof, 1.0);
  }
}

/// $Lambda phi$ for the new potential.
pub struct Projection {
  pub lambda_a: Vector,
  pub lambda_b: Vector,
  /// $||Lambda^T W sigma + g||$ before the solve.
  pub primal_residual: f64,
}

/// Solves for the potential and stores the projected multipliers
/// $hat(sigma) = sigma + r (Lambda phi - q)$ as density and momentum.
pub fn project(
  state: &mut AdmmState,
  operator: &SpaceTimeOperator,
  solver: &PotentialSolver,
  boundary_source: &Vector,
  penalty: f64,
  iteration: usize,
) -> Result<Projection, GeodesicError> {
  let residual = operator.adjoint(&state.sigma_a, &state.sigma_b) + boundary_source;
  let primal_residual = residual.norm();

  let rhs = operator.adjoint(&state.a, &state.b) - residual / penalty;
  state.phi = solver.solve(rhs, iteration)?;

  let (lambda_a, lambda_b) = operator.apply(&state.phi);
  state.density = &state.sigma_a + penalty * (&lambda_a - &state.a);
  state.momentum = &state.sigma_b + penalty * (&lambda_b - &state.b);

  Ok(Projection {
    lambda_a,
    lambda_b,
    primal_residual,
  })
}
