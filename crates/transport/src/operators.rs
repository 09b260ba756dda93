//! Discrete space-time operators, assembled once per run.
//!
//! The linear map $Lambda phi = (D_t phi, G phi)$ takes the potential on the
//! staggered instants to the consensus space on cells:
//! - $D_t$: per corner time derivative $(phi_(k+1)(v_j) - phi_k(v_j)) / "dt"$
//! - $G$: per cell surface gradient of the time average $(phi_k + phi_(k+1)) / 2$
//!
//! The consensus space carries the inner product with weights
//! $W_A = "dt" |T| / 3$ per corner and $W_B = "dt" |T|$ per gradient component,
//! under which $Lambda^T W$ is the discrete divergence of the continuity equation.
//!
//! The regularization $K$ is the surface stiffness matrix at every instant,
//! $K_(i a, i b) = "dt" sum_T |T| nabla lambda_a dot nabla lambda_b$.
//! It has the per-instant constants as kernel, so it never moves mass between
//! instants.

use crate::{layout::SpaceTimeLayout, measure::BoundaryMeasure};

use common::{
  linalg::nalgebra::{weighted_norm_squared, CsrMatrix, Matrix, Vector},
  sparse::SparseMatrix,
};
use manifold::{SurfaceGeometry, Triangle};

use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct SpaceTimeOperator {
  layout: SpaceTimeLayout,
  triangles: Vec<Triangle>,
  time_derivative: CsrMatrix,
  time_derivative_t: CsrMatrix,
  gradient: CsrMatrix,
  gradient_t: CsrMatrix,
  weights_a: Vector,
  weights_b: Vector,
  cell_weights: Vector,
  laplacian: CsrMatrix,
  regularization: CsrMatrix,
}

impl SpaceTimeOperator {
  pub fn new(geometry: &SurfaceGeometry, ntime: usize) -> Self {
    let layout = SpaceTimeLayout::new(ntime, geometry.nvertices(), geometry.ntriangles());
    let triangles = geometry.mesh().triangles().to_vec();

    let time_derivative = assemble_time_derivative(&layout, &triangles);
    let gradient = assemble_gradient(&layout, geometry);

    let dt = layout.dt();
    let cell_weights = Vector::from_fn(layout.ncells(), |icell, _| {
      let (_, itriangle) = layout.cell_time_triangle(icell);
      dt * geometry.triangle_area(itriangle)
    });
    let weights_a = Vector::from_fn(layout.ncorners(), |i, _| cell_weights[i / 3] / 3.0);
    let weights_b = Vector::from_fn(layout.ncorners(), |i, _| cell_weights[i / 3]);

    // $Lambda^T W Lambda = D_t^T W_A D_t + G^T W_B G$
    let weighted_time_derivative = time_derivative.mul_left_by_diagonal(&weights_a);
    let weighted_gradient = gradient.mul_left_by_diagonal(&weights_b);

    let time_derivative = time_derivative.to_nalgebra_csr();
    let gradient = gradient.to_nalgebra_csr();
    let time_derivative_t = time_derivative.transpose();
    let gradient_t = gradient.transpose();

    let laplacian = &time_derivative_t * &weighted_time_derivative.to_nalgebra_csr()
      + &gradient_t * &weighted_gradient.to_nalgebra_csr();

    let regularization = assemble_regularization(&layout, geometry).to_nalgebra_csr();

    tracing::info!(
      "assembled space-time operators: {} potentials, {} cells, laplacian nnz {}",
      layout.nphi(),
      layout.ncells(),
      laplacian.nnz(),
    );

    Self {
      layout,
      triangles,
      time_derivative,
      time_derivative_t,
      gradient,
      gradient_t,
      weights_a,
      weights_b,
      cell_weights,
      laplacian,
      regularization,
    }
  }

  pub fn layout(&self) -> &SpaceTimeLayout {
    &self.layout
  }
  pub fn triangles(&self) -> &[Triangle] {
    &self.triangles
  }
  pub fn time_derivative(&self) -> &CsrMatrix {
    &self.time_derivative
  }
  pub fn gradient(&self) -> &CsrMatrix {
    &self.gradient
  }
  /// $Lambda^T W Lambda$, symmetric positive semi-definite with the
  /// per-component constants as kernel.
  pub fn laplacian(&self) -> &CsrMatrix {
    &self.laplacian
  }
  /// The spatial stiffness $K$ at every instant.
  pub fn regularization(&self) -> &CsrMatrix {
    &self.regularization
  }
  pub fn weights_a(&self) -> &Vector {
    &self.weights_a
  }
  pub fn weights_b(&self) -> &Vector {
    &self.weights_b
  }
  /// $"dt" |T|$ for every cell.
  pub fn cell_weights(&self) -> &Vector {
    &self.cell_weights
  }

  /// $Lambda phi = (D_t phi, G phi)$
  pub fn apply(&self, phi: &Vector) -> (Vector, Vector) {
    (&self.time_derivative * phi, &self.gradient * phi)
  }

  /// $Lambda^T W (a, b) = D_t^T W_A a + G^T W_B b$
  pub fn adjoint(&self, a: &Vector, b: &Vector) -> Vector {
    &self.time_derivative_t * &a.component_mul(&self.weights_a)
      + &self.gradient_t * &b.component_mul(&self.weights_b)
  }

  /// $||(a, b)||_W^2$
  pub fn weighted_norm_squared(&self, a: &Vector, b: &Vector) -> f64 {
    weighted_norm_squared(a, &self.weights_a) + weighted_norm_squared(b, &self.weights_b)
  }

  /// Lumps corner densities to vertex masses:
  /// $mu_k(v) = sum_((T, j): v_j = v) |T|/3 rho_(k,T,j)$.
  ///
  /// Returns a `ntime x nvertices` matrix.
  pub fn vertex_masses(&self, corner_densities: &Vector) -> Matrix {
    let layout = &self.layout;
    assert_eq!(corner_densities.len(), layout.ncorners());

    let dt = layout.dt();
    let mut masses = Matrix::zeros(layout.ntime(), layout.nvertices());
    for itime in 0..layout.ntime() {
      for (itriangle, triangle) in self.triangles.iter().enumerate() {
        for (ilocal, &ivertex) in triangle.iter().enumerate() {
          let icorner = layout.corner_idx(itime, itriangle, ilocal);
          masses[(itime, ivertex)] += self.weights_a[icorner] / dt * corner_densities[icorner];
        }
      }
    }
    masses
  }
}

/// The source term $g$ of the continuity equation: $g_0 = mu_0$, $g_N = -mu_1$.
pub fn boundary_source(
  layout: &SpaceTimeLayout,
  source: &BoundaryMeasure,
  target: &BoundaryMeasure,
) -> Vector {
  let mut g = Vector::zeros(layout.nphi());
  for ivertex in 0..layout.nvertices() {
    g[layout.phi_idx(0, ivertex)] = source.masses()[ivertex];
    g[layout.phi_idx(layout.ntime(), ivertex)] = -target.masses()[ivertex];
  }
  g
}

fn assemble_time_derivative(layout: &SpaceTimeLayout, triangles: &[Triangle]) -> SparseMatrix {
  let dt_inv = 1.0 / layout.dt();
  let triplets: Vec<(usize, usize, f64)> = (0..triangles.len())
    .into_par_iter()
    .flat_map_iter(|itriangle| {
      let triangle = triangles[itriangle];
      let mut local_triplets = Vec::with_capacity(6 * layout.ntime());
      for itime in 0..layout.ntime() {
        for (ilocal, &ivertex) in triangle.iter().enumerate() {
          let row = layout.corner_idx(itime, itriangle, ilocal);
          local_triplets.push((row, layout.phi_idx(itime + 1, ivertex), dt_inv));
          local_triplets.push((row, layout.phi_idx(itime, ivertex), -dt_inv));
        }
      }
      local_triplets
    })
    .collect();
  SparseMatrix::new(layout.ncorners(), layout.nphi(), triplets)
}

fn assemble_gradient(layout: &SpaceTimeLayout, geometry: &SurfaceGeometry) -> SparseMatrix {
  let triplets: Vec<(usize, usize, f64)> = (0..geometry.ntriangles())
    .into_par_iter()
    .flat_map_iter(|itriangle| {
      let triangle = geometry.topology().triangle(itriangle);
      let gradients = geometry.barycentric_gradients(itriangle);
      let mut local_triplets = Vec::with_capacity(18 * layout.ntime());
      for itime in 0..layout.ntime() {
        for icomp in 0..3 {
          let row = layout.corner_idx(itime, itriangle, icomp);
          for (ilocal, &ivertex) in triangle.iter().enumerate() {
            let value = 0.5 * gradients[ilocal][icomp];
            if value != 0.0 {
              local_triplets.push((row, layout.phi_idx(itime, ivertex), value));
              local_triplets.push((row, layout.phi_idx(itime + 1, ivertex), value));
            }
          }
        }
      }
      local_triplets
    })
    .collect();
  SparseMatrix::new(layout.ncorners(), layout.nphi(), triplets)
}

fn assemble_regularization(layout: &SpaceTimeLayout, geometry: &SurfaceGeometry) -> SparseMatrix {
  let dt = layout.dt();
  let triplets: Vec<(usize, usize, f64)> = (0..geometry.ntriangles())
    .into_par_iter()
    .flat_map_iter(|itriangle| {
      let triangle = geometry.topology().triangle(itriangle);
      let gradients = geometry.barycentric_gradients(itriangle);
      let weight = dt * geometry.triangle_area(itriangle);
      let mut local_triplets = Vec::with_capacity(9 * layout.ninstants());
      for iinstant in 0..layout.ninstants() {
        for (ilocal, &ivertex) in triangle.iter().enumerate() {
          for (jlocal, &jvertex) in triangle.iter().enumerate() {
            local_triplets.push((
              layout.phi_idx(iinstant, ivertex),
              layout.phi_idx(iinstant, jvertex),
              weight * gradients[ilocal].dot(&gradients[jlocal]),
            ));
          }
        }
      }
      local_triplets
    })
    .collect();
  SparseMatrix::new(layout.nphi(), layout.nphi(), triplets)
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::measure::MeasureRole;

  use approx::assert_relative_eq;
  use common::linalg::nalgebra::{csr_bitwise_eq, quadratic_form_sparse};
  use manifold::gen;

  fn square_operator(ntime: usize) -> (SurfaceGeometry, SpaceTimeOperator) {
    let geometry = SurfaceGeometry::new(gen::unit_square(2)).unwrap();
    let operator = SpaceTimeOperator::new(&geometry, ntime);
    (geometry, operator)
  }

  #[test]
  fn linear_potential() {
    // $phi(t, x) = 2 t + 3 x - y$ has $D_t phi = 2$ and $G phi = (3, -1, 0)$.
    let (geometry, operator) = square_operator(4);
    let layout = *operator.layout();
    let coords = geometry.mesh().coords();
    let phi = Vector::from_fn(layout.nphi(), |i, _| {
      let (iinstant, ivertex) = (i / layout.nvertices(), i % layout.nvertices());
      let p = coords[ivertex];
      2.0 * layout.instant(iinstant) + 3.0 * p.x - p.y
    });

    let (a, b) = operator.apply(&phi);
    for v in a.iter() {
      assert_relative_eq!(*v, 2.0, epsilon = 1e-12);
    }
    for cell in b.as_slice().chunks(3) {
      assert_relative_eq!(cell[0], 3.0, epsilon = 1e-12);
      assert_relative_eq!(cell[1], -1.0, epsilon = 1e-12);
      assert_relative_eq!(cell[2], 0.0, epsilon = 1e-12);
    }
  }

  #[test]
  fn constants_in_kernel() {
    let (_, operator) = square_operator(3);
    let phi = Vector::from_element(operator.layout().nphi(), 1.7);
    let (a, b) = operator.apply(&phi);
    assert_relative_eq!(a.norm(), 0.0, epsilon = 1e-12);
    assert_relative_eq!(b.norm(), 0.0, epsilon = 1e-12);
    assert_relative_eq!((operator.laplacian() * &phi).norm(), 0.0, epsilon = 1e-10);
  }

  #[test]
  fn regularization_is_spatial() {
    let (geometry, operator) = square_operator(3);
    let layout = *operator.layout();

    // a different constant at every instant
    let phi = Vector::from_fn(layout.nphi(), |i, _| (i / layout.nvertices()) as f64 - 1.3);
    assert_relative_eq!((operator.regularization() * &phi).norm(), 0.0, epsilon = 1e-12);

    // $phi = 3 x - y$ at every instant: $"dt" (N + 1) |Omega| |nabla phi|^2$
    let coords = geometry.mesh().coords();
    let phi = Vector::from_fn(layout.nphi(), |i, _| {
      let p = coords[i % layout.nvertices()];
      3.0 * p.x - p.y
    });
    let expected = layout.dt() * layout.ninstants() as f64 * geometry.total_area() * 10.0;
    assert_relative_eq!(
      quadratic_form_sparse(operator.regularization(), &phi),
      expected,
      epsilon = 1e-10
    );
  }

  #[test]
  fn adjoint_and_laplacian() {
    let (_, operator) = square_operator(3);
    let layout = *operator.layout();
    let phi = Vector::from_fn(layout.nphi(), |i, _| ((i * 7 % 11) as f64).cos());
    let a = Vector::from_fn(layout.ncorners(), |i, _| ((i * 5 % 13) as f64).sin());
    let b = Vector::from_fn(layout.ncorners(), |i, _| ((i * 3 % 17) as f64).cos());

    // $<Lambda phi, (a, b)>_W = <phi, Lambda^T W (a, b)>$
    let (lphi_a, lphi_b) = operator.apply(&phi);
    let lhs = lphi_a.component_mul(operator.weights_a()).dot(&a)
      + lphi_b.component_mul(operator.weights_b()).dot(&b);
    let rhs = phi.dot(&operator.adjoint(&a, &b));
    assert_relative_eq!(lhs, rhs, epsilon = 1e-10);

    let energy = operator.weighted_norm_squared(&lphi_a, &lphi_b);
    assert_relative_eq!(
      quadratic_form_sparse(operator.laplacian(), &phi),
      energy,
      epsilon = 1e-10
    );
  }

  #[test]
  fn weights_sum_to_space_time_volume() {
    let (geometry, operator) = square_operator(5);
    assert_relative_eq!(operator.cell_weights().sum(), geometry.total_area(), epsilon = 1e-14);
    assert_relative_eq!(operator.weights_a().sum(), geometry.total_area(), epsilon = 1e-14);
  }

  #[test]
  fn build_is_idempotent() {
    let geometry = SurfaceGeometry::new(gen::sphere(1)).unwrap();
    let first = SpaceTimeOperator::new(&geometry, 4);
    let second = SpaceTimeOperator::new(&geometry, 4);
    assert!(csr_bitwise_eq(first.time_derivative(), second.time_derivative()));
    assert!(csr_bitwise_eq(first.gradient(), second.gradient()));
    assert!(csr_bitwise_eq(first.laplacian(), second.laplacian()));
    assert!(csr_bitwise_eq(first.regularization(), second.regularization()));
    assert_eq!(first.weights_a(), second.weights_a());
  }

  #[test]
  fn continuity_of_uniform_masses() {
    // A static density has zero divergence, only the boundary terms remain.
    let (geometry, operator) = square_operator(3);
    let layout = *operator.layout();
    let masses: Vec<f64> = geometry.vertex_areas().to_vec();
    let source = BoundaryMeasure::new(MeasureRole::Source, &masses, layout.nvertices(), 1e-12).unwrap();
    let target = BoundaryMeasure::new(MeasureRole::Target, &masses, layout.nvertices(), 1e-12).unwrap();
    let g = boundary_source(&layout, &source, &target);

    let density = Vector::from_element(layout.ncorners(), 1.0);
    let momentum = Vector::zeros(layout.ncorners());
    let residual = operator.adjoint(&density, &momentum) + g;
    assert_relative_eq!(residual.norm(), 0.0, epsilon = 1e-14);

    let mu = operator.vertex_masses(&density);
    for itime in 0..layout.ntime() {
      for ivertex in 0..layout.nvertices() {
        assert_relative_eq!(mu[(itime, ivertex)], masses[ivertex], epsilon = 1e-15);
      }
    }
  }
}
