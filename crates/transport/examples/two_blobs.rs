//! Congested transport between two blobs on a surface.
//!
//! Usage: `two_blobs [mesh.off]`. Without a mesh a subdivided sphere is used.
//! Results are written to `out/`.

extern crate nalgebra as na;

use common::linalg::nalgebra::save_vector;
use manifold::{gen, io::off, Coord, SurfaceGeometry};
use transport::{
  geodesic,
  measure::{self, MeasureRole},
  SolverConfig,
};

fn main() {
  tracing_subscriber::fmt::init();

  let mesh = match std::env::args().nth(1) {
    Some(path) => off::read_off(&path).unwrap(),
    None => gen::sphere(3),
  };
  let geometry = SurfaceGeometry::new(mesh).unwrap();

  let north = Coord::new(0.0, 0.0, 1.0);
  let south = Coord::new(0.0, 0.0, -1.0);
  let blob_width = 0.4;
  let mub0 = measure::from_density(&geometry, MeasureRole::Source, |p| {
    measure::cut_off((p - north).norm(), blob_width)
  })
  .unwrap();
  let mub1 = measure::from_density(&geometry, MeasureRole::Target, |p| {
    measure::gaussian(p, &south, blob_width)
  })
  .unwrap();

  let ntime = 31;
  let congestion = 0.1;
  let eps = 0.0;
  let niterations = 500;
  let config = SolverConfig::new(ntime, congestion, eps, niterations, false);
  let result = geodesic(&geometry, &mub0, &mub1, &config).unwrap();

  let primal = result.primal_residual();
  let dual = result.dual_residual();
  println!(
    "residuals: primal {:.3e} -> {:.3e}, dual {:.3e} -> {:.3e}",
    primal[0],
    primal[primal.len() - 1],
    dual[0],
    dual[dual.len() - 1],
  );
  for (iteration, objective) in result
    .diagnostics
    .objective_iterations
    .iter()
    .zip(result.objective_value())
  {
    println!("{iteration:>5}: {objective:.6e}");
  }

  std::fs::create_dir_all("out").unwrap();
  off::write_off(geometry.mesh(), "out/two_blobs.off").unwrap();
  result.save_mu("out/two_blobs_mu.txt").unwrap();
  result.save_phi("out/two_blobs_phi.txt").unwrap();
  save_vector(
    &na::DVector::from_row_slice(primal),
    "out/two_blobs_primal_residual.txt",
  )
  .unwrap();
  save_vector(
    &na::DVector::from_row_slice(dual),
    "out/two_blobs_dual_residual.txt",
  )
  .unwrap();
}
