//! Geometric weights of a triangulated surface, computed once per mesh.

use crate::{Coord, MeshError, SurfaceMesh, SurfaceTopology, TriangleIdx, VertexIdx};

use rayon::prelude::*;

/// Relative threshold below which a triangle counts as degenerate:
/// $|T| <= "DEGENERACY_TOLERANCE" h_T^2$ with $h_T$ the longest edge.
pub const DEGENERACY_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone)]
struct TriangleGeometry {
  area: f64,
  angles: [f64; 3],
  gradients: [Coord; 3],
  normal: Coord,
  diameter: f64,
}

/// The surface mesh together with per-triangle and per-vertex geometric weights.
///
/// - triangle areas $|T|$
/// - corner angles
/// - barycentric gradients $nabla lambda_j$, tangent to the triangle
/// - vertex areas $|v| = sum_(T in.rev v) |T|/3$
#[derive(Debug, Clone)]
pub struct SurfaceGeometry {
  mesh: SurfaceMesh,
  triangles: Vec<TriangleGeometry>,
  vertex_areas: Vec<f64>,
  total_area: f64,
}

impl SurfaceGeometry {
  pub fn new(mesh: SurfaceMesh) -> Result<Self, MeshError> {
    let triangles = (0..mesh.ntriangles())
      .into_par_iter()
      .map(|itriangle| triangle_geometry(itriangle, mesh.triangle_coords(itriangle)))
      .collect::<Result<Vec<_>, _>>()?;

    let mut vertex_areas = vec![0.0; mesh.nvertices()];
    for (triangle, geo) in mesh.triangles().iter().zip(&triangles) {
      for &v in triangle {
        vertex_areas[v] += geo.area / 3.0;
      }
    }
    if let Some(ivertex) = vertex_areas.iter().position(|&a| a <= 0.0) {
      return Err(MeshError::IsolatedVertex { ivertex });
    }

    let total_area = triangles.iter().map(|t| t.area).sum();

    let this = Self {
      mesh,
      triangles,
      vertex_areas,
      total_area,
    };
    tracing::debug!(
      "surface geometry: {} vertices, {} triangles, area {:.4e}, min angle {:.2}°",
      this.nvertices(),
      this.ntriangles(),
      this.total_area,
      this.min_angle().to_degrees(),
    );
    Ok(this)
  }

  pub fn mesh(&self) -> &SurfaceMesh {
    &self.mesh
  }
  pub fn topology(&self) -> &SurfaceTopology {
    self.mesh.topology()
  }
  pub fn nvertices(&self) -> usize {
    self.mesh.nvertices()
  }
  pub fn ntriangles(&self) -> usize {
    self.mesh.ntriangles()
  }

  pub fn triangle_area(&self, itriangle: TriangleIdx) -> f64 {
    self.triangles[itriangle].area
  }
  pub fn triangle_areas(&self) -> impl ExactSizeIterator<Item = f64> + '_ {
    self.triangles.iter().map(|t| t.area)
  }
  /// Interior angles at the three corners, in radians.
  pub fn corner_angles(&self, itriangle: TriangleIdx) -> &[f64; 3] {
    &self.triangles[itriangle].angles
  }
  /// Gradients of the three barycentric coordinate functions.
  ///
  /// They are tangent to the triangle and sum to zero.
  pub fn barycentric_gradients(&self, itriangle: TriangleIdx) -> &[Coord; 3] {
    &self.triangles[itriangle].gradients
  }
  /// Unit normal, following the vertex orientation.
  pub fn triangle_normal(&self, itriangle: TriangleIdx) -> &Coord {
    &self.triangles[itriangle].normal
  }

  pub fn vertex_area(&self, ivertex: VertexIdx) -> f64 {
    self.vertex_areas[ivertex]
  }
  pub fn vertex_areas(&self) -> &[f64] {
    &self.vertex_areas
  }
  pub fn total_area(&self) -> f64 {
    self.total_area
  }

  /// Area of every connected component.
  pub fn component_areas(&self) -> Vec<f64> {
    let topology = self.topology();
    let mut areas = vec![0.0; topology.ncomponents()];
    for (ivertex, &icomponent) in topology.vertex_components().iter().enumerate() {
      areas[icomponent] += self.vertex_areas[ivertex];
    }
    areas
  }

  /// The mesh width $h_max$, equal to the largest diameter of all triangles.
  pub fn mesh_width_max(&self) -> f64 {
    self
      .triangles
      .iter()
      .map(|t| t.diameter)
      .fold(0.0, f64::max)
  }

  pub fn min_angle(&self) -> f64 {
    self
      .triangles
      .iter()
      .flat_map(|t| t.angles)
      .fold(f64::INFINITY, f64::min)
  }
}

fn triangle_geometry(itriangle: TriangleIdx, p: [Coord; 3]) -> Result<TriangleGeometry, MeshError> {
  // edge opposite to corner j
  let edges = [p[2] - p[1], p[0] - p[2], p[1] - p[0]];
  let diameter = edges.iter().map(|e| e.norm()).fold(0.0, f64::max);

  let cross = (p[1] - p[0]).cross(&(p[2] - p[0]));
  let area = 0.5 * cross.norm();
  if !(area > DEGENERACY_TOLERANCE * diameter * diameter) {
    return Err(MeshError::DegenerateTriangle { itriangle, area });
  }
  let normal = cross / (2.0 * area);

  let gradients = edges.map(|e| normal.cross(&e) / (2.0 * area));

  let angles = std::array::from_fn(|j| {
    let u = p[(j + 1) % 3] - p[j];
    let v = p[(j + 2) % 3] - p[j];
    u.cross(&v).norm().atan2(u.dot(&v))
  });

  Ok(TriangleGeometry {
    area,
    angles,
    gradients,
    normal,
    diameter,
  })
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::gen;

  use approx::assert_relative_eq;

  #[test]
  fn reference_triangle() {
    let coords = vec![Coord::zeros(), Coord::x(), Coord::y()];
    let mesh = SurfaceMesh::new(coords, vec![[0, 1, 2]]).unwrap();
    let geometry = SurfaceGeometry::new(mesh).unwrap();

    assert_relative_eq!(geometry.triangle_area(0), 0.5);
    assert_relative_eq!(*geometry.triangle_normal(0), Coord::z());

    let [g0, g1, g2] = *geometry.barycentric_gradients(0);
    assert_relative_eq!(g0, Coord::new(-1.0, -1.0, 0.0), epsilon = 1e-14);
    assert_relative_eq!(g1, Coord::new(1.0, 0.0, 0.0), epsilon = 1e-14);
    assert_relative_eq!(g2, Coord::new(0.0, 1.0, 0.0), epsilon = 1e-14);

    let angles = geometry.corner_angles(0);
    assert_relative_eq!(angles[0], std::f64::consts::FRAC_PI_2, epsilon = 1e-14);
    assert_relative_eq!(angles[1], std::f64::consts::FRAC_PI_4, epsilon = 1e-14);
    assert_relative_eq!(angles.iter().sum::<f64>(), std::f64::consts::PI, epsilon = 1e-14);

    for ivertex in 0..3 {
      assert_relative_eq!(geometry.vertex_area(ivertex), 1.0 / 6.0);
    }
  }

  #[test]
  fn gradients_are_dual_to_edges() {
    let geometry = SurfaceGeometry::new(gen::sphere(1)).unwrap();
    for itriangle in 0..geometry.ntriangles() {
      let p = geometry.mesh().triangle_coords(itriangle);
      let grads = geometry.barycentric_gradients(itriangle);
      let normal = geometry.triangle_normal(itriangle);

      let sum: Coord = grads.iter().sum();
      assert_relative_eq!(sum.norm(), 0.0, epsilon = 1e-12);
      for i in 0..3 {
        assert_relative_eq!(grads[i].dot(normal), 0.0, epsilon = 1e-12);
        for j in 0..3 {
          // $nabla lambda_i dot (p_j - p_k) = delta_(i j) - delta_(i k)$
          let k = (j + 1) % 3;
          let expected = (i == j) as i32 as f64 - (i == k) as i32 as f64;
          assert_relative_eq!(grads[i].dot(&(p[j] - p[k])), expected, epsilon = 1e-10);
        }
      }
    }
  }

  #[test]
  fn areas_sum_up() {
    let geometry = SurfaceGeometry::new(gen::unit_square(4)).unwrap();
    assert_relative_eq!(geometry.total_area(), 1.0, epsilon = 1e-14);
    assert_relative_eq!(geometry.vertex_areas().iter().sum::<f64>(), 1.0, epsilon = 1e-14);
    assert_relative_eq!(geometry.mesh_width_max(), 2f64.sqrt() / 4.0, epsilon = 1e-14);
    assert_relative_eq!(geometry.min_angle(), std::f64::consts::FRAC_PI_4, epsilon = 1e-12);
    assert_eq!(geometry.component_areas().len(), 1);

    let sphere = SurfaceGeometry::new(gen::sphere(3)).unwrap();
    let area = sphere.total_area();
    assert!(area < 4.0 * std::f64::consts::PI && area > 0.95 * 4.0 * std::f64::consts::PI);
    for itriangle in 0..sphere.ntriangles() {
      let centroid: Coord = sphere.mesh().triangle_coords(itriangle).iter().sum::<Coord>() / 3.0;
      assert!(sphere.triangle_normal(itriangle).dot(&centroid) > 0.0);
    }
  }

  #[test]
  fn degenerate_triangle() {
    let coords = vec![
      Coord::zeros(),
      Coord::new(1.0, 0.0, 0.0),
      Coord::new(2.0, 0.0, 0.0),
      Coord::new(0.0, 1.0, 0.0),
    ];
    let mesh = SurfaceMesh::new(coords, vec![[0, 3, 1], [0, 1, 2]]).unwrap();
    assert!(matches!(
      SurfaceGeometry::new(mesh),
      Err(MeshError::DegenerateTriangle { itriangle: 1, .. })
    ));
  }

  #[test]
  fn isolated_vertex() {
    let coords = vec![Coord::zeros(), Coord::x(), Coord::y(), Coord::z()];
    let mesh = SurfaceMesh::new(coords, vec![[0, 1, 2]]).unwrap();
    assert_eq!(
      SurfaceGeometry::new(mesh).unwrap_err(),
      MeshError::IsolatedVertex { ivertex: 3 }
    );
  }
}
