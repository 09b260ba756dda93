use crate::{Coord, SurfaceMesh, Triangle, VertexIdx};

/// Converts the cartesian grid index `(i, j)` to the linear vertex index
/// of a grid with `nvertices_x` vertices per row.
pub fn cartesian_index2linear_index(i: usize, j: usize, nvertices_x: usize) -> VertexIdx {
  j * nvertices_x + i
}

/// Triangulated unit square $[0,1]^2$ in the plane $z = 0$ with
/// `nboxes_per_dim` boxes per side.
pub fn unit_square(nboxes_per_dim: usize) -> SurfaceMesh {
  rectangle(1.0, 1.0, nboxes_per_dim, nboxes_per_dim)
}

/// Triangulated rectangle $[0,w] times [0,h]$.
///
/// Vertex `(i, j)` has index `j * (nx + 1) + i`. Every box is split along its
/// diagonal into `[v00, v10, v11]` and `[v00, v11, v01]`, both counterclockwise.
pub fn rectangle(width: f64, height: f64, nx: usize, ny: usize) -> SurfaceMesh {
  assert!(nx > 0 && ny > 0, "Rectangle needs at least one box per side.");

  let nvertices_x = nx + 1;
  let mut coords = Vec::with_capacity(nvertices_x * (ny + 1));
  for j in 0..=ny {
    for i in 0..=nx {
      let x = width * i as f64 / nx as f64;
      let y = height * j as f64 / ny as f64;
      coords.push(Coord::new(x, y, 0.0));
    }
  }

  let mut triangles: Vec<Triangle> = Vec::with_capacity(2 * nx * ny);
  for j in 0..ny {
    for i in 0..nx {
      let v00 = cartesian_index2linear_index(i, j, nvertices_x);
      let v10 = cartesian_index2linear_index(i + 1, j, nvertices_x);
      let v01 = cartesian_index2linear_index(i, j + 1, nvertices_x);
      let v11 = cartesian_index2linear_index(i + 1, j + 1, nvertices_x);
      triangles.push([v00, v10, v11]);
      triangles.push([v00, v11, v01]);
    }
  }

  SurfaceMesh::new(coords, triangles).expect("Cartesian triangulation is a valid surface.")
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn single_box() {
    let mesh = unit_square(1);
    assert_eq!(mesh.nvertices(), 4);
    assert_eq!(mesh.triangles(), &[[0, 1, 3], [0, 3, 2]]);
    assert_eq!(*mesh.coord(3), Coord::new(1.0, 1.0, 0.0));
  }

  #[test]
  fn counts() {
    let mesh = rectangle(2.0, 1.0, 4, 3);
    assert_eq!(mesh.nvertices(), 5 * 4);
    assert_eq!(mesh.ntriangles(), 2 * 4 * 3);
    assert_eq!(mesh.topology().euler_characteristic(), 1);
    assert_eq!(mesh.topology().ncomponents(), 1);
    assert_eq!(mesh.topology().boundary_vertices().len(), 2 * (4 + 3));
  }
}
