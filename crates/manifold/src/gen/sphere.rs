use crate::{Coord, SurfaceMesh, Triangle, VertexIdx};

use std::{collections::HashMap, sync::LazyLock};

/// Geodesic unit sphere from subdividing an icosahedron.
///
/// Triangles are oriented with outward normals.
pub fn sphere(nsubdivisions: usize) -> SurfaceMesh {
  let (coords, triangles) = &*ICOSAHEDRON;
  let (coords, triangles) = subdivide(coords.clone(), triangles.clone(), nsubdivisions);
  SurfaceMesh::new(coords, triangles).expect("Subdivided icosahedron is a valid surface.")
}

fn subdivide(
  mut coords: Vec<Coord>,
  triangles: Vec<Triangle>,
  depth: usize,
) -> (Vec<Coord>, Vec<Triangle>) {
  if depth == 0 {
    return (coords, triangles);
  }

  let mut midpoints = HashMap::new();
  let triangles = triangles
    .into_iter()
    .flat_map(|[v0, v1, v2]| {
      let v01 = midpoint(v0, v1, &mut coords, &mut midpoints);
      let v12 = midpoint(v1, v2, &mut coords, &mut midpoints);
      let v20 = midpoint(v2, v0, &mut coords, &mut midpoints);
      [
        [v0, v01, v20],
        [v1, v12, v01],
        [v2, v20, v12],
        [v01, v12, v20],
      ]
    })
    .collect();

  subdivide(coords, triangles, depth - 1)
}

/// Projected midpoint of the edge, created once per edge.
fn midpoint(
  v0: VertexIdx,
  v1: VertexIdx,
  coords: &mut Vec<Coord>,
  midpoints: &mut HashMap<[VertexIdx; 2], VertexIdx>,
) -> VertexIdx {
  let edge = if v0 < v1 { [v0, v1] } else { [v1, v0] };
  *midpoints.entry(edge).or_insert_with(|| {
    coords.push(((coords[v0] + coords[v1]) / 2.0).normalize());
    coords.len() - 1
  })
}

static ICOSAHEDRON: LazyLock<(Vec<Coord>, Vec<Triangle>)> = LazyLock::new(|| {
  let phi = (1.0 + 5.0f64.sqrt()) / 2.0;

  #[rustfmt::skip]
  let vertices = [
    [-1.0, phi, 0.0],
    [ 1.0, phi, 0.0],
    [-1.0,-phi, 0.0],
    [ 1.0,-phi, 0.0],
    [ 0.0,-1.0, phi],
    [ 0.0, 1.0, phi],
    [ 0.0,-1.0,-phi],
    [ 0.0, 1.0,-phi],
    [ phi, 0.0,-1.0],
    [ phi, 0.0, 1.0],
    [-phi, 0.0,-1.0],
    [-phi, 0.0, 1.0],
  ];
  let coords = vertices
    .into_iter()
    .map(|[x, y, z]| Coord::new(x, y, z).normalize())
    .collect();

  #[rustfmt::skip]
  let triangles = vec![
    [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
    [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
    [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
    [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
  ];

  (coords, triangles)
});
