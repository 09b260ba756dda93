//! Combinatorial structure of a triangulated surface.

use crate::{ComponentIdx, EdgeIdx, MeshError, Triangle, TriangleIdx, VertexIdx};

use common::util::DisjointSets;
use indexmap::IndexMap;
use itertools::Itertools;

/// Sorted vertex pair.
pub type Edge = [VertexIdx; 2];

pub type EdgeSkeleton = IndexMap<Edge, EdgeData>;

#[derive(Default, Debug, Clone)]
pub struct EdgeData {
  /// Incident triangles, paired with whether the triangle traverses the edge
  /// from the smaller to the larger vertex.
  pub cotriangles: Vec<(TriangleIdx, bool)>,
}

/// Triangles, edges, incidence and connected components of a surface mesh.
///
/// Construction validates that the surface is a consistently oriented
/// 2-manifold (possibly with boundary).
#[derive(Debug, Clone)]
pub struct SurfaceTopology {
  nvertices: usize,
  triangles: Vec<Triangle>,
  edges: EdgeSkeleton,
  vertex_triangles: Vec<Vec<TriangleIdx>>,
  vertex_components: Vec<ComponentIdx>,
  ncomponents: usize,
}

impl SurfaceTopology {
  pub fn new(nvertices: usize, triangles: Vec<Triangle>) -> Result<Self, MeshError> {
    if triangles.is_empty() {
      return Err(MeshError::Empty);
    }

    for (itriangle, triangle) in triangles.iter().enumerate() {
      if let Some(&ivertex) = triangle.iter().find(|&&v| v >= nvertices) {
        return Err(MeshError::VertexOutOfRange {
          itriangle,
          ivertex,
          nvertices,
        });
      }
      if !triangle.iter().all_unique() {
        return Err(MeshError::RepeatedVertex { itriangle });
      }
    }

    let mut edges = EdgeSkeleton::new();
    for (itriangle, triangle) in triangles.iter().enumerate() {
      for (a, b) in local_edges(triangle) {
        let forward = a < b;
        let edge = if forward { [a, b] } else { [b, a] };
        edges
          .entry(edge)
          .or_default()
          .cotriangles
          .push((itriangle, forward));
      }
    }

    for (&edge, data) in &edges {
      match data.cotriangles.as_slice() {
        [_] => {}
        &[(t0, dir0), (t1, dir1)] => {
          if dir0 == dir1 {
            return Err(MeshError::InconsistentOrientation {
              edge,
              triangles: [t0, t1],
            });
          }
        }
        cotriangles => {
          return Err(MeshError::NonManifoldEdge {
            edge,
            ntriangles: cotriangles.len(),
          })
        }
      }
    }

    let mut vertex_triangles = vec![Vec::new(); nvertices];
    let mut sets = DisjointSets::new(nvertices);
    for (itriangle, &[v0, v1, v2]) in triangles.iter().enumerate() {
      for v in [v0, v1, v2] {
        vertex_triangles[v].push(itriangle);
      }
      sets.union(v0, v1);
      sets.union(v0, v2);
    }
    let (vertex_components, ncomponents) = sets.labels();

    Ok(Self {
      nvertices,
      triangles,
      edges,
      vertex_triangles,
      vertex_components,
      ncomponents,
    })
  }

  pub fn nvertices(&self) -> usize {
    self.nvertices
  }
  pub fn ntriangles(&self) -> usize {
    self.triangles.len()
  }
  pub fn nedges(&self) -> usize {
    self.edges.len()
  }

  pub fn triangles(&self) -> &[Triangle] {
    &self.triangles
  }
  pub fn triangle(&self, itriangle: TriangleIdx) -> &Triangle {
    &self.triangles[itriangle]
  }
  pub fn edges(&self) -> &EdgeSkeleton {
    &self.edges
  }
  pub fn edge(&self, iedge: EdgeIdx) -> Edge {
    *self.edges.get_index(iedge).expect("edge index out of range").0
  }
  pub fn edge_idx(&self, a: VertexIdx, b: VertexIdx) -> Option<EdgeIdx> {
    let edge = if a < b { [a, b] } else { [b, a] };
    self.edges.get_index_of(&edge)
  }

  /// Triangles containing `ivertex`, in increasing order.
  pub fn vertex_triangles(&self, ivertex: VertexIdx) -> &[TriangleIdx] {
    &self.vertex_triangles[ivertex]
  }

  pub fn boundary_edges(&self) -> impl Iterator<Item = Edge> + '_ {
    self
      .edges
      .iter()
      .filter(|(_, data)| data.cotriangles.len() == 1)
      .map(|(&edge, _)| edge)
  }
  pub fn has_boundary(&self) -> bool {
    self.boundary_edges().next().is_some()
  }

  /// The vertices that lie on the boundary of the mesh, sorted.
  pub fn boundary_vertices(&self) -> Vec<VertexIdx> {
    self.boundary_edges().flatten().sorted().dedup().collect()
  }

  /// Euler characteristic $V - E + F$.
  pub fn euler_characteristic(&self) -> isize {
    self.nvertices as isize - self.nedges() as isize + self.ntriangles() as isize
  }

  pub fn ncomponents(&self) -> usize {
    self.ncomponents
  }
  /// Component label of every vertex. Components are numbered in order of
  /// their smallest vertex.
  pub fn vertex_components(&self) -> &[ComponentIdx] {
    &self.vertex_components
  }
  pub fn triangle_component(&self, itriangle: TriangleIdx) -> ComponentIdx {
    self.vertex_components[self.triangles[itriangle][0]]
  }
  /// Smallest vertex of every component.
  pub fn component_representatives(&self) -> Vec<VertexIdx> {
    let mut representatives = Vec::with_capacity(self.ncomponents);
    for (ivertex, &icomponent) in self.vertex_components.iter().enumerate() {
      if icomponent == representatives.len() {
        representatives.push(ivertex);
      }
    }
    representatives
  }
}

/// Directed edges of an oriented triangle.
pub fn local_edges(&[v0, v1, v2]: &Triangle) -> [(VertexIdx, VertexIdx); 3] {
  [(v0, v1), (v1, v2), (v2, v0)]
}
