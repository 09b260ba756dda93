//! Triangulated surface datastructure for working with Topology and Geometry.
//!
//! - Container for vertices and oriented triangles.
//! - Edge skeleton, incidence and connected components.
//! - Geometric weights (areas, angles, barycentric gradients).
//! - Mesh generators and OFF file I/O.

extern crate nalgebra as na;

pub mod error;
pub mod gen;
pub mod geometry;
pub mod io;
pub mod topology;

pub use error::MeshError;
pub use geometry::SurfaceGeometry;
pub use topology::SurfaceTopology;

pub type VertexIdx = usize;
pub type EdgeIdx = usize;
pub type TriangleIdx = usize;
pub type ComponentIdx = usize;

pub type Triangle = [VertexIdx; 3];
pub type Coord = na::Vector3<f64>;

/// A surface mesh embedded in $RR^3$: vertex coordinates plus validated topology.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
  coords: Vec<Coord>,
  topology: SurfaceTopology,
}

impl SurfaceMesh {
  pub fn new(coords: Vec<Coord>, triangles: Vec<Triangle>) -> Result<Self, MeshError> {
    if let Some(ivertex) = coords
      .iter()
      .position(|c| c.iter().any(|x| !x.is_finite()))
    {
      return Err(MeshError::NonFiniteCoordinate { ivertex });
    }
    let topology = SurfaceTopology::new(coords.len(), triangles)?;
    Ok(Self { coords, topology })
  }

  pub fn coords(&self) -> &[Coord] {
    &self.coords
  }
  pub fn coord(&self, ivertex: VertexIdx) -> &Coord {
    &self.coords[ivertex]
  }
  pub fn topology(&self) -> &SurfaceTopology {
    &self.topology
  }
  pub fn triangles(&self) -> &[Triangle] {
    self.topology.triangles()
  }

  pub fn nvertices(&self) -> usize {
    self.coords.len()
  }
  pub fn ntriangles(&self) -> usize {
    self.topology.ntriangles()
  }

  pub fn triangle_coords(&self, itriangle: TriangleIdx) -> [Coord; 3] {
    self.topology.triangles()[itriangle].map(|v| self.coords[v])
  }

  pub fn into_parts(self) -> (Vec<Coord>, SurfaceTopology) {
    (self.coords, self.topology)
  }
}
