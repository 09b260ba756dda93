use crate::{TriangleIdx, VertexIdx};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MeshError {
  #[error("mesh has no triangles")]
  Empty,
  #[error("vertex {ivertex} has a non-finite coordinate")]
  NonFiniteCoordinate { ivertex: VertexIdx },
  #[error("triangle {itriangle} references vertex {ivertex}, but there are only {nvertices} vertices")]
  VertexOutOfRange {
    itriangle: TriangleIdx,
    ivertex: VertexIdx,
    nvertices: usize,
  },
  #[error("triangle {itriangle} repeats a vertex")]
  RepeatedVertex { itriangle: TriangleIdx },
  #[error("edge {edge:?} is shared by {ntriangles} triangles")]
  NonManifoldEdge { edge: [VertexIdx; 2], ntriangles: usize },
  #[error("triangles {triangles:?} traverse edge {edge:?} in the same direction")]
  InconsistentOrientation {
    edge: [VertexIdx; 2],
    triangles: [TriangleIdx; 2],
  },
  #[error("triangle {itriangle} is degenerate (area {area:e})")]
  DegenerateTriangle { itriangle: TriangleIdx, area: f64 },
  #[error("vertex {ivertex} is not used by any triangle")]
  IsolatedVertex { ivertex: VertexIdx },
}
