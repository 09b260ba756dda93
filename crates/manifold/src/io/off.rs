//! Object File Format (OFF) reading and writing for triangle meshes.

use crate::{Coord, MeshError, SurfaceMesh, Triangle};

use std::{fmt::Write as _, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum OffError {
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error("missing `OFF` header")]
  MissingHeader,
  #[error("line {line}: {reason}")]
  Parse { line: usize, reason: String },
  #[error("line {line}: face with {nvertices} vertices, only triangles are supported")]
  UnsupportedFace { line: usize, nvertices: usize },
  #[error("unexpected end of file, expected {expected}")]
  UnexpectedEof { expected: &'static str },
  #[error(transparent)]
  Mesh(#[from] MeshError),
}

pub fn read_off(path: impl AsRef<Path>) -> Result<SurfaceMesh, OffError> {
  let string = std::fs::read_to_string(path)?;
  parse_off(&string)
}

pub fn write_off(mesh: &SurfaceMesh, path: impl AsRef<Path>) -> std::io::Result<()> {
  std::fs::write(path, to_off_string(mesh))
}

pub fn to_off_string(mesh: &SurfaceMesh) -> String {
  let mut string = String::new();
  writeln!(string, "OFF").unwrap();
  writeln!(string, "{} {} 0", mesh.nvertices(), mesh.ntriangles()).unwrap();
  for c in mesh.coords() {
    writeln!(string, "{} {} {}", c.x, c.y, c.z).unwrap();
  }
  for t in mesh.triangles() {
    writeln!(string, "3 {} {} {}", t[0], t[1], t[2]).unwrap();
  }
  string
}

/// Parses an OFF string. Comments (`#`) and blank lines are skipped,
/// trailing face colors are ignored.
pub fn parse_off(off_string: &str) -> Result<SurfaceMesh, OffError> {
  let mut lines = off_string
    .lines()
    .enumerate()
    .map(|(i, line)| (i + 1, line.split('#').next().unwrap_or("").trim()))
    .filter(|(_, line)| !line.is_empty());

  let (iline, header) = lines.next().ok_or(OffError::MissingHeader)?;
  let counts_inline = header.strip_prefix("OFF").ok_or(OffError::MissingHeader)?.trim();
  let (iline, counts) = if counts_inline.is_empty() {
    lines.next().ok_or(OffError::UnexpectedEof {
      expected: "element counts",
    })?
  } else {
    (iline, counts_inline)
  };
  let counts: Vec<usize> = parse_tokens(iline, counts)?;
  let [nvertices, nfaces] = match counts.as_slice() {
    &[nvertices, nfaces, ..] => [nvertices, nfaces],
    _ => {
      return Err(OffError::Parse {
        line: iline,
        reason: "expected vertex and face counts".into(),
      })
    }
  };

  // the counts are untrusted, every element needs its own line
  let nlines = off_string.lines().count();
  let mut coords = Vec::with_capacity(nvertices.min(nlines));
  for _ in 0..nvertices {
    let (iline, line) = lines.next().ok_or(OffError::UnexpectedEof {
      expected: "vertex",
    })?;
    let values: Vec<f64> = parse_tokens(iline, line)?;
    if values.len() < 3 {
      return Err(OffError::Parse {
        line: iline,
        reason: format!("expected 3 coordinates, found {}", values.len()),
      });
    }
    coords.push(Coord::new(values[0], values[1], values[2]));
  }

  let mut triangles: Vec<Triangle> = Vec::with_capacity(nfaces.min(nlines));
  for _ in 0..nfaces {
    let (iline, line) = lines
      .next()
      .ok_or(OffError::UnexpectedEof { expected: "face" })?;
    let mut tokens = line.split_whitespace();
    let nface_vertices: usize = parse_token(iline, tokens.next())?;
    if nface_vertices != 3 {
      return Err(OffError::UnsupportedFace {
        line: iline,
        nvertices: nface_vertices,
      });
    }
    let triangle = [
      parse_token(iline, tokens.next())?,
      parse_token(iline, tokens.next())?,
      parse_token(iline, tokens.next())?,
    ];
    triangles.push(triangle);
  }

  Ok(SurfaceMesh::new(coords, triangles)?)
}

fn parse_tokens<T: std::str::FromStr>(iline: usize, line: &str) -> Result<Vec<T>, OffError> {
  line
    .split_whitespace()
    .map(|token| parse_token(iline, Some(token)))
    .collect()
}

fn parse_token<T: std::str::FromStr>(iline: usize, token: Option<&str>) -> Result<T, OffError> {
  let token = token.ok_or_else(|| OffError::Parse {
    line: iline,
    reason: "missing value".into(),
  })?;
  token.parse().map_err(|_| OffError::Parse {
    line: iline,
    reason: format!("invalid value `{token}`"),
  })
}
