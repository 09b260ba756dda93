extern crate nalgebra as na;
extern crate nalgebra_sparse as nas;

pub mod linalg;
pub mod sparse;
pub mod util;
