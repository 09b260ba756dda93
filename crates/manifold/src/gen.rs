pub mod cartesian;
pub mod sphere;

pub use cartesian::{rectangle, unit_square};
pub use sphere::sphere;
