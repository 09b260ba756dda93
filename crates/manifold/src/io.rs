pub mod off;

pub use off::{parse_off, read_off, to_off_string, write_off, OffError};
