//! Small helpers shared by CLI modules.

pub mod size;

pub use size::parse_size;
