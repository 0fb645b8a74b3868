pub mod rom;
pub mod smooth;
pub mod sway;
pub mod symmetry;

pub use rom::RomStats;
pub use smooth::smooth_series;
pub use sway::{SwayAnalysis, SwayLevel};
pub use symmetry::{Symmetry, SymmetryLevel};
