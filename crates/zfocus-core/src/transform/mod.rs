pub mod hartley;
pub mod spectrum;

pub use hartley::{HartleyTables, HartleyTransform};
pub use spectrum::{pad, power_spectrum};
