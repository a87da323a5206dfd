//! Domain models for the medication timeline.

mod assessment;
mod exposure;
mod filters;
mod patient;

pub use assessment::*;
pub use exposure::*;
pub use filters::*;
pub use patient::*;
