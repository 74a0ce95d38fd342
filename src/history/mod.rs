//! History sampling and reconstruction.
//!
//! A [`Sampler`] walks a paginated listing under a request budget and folds
//! the items it sees into a sparse [`History`]. The reconstruction side turns
//! histories into chart series and answers nearest-day lookups across them.

mod plan;
mod reconstruct;
mod resource;
mod sampler;

pub use plan::*;
pub use reconstruct::*;
pub use resource::*;
pub use sampler::*;
