//! Database module for repostats.
//!
//! SQLite storage for the persisted GitHub token.

mod store;

pub use store::*;
