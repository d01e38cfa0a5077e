//! Core data models for io2rlds.
//!
//! Epistemic mapping:
//! - K_i (Knowledge): Concrete types with compile-time guarantees
//! - B_i (Beliefs): Wrapped in Result/Option
//! - I^R (Resolvable): Config parameters

mod config;
mod episode;
mod error;

pub use config::*;
pub use episode::*;
pub use error::*;
