//! io2rlds - Convert robot demonstration recordings into per-episode step archives.
//!
//! ## Architecture
//!
//! One linear, single-threaded pass over an input root:
//! - **Loader**: Ordered image frames per modality, the step table, the language instruction
//! - **Pipeline**: Aligns the sources by ordinal position into steps, one per table row
//! - **Archive**: Writes each episode as an NPZ container and reads it back
//!
//! ## Epistemic Design
//!
//! - K_i (Knowledge): Compile-time enforced invariants (fixed 7-wide vectors, modality enum)
//! - B_i (Beliefs): Runtime fallible operations (Result, Option)
//! - I^R (Resolvable): User-configurable layout, columns and depth shape
//! - I^B (Bounded): Malformed inputs abort the run with a typed error

pub mod archive;
pub mod loader;
pub mod models;
pub mod pipeline;

pub use archive::{read_episode, write_episode};
pub use models::{Config, ConfigError, ConvertError, Episode, Modality, Result, RunStats, Step};
pub use pipeline::EpisodeConverter;
