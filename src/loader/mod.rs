//! Loader module - reads the raw sources of one episode directory.
//!
//! Provides:
//! - `frames`: Ordered, decoded image frames per modality folder
//! - `StepTable`: The per-step pose/action table
//! - `load_instruction`: The episode's language instruction

mod frames;
mod instruction;
mod table;

pub use frames::*;
pub use instruction::*;
pub use table::*;
