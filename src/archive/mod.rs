//! Archive module - on-disk episode artifacts.
//!
//! An artifact is an uncompressed NPZ container (zip of `.npy` arrays):
//! - `num_steps`: 0-d `u64`
//! - `step_NNNNNN/<field>`: one array per non-null step field
//!
//! Null image fields are encoded by the absence of their entry. NumPy opens the
//! file with `np.load` regardless of its `.npy` extension.

mod reader;
mod writer;

pub use reader::*;
pub use writer::*;

/// Entry holding the episode length.
pub const NUM_STEPS_KEY: &str = "num_steps";

/// Step field holding the end-effector pose.
pub const POSE_FIELD: &str = "end_effector_pose";

/// Step field holding the commanded action.
pub const ACTION_FIELD: &str = "action";

/// Step field holding the UTF-8 bytes of the language instruction.
pub const INSTRUCTION_FIELD: &str = "language_instruction";

/// Archive entry name for one field of one step (without the `.npy` suffix).
pub fn step_key(index: usize, field: &str) -> String {
    format!("step_{index:06}/{field}")
}
