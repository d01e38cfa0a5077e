//! Episode artifact writer.
//!
//! Epistemic foundation:
//! - K_i: Artifact is written to a temp file then renamed (never left truncated)
//! - I^B: Write failure → temp file removed, error propagated

use super::{ACTION_FIELD, INSTRUCTION_FIELD, NUM_STEPS_KEY, POSE_FIELD, step_key};
use crate::models::{ConvertError, Episode, Modality, Result};
use ndarray::{arr0, aview1};
use ndarray_npy::NpzWriter;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write an episode artifact at `path`, replacing any existing file.
pub fn write_episode(episode: &Episode, path: &Path) -> Result<()> {
    let temp_path = temp_path_for(path);

    if let Err(e) = write_archive(episode, path, &temp_path) {
        // Best effort: the original error is the one worth reporting
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, path)
        .map_err(|e| ConvertError::io(format!("renaming {}", temp_path.display()), e))?;

    debug!(path = %path.display(), steps = episode.len(), "Episode archive written");
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{file_name}.tmp"))
}

fn write_archive(episode: &Episode, path: &Path, temp_path: &Path) -> Result<()> {
    let npz_err = |e| ConvertError::ArchiveWrite {
        path: path.to_path_buf(),
        source: e,
    };

    let file = File::create(temp_path)
        .map_err(|e| ConvertError::io(format!("creating {}", temp_path.display()), e))?;
    let mut npz = NpzWriter::new(BufWriter::new(file));

    npz.add_array(NUM_STEPS_KEY, &arr0(episode.len() as u64))
        .map_err(npz_err)?;

    for (index, step) in episode.steps.iter().enumerate() {
        for modality in Modality::ALL {
            let key = step_key(index, modality.field_name());
            if modality == Modality::Depth {
                if let Some(depth) = &step.depth {
                    npz.add_array(key, depth).map_err(npz_err)?;
                }
            } else if let Some(image) = step.image_field(modality) {
                npz.add_array(key, image).map_err(npz_err)?;
            }
        }

        npz.add_array(step_key(index, POSE_FIELD), &aview1(&step.end_effector_pose))
            .map_err(npz_err)?;
        npz.add_array(step_key(index, ACTION_FIELD), &aview1(&step.action))
            .map_err(npz_err)?;
        npz.add_array(
            step_key(index, INSTRUCTION_FIELD),
            &aview1(step.language_instruction.as_bytes()),
        )
        .map_err(npz_err)?;
    }

    let mut writer = npz.finish().map_err(npz_err)?;
    writer
        .flush()
        .map_err(|e| ConvertError::io(format!("flushing {}", temp_path.display()), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Step;
    use tempfile::TempDir;

    #[test]
    fn test_write_replaces_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("episode_x.npy");
        fs::write(&path, b"stale").unwrap();

        let episode = Episode {
            name: "x".to_string(),
            steps: vec![Step {
                image: None,
                depth: None,
                image_left: None,
                image_right: None,
                image_fisheye: None,
                end_effector_pose: [1.0; 7],
                action: [2.0; 7],
                language_instruction: "push".to_string(),
            }],
        };
        write_episode(&episode, &path).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], b"PK\x03\x04");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_write_into_missing_dir_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("episode_x.npy");
        let episode = Episode {
            name: "x".to_string(),
            steps: Vec::new(),
        };
        assert!(matches!(
            write_episode(&episode, &path),
            Err(ConvertError::Io { .. })
        ));
    }
}
