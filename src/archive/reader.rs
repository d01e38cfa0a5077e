//! Episode artifact reader.

use super::{step_key, ACTION_FIELD, INSTRUCTION_FIELD, NUM_STEPS_KEY, POSE_FIELD};
use crate::models::{ConvertError, Modality, Result, Step};
use ndarray::{Array0, Array1, ArrayD};
use ndarray_npy::{NpzReader, ReadableElement};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

/// Load the steps of an episode artifact back into memory.
///
/// Absent image entries come back as `None`.
pub fn read_episode(path: &Path) -> Result<Vec<Step>> {
    let file = File::open(path)
        .map_err(|e| ConvertError::io(format!("opening {}", path.display()), e))?;
    let mut archive = ArchiveReader::new(file, path)?;

    let num_steps: Array0<u64> = archive.required(NUM_STEPS_KEY)?;
    let num_steps = num_steps.into_scalar() as usize;

    (0..num_steps).map(|index| archive.step(index)).collect()
}

struct ArchiveReader<'p, R: Read + Seek> {
    npz: NpzReader<R>,
    names: HashSet<String>,
    path: &'p Path,
}

impl<'p, R: Read + Seek> ArchiveReader<'p, R> {
    fn new(reader: R, path: &'p Path) -> Result<Self> {
        let npz_err = |e| ConvertError::ArchiveRead {
            path: path.to_path_buf(),
            source: e,
        };
        let mut npz = NpzReader::new(reader).map_err(npz_err)?;
        let names = npz.names().map_err(npz_err)?.into_iter().collect();
        Ok(Self { npz, names, path })
    }

    fn optional<A, D>(&mut self, key: &str) -> Result<Option<ndarray::Array<A, D>>>
    where
        A: ReadableElement,
        D: ndarray::Dimension,
    {
        // Listed names carry no `.npy` suffix
        if !self.names.contains(key) {
            return Ok(None);
        }
        self.npz
            .by_name(key)
            .map(Some)
            .map_err(|e| ConvertError::ArchiveRead {
                path: self.path.to_path_buf(),
                source: e,
            })
    }

    fn required<A, D>(&mut self, key: &str) -> Result<ndarray::Array<A, D>>
    where
        A: ReadableElement,
        D: ndarray::Dimension,
    {
        self.optional(key)?.ok_or_else(|| {
            ConvertError::ParseError(format!(
                "{}: missing entry '{key}'",
                self.path.display()
            ))
        })
    }

    fn vector7(&mut self, key: &str) -> Result<[f32; 7]> {
        let values: Array1<f32> = self.required(key)?;
        <[f32; 7]>::try_from(values.to_vec()).map_err(|v| {
            ConvertError::ParseError(format!(
                "{}: entry '{key}' has {} values, expected 7",
                self.path.display(),
                v.len()
            ))
        })
    }

    fn step(&mut self, index: usize) -> Result<Step> {
        let mut step = Step {
            image: None,
            depth: self.optional(&step_key(index, Modality::Depth.field_name()))?,
            image_left: None,
            image_right: None,
            image_fisheye: None,
            end_effector_pose: self.vector7(&step_key(index, POSE_FIELD))?,
            action: self.vector7(&step_key(index, ACTION_FIELD))?,
            language_instruction: String::new(),
        };

        for modality in Modality::ALL {
            if let Some(slot) = step.image_field_mut(modality) {
                let image: Option<ArrayD<u8>> =
                    self.optional(&step_key(index, modality.field_name()))?;
                *slot = image;
            }
        }

        let bytes: Array1<u8> = self.required(&step_key(index, INSTRUCTION_FIELD))?;
        step.language_instruction = String::from_utf8(bytes.to_vec()).map_err(|e| {
            ConvertError::ParseError(format!(
                "{}: step {index} instruction is not UTF-8: {e}",
                self.path.display()
            ))
        })?;

        Ok(step)
    }
}
