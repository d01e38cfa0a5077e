//! Episode and step types for io2rlds.
//!
//! K_i: These types represent the core data flow through the pipeline.

use super::{ConvertError, Result};
use ndarray::{Array3, ArrayD, IxDyn};
use std::path::PathBuf;

/// One of the five image sources recorded per episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modality {
    /// Main RGB camera
    Rgb,
    /// Depth camera (16-bit)
    Depth,
    /// Left stereo camera
    Left,
    /// Right stereo camera
    Right,
    /// Fisheye camera
    Fisheye,
}

impl Modality {
    /// All modalities in step field order.
    pub const ALL: [Modality; 5] = [
        Modality::Rgb,
        Modality::Depth,
        Modality::Left,
        Modality::Right,
        Modality::Fisheye,
    ];

    /// Name of the step field this modality fills.
    pub fn field_name(self) -> &'static str {
        match self {
            Modality::Rgb => "image",
            Modality::Depth => "depth",
            Modality::Left => "image_left",
            Modality::Right => "image_right",
            Modality::Fisheye => "image_fisheye",
        }
    }
}

/// Sample storage of a decoded frame, in the source file's bit depth.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    F32(Vec<f32>),
}

/// A decoded frame as a row-major sample buffer with a numpy-style shape.
///
/// K_i: `shape` is `[H, W]` for single-channel images and `[H, W, C]` otherwise,
/// and its product equals the sample count.
#[derive(Debug, Clone, PartialEq)]
pub struct Pixels {
    shape: Vec<usize>,
    data: PixelData,
}

impl Pixels {
    /// Wrap decoded samples, checking that the shape covers them exactly.
    pub fn new(shape: Vec<usize>, data: PixelData) -> Result<Self> {
        let pixels = Self { shape, data };
        let expected: usize = pixels.shape.iter().product();
        if expected != pixels.len() {
            return Err(ConvertError::Internal(format!(
                "shape {:?} does not cover {} samples",
                pixels.shape,
                pixels.len()
            )));
        }
        Ok(pixels)
    }

    /// Array shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Underlying samples.
    pub fn data(&self) -> &PixelData {
        &self.data
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        match &self.data {
            PixelData::U8(v) => v.len(),
            PixelData::U16(v) => v.len(),
            PixelData::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples cast to `u8` (wrapping for 16-bit input, saturating for float).
    ///
    /// Float samples clamp to `0..=255` and NaN becomes 0, where NumPy's
    /// `astype` leaves out-of-range floats platform-defined.
    pub fn to_u8_vec(&self) -> Vec<u8> {
        match &self.data {
            PixelData::U8(v) => v.clone(),
            PixelData::U16(v) => v.iter().map(|&s| s as u8).collect(),
            PixelData::F32(v) => v.iter().map(|&s| s as u8).collect(),
        }
    }

    /// Samples cast to `u16` (saturating for float input).
    pub fn to_u16_vec(&self) -> Vec<u16> {
        match &self.data {
            PixelData::U8(v) => v.iter().map(|&s| u16::from(s)).collect(),
            PixelData::U16(v) => v.clone(),
            PixelData::F32(v) => v.iter().map(|&s| s as u16).collect(),
        }
    }

    /// Cast to an 8-bit array keeping the original shape.
    pub fn to_u8_array(&self) -> Result<ArrayD<u8>> {
        Ok(ArrayD::from_shape_vec(
            IxDyn(&self.shape),
            self.to_u8_vec(),
        )?)
    }

    /// Cast to 16 bits and reshape into `shape`.
    ///
    /// Fails when the sample count differs from the target's.
    pub fn to_u16_reshaped(&self, shape: [usize; 3]) -> Option<Array3<u16>> {
        let expected: usize = shape.iter().product();
        if self.len() != expected {
            return None;
        }
        Array3::from_shape_vec((shape[0], shape[1], shape[2]), self.to_u16_vec()).ok()
    }
}

/// A decoded image file.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Source file
    pub path: PathBuf,
    /// Decoded samples
    pub pixels: Pixels,
}

/// One time-indexed record of an episode.
///
/// K_i: Image fields are `None` when the modality is missing or has fewer
/// frames than the episode has steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// RGB frame
    pub image: Option<ArrayD<u8>>,

    /// Depth frame reshaped to the configured (H, W, 1) target
    pub depth: Option<Array3<u16>>,

    /// Left stereo frame
    pub image_left: Option<ArrayD<u8>>,

    /// Right stereo frame
    pub image_right: Option<ArrayD<u8>>,

    /// Fisheye frame
    pub image_fisheye: Option<ArrayD<u8>>,

    /// Position xyz + orientation xyzw
    pub end_effector_pose: [f32; 7],

    /// Gripper flag + command position xyz + command rotation xyz
    pub action: [f32; 7],

    /// Task description, identical for every step of an episode
    pub language_instruction: String,
}

impl Step {
    /// Image field filled by a non-depth modality.
    pub fn image_field(&self, modality: Modality) -> Option<&ArrayD<u8>> {
        match modality {
            Modality::Rgb => self.image.as_ref(),
            Modality::Left => self.image_left.as_ref(),
            Modality::Right => self.image_right.as_ref(),
            Modality::Fisheye => self.image_fisheye.as_ref(),
            Modality::Depth => None,
        }
    }

    /// Mutable slot for a non-depth modality.
    pub fn image_field_mut(&mut self, modality: Modality) -> Option<&mut Option<ArrayD<u8>>> {
        match modality {
            Modality::Rgb => Some(&mut self.image),
            Modality::Left => Some(&mut self.image_left),
            Modality::Right => Some(&mut self.image_right),
            Modality::Fisheye => Some(&mut self.image_fisheye),
            Modality::Depth => None,
        }
    }

    /// Number of image fields carrying a frame.
    pub fn frame_count(&self) -> usize {
        let images = [
            &self.image,
            &self.image_left,
            &self.image_right,
            &self.image_fisheye,
        ]
        .iter()
        .filter(|f| f.is_some())
        .count();
        images + usize::from(self.depth.is_some())
    }
}

/// A converted episode: one subdirectory's steps in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    /// Subdirectory stem, used in the artifact name
    pub name: String,
    /// Steps, one per table row
    pub steps: Vec<Step>,
}

impl Episode {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Statistics for a conversion run.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Episodes written
    pub total_episodes: usize,

    /// Episodes written with zero steps
    pub empty_episodes: usize,

    /// Steps across all episodes
    pub total_steps: usize,

    /// Frames attached to steps across all episodes
    pub total_frames: usize,

    /// Non-directory entries skipped in the input root
    pub skipped_entries: usize,

    /// Total runtime in seconds
    pub runtime_secs: f64,

    /// Steps per second throughput
    pub steps_per_sec: f64,
}

impl RunStats {
    /// Record a written episode.
    pub fn record(&mut self, episode: &Episode) {
        self.total_episodes += 1;
        if episode.is_empty() {
            self.empty_episodes += 1;
        }
        self.total_steps += episode.len();
        self.total_frames += episode.steps.iter().map(Step::frame_count).sum::<usize>();
    }

    /// Calculate derived stats.
    pub fn finalize(&mut self) {
        if self.runtime_secs > 0.0 {
            self.steps_per_sec = self.total_steps as f64 / self.runtime_secs;
        }
    }
}
