//! Episode conversion pipeline.
//!
//! Pipeline flow:
//! Episode dirs → Frames + Step table + Instruction → Steps (ordinal alignment) → Archive
//!
//! Epistemic foundation:
//! - K_i: Step count == table row count; frames never extend an episode
//! - K_i: Modalities are aligned by position only, missing frames are null
//! - I^B: The first fault aborts the run; artifacts already written stay

use crate::archive::write_episode;
use crate::loader::{load_frames, load_optional_instruction, StepTable};
use crate::models::{Config, ConvertError, Episode, Frame, Modality, Result, RunStats, Step};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Everything read from one episode directory before steps are assembled.
#[derive(Debug)]
pub struct EpisodeSources {
    /// Decoded frames per modality, in `Modality::ALL` order
    pub frames: [Vec<Frame>; 5],
    /// Per-step pose/action table
    pub table: StepTable,
    /// Language instruction shared by all steps
    pub instruction: String,
}

impl EpisodeSources {
    /// Frames of one modality.
    pub fn frames(&self, modality: Modality) -> &[Frame] {
        &self.frames[modality_slot(modality)]
    }
}

fn modality_slot(modality: Modality) -> usize {
    match modality {
        Modality::Rgb => 0,
        Modality::Depth => 1,
        Modality::Left => 2,
        Modality::Right => 3,
        Modality::Fisheye => 4,
    }
}

/// Converter from recorder episode directories to episode archives.
pub struct EpisodeConverter {
    config: Config,
}

impl EpisodeConverter {
    /// Create a converter from configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// List episode directories under the input root, sorted by name.
    ///
    /// Returns the directories and the number of non-directory entries skipped.
    pub fn episode_dirs(input: &Path) -> Result<(Vec<PathBuf>, usize)> {
        if !input.exists() {
            return Err(ConvertError::InputNotFound(input.to_path_buf()));
        }
        if !input.is_dir() {
            return Err(ConvertError::InputNotDirectory(input.to_path_buf()));
        }

        let entries =
            fs::read_dir(input).map_err(|e| ConvertError::io("listing input folder", e))?;

        let mut dirs = Vec::new();
        let mut skipped = 0;
        for entry in entries {
            let path = entry
                .map_err(|e| ConvertError::io("listing input folder", e))?
                .path();
            if path.is_dir() {
                dirs.push(path);
            } else {
                debug!(path = %path.display(), "Skipping non-directory entry");
                skipped += 1;
            }
        }
        dirs.sort();

        Ok((dirs, skipped))
    }

    /// Episode name of a directory: its file stem.
    pub fn episode_name(dir: &Path) -> String {
        dir.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Read every source of one episode directory.
    pub fn load_sources(&self, dir: &Path) -> Result<EpisodeSources> {
        let layout = &self.config.layout;

        let mut frames: [Vec<Frame>; 5] = Default::default();
        for modality in Modality::ALL {
            frames[modality_slot(modality)] = load_frames(&dir.join(layout.folder(modality)))?;
        }

        let table = StepTable::load_optional(&dir.join(&layout.table_file))?;
        let instruction =
            load_optional_instruction(&dir.join(&layout.info_file), &layout.instruction_key)?;

        Ok(EpisodeSources {
            frames,
            table,
            instruction,
        })
    }

    /// Assemble steps from loaded sources, one per table row.
    pub fn build_episode(&self, name: &str, sources: &EpisodeSources) -> Result<Episode> {
        let rows = sources.table.len();
        if rows == 0 {
            return Ok(Episode {
                name: name.to_string(),
                steps: Vec::new(),
            });
        }

        let pose_cols = sources.table.resolve(&self.config.columns.pose)?;
        let action_cols = sources.table.resolve(&self.config.columns.action)?;
        let depth_shape = self.config.depth.shape;

        let mut steps = Vec::with_capacity(rows);
        for i in 0..rows {
            let depth = match sources.frames(Modality::Depth).get(i) {
                Some(frame) => Some(frame.pixels.to_u16_reshaped(depth_shape).ok_or_else(
                    || ConvertError::DepthShape {
                        path: frame.path.clone(),
                        expected: depth_shape,
                        actual: frame.pixels.len(),
                    },
                )?),
                None => None,
            };

            let mut step = Step {
                image: None,
                depth,
                image_left: None,
                image_right: None,
                image_fisheye: None,
                end_effector_pose: sources.table.row_values(i, &pose_cols)?,
                action: sources.table.row_values(i, &action_cols)?,
                language_instruction: sources.instruction.clone(),
            };

            for modality in Modality::ALL {
                if let Some(slot) = step.image_field_mut(modality) {
                    *slot = match sources.frames(modality).get(i) {
                        Some(frame) => Some(frame.pixels.to_u8_array()?),
                        None => None,
                    };
                }
            }

            steps.push(step);
        }

        Ok(Episode {
            name: name.to_string(),
            steps,
        })
    }

    /// Convert one episode directory and write its artifact into `output`.
    pub fn convert_dir(&self, dir: &Path, output: &Path) -> Result<Episode> {
        let name = Self::episode_name(dir);
        let sources = self.load_sources(dir)?;

        debug!(
            episode = %name,
            rows = sources.table.len(),
            rgb = sources.frames(Modality::Rgb).len(),
            depth = sources.frames(Modality::Depth).len(),
            left = sources.frames(Modality::Left).len(),
            right = sources.frames(Modality::Right).len(),
            fisheye = sources.frames(Modality::Fisheye).len(),
            "Loaded episode sources"
        );

        let episode = self.build_episode(&name, &sources)?;
        drop(sources);

        let file_name = self.config.output.file_name(&name);
        write_episode(&episode, &output.join(&file_name))?;

        info!("Saved {} to {}", file_name, output.display());
        Ok(episode)
    }

    /// Make sure the output folder is usable.
    fn prepare_output(&self, output: &Path) -> Result<()> {
        if output.is_dir() {
            return Ok(());
        }
        if !self.config.output.create_missing {
            return Err(ConvertError::OutputNotFound(output.to_path_buf()));
        }
        fs::create_dir_all(output).map_err(|e| ConvertError::io("creating output folder", e))?;
        info!(path = %output.display(), "Created output folder");
        Ok(())
    }

    /// Convert every episode directory under `input`.
    pub fn run(&self, input: &Path, output: &Path) -> Result<RunStats> {
        let start = Instant::now();

        let (dirs, skipped) = Self::episode_dirs(input)?;
        self.prepare_output(output)?;

        info!(
            episodes = dirs.len(),
            skipped,
            input = %input.display(),
            output = %output.display(),
            "Starting conversion"
        );

        // Setup progress bar
        let pb = if self.config.output.show_progress {
            let pb = ProgressBar::new(dirs.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}")
                    .map_err(|e| ConvertError::Internal(format!("progress template: {e}")))?
                    .progress_chars("##-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut stats = RunStats {
            skipped_entries: skipped,
            ..Default::default()
        };

        for dir in &dirs {
            pb.set_message(Self::episode_name(dir));
            let episode = self.convert_dir(dir, output)?;
            stats.record(&episode);
            pb.inc(1);
        }

        pb.finish_with_message(format!(
            "Done! {} episodes, {} steps",
            stats.total_episodes, stats.total_steps
        ));

        stats.runtime_secs = start.elapsed().as_secs_f64();
        stats.finalize();

        info!("Done!");
        info!(
            episodes = stats.total_episodes,
            empty = stats.empty_episodes,
            steps = stats.total_steps,
            frames = stats.total_frames,
            throughput = format!("{:.1} steps/s", stats.steps_per_sec),
            "Conversion complete"
        );

        Ok(stats)
    }
}
