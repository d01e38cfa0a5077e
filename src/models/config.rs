//! Configuration models for io2rlds.
//!
//! All I^R (resolvable ignorance) is parameterized here.
//! Every field has a default matching the recorder's on-disk layout, so the
//! converter runs without a config file and a partial file only overrides
//! what it names.

use super::Modality;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for io2rlds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Names of the folders and files inside an episode directory
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Table columns feeding the pose and action vectors
    #[serde(default)]
    pub columns: ColumnsConfig,

    /// Depth reshape target
    #[serde(default)]
    pub depth: DepthConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Episode directory layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// RGB frames folder
    #[serde(default = "default_rgb_dir")]
    pub rgb_dir: String,

    /// Depth frames folder
    #[serde(default = "default_depth_dir")]
    pub depth_dir: String,

    /// Left stereo camera folder
    #[serde(default = "default_left_dir")]
    pub left_dir: String,

    /// Right stereo camera folder
    #[serde(default = "default_right_dir")]
    pub right_dir: String,

    /// Fisheye camera folder
    #[serde(default = "default_fisheye_dir")]
    pub fisheye_dir: String,

    /// Step table (one row per step)
    #[serde(default = "default_table_file")]
    pub table_file: String,

    /// Episode metadata JSON
    #[serde(default = "default_info_file")]
    pub info_file: String,

    /// Key holding the language instruction inside the metadata JSON
    #[serde(default = "default_instruction_key")]
    pub instruction_key: String,
}

fn default_rgb_dir() -> String {
    "rgb".to_string()
}

fn default_depth_dir() -> String {
    "depth".to_string()
}

fn default_left_dir() -> String {
    "cam_01".to_string()
}

fn default_right_dir() -> String {
    "cam_02".to_string()
}

fn default_fisheye_dir() -> String {
    "cam_fisheye".to_string()
}

fn default_table_file() -> String {
    "result.csv".to_string()
}

fn default_info_file() -> String {
    "info.json".to_string()
}

fn default_instruction_key() -> String {
    "natural_language_description".to_string()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rgb_dir: default_rgb_dir(),
            depth_dir: default_depth_dir(),
            left_dir: default_left_dir(),
            right_dir: default_right_dir(),
            fisheye_dir: default_fisheye_dir(),
            table_file: default_table_file(),
            info_file: default_info_file(),
            instruction_key: default_instruction_key(),
        }
    }
}

impl LayoutConfig {
    /// Folder name holding the frames of a modality.
    pub fn folder(&self, modality: Modality) -> &str {
        match modality {
            Modality::Rgb => &self.rgb_dir,
            Modality::Depth => &self.depth_dir,
            Modality::Left => &self.left_dir,
            Modality::Right => &self.right_dir,
            Modality::Fisheye => &self.fisheye_dir,
        }
    }
}

/// Table column names.
///
/// K_i: Both vectors are exactly 7 wide; a config with another length fails to parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnsConfig {
    /// Position xyz + orientation xyzw
    #[serde(default = "default_pose_columns")]
    pub pose: [String; 7],

    /// Gripper flag + command position xyz + command rotation xyz
    #[serde(default = "default_action_columns")]
    pub action: [String; 7],
}

fn default_pose_columns() -> [String; 7] {
    [
        "camera_link_position_x",
        "camera_link_position_y",
        "camera_link_position_z",
        "camera_link_orientation_x",
        "camera_link_orientation_y",
        "camera_link_orientation_z",
        "camera_link_orientation_w",
    ]
    .map(String::from)
}

fn default_action_columns() -> [String; 7] {
    [
        "gripper_closed",
        "ee_command_position_x",
        "ee_command_position_y",
        "ee_command_position_z",
        "ee_command_rotation_x",
        "ee_command_rotation_y",
        "ee_command_rotation_z",
    ]
    .map(String::from)
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            pose: default_pose_columns(),
            action: default_action_columns(),
        }
    }
}

/// Depth frame reshape target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthConfig {
    /// Target shape as (height, width, channels)
    #[serde(default = "default_depth_shape")]
    pub shape: [usize; 3],
}

fn default_depth_shape() -> [usize; 3] {
    [720, 1280, 1]
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            shape: default_depth_shape(),
        }
    }
}

impl DepthConfig {
    /// Number of samples a depth frame must carry.
    pub fn sample_count(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Artifact file name prefix (followed by the episode name)
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Artifact file extension
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Create the output folder when it does not exist
    #[serde(default)]
    pub create_missing: bool,

    /// Draw a progress bar while converting
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

fn default_prefix() -> String {
    "episode_".to_string()
}

fn default_extension() -> String {
    "npy".to_string()
}

fn default_show_progress() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            extension: default_extension(),
            create_missing: false,
            show_progress: default_show_progress(),
        }
    }
}

impl OutputConfig {
    /// Artifact file name for an episode.
    pub fn file_name(&self, episode: &str) -> String {
        format!("{}{}.{}", self.prefix, episode, self.extension)
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// B_i(file exists) → Result
    /// B_i(file is valid TOML) → Result
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Load from `path` when given, otherwise use the built-in defaults.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

/// Configuration errors.
///
/// Epistemic origin:
/// - B_i falsified: File not found, parse error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_recorder_layout() {
        let config = Config::default();
        assert_eq!(config.layout.folder(Modality::Rgb), "rgb");
        assert_eq!(config.layout.folder(Modality::Left), "cam_01");
        assert_eq!(config.layout.folder(Modality::Fisheye), "cam_fisheye");
        assert_eq!(config.layout.table_file, "result.csv");
        assert_eq!(config.depth.shape, [720, 1280, 1]);
        assert_eq!(config.depth.sample_count(), 720 * 1280);
        assert_eq!(config.columns.pose[6], "camera_link_orientation_w");
        assert_eq!(config.columns.action[0], "gripper_closed");
        assert_eq!(config.output.file_name("A"), "episode_A.npy");
        assert!(!config.output.create_missing);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[layout]
rgb_dir = "color"

[depth]
shape = [480, 640, 1]

[output]
show_progress = false
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.layout.rgb_dir, "color");
        assert_eq!(config.layout.depth_dir, "depth");
        assert_eq!(config.depth.shape, [480, 640, 1]);
        assert!(!config.output.show_progress);
        assert_eq!(config.output.prefix, "episode_");
    }

    #[test]
    fn test_wrong_column_count_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[columns]\npose = [\"x\", \"y\"]\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = Config::from_file(std::path::Path::new("/nonexistent/io2rlds.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
        assert!(Config::load(None).is_ok());
    }
}
