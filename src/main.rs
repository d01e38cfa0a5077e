//! io2rlds CLI - Convert robot demonstration recordings into per-episode step archives.

use anyhow::{Context, Result};
use clap::Parser;
use io2rlds::{Config, EpisodeConverter};
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "io2rlds")]
#[command(author = "Infernet <dev@infernet.org>")]
#[command(version)]
#[command(about = "Process and save episodes from folders.")]
struct Cli {
    /// Input folder containing one subfolder per episode
    #[arg(long = "input_folder", required_unless_present = "example_config")]
    input_folder: Option<PathBuf>,

    /// Output folder to save episodes
    #[arg(long = "output_folder", required_unless_present = "example_config")]
    output_folder: Option<PathBuf>,

    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Show example configuration
    #[arg(long = "example-config")]
    example_config: bool,
}

fn build_subscriber(verbose: bool) -> impl tracing::Subscriber + Send + Sync {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish()
}

fn print_example_config() {
    let example = r#"# io2rlds configuration file
# Every key is optional; omitted keys keep the values shown here.

[layout]
rgb_dir = "rgb"
depth_dir = "depth"
left_dir = "cam_01"
right_dir = "cam_02"
fisheye_dir = "cam_fisheye"
table_file = "result.csv"
info_file = "info.json"
instruction_key = "natural_language_description"

[columns]
pose = [
    "camera_link_position_x", "camera_link_position_y", "camera_link_position_z",
    "camera_link_orientation_x", "camera_link_orientation_y", "camera_link_orientation_z",
    "camera_link_orientation_w",
]
action = [
    "gripper_closed",
    "ee_command_position_x", "ee_command_position_y", "ee_command_position_z",
    "ee_command_rotation_x", "ee_command_rotation_y", "ee_command_rotation_z",
]

[depth]
# (height, width, channels); depth frames must carry exactly this many samples
shape = [720, 1280, 1]

[output]
prefix = "episode_"
extension = "npy"
create_missing = false
show_progress = true
"#;
    println!("{example}");
}

fn run(cli: Cli) -> Result<()> {
    let (Some(input), Some(output)) = (cli.input_folder, cli.output_folder) else {
        anyhow::bail!("--input_folder and --output_folder are required");
    };

    let config_path = cli.config;
    let config = Config::load(config_path.as_deref())
        .with_context(|| format!("Failed to load config from {config_path:?}"))?;

    let converter = EpisodeConverter::new(config);
    let stats = match converter.run(&input, &output) {
        Ok(stats) => stats,
        Err(e) => {
            if e.is_input_error() {
                error!(error = %e, "Conversion aborted on malformed input");
            }
            return Err(e).with_context(|| format!("Failed to convert episodes in {input:?}"));
        }
    };

    info!(
        episodes = stats.total_episodes,
        empty = stats.empty_episodes,
        steps = stats.total_steps,
        skipped = stats.skipped_entries,
        runtime = format!("{:.1}s", stats.runtime_secs),
        output = ?output,
        "Summary"
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.example_config {
        print_example_config();
        return Ok(());
    }

    let subscriber = build_subscriber(cli.verbose);
    tracing::subscriber::with_default(subscriber, || run(cli))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_flag_controls_debug_level() {
        let debug_on = tracing::subscriber::with_default(build_subscriber(true), || {
            tracing::enabled!(Level::DEBUG)
        });
        let debug_off = tracing::subscriber::with_default(build_subscriber(false), || {
            tracing::enabled!(Level::DEBUG)
        });
        assert!(debug_on);
        assert!(!debug_off);
    }

    #[test]
    fn test_folders_required_unless_example_config() {
        assert!(Cli::try_parse_from(["io2rlds"]).is_err());
        assert!(Cli::try_parse_from(["io2rlds", "--example-config"]).is_ok());

        let cli = Cli::try_parse_from([
            "io2rlds",
            "--input_folder",
            "in",
            "--output_folder",
            "out",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.input_folder, Some(PathBuf::from("in")));
        assert_eq!(cli.output_folder, Some(PathBuf::from("out")));
        assert!(cli.verbose);
    }
}
