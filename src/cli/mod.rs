//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no packing logic - that belongs in the [`crate::core`] module.

pub mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::defaults::ENV_IMAGE_BUILDER;
use crate::core::global_config::GlobalConfig;
use crate::core::pack::{PackConfig, Packer};
use crate::infra::dirs::AppDirs;
use crate::infra::image_builder::CommandImageBuilder;
use output::{OutputConfig, SpinnerProgress};

/// Package a target-files archive into a flashable image archive
///
/// Writes boot.img, recovery.img, the partition images, android-info.txt
/// and the radio firmware into OUTPUT, ready for `fastboot update`.
#[derive(Parser, Debug)]
#[command(name = "img-from-target-files")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Output the run summary in JSON format for scripting
    #[arg(long)]
    pub json: bool,

    /// Deprecated, accepted and ignored
    #[arg(short = 'b', long = "board_config", value_name = "FILE")]
    pub board_config: Option<PathBuf>,

    /// Only include boot.img and recovery.img
    #[arg(short = 'z', long = "bootable_zip")]
    pub bootable_zip: bool,

    /// Program that builds a filesystem image from a directory
    #[arg(long, value_name = "PROGRAM", env = ENV_IMAGE_BUILDER)]
    pub image_builder: Option<String>,

    /// Input target-files archive
    pub input: PathBuf,

    /// Output image archive
    pub output: PathBuf,
}

/// Options that change how a run is configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOption {
    /// `--board_config`, no longer has any effect
    BoardConfig(PathBuf),
    /// `--bootable_zip`
    BootableZip,
}

impl ToolOption {
    /// Apply this option to `config`
    pub fn apply(&self, config: &mut PackConfig) {
        match self {
            Self::BoardConfig(path) => {
                tracing::warn!(
                    "--board_config {} is deprecated and ignored",
                    path.display()
                );
            }
            Self::BootableZip => config.bootable_only = true,
        }
    }
}

impl Cli {
    /// Options given on the command line, in a fixed order
    pub fn options(&self) -> Vec<ToolOption> {
        let mut options = Vec::new();
        if let Some(path) = &self.board_config {
            options.push(ToolOption::BoardConfig(path.clone()));
        }
        if self.bootable_zip {
            options.push(ToolOption::BootableZip);
        }
        options
    }

    /// Build the run configuration from the arguments
    pub fn pack_config(&self) -> PackConfig {
        let mut config = PackConfig::new(&self.input, &self.output);
        for option in self.options() {
            option.apply(&mut config);
        }
        config
    }

    /// Output preferences, merging flags with the user configuration
    pub fn output_config(&self, global: &GlobalConfig) -> OutputConfig {
        OutputConfig::new(
            self.quiet || global.output.quiet.unwrap_or(false),
            self.json || global.output.json.unwrap_or(false),
            self.verbose,
        )
    }

    /// Execute the packing run
    pub fn run(self, global: &GlobalConfig) -> Result<()> {
        let output_config = self.output_config(global);
        let config = self.pack_config();

        let builder = if config.bootable_only {
            None
        } else {
            let program = global.builder_program(self.image_builder.as_deref());
            Some(
                CommandImageBuilder::resolve(&program, global.builder_args())
                    .context("Cannot build partition images")?,
            )
        };

        let progress = SpinnerProgress::new(output_config.show_progress());
        let mut packer = Packer::new(&config).with_progress(&progress);
        if let Some(builder) = &builder {
            packer = packer.with_builder(builder);
        }

        let summary = packer
            .run()
            .with_context(|| format!("Failed to create {}", config.output.display()))?;

        output::print_summary(&summary, &output_config)
    }
}

/// Load the user configuration from the platform config directory
pub fn load_global_config() -> Result<GlobalConfig> {
    let dirs = AppDirs::new();
    GlobalConfig::load(&dirs).context("Failed to load configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(
            std::iter::once("img-from-target-files").chain(args.iter().copied()),
        )
        .unwrap()
    }

    #[test]
    fn test_positional_arguments() {
        let cli = parse(&["in.zip", "out.zip"]);
        let config = cli.pack_config();
        assert_eq!(config, PackConfig::new("in.zip", "out.zip"));
    }

    #[test]
    fn test_bootable_zip_flag() {
        let cli = parse(&["--bootable_zip", "in.zip", "out.zip"]);
        assert!(cli.pack_config().bootable_only);

        let cli = parse(&["-z", "in.zip", "out.zip"]);
        assert!(cli.pack_config().bootable_only);
    }

    #[test]
    fn test_board_config_is_inert() {
        let cli = parse(&["--board_config", "board.txt", "in.zip", "out.zip"]);
        assert_eq!(
            cli.options(),
            vec![ToolOption::BoardConfig(PathBuf::from("board.txt"))]
        );
        assert_eq!(cli.pack_config(), PackConfig::new("in.zip", "out.zip"));
    }

    #[test]
    fn test_wrong_argument_count_rejected() {
        assert!(Cli::try_parse_from(["img-from-target-files", "in.zip"]).is_err());
        assert!(Cli::try_parse_from(["img-from-target-files", "a", "b", "c"]).is_err());
    }

    #[test]
    fn test_output_config_merges_user_preferences() {
        let cli = parse(&["in.zip", "out.zip"]);
        let mut global = GlobalConfig::default();
        global.output.json = Some(true);
        let output = cli.output_config(&global);
        assert!(output.json);
        assert!(!output.quiet);
    }
}
