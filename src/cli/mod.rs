use crate::checks::Check;
use crate::tag::Tag;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "winfs-ci")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the image for a tag and run the checklist against it
    Run {
        /// Image tag to test (1709, 1803, 2019); overrides VERSION_TAG
        #[arg(long)]
        tag: Option<Tag>,

        /// Test an existing image instead of building one
        #[arg(long)]
        image: Option<String>,

        /// Skip `docker build` and test the image already tagged for this version
        #[arg(long)]
        skip_build: bool,

        /// Directory containing <tag>/Dockerfile
        #[arg(long, value_name = "DIRECTORY")]
        images_dir: Option<PathBuf>,

        /// Directory containing the per-tag service fixtures
        #[arg(long, value_name = "DIRECTORY")]
        fixtures_dir: Option<PathBuf>,

        /// Run only these checks (comma-separated, see `winfs-ci checks`)
        #[arg(long, value_delimiter = ',')]
        only: Vec<Check>,

        /// Daemon socket to pass to docker as -H
        #[arg(long)]
        docker_host: Option<String>,

        /// Write the outcome of every check to this file as JSON
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,
    },

    /// Diff two service snapshots and print the result as JSON
    Diff {
        /// Baseline snapshot (JSON array of {Name, StartType})
        baseline: PathBuf,

        /// Actual snapshot, e.g. saved `Get-Service | ConvertTo-JSON` output
        actual: PathBuf,

        /// Expected diff to compare against; exits non-zero on mismatch
        #[arg(long)]
        expected: Option<PathBuf>,
    },

    /// List the available checks
    Checks,

    /// Show version information
    Version,
}
