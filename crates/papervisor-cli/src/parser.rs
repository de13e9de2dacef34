//! Root CLI structure with global options.

use std::path::PathBuf;

use clap::Parser;
use papervisor_core::Settings;

use crate::commands::Commands;

/// Supervise a PaperMC server and manage its players.
///
/// Settings come from the environment (and `.env`); the global flags below
/// override the matching variables for one invocation.
#[derive(Parser)]
#[command(name = "papervisor")]
#[command(about = "Supervise a PaperMC server and manage its players")]
#[command(version)]
pub struct Cli {
    /// Server working directory
    #[arg(long = "work-dir", env = "MC_WORKDIR", global = true)]
    pub work_dir: Option<PathBuf>,

    /// Server jar inside the working directory
    #[arg(long = "jar", env = "JAR_FILE", global = true)]
    pub jar_file: Option<String>,

    /// JVM heap size, e.g. 4G
    #[arg(long = "ram", env = "RAM", global = true)]
    pub heap_size: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Apply command-line overrides on top of environment settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(work_dir) = &self.work_dir {
            settings.work_dir.clone_from(work_dir);
        }
        if let Some(jar_file) = &self.jar_file {
            settings.jar_file.clone_from(jar_file);
        }
        if let Some(heap_size) = &self.heap_size {
            settings.heap_size.clone_from(heap_size);
        }
    }
}
