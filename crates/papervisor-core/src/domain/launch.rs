//! Launch description for the supervised process.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Flag that keeps the server from opening its own console window.
pub const HEADLESS_FLAG: &str = "nogui";

/// Everything needed to spawn the supervised process.
///
/// This is an intent-based description; building the OS command from it is
/// the runtime's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSpec {
    /// Executable to run (usually `java`).
    pub program: PathBuf,
    /// Working directory of the server.
    pub work_dir: PathBuf,
    /// Full argument list.
    pub args: Vec<String>,
}

impl LaunchSpec {
    /// Create a spec from raw parts.
    pub fn new(program: impl Into<PathBuf>, work_dir: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            work_dir: work_dir.into(),
            args,
        }
    }

    /// The JVM launch for a Paper server jar.
    ///
    /// The heap size is applied as both minimum and maximum, followed by the
    /// jar, the headless flag and any extra arguments.
    pub fn paper(
        java: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
        heap: &str,
        jar_file: &str,
        extra_args: &[String],
    ) -> Self {
        let mut args = vec![
            format!("-Xmx{heap}"),
            format!("-Xms{heap}"),
            "-jar".to_string(),
            jar_file.to_string(),
            HEADLESS_FLAG.to_string(),
        ];
        args.extend(extra_args.iter().cloned());
        Self::new(java, work_dir, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paper_launch_arguments() {
        let spec = LaunchSpec::paper("java", "/srv/mc", "2048M", "server.jar", &[]);
        assert_eq!(spec.program, PathBuf::from("java"));
        assert_eq!(spec.work_dir, PathBuf::from("/srv/mc"));
        assert_eq!(
            spec.args,
            vec!["-Xmx2048M", "-Xms2048M", "-jar", "server.jar", "nogui"]
        );
    }

    #[test]
    fn test_paper_launch_appends_extra_args() {
        let extra = vec!["--port".to_string(), "25566".to_string()];
        let spec = LaunchSpec::paper("java", ".", "1G", "paper.jar", &extra);
        assert_eq!(spec.args.last().map(String::as_str), Some("25566"));
        assert_eq!(spec.args[4], HEADLESS_FLAG);
    }
}
