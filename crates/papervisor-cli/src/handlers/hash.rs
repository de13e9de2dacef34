//! `papervisor hash <file>`

use std::path::Path;

use anyhow::Result;
use papervisor_core::file_sha256;

use crate::error::CliError;

/// Print the SHA-256 of `file` in `sha256sum` format.
///
/// A missing file is an error here, unlike the verifier itself which reports
/// an empty digest for it.
pub async fn execute(file: &Path) -> Result<()> {
    if !file.is_file() {
        return Err(CliError::Arguments(format!("{} is not a file", file.display())).into());
    }
    let digest = file_sha256(file.to_path_buf()).await.map_err(CliError::from)?;
    println!("{digest}  {}", file.display());
    Ok(())
}
