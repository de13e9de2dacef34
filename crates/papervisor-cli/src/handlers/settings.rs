//! `papervisor settings`

use anyhow::Result;
use papervisor_core::{Settings, validate_settings};

/// Print the resolved settings and whether they pass validation.
pub fn execute(settings: &Settings) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(settings)?);
    match validate_settings(settings) {
        Ok(()) => println!("\nSettings are valid."),
        Err(e) => println!("\nSettings are invalid: {e}"),
    }
    Ok(())
}
