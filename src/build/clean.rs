//! Build artifact cleanup.
//!
//! - `bw clean` - Remove the current configuration's output tree (`bin/<Configuration>`)
//! - `bw clean --all` - Remove every configuration (`bin/`)

use super::layout::OutputLayout;
use super::mode::Mode;
use anyhow::{Context, Result};
use colored::*;

use std::fs;
use std::path::Path;

pub fn clean(base: &Path, mode: &Mode, all: bool) -> Result<()> {
    let target = if all {
        base.join("bin")
    } else {
        OutputLayout::new(base, mode).root().to_path_buf()
    };

    if target.exists() {
        fs::remove_dir_all(&target)
            .with_context(|| format!("Failed to remove {}", target.display()))?;
        println!("{} Removed {}", "🗑️".red(), target.display());
        println!("{} Clean complete.", "✓".green());
    } else {
        println!("{} Nothing to clean", "!".yellow());
    }
    Ok(())
}
