//! `compile_commands.json` generation.
//!
//! Each library that compiles records its own entries next to its merged
//! artifact; the project-wide database is reassembled from those after every
//! run, so unchanged libraries keep their entries.

use super::compile::CompileUnit;
use super::layout::OutputLayout;
use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEntry {
    pub directory: String,
    pub command: String,
    pub file: String,
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> BuildResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| BuildError::io(path, io::Error::other(e)))?;
    fs::write(path, text).map_err(|e| BuildError::io(path, e))
}

pub fn write_library_commands(
    layout: &OutputLayout,
    library: &str,
    units: &[CompileUnit],
) -> BuildResult<()> {
    let cwd = std::env::current_dir().map_err(|e| BuildError::io(".", e))?;
    let directory = cwd.to_string_lossy().to_string();
    let entries: Vec<CommandEntry> = units
        .iter()
        .map(|unit| CommandEntry {
            directory: directory.clone(),
            command: unit.command.join(" "),
            file: unit.source.to_string_lossy().to_string(),
        })
        .collect();
    write_json(&layout.commands_file(library), &entries)
}

/// Concatenates the per-library entries of `libraries`, in order, into the
/// project database. Libraries without a record are skipped.
pub fn assemble(layout: &OutputLayout, libraries: &[&str]) -> BuildResult<usize> {
    let mut all = Vec::new();
    for library in libraries {
        let path = layout.commands_file(library);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(BuildError::io(&path, e)),
        };
        let entries: Vec<CommandEntry> = serde_json::from_str(&text)
            .map_err(|e| BuildError::io(&path, io::Error::other(e)))?;
        all.extend(entries);
    }
    write_json(&layout.compile_commands(), &all)?;
    Ok(all.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::mode::{Mode, ModeRequest};
    use std::path::PathBuf;

    #[test]
    fn test_assemble_concatenates_in_library_order() {
        let dir = tempfile::tempdir().unwrap();
        let mode = Mode::resolve(ModeRequest {
            debug: true,
            ..Default::default()
        })
        .unwrap();
        let layout = OutputLayout::new(dir.path(), &mode);
        layout.create().unwrap();

        let unit = |src: &str| CompileUnit {
            source: PathBuf::from(src),
            output: PathBuf::from(format!("{src}.bc")),
            command: vec!["clang".into(), src.into()],
        };
        write_library_commands(&layout, "B", &[unit("b1.cpp")]).unwrap();
        write_library_commands(&layout, "A", &[unit("a1.cpp"), unit("a2.cpp")]).unwrap();

        let count = assemble(&layout, &["A", "B", "missing"]).unwrap();
        assert_eq!(count, 3);

        let text = fs::read_to_string(layout.compile_commands()).unwrap();
        let entries: Vec<CommandEntry> = serde_json::from_str(&text).unwrap();
        let files: Vec<_> = entries.iter().map(|e| e.file.as_str()).collect();
        assert_eq!(files, vec!["a1.cpp", "a2.cpp", "b1.cpp"]);
        assert_eq!(entries[0].command, "clang a1.cpp");
    }
}
