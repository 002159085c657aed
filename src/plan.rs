//! The resolved build plan.
//!
//! A [`BuildPlan`] is what the build core consumes: libraries in declaration
//! order, the distinguished project library, the frozen [`Mode`] and the
//! toolchain. It is produced by [`crate::config`] and never mutated.

use crate::build::Mode;
use crate::error::{BuildError, BuildResult};
use crate::toolchain::Toolchain;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions the compiler is invoked on
pub const COMPILABLE_EXTENSIONS: [&str; 4] = ["c", "cc", "cpp", "cxx"];

pub fn is_compilable(path: &Path) -> bool {
    path.extension()
        .map(|ext| COMPILABLE_EXTENSIONS.contains(&ext.to_string_lossy().as_ref()))
        .unwrap_or(false)
}

/// Plain C sources get no language-standard flag
pub fn is_plain_c(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "c")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Directory,
}

/// A single source file, or a directory meaning its immediate compilable children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    path: PathBuf,
    kind: SourceKind,
}

impl SourceSpec {
    /// Classifies `path` by looking at the filesystem. A missing path is an error.
    pub fn resolve(path: impl Into<PathBuf>) -> BuildResult<Self> {
        let path = path.into();
        let meta = fs::metadata(&path).map_err(|e| BuildError::io(&path, e))?;
        let kind = if meta.is_dir() {
            SourceKind::Directory
        } else {
            SourceKind::File
        };
        Ok(Self { path, kind })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Files this spec contributes to staleness checks.
    ///
    /// A file spec is itself, whatever its extension. A directory spec is its
    /// immediate compilable children, sorted by name; subdirectories are not
    /// descended into.
    pub fn files(&self) -> BuildResult<Vec<PathBuf>> {
        match self.kind {
            SourceKind::File => Ok(vec![self.path.clone()]),
            SourceKind::Directory => {
                let entries = fs::read_dir(&self.path).map_err(|e| BuildError::io(&self.path, e))?;
                let mut files = Vec::new();
                for entry in entries {
                    let entry = entry.map_err(|e| BuildError::io(&self.path, e))?;
                    let path = entry.path();
                    if path.is_file() && is_compilable(&path) {
                        files.push(path);
                    }
                }
                files.sort();
                Ok(files)
            }
        }
    }

    /// Files this spec hands to the compiler
    pub fn compilable_files(&self) -> BuildResult<Vec<PathBuf>> {
        Ok(self.files()?.into_iter().filter(|f| is_compilable(f)).collect())
    }

    /// Include directory implied by this spec: the directory itself, or a file's parent
    pub fn include_dir(&self) -> PathBuf {
        match self.kind {
            SourceKind::Directory => self.path.clone(),
            SourceKind::File => self
                .path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

/// One named library of the plan
#[derive(Debug, Clone)]
pub struct LibrarySpec {
    pub name: String,
    pub sources: Vec<SourceSpec>,
    /// Language standard for non-plain-C sources, e.g. `c++17`
    pub version: String,
    pub includes: Vec<PathBuf>,
    pub defines: Vec<String>,
}

impl LibrarySpec {
    /// Include and define flags in clang syntax: declared includes, then the
    /// directory of every source spec, then defines. First occurrence wins.
    pub fn include_and_define_flags(&self) -> Vec<String> {
        let mut flags: Vec<String> = Vec::new();
        let includes = self
            .includes
            .iter()
            .cloned()
            .chain(self.sources.iter().map(SourceSpec::include_dir));
        for dir in includes {
            let flag = format!("-I{}", dir.display());
            if !flags.contains(&flag) {
                flags.push(flag);
            }
        }
        for define in &self.defines {
            let flag = format!("-D{}", define);
            if !flags.contains(&flag) {
                flags.push(flag);
            }
        }
        flags
    }
}

/// Fully resolved input of a build run
#[derive(Debug, Clone)]
pub struct BuildPlan {
    /// Libraries in declaration order; this is the build order
    pub libraries: Vec<LibrarySpec>,
    /// Name of the library that becomes the executable
    pub project: String,
    pub mode: Mode,
    /// Native libraries passed verbatim to every final link
    pub native_libs: Vec<String>,
    /// Tool output lines containing any of these are not printed
    pub ignore: Vec<String>,
    pub toolchain: Toolchain,
    /// Directory the `bin/` output tree is created in
    pub root: PathBuf,
}

impl BuildPlan {
    pub fn project_library(&self) -> Option<&LibrarySpec> {
        self.libraries.iter().find(|l| l.name == self.project)
    }

    pub fn library_names(&self) -> Vec<&str> {
        self.libraries.iter().map(|l| l.name.as_str()).collect()
    }
}
