//! Library build stage.
//!
//! Staleness check, source enumeration, dispatch, then a merge of the
//! per-file artifacts into one artifact per library: `llvm-link` for the
//! bitcode strategies, `lib` for the native toolchain.

use super::compdb;
use super::compile::{CompileUnit, bitcode_unit, native_unit};
use super::core::BuildContext;
use super::dispatch::dispatch_all;
use super::staleness::is_stale;
use crate::error::{BuildError, BuildResult};
use crate::plan::LibrarySpec;
use colored::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryOutcome {
    /// Sources changed (or the artifact was missing) and the library was rebuilt
    Built(PathBuf),
    /// The merged artifact is newer than every source; nothing ran
    Unchanged(PathBuf),
}

impl LibraryOutcome {
    pub fn artifact(&self) -> &PathBuf {
        match self {
            LibraryOutcome::Built(p) | LibraryOutcome::Unchanged(p) => p,
        }
    }

    pub fn was_built(&self) -> bool {
        matches!(self, LibraryOutcome::Built(_))
    }
}

/// Compile units for every compilable file of `library`, in source-spec order.
pub fn plan_units(library: &LibrarySpec, ctx: &BuildContext) -> BuildResult<Vec<CompileUnit>> {
    let out_dir = ctx.layout.library_dir(&library.name);
    let flags = library.include_and_define_flags();
    let mut units = Vec::new();
    let mut outputs = HashSet::new();

    for spec in &library.sources {
        for source in spec.compilable_files()? {
            let unit = if ctx.mode.strategy.uses_bitcode() {
                bitcode_unit(&source, &out_dir, &ctx.mode, ctx.toolchain, &library.version, &flags)
            } else {
                native_unit(&source, &out_dir, &ctx.mode, ctx.toolchain, &library.version, &flags)
            };
            if !outputs.insert(unit.output.clone()) {
                return Err(BuildError::config(format!(
                    "library '{}' has two sources named '{}'; per-file outputs would collide",
                    library.name,
                    source.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
                )));
            }
            units.push(unit);
        }
    }

    if units.is_empty() {
        return Err(BuildError::config(format!(
            "library '{}' has no compilable sources (.c .cc .cpp .cxx)",
            library.name
        )));
    }
    Ok(units)
}

fn merge_command(ctx: &BuildContext, target: &Path, artifacts: &[PathBuf]) -> Vec<String> {
    let inputs = artifacts.iter().map(|p| p.to_string_lossy().to_string());
    if ctx.mode.strategy.uses_bitcode() {
        let mut cmd = vec![
            ctx.toolchain.llvm_link(),
            "-o".to_string(),
            target.to_string_lossy().to_string(),
        ];
        cmd.extend(inputs);
        cmd
    } else {
        let mut args: Vec<String> = inputs.collect();
        args.push("/LTCG".to_string());
        args.push("/nologo".to_string());
        args.push(format!("/OUT:{}", target.display()));
        args.push(format!("/MACHINE:{}", ctx.mode.arch.msvc_machine()));
        ctx.toolchain.native_command(ctx.mode.arch, "lib", args)
    }
}

/// Builds one library unless its merged artifact is up to date.
pub fn build_library(library: &LibrarySpec, ctx: &BuildContext) -> BuildResult<LibraryOutcome> {
    let target = ctx
        .layout
        .library_artifact(&library.name, ctx.mode.strategy);

    if !is_stale(&target, &library.sources)? {
        return Ok(LibraryOutcome::Unchanged(target));
    }

    ctx.runner
        .emit(format!("\n{} {}", "Building".bright_white().bold(), library.name));

    let out_dir = ctx.layout.library_dir(&library.name);
    fs::create_dir_all(&out_dir).map_err(|e| BuildError::io(&out_dir, e))?;

    let units = plan_units(library, ctx)?;
    let artifacts = dispatch_all(&units, ctx.mode.parallel, ctx.runner)?;

    ctx.runner.run(&merge_command(ctx, &target, &artifacts))?;
    compdb::write_library_commands(ctx.layout, &library.name, &units)?;

    Ok(LibraryOutcome::Built(target))
}
