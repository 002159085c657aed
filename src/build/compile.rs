//! Per-file compilation.
//!
//! Assembles the mode-dependent command line for one source file and runs
//! it. Bitcode strategies emit one `<file>.bc` per source with clang; the
//! native toolchain emits one `<file>.obj` with `cl`.

use super::mode::Mode;
use super::process::{LineClass, ProcessRunner};
use super::utils::{std_flag_clang, std_flag_msvc};
use crate::error::BuildResult;
use crate::plan::is_plain_c;
use crate::toolchain::Toolchain;
use colored::*;
use std::path::{Path, PathBuf};

/// Size/performance profile appended to every release compile, never to debug ones
pub const RELEASE_PROFILE: [&str; 8] = [
    "-Oz",
    "-flto",
    "-ffunction-sections",
    "-fno-integrated-as",
    "-fomit-frame-pointer",
    "-fno-stack-protector",
    "-fmerge-all-constants",
    "-fvisibility=hidden",
];

const WARNING_SUPPRESSIONS: [&str; 2] = ["-Wno-deprecated-declarations", "-Wno-microsoft-template"];

/// Fixed `cl` profile for the native toolchain (release only)
const MSVC_PROFILE: [&str; 19] = [
    "/GL",
    "/analyze-",
    "/W0",
    "/Gy",
    "/Zc:wchar_t",
    "/Zc:inline",
    "/fp:precise",
    "/DNDEBUG",
    "/c",
    "/WX-",
    "/Zc:forScope",
    "/Gd",
    "/Oy",
    "/Oi",
    "/MT",
    "/EHsc",
    "/nologo",
    "/Ox",
    "/sdl-",
];

/// One source file with its output path and full command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileUnit {
    pub source: PathBuf,
    pub output: PathBuf,
    pub command: Vec<String>,
}

/// `<out_dir>/<source file name>.<ext>`
pub fn artifact_path(source: &Path, out_dir: &Path, ext: &str) -> PathBuf {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    out_dir.join(format!("{}.{}", name, ext))
}

/// Mode-derived clang flags for `source`, excluding input and output.
///
/// Order: emit bitcode, architecture, debug info, debug define, warning
/// suppressions, language standard, includes/defines, release profile.
pub fn bitcode_flags(
    source: &Path,
    mode: &Mode,
    toolchain: &Toolchain,
    version: &str,
    include_and_define: &[String],
) -> Vec<String> {
    let mut flags: Vec<String> = vec!["-emit-llvm".into(), "-c".into()];
    flags.push(mode.arch.clang_flag().into());

    if mode.native_symbols {
        flags.push("--debug".into());
        flags.push(toolchain.host.native_debug_flag().into());
    } else if mode.debug {
        flags.push("-g".into());
    }

    if mode.debug {
        flags.push("-D_DEBUG".into());
    }

    flags.extend(WARNING_SUPPRESSIONS.iter().map(|s| s.to_string()));

    if !is_plain_c(source)
        && let Some(std) = std_flag_clang(version)
    {
        flags.push(std);
    }

    flags.extend(include_and_define.iter().filter(|f| !f.is_empty()).cloned());

    if !mode.debug {
        flags.extend(RELEASE_PROFILE.iter().map(|s| s.to_string()));
    }

    flags
}

/// Clang unit producing `<out_dir>/<file>.bc`
pub fn bitcode_unit(
    source: &Path,
    out_dir: &Path,
    mode: &Mode,
    toolchain: &Toolchain,
    version: &str,
    include_and_define: &[String],
) -> CompileUnit {
    let output = artifact_path(source, out_dir, "bc");
    let mut command = vec![
        toolchain.clang(),
        source.to_string_lossy().to_string(),
        "-o".to_string(),
        output.to_string_lossy().to_string(),
    ];
    command.extend(bitcode_flags(source, mode, toolchain, version, include_and_define));
    CompileUnit {
        source: source.to_path_buf(),
        output,
        command,
    }
}

/// `cl` unit producing `<out_dir>/<file>.obj`. Clang-style `-I`/`-D` flags
/// are rewritten to their `/I`/`/D` forms.
pub fn native_unit(
    source: &Path,
    out_dir: &Path,
    mode: &Mode,
    toolchain: &Toolchain,
    version: &str,
    include_and_define: &[String],
) -> CompileUnit {
    let output = artifact_path(source, out_dir, "obj");
    let mut args = vec![source.to_string_lossy().to_string()];
    args.extend(
        include_and_define
            .iter()
            .filter_map(|f| f.strip_prefix('-').map(|rest| format!("/{}", rest))),
    );
    args.extend(MSVC_PROFILE.iter().map(|s| s.to_string()));
    if !is_plain_c(source)
        && let Some(std) = std_flag_msvc(version)
    {
        args.push(std);
    }
    args.push(format!("/Fo{}", output.display()));

    CompileUnit {
        source: source.to_path_buf(),
        output,
        command: toolchain.native_command(mode.arch, "cl", args),
    }
}

/// Runs one unit, announcing the file by its base name.
pub fn compile(unit: &CompileUnit, runner: &ProcessRunner) -> BuildResult<PathBuf> {
    let name = unit
        .source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    runner.emit(format!("   {} {}", "⚙".blue(), name));
    let result = runner.run(&unit.command)?;
    let warnings = result.count(LineClass::Warning);
    if warnings > 0 {
        runner.emit(format!("   {} {} warning(s) in {}", "!".yellow(), warnings, name));
    }
    Ok(unit.output.clone())
}
