//! Final link stage.
//!
//! The strategy is matched once in [`link`]; each arm gathers its inputs into
//! a [`LinkPlan`] and builds the matching command. The executable is only
//! relinked when it is stale against those inputs.

use super::core::BuildContext;
use super::mode::{Mode, LinkStrategy};
use super::staleness::is_stale_against;
use crate::error::{BuildError, BuildResult};
use crate::toolchain::{Host, Toolchain};
use colored::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Runtime libraries for native-symbol debug links on Windows
const DEBUG_CRT: [&str; 5] = [
    "libcmtd.lib",
    "libvcruntimed.lib",
    "oldnames.lib",
    "legacy_stdio_definitions.lib",
    "legacy_stdio_wide_specifiers.lib",
];

const MSVC_SYSTEM_LIBS: [&str; 8] = [
    "kernel32.lib",
    "user32.lib",
    "gdi32.lib",
    "winspool.lib",
    "shell32.lib",
    "ole32.lib",
    "oleaut32.lib",
    "uuid.lib",
];

/// Ordered link inputs plus native libraries passed through verbatim
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPlan {
    pub inputs: Vec<PathBuf>,
    pub native_libs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked(PathBuf),
    UpToDate(PathBuf),
}

impl LinkOutcome {
    pub fn executable(&self) -> &Path {
        match self {
            LinkOutcome::Linked(p) | LinkOutcome::UpToDate(p) => p,
        }
    }
}

fn lossy(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Files with extension `ext` under `dir`, recursively, sorted by name
fn collect_artifacts(dir: &Path, ext: &str) -> BuildResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            BuildError::io(path, e.into())
        })?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|x| x == ext) {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// Lowers a library's merged bitcode to a native object with `llc`, unless
/// the object is already newer.
pub fn lower_library(library: &str, ctx: &BuildContext) -> BuildResult<PathBuf> {
    let bitcode = ctx.layout.library_artifact(library, LinkStrategy::Fast);
    let object = ctx.layout.library_object(library);
    if is_stale_against(&object, std::slice::from_ref(&bitcode))? {
        ctx.runner.run(&[
            ctx.toolchain.llc(),
            "-filetype=obj".to_string(),
            "-o".to_string(),
            lossy(&object),
            lossy(&bitcode),
        ])?;
    }
    Ok(object)
}

/// Project bitcode plus the lowered object of every other library
pub fn fast_plan(
    project: &str,
    libraries: &[&str],
    native_libs: &[String],
    ctx: &BuildContext,
) -> BuildResult<LinkPlan> {
    let mut inputs = vec![ctx.layout.library_artifact(project, LinkStrategy::Fast)];
    for library in libraries.iter().filter(|l| **l != project) {
        inputs.push(lower_library(library, ctx)?);
    }
    Ok(LinkPlan {
        inputs,
        native_libs: native_libs.to_vec(),
    })
}

/// Every per-file bitcode artifact of every library, in library order
pub fn whole_program_plan(
    libraries: &[&str],
    native_libs: &[String],
    ctx: &BuildContext,
) -> BuildResult<LinkPlan> {
    let mut inputs = Vec::new();
    for library in libraries {
        inputs.extend(collect_artifacts(&ctx.layout.library_dir(library), "bc")?);
    }
    Ok(LinkPlan {
        inputs,
        native_libs: native_libs.to_vec(),
    })
}

/// Archives of the other libraries plus the project's own objects
pub fn native_plan(
    project: &str,
    libraries: &[&str],
    native_libs: &[String],
    ctx: &BuildContext,
) -> BuildResult<LinkPlan> {
    let mut inputs: Vec<PathBuf> = libraries
        .iter()
        .filter(|l| **l != project)
        .map(|l| ctx.layout.library_artifact(l, LinkStrategy::NativeToolchain))
        .collect();
    inputs.extend(collect_artifacts(&ctx.layout.library_dir(project), "obj")?);
    Ok(LinkPlan {
        inputs,
        native_libs: native_libs.to_vec(),
    })
}

/// Link command for the bitcode strategies.
///
/// Native-symbol builds go through clang with debug info; otherwise Windows
/// uses `lld-link` against the configured SDK and Unix lets clang drive the
/// system linker.
pub fn bitcode_link_command(
    plan: &LinkPlan,
    exe: &Path,
    mode: &Mode,
    toolchain: &Toolchain,
) -> Vec<String> {
    let inputs = plan.inputs.iter().map(|p| lossy(p));
    let arch = mode.arch;

    if mode.native_symbols {
        let mut cmd = vec![toolchain.clang()];
        cmd.extend(inputs);
        cmd.extend([
            "-o".to_string(),
            lossy(exe),
            "--debug".to_string(),
            arch.clang_flag().to_string(),
            toolchain.host.native_debug_flag().to_string(),
        ]);
        if toolchain.host == Host::Windows {
            let lib_dir = toolchain.msvc_lib_dir(arch);
            cmd.extend(DEBUG_CRT.iter().map(|l| lossy(&lib_dir.join(l))));
        }
        cmd.extend(plan.native_libs.iter().cloned());
        return cmd;
    }

    match toolchain.host {
        Host::Windows => {
            let d = mode.debug;
            let mut cmd = vec![toolchain.lld_link()];
            cmd.extend(inputs);
            cmd.extend([
                format!("/out:{}", exe.display()),
                format!("/machine:{}", arch.platform()),
                "/nodefaultlib".to_string(),
                "/subsystem:console".to_string(),
                "/opt:lldltojobs=8".to_string(),
                format!("/libpath:{}", toolchain.msvc_lib_dir(arch).display()),
                format!("/libpath:{}", toolchain.windows_lib_dir("ucrt", arch).display()),
                format!("/libpath:{}", toolchain.windows_lib_dir("um", arch).display()),
            ]);
            cmd.extend(plan.native_libs.iter().cloned());
            let crt = [
                if d { "libcpmtd.lib" } else { "libcpmt.lib" },
                if d { "libucrtd.lib" } else { "libucrt.lib" },
                if d { "libvcruntimed.lib" } else { "libvcruntime.lib" },
                if d { "libcmtd.lib" } else { "libcmt.lib" },
                "shell32.lib",
                "ole32.lib",
                "advapi32.lib",
                if d { "concrtd.lib" } else { "concrt.lib" },
                "legacy_stdio_definitions.lib",
                "oldnames.lib",
                "legacy_stdio_wide_specifiers.lib",
                "kernel32.lib",
                "User32.lib",
            ];
            cmd.extend(crt.iter().map(|s| s.to_string()));
            cmd
        }
        Host::Unix => {
            let mut cmd = vec![toolchain.clang()];
            cmd.extend(inputs);
            cmd.extend(["-o".to_string(), lossy(exe), arch.clang_flag().to_string()]);
            cmd.extend(plan.native_libs.iter().cloned());
            cmd
        }
    }
}

/// `link` command for the native toolchain
pub fn msvc_link_command(
    plan: &LinkPlan,
    exe: &Path,
    mode: &Mode,
    toolchain: &Toolchain,
) -> Vec<String> {
    let mut args: Vec<String> = plan.inputs.iter().map(|p| lossy(p)).collect();
    args.extend([
        "/INCREMENTAL:NO".to_string(),
        "/SUBSYSTEM:CONSOLE".to_string(),
        "/nologo".to_string(),
        "/LTCG".to_string(),
        format!("/OUT:{}", exe.display()),
        format!("/MACHINE:{}", mode.arch.msvc_machine()),
        "/MANIFEST".to_string(),
        "/NXCOMPAT".to_string(),
        "/DYNAMICBASE".to_string(),
    ]);
    args.extend(plan.native_libs.iter().cloned());
    args.extend(MSVC_SYSTEM_LIBS.iter().map(|s| s.to_string()));
    toolchain.native_command(mode.arch, "link", args)
}

/// Produces the executable with the strategy selected in `ctx.mode`.
pub fn link(
    project: &str,
    libraries: &[&str],
    native_libs: &[String],
    ctx: &BuildContext,
) -> BuildResult<LinkOutcome> {
    let exe = ctx.layout.executable(project, &ctx.mode, ctx.toolchain.host);

    let (plan, command) = match ctx.mode.strategy {
        LinkStrategy::Fast => {
            let plan = fast_plan(project, libraries, native_libs, ctx)?;
            let cmd = bitcode_link_command(&plan, &exe, &ctx.mode, ctx.toolchain);
            (plan, cmd)
        }
        LinkStrategy::WholeProgram => {
            let plan = whole_program_plan(libraries, native_libs, ctx)?;
            let cmd = bitcode_link_command(&plan, &exe, &ctx.mode, ctx.toolchain);
            (plan, cmd)
        }
        LinkStrategy::NativeToolchain => {
            let plan = native_plan(project, libraries, native_libs, ctx)?;
            let cmd = msvc_link_command(&plan, &exe, &ctx.mode, ctx.toolchain);
            (plan, cmd)
        }
    };

    if !is_stale_against(&exe, &plan.inputs)? {
        return Ok(LinkOutcome::UpToDate(exe));
    }

    ctx.runner.emit(format!(
        "   {} Linking ({})...",
        "🔗".cyan(),
        ctx.mode.strategy.name()
    ));
    ctx.runner.run(&command)?;
    Ok(LinkOutcome::Linked(exe))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::layout::OutputLayout;
    use crate::build::mode::{Arch, LinkChoice, ModeRequest};
    use crate::build::process::ProcessRunner;
    use std::fs;

    fn mode(debug: bool, native_symbols: bool, link: LinkChoice) -> Mode {
        Mode::resolve(ModeRequest {
            arch: Arch::X64,
            debug,
            native_symbols,
            parallel: false,
            link,
        })
        .unwrap()
    }

    fn plan() -> LinkPlan {
        LinkPlan {
            inputs: vec![PathBuf::from("app.bc"), PathBuf::from("core.o")],
            native_libs: vec!["extra.lib".into()],
        }
    }

    #[test]
    fn test_unix_link_uses_clang_driver() {
        let tc = Toolchain {
            host: Host::Unix,
            ..Default::default()
        };
        let cmd = bitcode_link_command(&plan(), Path::new("bin/app"), &mode(true, false, LinkChoice::Auto), &tc);
        assert_eq!(
            cmd,
            vec!["clang", "app.bc", "core.o", "-o", "bin/app", "-m64", "extra.lib"]
        );
    }

    #[test]
    fn test_windows_link_uses_lld_with_crt_variant() {
        let tc = Toolchain {
            host: Host::Windows,
            ..Default::default()
        };
        let debug = bitcode_link_command(&plan(), Path::new("app.exe"), &mode(true, false, LinkChoice::Auto), &tc);
        assert_eq!(debug[0], "lld-link");
        assert!(debug.contains(&"/out:app.exe".to_string()));
        assert!(debug.contains(&"/machine:x64".to_string()));
        assert!(debug.contains(&"libcmtd.lib".to_string()));
        assert!(debug.contains(&"extra.lib".to_string()));

        let release = bitcode_link_command(&plan(), Path::new("app.exe"), &mode(false, false, LinkChoice::Auto), &tc);
        assert!(release.contains(&"libcmt.lib".to_string()));
        assert!(!release.contains(&"libcmtd.lib".to_string()));
    }

    #[test]
    fn test_native_symbols_link_through_clang_debug() {
        let tc = Toolchain {
            host: Host::Windows,
            ..Default::default()
        };
        let cmd = bitcode_link_command(&plan(), Path::new("debugee.exe"), &mode(true, true, LinkChoice::Auto), &tc);
        assert_eq!(cmd[0], "clang");
        assert!(cmd.contains(&"--debug".to_string()));
        assert!(cmd.contains(&"-gcodeview".to_string()));
        assert!(cmd.iter().any(|a| a.ends_with("libvcruntimed.lib")));
        assert_eq!(cmd.last().map(String::as_str), Some("extra.lib"));
    }

    #[test]
    fn test_msvc_link_command_shape() {
        let tc = Toolchain::default();
        let cmd = msvc_link_command(&plan(), Path::new("app.exe"), &mode(false, false, LinkChoice::Native), &tc);
        assert_eq!(cmd[0], "link");
        assert!(cmd.contains(&"/LTCG".to_string()));
        assert!(cmd.contains(&"/MACHINE:X64".to_string()));
        assert!(cmd.contains(&"/OUT:app.exe".to_string()));
        assert_eq!(cmd.last().map(String::as_str), Some("uuid.lib"));
    }

    #[test]
    fn test_whole_program_collects_every_per_file_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let m = mode(false, false, LinkChoice::WholeProgram);
        let layout = OutputLayout::new(dir.path(), &m);
        let tc = Toolchain::default();
        let runner = ProcessRunner::default().quiet(true);
        let ctx = BuildContext {
            mode: m,
            toolchain: &tc,
            layout: &layout,
            runner: &runner,
        };

        for (lib, files) in [("A", vec!["a2.cpp.bc", "a1.cpp.bc"]), ("B", vec!["b1.cpp.bc"])] {
            let lib_dir = layout.library_dir(lib);
            fs::create_dir_all(&lib_dir).unwrap();
            for f in files {
                fs::write(lib_dir.join(f), "").unwrap();
            }
            fs::write(lib_dir.join("stray.txt"), "").unwrap();
        }

        let plan = whole_program_plan(&["A", "B"], &[], &ctx).unwrap();
        let names: Vec<_> = plan
            .inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a1.cpp.bc", "a2.cpp.bc", "b1.cpp.bc"]);
    }
}
