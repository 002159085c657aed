//! External toolchain description.
//!
//! Resolves tool names against the configured LLVM bin directory and builds
//! the command lines for native MSVC tools, optionally wrapped in a
//! `vcvarsall.bat` environment.

pub mod types;

pub use types::{Host, SdkPaths, Toolchain};

use crate::build::Arch;
use std::path::{Path, PathBuf};

impl Toolchain {
    fn llvm_tool(&self, name: &str) -> String {
        match &self.llvm_bindir {
            Some(dir) => dir.join(name).to_string_lossy().to_string(),
            None => name.to_string(),
        }
    }

    pub fn clang(&self) -> String {
        self.llvm_tool("clang")
    }

    pub fn llvm_link(&self) -> String {
        self.llvm_tool("llvm-link")
    }

    pub fn llc(&self) -> String {
        self.llvm_tool("llc")
    }

    pub fn lld_link(&self) -> String {
        self.llvm_tool("lld-link")
    }

    /// `<msvc>/lib/<platform>`
    pub fn msvc_lib_dir(&self, arch: Arch) -> PathBuf {
        self.sdk.msvc.join("lib").join(arch.platform())
    }

    /// `<winsdk>/<kind>/<platform>` for `ucrt` and `um`
    pub fn windows_lib_dir(&self, kind: &str, arch: Arch) -> PathBuf {
        self.sdk.windows.join(kind).join(arch.platform())
    }

    /// Command line for a native MSVC tool (`cl`, `lib`, `link`).
    ///
    /// Without `sdk.vcvarsall` the tool is expected on `PATH`. With it, the
    /// tool runs through `cmd /C` after `vcvarsall.bat <platform>` has set up
    /// the environment.
    pub fn native_command(&self, arch: Arch, tool: &str, args: Vec<String>) -> Vec<String> {
        match &self.sdk.vcvarsall {
            None => std::iter::once(tool.to_string()).chain(args).collect(),
            Some(dir) => {
                let script = quote(&dir.join("vcvarsall.bat"));
                let invocation = std::iter::once(tool.to_string())
                    .chain(args.iter().map(|a| quote_arg(a)))
                    .collect::<Vec<_>>()
                    .join(" ");
                vec![
                    "cmd".to_string(),
                    "/C".to_string(),
                    format!("call {} {} && {}", script, arch.platform(), invocation),
                ]
            }
        }
    }
}

fn quote(path: &Path) -> String {
    format!("\"{}\"", path.display())
}

fn quote_arg(arg: &str) -> String {
    if arg.contains(' ') {
        format!("\"{}\"", arg)
    } else {
        arg.to_string()
    }
}
