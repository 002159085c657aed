//! Build-wide mode flags.
//!
//! A [`Mode`] is resolved once per run and passed by value into every stage.
//! Nothing reads build settings from ambient state.

use crate::error::{BuildError, BuildResult};
use serde::Deserialize;

/// Target architecture width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    #[default]
    X64,
    X86,
}

impl Arch {
    /// Platform directory name used by the SDK layout and the linker (`x64`, `x86`)
    pub fn platform(self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::X86 => "x86",
        }
    }

    pub fn clang_flag(self) -> &'static str {
        match self {
            Arch::X64 => "-m64",
            Arch::X86 => "-m32",
        }
    }

    /// Machine name for MSVC tools (`/MACHINE:X64`)
    pub fn msvc_machine(self) -> &'static str {
        match self {
            Arch::X64 => "X64",
            Arch::X86 => "X86",
        }
    }
}

/// Requested final-link strategy, before it is pinned down against the build type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LinkChoice {
    /// Fast for debug builds, whole-program for release builds
    #[default]
    Auto,
    Fast,
    WholeProgram,
    Native,
}

/// The final-link strategy of a run. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStrategy {
    /// Project bitcode against already-merged library artifacts
    Fast,
    /// Every per-file bitcode artifact of every library in one pass
    WholeProgram,
    /// Native compiler, archiver and linker; no bitcode
    NativeToolchain,
}

impl LinkStrategy {
    pub fn name(self) -> &'static str {
        match self {
            LinkStrategy::Fast => "fast",
            LinkStrategy::WholeProgram => "whole-program",
            LinkStrategy::NativeToolchain => "native",
        }
    }

    pub fn uses_bitcode(self) -> bool {
        !matches!(self, LinkStrategy::NativeToolchain)
    }
}

/// Raw settings a [`Mode`] is resolved from
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeRequest {
    pub arch: Arch,
    pub debug: bool,
    pub native_symbols: bool,
    pub parallel: bool,
    pub link: LinkChoice,
}

/// Frozen build-wide flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    pub arch: Arch,
    pub debug: bool,
    pub native_symbols: bool,
    pub parallel: bool,
    pub strategy: LinkStrategy,
}

impl Mode {
    /// Validates a request and pins down the link strategy.
    pub fn resolve(request: ModeRequest) -> BuildResult<Self> {
        if request.native_symbols && !request.debug {
            return Err(BuildError::config(
                "native symbols are only available in debug builds (configuration = \"nativedebug\")",
            ));
        }

        let strategy = match request.link {
            LinkChoice::Auto if request.debug => LinkStrategy::Fast,
            LinkChoice::Auto => LinkStrategy::WholeProgram,
            LinkChoice::Fast => LinkStrategy::Fast,
            LinkChoice::WholeProgram => LinkStrategy::WholeProgram,
            LinkChoice::Native => LinkStrategy::NativeToolchain,
        };

        if strategy == LinkStrategy::NativeToolchain && request.debug {
            return Err(BuildError::config(
                "link = \"native\" uses the release-only native toolchain profile; use a release configuration",
            ));
        }

        Ok(Self {
            arch: request.arch,
            debug: request.debug,
            native_symbols: request.native_symbols,
            parallel: request.parallel,
            strategy,
        })
    }

    /// Output configuration name, e.g. `Debugx64`, `Releasex86`, `Debugx64n`
    pub fn configuration_name(&self) -> String {
        format!(
            "{}{}{}",
            if self.debug { "Debug" } else { "Release" },
            self.arch.platform(),
            if self.native_symbols { "n" } else { "" }
        )
    }
}
