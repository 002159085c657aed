use std::path::PathBuf;

/// Operating system family the produced executable targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Host {
    /// MSVC runtime, `lld-link`, `.exe` outputs
    Windows,
    /// System linker driven through `clang`
    Unix,
}

impl Host {
    /// Host the orchestrator itself was compiled for
    pub fn current() -> Self {
        if cfg!(windows) { Host::Windows } else { Host::Unix }
    }

    pub fn exe_suffix(self) -> &'static str {
        match self {
            Host::Windows => ".exe",
            Host::Unix => "",
        }
    }

    /// Debug-info flag used when native debugger symbols are requested
    pub fn native_debug_flag(self) -> &'static str {
        match self {
            Host::Windows => "-gcodeview",
            Host::Unix => "-gdwarf",
        }
    }
}

/// Native SDK locations. These are configured, never auto-discovered.
#[derive(Debug, Clone)]
pub struct SdkPaths {
    /// MSVC toolset root (contains `lib/<platform>`)
    pub msvc: PathBuf,

    /// Windows SDK library root (contains `ucrt/<platform>` and `um/<platform>`)
    pub windows: PathBuf,

    /// Directory holding `vcvarsall.bat`; when set, native tools run inside its environment
    pub vcvarsall: Option<PathBuf>,
}

impl Default for SdkPaths {
    fn default() -> Self {
        Self {
            msvc: PathBuf::from("../winsdk/"),
            windows: PathBuf::from("../winsdk/"),
            vcvarsall: None,
        }
    }
}

/// The external tools a build run invokes
#[derive(Debug, Clone)]
pub struct Toolchain {
    /// Prefix for the LLVM tools; `None` resolves them from `PATH`
    pub llvm_bindir: Option<PathBuf>,

    pub sdk: SdkPaths,

    pub host: Host,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            llvm_bindir: None,
            sdk: SdkPaths::default(),
            host: Host::current(),
        }
    }
}
