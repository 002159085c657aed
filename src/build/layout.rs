//! Output tree layout.
//!
//! ```text
//! bin/<Configuration>/
//!     <project>[.exe]            final executable (debugee[.exe] with native symbols)
//!     compile_commands.json
//!     bitcode/
//!         <lib>/<file>.bc        per-file intermediates (.obj for the native toolchain)
//!         <lib>.bc               merged library bitcode (.lib for the native toolchain)
//!         <lib>.o                lowered library object (fast link)
//!         <lib>.commands.json
//! ```

use super::mode::{LinkStrategy, Mode};
use crate::error::{BuildError, BuildResult};
use crate::toolchain::Host;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    bitcode: PathBuf,
}

impl OutputLayout {
    pub fn new(base: &Path, mode: &Mode) -> Self {
        let root = base.join("bin").join(mode.configuration_name());
        let bitcode = root.join("bitcode");
        Self { root, bitcode }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bitcode_dir(&self) -> &Path {
        &self.bitcode
    }

    pub fn create(&self) -> BuildResult<()> {
        fs::create_dir_all(&self.bitcode).map_err(|e| BuildError::io(&self.bitcode, e))
    }

    /// Directory holding one library's per-file intermediates
    pub fn library_dir(&self, library: &str) -> PathBuf {
        self.bitcode.join(library)
    }

    /// Merged per-library artifact
    pub fn library_artifact(&self, library: &str, strategy: LinkStrategy) -> PathBuf {
        let ext = if strategy.uses_bitcode() { "bc" } else { "lib" };
        self.bitcode.join(format!("{}.{}", library, ext))
    }

    /// Native object lowered from a library's merged bitcode
    pub fn library_object(&self, library: &str) -> PathBuf {
        self.bitcode.join(format!("{}.o", library))
    }

    pub fn commands_file(&self, library: &str) -> PathBuf {
        self.bitcode.join(format!("{}.commands.json", library))
    }

    pub fn compile_commands(&self) -> PathBuf {
        self.root.join("compile_commands.json")
    }

    pub fn executable(&self, project: &str, mode: &Mode, host: Host) -> PathBuf {
        let stem = if mode.native_symbols { "debugee" } else { project };
        self.root.join(format!("{}{}", stem, host.exe_suffix()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::mode::{Arch, LinkChoice, ModeRequest};

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

    #[test]
    fn test_layout_is_partitioned_per_configuration() {
        let debug = OutputLayout::new(Path::new("proj"), &mode(true, false, LinkChoice::Auto));
        let release = OutputLayout::new(Path::new("proj"), &mode(false, false, LinkChoice::Auto));
        assert_eq!(debug.root(), Path::new("proj/bin/Debugx64"));
        assert_eq!(release.root(), Path::new("proj/bin/Releasex64"));
        assert_eq!(
            debug.library_dir("core"),
            Path::new("proj/bin/Debugx64/bitcode/core")
        );
    }

    #[test]
    fn test_artifact_names() {
        let m = mode(false, false, LinkChoice::Native);
        let layout = OutputLayout::new(Path::new("."), &m);
        assert!(layout.library_artifact("core", m.strategy).ends_with("bitcode/core.lib"));
        assert!(layout.library_artifact("core", LinkStrategy::Fast).ends_with("bitcode/core.bc"));
        assert!(layout.library_object("core").ends_with("bitcode/core.o"));
        assert!(layout.executable("app", &m, Host::Windows).ends_with("app.exe"));
        assert!(layout.executable("app", &m, Host::Unix).ends_with("Releasex64/app"));
    }

    #[test]
    fn test_native_symbol_executable_is_debugee() {
        let m = mode(true, true, LinkChoice::Auto);
        let layout = OutputLayout::new(Path::new("."), &m);
        assert!(layout.executable("app", &m, Host::Windows).ends_with("Debugx64n/debugee.exe"));
    }
}
