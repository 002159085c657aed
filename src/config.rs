use crate::build::{Arch, LinkChoice, Mode, ModeRequest};
use crate::error::{BuildError, BuildResult};
use crate::plan::{BuildPlan, LibrarySpec, SourceSpec};
use crate::toolchain::{Host, SdkPaths, Toolchain};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// `bitweave.toml`
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct BuildFile {
    pub project: ProjectConfig,
    #[serde(default)]
    pub sdk: SdkConfig,
    #[serde(default, rename = "library")]
    pub libraries: Vec<LibraryConfig>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Configuration {
    #[default]
    Debug,
    Release,
    /// Debug build with native debugger symbols
    #[value(name = "nativedebug")]
    NativeDebug,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default)]
    pub configuration: Configuration,
    #[serde(default)]
    pub platform: Arch,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub native_symbols: bool,
    #[serde(default)]
    pub link: LinkChoice,
    pub llvm_bindir: Option<PathBuf>,
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub native_libs: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct SdkConfig {
    #[serde(default = "default_sdk_dir")]
    pub msvc: PathBuf,
    #[serde(default = "default_sdk_dir")]
    pub windows: PathBuf,
    pub vcvarsall: Option<PathBuf>,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            msvc: default_sdk_dir(),
            windows: default_sdk_dir(),
            vcvarsall: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct LibraryConfig {
    pub name: String,
    pub sources: Vec<PathBuf>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub includes: Vec<PathBuf>,
    #[serde(default)]
    pub defines: Vec<String>,
}

fn default_sdk_dir() -> PathBuf {
    PathBuf::from("../winsdk/")
}

fn default_version() -> String {
    "c++17".to_string()
}

/// Command-line settings applied on top of the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub configuration: Option<Configuration>,
    pub platform: Option<Arch>,
    pub parallel: Option<bool>,
    pub native_symbols: Option<bool>,
    pub link: Option<LinkChoice>,
}

impl BuildFile {
    pub fn apply(&mut self, overrides: &Overrides) {
        let project = &mut self.project;
        if let Some(c) = overrides.configuration {
            project.configuration = c;
        }
        if let Some(p) = overrides.platform {
            project.platform = p;
        }
        if let Some(p) = overrides.parallel {
            project.parallel = p;
        }
        if let Some(n) = overrides.native_symbols {
            project.native_symbols = n;
        }
        if let Some(l) = overrides.link {
            project.link = l;
        }
    }

    /// The mode request this file describes
    pub fn mode_request(&self) -> ModeRequest {
        let p = &self.project;
        ModeRequest {
            arch: p.platform,
            debug: p.configuration != Configuration::Release,
            native_symbols: p.native_symbols || p.configuration == Configuration::NativeDebug,
            parallel: p.parallel,
            link: p.link,
        }
    }

    /// Resolved mode alone; source paths are not touched
    pub fn mode(&self) -> BuildResult<Mode> {
        Mode::resolve(self.mode_request())
    }

    /// Validates and resolves into a plan. Relative paths are taken from `base`.
    ///
    /// Mode errors are reported first, then plan structure, then missing
    /// source paths. Nothing here runs a tool.
    pub fn resolve(&self, base: &Path) -> BuildResult<BuildPlan> {
        let mode = self.mode()?;

        if self.libraries.is_empty() {
            return Err(BuildError::config("no [[library]] entries declared"));
        }

        let mut seen = HashSet::new();
        for lib in &self.libraries {
            if !seen.insert(lib.name.as_str()) {
                return Err(BuildError::config(format!(
                    "library '{}' is declared twice",
                    lib.name
                )));
            }
            if lib.sources.is_empty() {
                return Err(BuildError::config(format!(
                    "library '{}' has no sources",
                    lib.name
                )));
            }
        }
        if !seen.contains(self.project.name.as_str()) {
            return Err(BuildError::config(format!(
                "Project '{}' not found among the declared libraries",
                self.project.name
            )));
        }

        let mut libraries = Vec::with_capacity(self.libraries.len());
        for lib in &self.libraries {
            let sources = lib
                .sources
                .iter()
                .map(|s| SourceSpec::resolve(base.join(s)))
                .collect::<BuildResult<Vec<_>>>()?;
            libraries.push(LibrarySpec {
                name: lib.name.clone(),
                sources,
                version: lib.version.clone(),
                includes: lib.includes.iter().map(|i| base.join(i)).collect(),
                defines: lib.defines.clone(),
            });
        }

        let toolchain = Toolchain {
            llvm_bindir: self.project.llvm_bindir.clone(),
            sdk: SdkPaths {
                msvc: self.sdk.msvc.clone(),
                windows: self.sdk.windows.clone(),
                vcvarsall: self.sdk.vcvarsall.clone(),
            },
            host: Host::current(),
        };

        Ok(BuildPlan {
            libraries,
            project: self.project.name.clone(),
            mode,
            native_libs: self.project.native_libs.clone(),
            ignore: self.project.ignore.clone(),
            toolchain,
            root: base.to_path_buf(),
        })
    }
}

/// Directory relative paths in a build file are resolved against
pub fn base_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::LinkStrategy;
    use std::fs;

    const SAMPLE: &str = r#"
[project]
name = "app"
configuration = "release"
platform = "x86"
parallel = true
ignore = ["LNK4099"]
native_libs = ["extra.lib"]

[sdk]
vcvarsall = "C:/VS/VC"

[[library]]
name = "core"
sources = ["core"]
version = "c++20"
defines = ["CORE=1"]

[[library]]
name = "app"
sources = ["app/main.cpp"]
"#;

    fn project_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("core")).unwrap();
        fs::write(dir.path().join("core").join("core.cpp"), "").unwrap();
        fs::create_dir_all(dir.path().join("app")).unwrap();
        fs::write(dir.path().join("app").join("main.cpp"), "").unwrap();
        dir
    }

    #[test]
    fn test_parse_sample_file() {
        let file: BuildFile = toml::from_str(SAMPLE).unwrap();
        assert_eq!(file.project.configuration, Configuration::Release);
        assert_eq!(file.project.platform, Arch::X86);
        assert_eq!(file.libraries.len(), 2);
        assert_eq!(file.libraries[0].name, "core");
        assert_eq!(file.libraries[1].version, "c++17");
        assert_eq!(file.sdk.msvc, PathBuf::from("../winsdk/"));
        assert_eq!(file.sdk.vcvarsall, Some(PathBuf::from("C:/VS/VC")));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let text = "[project]\nname = \"app\"\nconfigurtion = \"debug\"\n";
        assert!(toml::from_str::<BuildFile>(text).is_err());
        let text = "[project]\nname = \"app\"\nconfiguration = \"fast\"\n";
        assert!(toml::from_str::<BuildFile>(text).is_err());
    }

    #[test]
    fn test_resolve_keeps_declaration_order_and_base_paths() {
        let dir = project_tree();
        let file: BuildFile = toml::from_str(SAMPLE).unwrap();
        let plan = file.resolve(dir.path()).unwrap();
        assert_eq!(plan.library_names(), vec!["core", "app"]);
        assert_eq!(plan.mode.strategy, LinkStrategy::WholeProgram);
        assert!(plan.mode.parallel);
        assert_eq!(plan.mode.configuration_name(), "Releasex86");
        assert_eq!(plan.libraries[0].sources[0].path(), dir.path().join("core"));
        assert_eq!(plan.project_library().unwrap().name, "app");
        assert_eq!(plan.ignore, vec!["LNK4099"]);
    }

    #[test]
    fn test_native_symbols_in_release_rejected_before_sources_are_touched() {
        // no source tree at all: the mode error must come first
        let dir = tempfile::tempdir().unwrap();
        let mut file: BuildFile = toml::from_str(SAMPLE).unwrap();
        file.apply(&Overrides {
            native_symbols: Some(true),
            ..Default::default()
        });
        let err = file.resolve(dir.path()).unwrap_err();
        assert!(matches!(err, BuildError::Config(_)));
    }

    #[test]
    fn test_nativedebug_configuration_implies_native_symbols() {
        let dir = project_tree();
        let mut file: BuildFile = toml::from_str(SAMPLE).unwrap();
        file.apply(&Overrides {
            configuration: Some(Configuration::NativeDebug),
            platform: Some(Arch::X64),
            ..Default::default()
        });
        let plan = file.resolve(dir.path()).unwrap();
        assert!(plan.mode.debug && plan.mode.native_symbols);
        assert_eq!(plan.mode.strategy, LinkStrategy::Fast);
        assert_eq!(plan.mode.configuration_name(), "Debugx64n");
    }

    #[test]
    fn test_missing_project_library() {
        let dir = project_tree();
        let mut file: BuildFile = toml::from_str(SAMPLE).unwrap();
        file.project.name = "nope".into();
        let err = file.resolve(dir.path()).unwrap_err();
        assert!(err.to_string().contains("'nope' not found"));
    }

    #[test]
    fn test_missing_source_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let file: BuildFile = toml::from_str(SAMPLE).unwrap();
        assert!(matches!(
            file.resolve(dir.path()),
            Err(BuildError::Io { .. })
        ));
    }

    #[test]
    fn test_mode_ignores_missing_sources() {
        let dir = tempfile::tempdir().unwrap();
        let file: BuildFile = toml::from_str(SAMPLE).unwrap();
        assert!(file.resolve(dir.path()).is_err());
        let mode = file.mode().unwrap();
        assert_eq!(mode.configuration_name(), "Releasex86");
    }

    #[test]
    fn test_base_dir() {
        assert_eq!(base_dir(Path::new("bitweave.toml")), PathBuf::from("."));
        assert_eq!(base_dir(Path::new("proj/bitweave.toml")), PathBuf::from("proj"));
    }
}
