use super::compdb;
use super::layout::OutputLayout;
use super::library::{LibraryOutcome, build_library};
use super::link::{LinkOutcome, link};
use super::mode::Mode;
use super::process::ProcessRunner;
use crate::error::{BuildError, BuildResult};
use crate::plan::BuildPlan;
use crate::toolchain::Toolchain;
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

/// Everything a stage needs besides its own inputs. Shared read-only.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub mode: Mode,
    pub toolchain: &'a Toolchain,
    pub layout: &'a OutputLayout,
    pub runner: &'a ProcessRunner,
}

/// What a build run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Libraries in build order with their outcome
    pub libraries: Vec<(String, LibraryOutcome)>,
    pub link: LinkOutcome,
    /// Whether the executable was smoke-run after linking
    pub ran: bool,
}

impl BuildReport {
    pub fn built(&self) -> Vec<&str> {
        self.libraries
            .iter()
            .filter(|(_, o)| o.was_built())
            .map(|(n, _)| n.as_str())
            .collect()
    }

    pub fn executable(&self) -> PathBuf {
        self.link.executable().to_path_buf()
    }
}

// --- CORE: Build Project ---
pub fn build_project(plan: &BuildPlan, runner: &ProcessRunner) -> BuildResult<BuildReport> {
    let start_time = Instant::now();

    if plan.project_library().is_none() {
        return Err(BuildError::config(format!(
            "Project '{}' is not one of the planned libraries",
            plan.project
        )));
    }

    // 1. Output tree
    let layout = OutputLayout::new(&plan.root, &plan.mode);
    layout.create()?;

    let ctx = BuildContext {
        mode: plan.mode,
        toolchain: &plan.toolchain,
        layout: &layout,
        runner,
    };

    // 2. Libraries, in declaration order
    let mut libraries = Vec::with_capacity(plan.libraries.len());
    for library in &plan.libraries {
        let outcome = build_library(library, &ctx)?;
        libraries.push((library.name.clone(), outcome));
    }

    // 3. compile_commands.json
    let names = plan.library_names();
    compdb::assemble(&layout, &names)?;

    // 4. Final link; waits on every library above
    let link = link(&plan.project, &names, &plan.native_libs, &ctx)?;

    match &link {
        LinkOutcome::Linked(exe) => println!(
            "{} Built {} in {:.2?}",
            "✓".green(),
            exe.display(),
            start_time.elapsed()
        ),
        LinkOutcome::UpToDate(_) => println!("{} Up to date", "⚡".green()),
    }

    Ok(BuildReport {
        libraries,
        link,
        ran: false,
    })
}

// --- COMMAND: Build & Run ---
/// Builds, then runs the executable unless native symbols were requested;
/// a native-symbol build produces a binary meant for a debugger instead.
pub fn build_and_run(plan: &BuildPlan, runner: &ProcessRunner) -> BuildResult<BuildReport> {
    let mut report = build_project(plan, runner)?;

    if !plan.mode.native_symbols {
        println!("{} Running...\n", "▶".green());
        let exe = report.executable();
        runner.run(&[exe.to_string_lossy().to_string()])?;
        report.ran = true;
    }

    Ok(report)
}
