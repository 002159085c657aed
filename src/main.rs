//! # bitweave CLI Entry Point
//!
//! This is the main executable for the `bw` command-line tool. It loads the
//! build file, resolves the build plan and hands it to the build pipeline.
//! It is also the one place a fatal build error is reported and turned into
//! a non-zero exit status.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

use bitweave::build::{self, Arch, FeedbackAnalyzer, LinkChoice, OutputLayout, ProcessRunner};
use bitweave::config::{self, Configuration, Overrides};
use bitweave::error::BuildError;
use bitweave::plan::BuildPlan;

#[derive(Parser)]
#[command(name = "bw")]
#[command(about = "Incremental C/C++ builds through LLVM bitcode", version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the build file
    #[arg(long, short, global = true, default_value = build::BUILD_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every stale library, link, and run the executable
    Build {
        #[command(flatten)]
        mode: ModeArgs,
        /// Do not echo tool command lines
        #[arg(short, long)]
        quiet: bool,
    },
    /// Show the resolved build plan without building
    Plan {
        #[command(flatten)]
        mode: ModeArgs,
    },
    /// Remove build outputs
    Clean {
        #[command(flatten)]
        mode: ModeArgs,
        /// Remove every configuration, not just the selected one
        #[arg(long)]
        all: bool,
    },
}

#[derive(Args, Default)]
struct ModeArgs {
    /// Override the configuration from the build file
    #[arg(long)]
    configuration: Option<Configuration>,
    /// Override the target platform
    #[arg(long)]
    platform: Option<Arch>,
    /// Compile files of a library in parallel
    #[arg(long)]
    parallel: bool,
    /// Request native debugger symbols (debug builds only)
    #[arg(long)]
    native_symbols: bool,
    /// Override the final link strategy
    #[arg(long)]
    link: Option<LinkChoice>,
}

impl ModeArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            configuration: self.configuration,
            platform: self.platform,
            parallel: self.parallel.then_some(true),
            native_symbols: self.native_symbols.then_some(true),
            link: self.link,
        }
    }
}

fn load_plan(config_path: &std::path::Path, mode: &ModeArgs) -> Result<BuildPlan> {
    let mut file = build::load_config(config_path)?;
    file.apply(&mode.overrides());
    Ok(file.resolve(&config::base_dir(config_path))?)
}

fn print_plan(plan: &BuildPlan) {
    let layout = OutputLayout::new(&plan.root, &plan.mode);
    println!(
        "{} Project: {} ({}, {} link)",
        "🚀".blue(),
        plan.project.bold(),
        plan.mode.configuration_name(),
        plan.mode.strategy.name()
    );
    println!("   Output: {}", layout.root().display());
    for lib in &plan.libraries {
        let marker = if lib.name == plan.project { "*" } else { " " };
        println!(
            "   {} {} ({} source specs, {})",
            marker,
            lib.name,
            lib.sources.len(),
            lib.version
        );
    }
}

fn run(cli: Cli) -> Result<()> {
    let command = cli.command.unwrap_or(Commands::Build {
        mode: ModeArgs::default(),
        quiet: false,
    });

    match command {
        Commands::Build { mode, quiet } => {
            let plan = load_plan(&cli.config, &mode)?;
            print_plan(&plan);
            let runner = ProcessRunner::new(plan.ignore.clone()).quiet(quiet);
            build::build_and_run(&plan, &runner)?;
        }
        Commands::Plan { mode } => {
            let plan = load_plan(&cli.config, &mode)?;
            print_plan(&plan);
        }
        Commands::Clean { mode, all } => {
            // sources may already be gone; only the mode picks the output tree
            let mut file = build::load_config(&cli.config)?;
            file.apply(&mode.overrides());
            build::clean(&config::base_dir(&cli.config), &file.mode()?, all)?;
        }
    }
    Ok(())
}

fn report_fatal(err: &anyhow::Error) {
    match err.downcast_ref::<BuildError>() {
        Some(build_err) => {
            println!("{} {}", "x".red(), format!("Error: {}", build_err).red());
            if let Some(hint) = build_err.tool_output().and_then(FeedbackAnalyzer::analyze) {
                println!("\n{} {}", "💡".yellow(), hint);
            }
        }
        None => println!("{} {:#}", "x".red(), err),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        report_fatal(&err);
        std::process::exit(1);
    }
}
