//! # bitweave - Incremental C/C++ Build Orchestrator
//!
//! bitweave compiles C/C++ libraries to LLVM bitcode, merges each library's
//! bitcode into one artifact, and links the project executable with one of
//! three strategies. Only libraries whose sources changed are rebuilt.
//!
//! ## Pipeline
//!
//! 1. **Staleness**: a library is rebuilt when its merged artifact is missing
//!    or older than (or as old as) any of its sources
//! 2. **Compile**: one `clang -emit-llvm -c` per source file, optionally in parallel
//! 3. **Merge**: `llvm-link` the per-file bitcode into `<lib>.bc`
//! 4. **Link**: fast (debug), whole-program, or native MSVC toolchain
//! 5. **Run**: the produced executable is run once, unless native symbols were requested
//!
//! ## Quick Start
//!
//! ```bash
//! # bitweave.toml in the current directory
//! bw build
//!
//! # Release build, all cores
//! bw build --configuration release --parallel
//! ```
//!
//! ## Module Organization
//!
//! - [`build`] - Pipeline stages and the process runner
//! - [`config`] - Build file parsing (`bitweave.toml`)
//! - [`plan`] - The resolved build plan the pipeline consumes
//! - [`toolchain`] - Tool paths and SDK locations
//! - [`error`] - Fatal build errors

/// Build pipeline: staleness, compilation, dispatch, library merge, link.
pub mod build;

/// Build file parsing (`bitweave.toml`).
pub mod config;

/// Fatal error type shared by every stage.
pub mod error;

/// Resolved build plan: libraries, sources, mode.
pub mod plan;

/// External tool and SDK locations.
pub mod toolchain;
