//! Compile-unit dispatch.
//!
//! Sequential mode compiles units in the given order. Parallel mode hands
//! them to rayon's pool, which is sized to the available hardware threads;
//! the first failure stops further units from being picked up and is
//! returned once in-flight units finish.

use super::compile::{CompileUnit, compile};
use super::process::ProcessRunner;
use crate::error::BuildResult;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::PathBuf;

/// Compiles every unit and returns the produced artifacts in unit order.
pub fn dispatch_all(
    units: &[CompileUnit],
    parallel: bool,
    runner: &ProcessRunner,
) -> BuildResult<Vec<PathBuf>> {
    if !parallel || units.len() < 2 {
        return units.iter().map(|unit| compile(unit, runner)).collect();
    }

    let pb = ProgressBar::new(units.len() as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
    ) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message("Compiling...");

    let runner = runner.with_progress(pb.clone());
    let result = units
        .par_iter()
        .map(|unit| {
            let output = compile(unit, &runner)?;
            pb.inc(1);
            Ok(output)
        })
        .collect::<BuildResult<Vec<_>>>();

    match &result {
        Ok(_) => pb.finish_and_clear(),
        Err(_) => pb.abandon_with_message("Compilation failed"),
    }
    result
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::BuildError;
    use std::fs;
    use std::path::Path;

    fn touch_unit(dir: &Path, name: &str) -> CompileUnit {
        let output = dir.join(format!("{}.bc", name));
        CompileUnit {
            source: PathBuf::from(name),
            output: output.clone(),
            command: vec![
                "sh".into(),
                "-c".into(),
                format!("printf '{}' > '{}'", name, output.display()),
            ],
        }
    }

    fn artifacts(dir: &Path) -> Vec<(String, String)> {
        let mut found: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| {
                let path = e.unwrap().path();
                let name = path.file_name().unwrap().to_string_lossy().to_string();
                (name, fs::read_to_string(&path).unwrap())
            })
            .collect();
        found.sort();
        found
    }

    #[test]
    fn test_parallel_and_sequential_produce_same_artifacts() {
        let seq = tempfile::tempdir().unwrap();
        let par = tempfile::tempdir().unwrap();
        let names = ["a1.cpp", "a2.cpp", "a3.c", "a4.cc", "a5.cxx", "a6.cpp"];
        let runner = ProcessRunner::default().quiet(true);

        let seq_units: Vec<_> = names.iter().map(|n| touch_unit(seq.path(), n)).collect();
        let par_units: Vec<_> = names.iter().map(|n| touch_unit(par.path(), n)).collect();

        let seq_out = dispatch_all(&seq_units, false, &runner).unwrap();
        let par_out = dispatch_all(&par_units, true, &runner).unwrap();

        assert_eq!(seq_out.len(), names.len());
        assert_eq!(par_out.len(), names.len());
        assert_eq!(artifacts(seq.path()), artifacts(par.path()));
    }

    #[test]
    fn test_parallel_failure_is_propagated() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::default().quiet(true);
        let mut units: Vec<_> = ["a.cpp", "b.cpp", "c.cpp"]
            .iter()
            .map(|n| touch_unit(dir.path(), n))
            .collect();
        units[1].command = vec![
            "sh".into(),
            "-c".into(),
            "echo 'b.cpp:1:1: error: expected expression'".into(),
        ];

        let err = dispatch_all(&units, true, &runner).unwrap_err();
        assert!(matches!(err, BuildError::Tool { .. }));
    }

    #[test]
    fn test_sequential_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::default().quiet(true);
        let mut units: Vec<_> = ["a.cpp", "b.cpp", "c.cpp"]
            .iter()
            .map(|n| touch_unit(dir.path(), n))
            .collect();
        units[1].command = vec!["sh".into(), "-c".into(), "exit 1".into()];

        assert!(dispatch_all(&units, false, &runner).is_err());
        assert!(dir.path().join("a.cpp.bc").exists());
        assert!(!dir.path().join("c.cpp.bc").exists());
    }
}
