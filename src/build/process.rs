//! External process execution.
//!
//! The only place that spawns tools. Stdout and stderr are drained by two
//! reader threads into one channel, so a child filling one pipe can never
//! block on the other. Every line is classified and echoed as it arrives.

use crate::error::{BuildError, BuildResult, ToolFailure};
use colored::*;
use indicatif::ProgressBar;
use std::io::{self, BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread;

/// A line containing this marker fails the run, whatever the exit status
pub const FAILURE_MARKER: &str = "error:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Failure,
    Warning,
    Note,
    Info,
}

/// Classifies a line by fixed precedence: failure, warning, note, informational.
pub fn classify(line: &str) -> LineClass {
    if line.contains("error") || line.contains("Error") || line.contains(FAILURE_MARKER) {
        LineClass::Failure
    } else if line.contains("warn") {
        LineClass::Warning
    } else if line.contains("note") {
        LineClass::Note
    } else {
        LineClass::Info
    }
}

#[derive(Debug, Clone)]
pub struct OutputLine {
    pub stream: Stream,
    pub class: LineClass,
    pub text: String,
}

/// Outcome of one successful tool invocation
#[derive(Debug)]
pub struct ProcessResult {
    pub code: Option<i32>,
    /// Printed lines in arrival order; ignored lines are not recorded
    pub lines: Vec<OutputLine>,
}

impl ProcessResult {
    pub fn count(&self, class: LineClass) -> usize {
        self.lines.iter().filter(|l| l.class == class).count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    ignore: Vec<String>,
    quiet: bool,
    progress: Option<ProgressBar>,
}

impl ProcessRunner {
    pub fn new(ignore: Vec<String>) -> Self {
        Self {
            ignore,
            quiet: false,
            progress: None,
        }
    }

    /// Stop echoing command lines. Tool output is still printed.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// A runner that prints through `bar` so output does not tear its redraws
    pub fn with_progress(&self, bar: ProgressBar) -> Self {
        Self {
            progress: Some(bar),
            ..self.clone()
        }
    }

    /// Prints a line, routed through the progress bar when one is attached.
    pub fn emit(&self, text: impl Into<String>) {
        let text = text.into();
        match &self.progress {
            Some(bar) => bar.println(text),
            None => println!("{}", text),
        }
    }

    fn is_ignored(&self, line: &str) -> bool {
        self.ignore.iter().any(|ig| line.contains(ig.as_str()))
    }

    fn print_classified(&self, class: LineClass, line: &str) {
        if line.trim().is_empty() {
            self.emit("");
            return;
        }
        let colored = match class {
            LineClass::Failure => line.red(),
            LineClass::Warning => line.yellow(),
            LineClass::Note => line.blue(),
            LineClass::Info => line.cyan(),
        };
        self.emit(colored.to_string());
    }

    /// Runs `command` (program followed by its arguments) to completion.
    ///
    /// Fails when any output line contains [`FAILURE_MARKER`], even if the
    /// tool exited zero, and when the tool exits unsuccessfully.
    pub fn run(&self, command: &[String]) -> BuildResult<ProcessResult> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| BuildError::config("attempted to run an empty command"))?;

        if !self.quiet {
            self.emit(command.join("  "));
        }

        let mut child = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BuildError::Tool {
                program: program.clone(),
                reason: ToolFailure::Spawn(e),
            })?;

        let (tx, rx) = mpsc::channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(out) = child.stdout.take() {
            readers.push(spawn_reader(out, Stream::Stdout, tx.clone()));
        }
        if let Some(err) = child.stderr.take() {
            readers.push(spawn_reader(err, Stream::Stderr, tx.clone()));
        }
        drop(tx);

        let mut lines = Vec::new();
        let mut output = String::new();
        let mut failure: Option<String> = None;

        // Ends once both readers hit EOF and drop their senders
        for (stream, text) in rx {
            output.push_str(&text);
            output.push('\n');
            if failure.is_none() && text.contains(FAILURE_MARKER) {
                failure = Some(text.clone());
            }
            if self.is_ignored(&text) {
                continue;
            }
            let class = classify(&text);
            self.print_classified(class, &text);
            lines.push(OutputLine {
                stream,
                class,
                text,
            });
        }

        let drained = join_readers(readers);
        let status = child.wait().map_err(|e| BuildError::io(program, e))?;

        if let Some(line) = failure {
            self.print_classified(LineClass::Failure, "Error: Build failed.");
            return Err(BuildError::Tool {
                program: program.clone(),
                reason: ToolFailure::Marker { line, output },
            });
        }

        if !drained {
            self.print_classified(LineClass::Failure, "Error: Tool output was cut short.");
            return Err(BuildError::Tool {
                program: program.clone(),
                reason: ToolFailure::OutputLost { output },
            });
        }

        if !status.success() {
            return Err(BuildError::Tool {
                program: program.clone(),
                reason: ToolFailure::Status {
                    code: status.code(),
                    output,
                },
            });
        }

        Ok(ProcessResult {
            code: status.code(),
            lines,
        })
    }
}

type Reader = thread::JoinHandle<io::Result<()>>;

fn spawn_reader<R>(pipe: R, stream: Stream, tx: Sender<(Stream, String)>) -> Reader
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let reader = BufReader::new(pipe);
        for chunk in reader.split(b'\n') {
            let bytes = chunk?;
            let text = String::from_utf8_lossy(&bytes)
                .trim_end_matches('\r')
                .to_string();
            if tx.send((stream, text)).is_err() {
                break;
            }
        }
        Ok(())
    })
}

/// Waits for every reader; false when any of them failed or panicked.
fn join_readers(readers: Vec<Reader>) -> bool {
    readers
        .into_iter()
        .map(|reader| matches!(reader.join(), Ok(Ok(()))))
        .fold(true, |all, ok| all && ok)
}
