//! Sequential execution of the steps for every source file and segment.

use std::fs;
use std::path::Path;

use tracing::{debug, error, info};

use crate::command::Step;
use crate::converter::Converter;
use crate::error::Result;
use crate::segment::Segment;

/// Executes a single step and reports its exit code.
pub trait StepRunner {
    fn run_step(&mut self, step: &Step) -> Result<i32>;
}

/// Runs tools as child processes and performs file bookkeeping in-process.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl StepRunner for SystemRunner {
    fn run_step(&mut self, step: &Step) -> Result<i32> {
        match step {
            Step::Tool(cmd) => {
                let status = cmd.to_command().status()?;
                // A process killed by a signal has no code.
                Ok(status.code().unwrap_or(1))
            }
            Step::RemoveFile(path) => {
                fs::remove_file(path)?;
                Ok(0)
            }
            Step::RenameFile { from, to } => {
                fs::rename(from, to)?;
                Ok(0)
            }
        }
    }
}

/// Keeps the worst exit code seen so far: the first failure, or any higher one.
fn worst_code(current: i32, code: i32) -> i32 {
    if current == 0 || code > current {
        code
    } else {
        current
    }
}

pub struct Orchestrator<'a, R> {
    converter: &'a Converter<'a>,
    runner: R,
}

impl<'a, R: StepRunner> Orchestrator<'a, R> {
    pub fn new(converter: &'a Converter<'a>, runner: R) -> Self {
        Self { converter, runner }
    }

    pub fn into_runner(self) -> R {
        self.runner
    }

    /// Converts every source file and returns the process exit code: zero if
    /// everything succeeded, otherwise the highest failing exit code.
    ///
    /// A failure stops the current file but not the run.
    pub fn run(&mut self) -> i32 {
        let config = self.converter.config();
        let mut rc = 0;
        for source in &config.source_files {
            info!(source = %source.display(), "converting");
            let code = self.process_file(source);
            if code != 0 {
                error!(
                    source = %source.display(),
                    code,
                    "execution error, proceeding to next source file"
                );
                rc = worst_code(rc, code);
            }
        }
        rc
    }

    fn process_file(&mut self, source: &Path) -> i32 {
        let segments = &self.converter.config().segments;
        for segment in segments {
            let code = self.process_segment(segment, source);
            if code != 0 {
                return code;
            }
        }
        0
    }

    fn process_segment(&mut self, segment: &Segment, source: &Path) -> i32 {
        let config = self.converter.config();
        let steps = self.converter.segment_steps(segment, source);

        if config.pretend || config.verbose >= 1 {
            for step in &steps {
                println!("{step}");
                println!();
            }
        }
        if config.pretend {
            return 0;
        }

        for step in &steps {
            debug!(%step, "running");
            let code = match self.runner.run_step(step) {
                Ok(code) => code,
                Err(e) => {
                    error!(%step, "failed to run: {e}");
                    1
                }
            };
            if code != 0 {
                return code;
            }
        }
        0
    }
}
