//! Joins media files without re-encoding using ffmpeg's concat demuxer.

use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use tracing::{debug, error};

use crate::command::{Step, ToolCommand, FFMPEG};
use crate::error::Result;
use crate::logging;
use crate::runner::{StepRunner, SystemRunner};
use crate::util::escape_single_quotes;

#[derive(Debug, Parser)]
#[command(
    name = "ffcat",
    version,
    about = "Concatenates media files using the ffmpeg concat demuxer"
)]
pub struct ConcatCli {
    /// Verbose output
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Source files to concatenate
    #[arg(required = true, value_name = "SOURCE_FILE")]
    pub source_files: Vec<PathBuf>,

    /// Output file name
    pub output_file: PathBuf,
}

/// The contents of a concat list naming `sources` in order.
pub fn concat_list(sources: &[PathBuf]) -> String {
    sources
        .iter()
        .map(|source| format!("file '{}'\n", escape_single_quotes(&source.to_string_lossy())))
        .collect()
}

pub fn concat_command(list: &Path, output: &Path) -> ToolCommand {
    let mut cmd = ToolCommand::new(FFMPEG);
    cmd.args(["-f", "concat", "-safe", "0", "-i"])
        .arg(list.to_string_lossy())
        .args(["-c", "copy"])
        .arg(output.to_string_lossy());
    cmd
}

/// Writes the list next to the working directory and runs ffmpeg on it. The
/// list is removed when this returns, whatever the outcome.
pub fn concat<R: StepRunner>(cli: &ConcatCli, runner: &mut R) -> Result<i32> {
    let mut list = tempfile::Builder::new()
        .prefix("ffcat-")
        .suffix(".txt")
        .tempfile_in(env::current_dir()?)?;
    list.write_all(concat_list(&cli.source_files).as_bytes())?;
    list.flush()?;

    let step = Step::from(concat_command(list.path(), &cli.output_file));
    if cli.verbose >= 1 {
        println!("{step}");
    }
    debug!(list = %list.path().display(), "running concat");
    runner.run_step(&step)
}

/// Entry point for `ffcat`; returns ffmpeg's exit code.
pub fn ffcat_main() -> i32 {
    let cli = ConcatCli::parse();
    logging::init(cli.verbose);
    match concat(&cli, &mut SystemRunner) {
        Ok(code) => code,
        Err(e) => {
            error!("concat failed: {e}");
            1
        }
    }
}
