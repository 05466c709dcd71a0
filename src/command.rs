//! External command lines and the steps that make up one output.

use std::fmt;
use std::path::PathBuf;
use std::process::Command;

use crate::util::quote_arg;

pub const FFMPEG: &str = "ffmpeg";

/// An argument vector for an external tool. Never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Position of the first occurrence of `arg`, if any.
    pub fn position(&self, arg: &str) -> Option<usize> {
        self.args.iter().position(|a| a == arg)
    }

    /// The value following the first occurrence of `flag`.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.position(flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    pub fn contains(&self, arg: &str) -> bool {
        self.position(arg).is_some()
    }

    /// The last argument, which for ffmpeg is the output target.
    pub fn output(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote_arg(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote_arg(arg))?;
        }
        Ok(())
    }
}

/// One unit of work in producing an output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Tool(ToolCommand),
    /// Delete a pass log.
    RemoveFile(PathBuf),
    /// Keep a pass log under a new name.
    RenameFile { from: PathBuf, to: PathBuf },
}

impl Step {
    pub fn as_tool(&self) -> Option<&ToolCommand> {
        match self {
            Self::Tool(cmd) => Some(cmd),
            _ => None,
        }
    }
}

impl From<ToolCommand> for Step {
    fn from(cmd: ToolCommand) -> Self {
        Self::Tool(cmd)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tool(cmd) => fmt::Display::fmt(cmd, f),
            Self::RemoveFile(path) => write!(f, "rm {}", quote_arg(&path.to_string_lossy())),
            Self::RenameFile { from, to } => write!(
                f,
                "mv {} {}",
                quote_arg(&from.to_string_lossy()),
                quote_arg(&to.to_string_lossy())
            ),
        }
    }
}
