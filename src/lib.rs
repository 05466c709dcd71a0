//! Converts audio and video files with ffmpeg.
//!
//! Each tool resolves its command line into a [`config::Config`], a
//! [`converter::Converter`] turns every source file and segment into ordered
//! ffmpeg steps, and a [`runner::Orchestrator`] executes them.

pub mod cli;
pub mod command;
pub mod concat;
pub mod config;
pub mod converter;
pub mod duration;
pub mod error;
pub mod filters;
pub mod formats;
pub mod logging;
pub mod runner;
pub mod segment;
pub mod util;

pub use error::{Error, Result};
