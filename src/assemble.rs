//! Turning the composited frames into the final GIF

use crate::encoderust::BuiltinAssembler;
use crate::error::*;
use crate::ffmpeg::{self, FfmpegAssembler};
use crate::frames::FrameFailure;
use crate::Config;
use std::path::PathBuf;

/// Result of assembling the animation
#[derive(Debug)]
pub struct Assembled {
    pub output: PathBuf,
    /// Composited frames that were missing or unreadable
    pub skipped: Vec<FrameFailure>,
    /// Number of frames in the GIF, if the assembler knows it
    pub frames: Option<usize>,
}

/// One way of writing the GIF from `Config::intermediate_path` files
pub trait Assembler {
    fn name(&self) -> &'static str;

    /// True if a missing checkpoint also drops every frame after it
    fn stops_at_gap(&self) -> bool {
        false
    }

    fn assemble(&mut self, config: &Config) -> ParrotResult<Assembled>;
}

/// Looks for the external tool once, and picks the matching assembler
pub fn select(config: &Config) -> Box<dyn Assembler> {
    select_with(ffmpeg::find_executable(&config.tool))
}

/// The external tool at `found` if there is one, the built-in encoder otherwise
pub fn select_with(found: Option<PathBuf>) -> Box<dyn Assembler> {
    match found {
        Some(program) => Box::new(FfmpegAssembler::new(program)),
        None => Box::new(BuiltinAssembler::new()),
    }
}
