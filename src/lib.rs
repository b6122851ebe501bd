/*
 parrot-maker: party parrot GIF maker

 This program is free software: you can redistribute it and/or modify
 it under the terms of the GNU Affero General Public License as
 published by the Free Software Foundation, either version 3 of the
 License, or (at your option) any later version.

 This program is distributed in the hope that it will be useful,
 but WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 GNU Affero General Public License for more details.

 You should have received a copy of the GNU Affero General Public License
 along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

#[macro_use] extern crate quick_error;

mod error;
pub use crate::error::*;
pub mod assemble;
pub mod bitmap;
pub mod composite;
pub mod encoderust;
pub mod ffmpeg;
pub mod frames;
pub mod palette;
pub mod progress;
pub mod scale;

use crate::frames::{FrameFailure, FrameSet};
use crate::progress::ProgressReporter;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where the picture goes on each of the parrot frames (before `OFFSET` is added)
pub const POSITIONS: [(i32, i32); 10] = [
    (55, 35),
    (40, 28),
    (25, 32),
    (15, 39),
    (12, 39),
    (19, 43),
    (35, 47),
    (48, 51),
    (54, 47),
    (64, 42),
];

/// Moves the picture's anchor from its top-left corner to roughly the parrot's head
pub const OFFSET: (i32, i32) = (-25, -15);

/// Everything the pipeline needs to know. `Default` is the party parrot in the current directory.
#[derive(Debug, Clone)]
pub struct Config {
    /// The picture to put on the parrot
    pub input: PathBuf,
    /// Background frames, used in file name order
    pub frames_dir: PathBuf,
    /// Composited frames are saved here as `0.png`, `1.png`, …
    pub intermediates_dir: PathBuf,
    /// The animated GIF
    pub output: PathBuf,
    /// The picture is resized to this width
    pub width: usize,
    /// Added to every position
    pub offset: (i32, i32),
    /// One per frame
    pub positions: Vec<(i32, i32)>,
    /// Frame delay of the built-in encoder, in 1/100s
    pub delay: u16,
    /// Frame rate for the external tool
    pub fps: u32,
    /// Alpha below this becomes transparent in the GIF
    pub alpha_threshold: u8,
    /// Name or path of the external media tool
    pub tool: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: "input.png".into(),
            frames_dir: "frames".into(),
            intermediates_dir: "intermediates".into(),
            output: Path::new("output").join("animation.gif"),
            width: 100,
            offset: OFFSET,
            positions: POSITIONS.to_vec(),
            delay: 5,
            fps: 20,
            alpha_threshold: palette::ALPHA_THRESHOLD,
            tool: "ffmpeg".into(),
        }
    }
}

impl Config {
    /// Default settings, with all files relative to `root`
    pub fn rooted(root: &Path) -> Self {
        let mut c = Self::default();
        c.input = root.join(&c.input);
        c.frames_dir = root.join(&c.frames_dir);
        c.intermediates_dir = root.join(&c.intermediates_dir);
        c.output = root.join(&c.output);
        c
    }

    pub fn validate(&self) -> ParrotResult<()> {
        if self.width == 0 {
            return Err(Error::InvalidConfig("width must be non-zero"));
        }
        if self.positions.is_empty() {
            return Err(Error::InvalidConfig("there must be at least one position"));
        }
        if self.delay == 0 {
            return Err(Error::InvalidConfig("delay must be non-zero"));
        }
        if self.fps == 0 {
            return Err(Error::InvalidConfig("fps must be non-zero"));
        }
        Ok(())
    }

    /// Composited frame number `index`
    pub fn intermediate_path(&self, index: usize) -> PathBuf {
        self.intermediates_dir.join(format!("{index}.png"))
    }

    /// Palette generated by the external tool
    pub fn palette_path(&self) -> PathBuf {
        self.intermediates_dir.join("palette.png")
    }
}

/// What a finished run did
#[derive(Debug)]
pub struct Report {
    /// Name of the assembler that wrote the GIF
    pub strategy: &'static str,
    pub intermediates: Vec<PathBuf>,
    /// Background frames that couldn't be composited
    pub skipped_frames: Vec<FrameFailure>,
    /// Composited frames the assembler couldn't use
    pub skipped_intermediates: Vec<FrameFailure>,
    /// Frames in the GIF, if known
    pub frames_written: Option<usize>,
    pub output: PathBuf,
}

/// Resize the input, composite it onto every frame, and assemble the GIF.
///
/// The external tool is used if it can be found, otherwise the built-in encoder.
/// Bad frames are skipped; anything else stops the run.
pub fn make(config: &Config, reporter: &mut dyn ProgressReporter) -> ParrotResult<Report> {
    config.validate()?;

    let input = bitmap::decode(&config.input)?;
    let overlay = scale::to_width(input.as_ref(), config.width)?;
    info!(width = overlay.width(), height = overlay.height(), "resized {}", config.input.display());

    let frame_set = FrameSet::list(&config.frames_dir)?;
    frame_set.check_positions(config.positions.len())?;
    fs::create_dir_all(&config.intermediates_dir)?;

    let composited = frames::composite_all(&frame_set, overlay.as_ref(), config, reporter)?;
    info!(written = composited.done.len(), skipped = composited.failures.len(), "composited frames");

    let mut assembler = assemble::select(config);
    info!("assembling with {}", assembler.name());
    let assembled = assembler.assemble(config)?;
    if assembler.stops_at_gap() {
        if let Some(gap) = first_gap(&composited.failures) {
            warn!("{} stops at the missing {}, so later frames are not in the animation",
                assembler.name(), config.intermediate_path(gap).display());
        }
    }
    reporter.done(&format!("parrot-maker created {}", assembled.output.display()));

    Ok(Report {
        strategy: assembler.name(),
        intermediates: composited.done,
        skipped_frames: composited.failures,
        skipped_intermediates: assembled.skipped,
        frames_written: assembled.frames,
        output: assembled.output,
    })
}

/// Lowest index that has no checkpoint
fn first_gap(failures: &[FrameFailure]) -> Option<usize> {
    failures.iter().map(|f| f.index).min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_are_relative() {
        let c = Config::default();
        assert_eq!(Path::new("input.png"), c.input);
        assert_eq!(Path::new("output/animation.gif"), c.output);
        assert_eq!(Path::new("intermediates/7.png"), c.intermediate_path(7));
        assert_eq!(Path::new("intermediates/palette.png"), c.palette_path());
        assert_eq!(10, c.positions.len());
        c.validate().unwrap();
    }

    #[test]
    fn rooted_moves_every_path() {
        let c = Config::rooted(Path::new("/tmp/party"));
        for p in [&c.input, &c.frames_dir, &c.intermediates_dir, &c.output] {
            assert!(p.starts_with("/tmp/party"), "{}", p.display());
        }
        assert_eq!(Path::new("ffmpeg"), c.tool);
    }

    #[test]
    fn first_frame_position() {
        let c = Config::default();
        assert_eq!((30, 20), (c.positions[0].0 + c.offset.0, c.positions[0].1 + c.offset.1));
    }

    #[test]
    fn rejects_nonsense() {
        let mut c = Config::default();
        c.positions.clear();
        assert!(matches!(c.validate(), Err(Error::InvalidConfig(_))));

        let c = Config { width: 0, ..Config::default() };
        assert!(c.validate().is_err());
        let c = Config { fps: 0, ..Config::default() };
        assert!(c.validate().is_err());
    }

    #[test]
    fn gap_is_the_lowest_failed_index() {
        let failed = |index| FrameFailure { index, error: Error::NoFrames, leftover: None };
        assert_eq!(None, first_gap(&[]));
        assert_eq!(Some(3), first_gap(&[failed(7), failed(3), failed(8)]));
    }
}
