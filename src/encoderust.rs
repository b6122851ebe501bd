use crate::assemble::{Assembled, Assembler};
use crate::bitmap;
use crate::error::*;
use crate::frames::Batch;
use crate::palette::Palette;
use crate::Config;
use imgref::*;
use rgb::*;
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use tracing::info;

/// One paletted frame of the animation
pub struct GIFFrame {
    pub image: ImgVec<u8>,
    pub delay: u16,
    pub dispose: gif::DisposalMethod,
}

/// Frames sharing one global palette, kept in memory until written
pub struct Animation {
    width: u16,
    height: u16,
    pal: Palette,
    frames: Vec<GIFFrame>,
}

impl Animation {
    pub fn new(width: usize, height: usize, pal: Palette) -> ParrotResult<Self> {
        Ok(Self {
            width: gif_dimension(width)?,
            height: gif_dimension(height)?,
            pal,
            frames: Vec::new(),
        })
    }

    /// Decode and quantize every composited frame the config expects.
    ///
    /// The first usable frame sets the size of the animation. Frames that are missing,
    /// unreadable or larger than that are skipped.
    pub fn collect(config: &Config) -> ParrotResult<(Self, Batch<usize>)> {
        let mut anim = None;
        let batch = (0..config.positions.len()).fold(Batch::default(), |batch, index| {
            let res = bitmap::decode(&config.intermediate_path(index)).and_then(|image| {
                if anim.is_none() {
                    anim = Some(Self::new(image.width(), image.height(), Palette::transparent_plan9())?);
                }
                let anim = anim.as_mut().ok_or(Error::NoFrames)?;
                anim.push_frame(image.as_ref(), config.delay, config.alpha_threshold)?;
                Ok(index)
            });
            batch.record(index, res)
        });
        let anim = anim.ok_or(Error::NoFrames)?;
        Ok((anim, batch))
    }

    /// Map every pixel to the palette, and append it with "restore to previous" disposal
    pub fn push_frame(&mut self, image: ImgRef<'_, RGBA8>, delay: u16, alpha_threshold: u8) -> ParrotResult<()> {
        if image.width() > self.width.into() || image.height() > self.height.into() {
            return Err(Error::WrongSize(format!("Frame {} has wrong size ({}×{}, expected at most {}×{})",
                self.frames.len(), image.width(), image.height(), self.width, self.height)));
        }
        let pal = &mut self.pal;
        let indices = image.pixels().map(|px| pal.index_of(px, alpha_threshold)).collect();
        self.frames.push(GIFFrame {
            image: ImgVec::new(indices, image.width(), image.height()),
            delay,
            dispose: gif::DisposalMethod::Previous,
        });
        Ok(())
    }

    pub fn frames(&self) -> &[GIFFrame] {
        &self.frames
    }

    /// Write a looping GIF
    pub fn write<W: Write>(&self, writer: W) -> ParrotResult<W> {
        let mut enc = gif::Encoder::new(writer, self.width, self.height, &self.pal.to_rgb_bytes())?;
        enc.set_repeat(gif::Repeat::Infinite)?;

        let transparent = self.pal.transparent_index();
        for f in &self.frames {
            enc.write_frame(&gif::Frame {
                delay: f.delay,
                dispose: f.dispose,
                transparent,
                width: f.image.width() as u16,
                height: f.image.height() as u16,
                buffer: Cow::Borrowed(f.image.buf()),
                ..gif::Frame::default()
            })?;
        }
        Ok(enc.into_inner()?)
    }
}

fn gif_dimension(size: usize) -> ParrotResult<u16> {
    match u16::try_from(size) {
        Ok(s) if s > 0 => Ok(s),
        _ => Err(Error::WrongSize(format!("GIF can't be {size} pixels wide or tall"))),
    }
}

/// Writes the GIF with the fixed Plan 9 palette, without any external tools
pub struct BuiltinAssembler {}

impl BuiltinAssembler {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for BuiltinAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler for BuiltinAssembler {
    fn name(&self) -> &'static str {
        "built-in"
    }

    fn assemble(&mut self, config: &Config) -> ParrotResult<Assembled> {
        let (anim, batch) = Animation::collect(config)?;

        if let Some(parent) = config.output.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&config.output)
            .map_err(|err| Error::Write(format!("Can't write to {}: {}", config.output.display(), err)))?;
        anim.write(BufWriter::new(file))?.flush()?;
        info!(frames = anim.frames().len(), "wrote {}", config.output.display());

        Ok(Assembled {
            output: config.output.clone(),
            skipped: batch.failures,
            frames: Some(anim.frames().len()),
        })
    }
}
