//! Reading pictures from disk and writing PNG checkpoints

use crate::error::*;
use imgref::*;
use rgb::*;
use std::fs;
use std::io;
use std::path::Path;

/// Image formats accepted as input, recognized by their magic bytes
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Format {
    Png,
    Jpeg,
    Gif,
}

impl Format {
    pub fn sniff(data: &[u8]) -> Option<Self> {
        match data {
            [0x89, b'P', b'N', b'G', ..] => Some(Self::Png),
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [b'G', b'I', b'F', b'8', ..] => Some(Self::Gif),
            _ => None,
        }
    }
}

/// Decode a PNG, JPEG or GIF file into straight-alpha RGBA pixels.
///
/// JPEG has no alpha, so it comes out fully opaque. For GIF only the first frame is used.
pub fn decode(path: &Path) -> ParrotResult<ImgVec<RGBA8>> {
    let data = fs::read(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => Error::NotFound(path.to_owned()),
        _ => Error::Io(err),
    })?;

    match Format::sniff(&data) {
        Some(Format::Png) => decode_png(&data, path),
        Some(Format::Jpeg) => decode_jpeg(&data, path),
        Some(Format::Gif) => decode_gif(&data, path),
        None => Err(Error::UnsupportedFormat(path.to_owned())),
    }
}

fn decode_png(data: &[u8], path: &Path) -> ParrotResult<ImgVec<RGBA8>> {
    let image = lodepng::decode32(data)
        .map_err(|err| Error::CorruptData(format!("Can't load {}: {}", path.display(), err)))?;
    Ok(ImgVec::new(image.buffer, image.width, image.height))
}

fn decode_jpeg(data: &[u8], path: &Path) -> ParrotResult<ImgVec<RGBA8>> {
    let image = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
        .map_err(|err| Error::CorruptData(format!("Can't load {}: {}", path.display(), err)))?
        .into_rgba8();
    let (width, height) = image.dimensions();
    let pixels = image.into_raw().as_rgba().to_vec();
    Ok(ImgVec::new(pixels, width as usize, height as usize))
}

fn decode_gif(data: &[u8], path: &Path) -> ParrotResult<ImgVec<RGBA8>> {
    let corrupt = |err: &dyn std::fmt::Display| Error::CorruptData(format!("Can't load {}: {}", path.display(), err));

    let mut gif_opts = gif::DecodeOptions::new();
    // gif-dispose needs palette indices, not expanded colors
    gif_opts.set_color_output(gif::ColorOutput::Indexed);

    let mut decoder = gif_opts.read_info(data).map_err(|e| corrupt(&e))?;
    let mut screen = gif_dispose::Screen::new_decoder(&decoder);
    let frame = decoder.read_next_frame()
        .map_err(|e| corrupt(&e))?
        .ok_or_else(|| corrupt(&"the file has no frames"))?;
    screen.blit_frame(frame).map_err(|e| corrupt(&e))?;

    let (buf, width, height) = screen.pixels_rgba().to_contiguous_buf();
    Ok(ImgVec::new(buf.into_owned(), width, height))
}

/// Write pixels as a lossless PNG, replacing any existing file
pub fn write_png(path: &Path, image: ImgRef<'_, RGBA8>) -> ParrotResult<()> {
    let (buf, width, height) = image.to_contiguous_buf();
    lodepng::encode32_file(path, &buf[..], width, height)
        .map_err(|err| Error::Write(format!("Can't write {}: {}", path.display(), err)))
}
