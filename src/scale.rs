use crate::error::*;
use imgref::*;
use rgb::*;

/// Height that keeps the aspect ratio of a `width`×`height` image scaled to `target_width`
pub fn height_for_width(width: usize, height: usize, target_width: usize) -> usize {
    let h = (target_width as f64 * height as f64 / width as f64).round() as usize;
    h.max(1)
}

/// Scale the image to the given width with a Lanczos3 filter, preserving aspect ratio.
///
/// If the size wouldn't change, the pixels are copied as-is.
pub fn to_width(image: ImgRef<'_, RGBA8>, target_width: usize) -> ParrotResult<ImgVec<RGBA8>> {
    if target_width == 0 {
        return Err(Error::InvalidConfig("target width must be non-zero"));
    }
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::InvalidConfig("can't scale an empty image"));
    }

    let target_height = height_for_width(image.width(), image.height(), target_width);
    let (buf, img_width, img_height) = image.to_contiguous_buf();
    if (target_width, target_height) == (img_width, img_height) {
        return Ok(ImgVec::new(buf.into_owned(), img_width, img_height));
    }

    // premultiplied, so that colors of transparent pixels don't bleed into the edges
    let mut r = resize::new(img_width, img_height, target_width, target_height, resize::Pixel::RGBA8P, resize::Type::Lanczos3)?;
    let mut dst = vec![RGBA8::new(0, 0, 0, 0); target_width * target_height];
    r.resize(&buf, &mut dst)?;
    Ok(ImgVec::new(dst, target_width, target_height))
}
