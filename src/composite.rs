use imgref::*;
use rgb::*;

/// Draw `overlay` over a copy of `background`, with the overlay's top-left corner at (`x`, `y`).
///
/// Offsets may be negative. Parts of the overlay outside the background are clipped.
pub fn overlay(background: ImgRef<'_, RGBA8>, overlay: ImgRef<'_, RGBA8>, x: i32, y: i32) -> ImgVec<RGBA8> {
    let (buf, width, height) = background.to_contiguous_buf();
    let mut out = ImgVec::new(buf.into_owned(), width, height);

    let left = i64::from(x).max(0);
    let top = i64::from(y).max(0);
    let right = (i64::from(x) + overlay.width() as i64).min(width as i64);
    let bottom = (i64::from(y) + overlay.height() as i64).min(height as i64);
    if left >= right || top >= bottom {
        return out;
    }

    let src_x = (left - i64::from(x)) as usize;
    let src_y = (top - i64::from(y)) as usize;
    let w = (right - left) as usize;
    let h = (bottom - top) as usize;

    let src = overlay.sub_image(src_x, src_y, w, h);
    let mut dst = out.sub_image_mut(left as usize, top as usize, w, h);
    for (dst_row, src_row) in dst.rows_mut().zip(src.rows()) {
        for (d, &s) in dst_row.iter_mut().zip(src_row) {
            *d = blend_over(s, *d);
        }
    }
    out
}

/// Porter-Duff "over" on straight (non-premultiplied) alpha
#[inline]
pub fn blend_over(src: RGBA8, dst: RGBA8) -> RGBA8 {
    match src.a {
        255 => return src,
        0 => return dst,
        _ => {},
    }
    let sa = u32::from(src.a);
    let da = u32::from(dst.a);
    // alpha of the result, scaled by 255
    let out_a = sa * 255 + da * (255 - sa);
    if out_a == 0 {
        return RGBA8::new(0, 0, 0, 0);
    }
    let channel = |s: u8, d: u8| {
        let num = u32::from(s) * sa * 255 + u32::from(d) * da * (255 - sa);
        ((num + out_a / 2) / out_a) as u8
    };
    RGBA8::new(
        channel(src.r, dst.r),
        channel(src.g, dst.g),
        channel(src.b, dst.b),
        ((out_a + 127) / 255) as u8,
    )
}
