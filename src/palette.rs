//! Fixed GIF palette for the built-in encoder

use rgb::*;
use std::collections::HashMap;

/// Alpha below this is treated as fully transparent
pub const ALPHA_THRESHOLD: u8 = 128;

/// 256 colors, where index 0 may be reserved for transparency
#[derive(Clone)]
pub struct Palette {
    colors: [RGBA8; 256],
    /// nearest-color lookups, keyed by opaque RGB
    cache: HashMap<RGB8, u8>,
}

impl Palette {
    /// The Plan 9 color map: a 4×4×4 RGB cube, with each cell split into 4 shades
    pub fn plan9() -> Self {
        let mut colors = [RGBA8::default(); 256];
        for r in 0..4 {
            for v in 0..4 {
                let i = 16 * (4 * r + v);
                for g in 0..4 {
                    for b in 0..4 {
                        let j = (v + 4 * g + b - r) & 0x0f;
                        let den = r.max(g).max(b);
                        let (cr, cg, cb) = if den == 0 {
                            (17 * v, 17 * v, 17 * v)
                        } else {
                            let num = 17 * (4 * den + v);
                            (r * num / den, g * num / den, b * num / den)
                        };
                        colors[(i + j) as usize] = RGBA8::new(cr as u8, cg as u8, cb as u8, 255);
                    }
                }
            }
        }
        Self { colors, cache: HashMap::new() }
    }

    /// Plan 9 colors with the first entry replaced by full transparency
    pub fn transparent_plan9() -> Self {
        let mut pal = Self::plan9();
        pal.colors[0] = RGBA8::new(0, 0, 0, 0);
        pal
    }

    pub fn colors(&self) -> &[RGBA8; 256] {
        &self.colors
    }

    /// Index of the first fully transparent entry
    pub fn transparent_index(&self) -> Option<u8> {
        self.colors.iter().position(|c| c.a == 0).map(|i| i as u8)
    }

    /// Flat RGB triplets, as GIF color tables store them
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.colors.iter().flat_map(|c| [c.r, c.g, c.b]).collect()
    }

    /// Pixels with alpha under `threshold` map to the transparent entry (if there is one).
    /// Everything else maps to the closest opaque color; on a tie the lower index wins.
    pub fn index_of(&mut self, px: RGBA8, threshold: u8) -> u8 {
        if px.a < threshold {
            if let Some(t) = self.transparent_index() {
                return t;
            }
        }
        let rgb = px.rgb();
        if let Some(&idx) = self.cache.get(&rgb) {
            return idx;
        }
        let idx = self.nearest_opaque(rgb);
        self.cache.insert(rgb, idx);
        idx
    }

    fn nearest_opaque(&self, px: RGB8) -> u8 {
        let mut best = (u32::MAX, 0);
        for (i, c) in self.colors.iter().enumerate() {
            if c.a == 0 {
                continue;
            }
            let diff = sq_diff(px.r, c.r) + sq_diff(px.g, c.g) + sq_diff(px.b, c.b);
            if diff < best.0 {
                best = (diff, i);
                if diff == 0 {
                    break;
                }
            }
        }
        best.1 as u8
    }
}

#[inline]
fn sq_diff(a: u8, b: u8) -> u32 {
    let d = i32::from(a) - i32::from(b);
    (d * d) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan9_corners() {
        let pal = Palette::plan9();
        assert_eq!(RGBA8::new(0, 0, 0, 255), pal.colors()[0]);
        assert_eq!(RGBA8::new(255, 255, 255, 255), pal.colors()[255]);
        assert_eq!(RGBA8::new(0, 0, 0x44, 255), pal.colors()[1]);
        assert_eq!(RGBA8::new(0x11, 0x11, 0x11, 255), pal.colors()[17]);
        let grays = pal.colors().iter().filter(|c| c.r == c.g && c.g == c.b).count();
        assert_eq!(16, grays);
        assert_eq!(None, pal.transparent_index());
    }

    #[test]
    fn has_pure_primaries() {
        let pal = Palette::plan9();
        for c in [RGBA8::new(255, 0, 0, 255), RGBA8::new(0, 255, 0, 255), RGBA8::new(0, 0, 255, 255)] {
            assert!(pal.colors().contains(&c), "{c:?}");
        }
    }

    #[test]
    fn first_entry_is_transparent() {
        let pal = Palette::transparent_plan9();
        assert_eq!(0, pal.colors()[0].a);
        assert_eq!(Some(0), pal.transparent_index());
        assert_eq!(&[0, 0, 0], &pal.to_rgb_bytes()[..3]);
        assert_eq!(256 * 3, pal.to_rgb_bytes().len());
    }

    #[test]
    fn low_alpha_maps_to_transparent() {
        let mut pal = Palette::transparent_plan9();
        assert_eq!(0, pal.index_of(RGBA8::new(255, 255, 255, 0), ALPHA_THRESHOLD));
        assert_eq!(0, pal.index_of(RGBA8::new(255, 0, 0, 127), ALPHA_THRESHOLD));
        assert_ne!(0, pal.index_of(RGBA8::new(255, 0, 0, 128), ALPHA_THRESHOLD));
    }

    #[test]
    fn opaque_pixels_never_pick_transparent() {
        let mut pal = Palette::transparent_plan9();
        let idx = pal.index_of(RGBA8::new(0, 0, 0, 255), ALPHA_THRESHOLD);
        assert_ne!(0, idx);
        assert_eq!(255, pal.colors()[idx as usize].a);
    }

    #[test]
    fn exact_colors_map_to_themselves() {
        let mut pal = Palette::transparent_plan9();
        let white = pal.index_of(RGBA8::new(255, 255, 255, 255), ALPHA_THRESHOLD);
        assert_eq!(255, white);
        for i in [1, 17, 100, 200] {
            let c = pal.colors()[i];
            let idx = pal.index_of(c, ALPHA_THRESHOLD) as usize;
            assert_eq!(c, pal.colors()[idx]);
        }
    }

    #[test]
    fn nearest_wins_and_ties_go_to_lower_index() {
        let mut pal = Palette::transparent_plan9();
        let idx = pal.index_of(RGBA8::new(250, 3, 2, 255), ALPHA_THRESHOLD);
        assert_eq!(RGBA8::new(255, 0, 0, 255), pal.colors()[idx as usize]);

        let mut tie = Palette::plan9();
        tie.colors[1] = RGBA8::new(10, 10, 10, 255);
        tie.colors[2] = RGBA8::new(10, 10, 10, 255);
        tie.colors[0] = RGBA8::new(200, 200, 200, 255);
        assert_eq!(1, tie.index_of(RGBA8::new(11, 11, 11, 255), ALPHA_THRESHOLD));
    }

    #[test]
    fn cached_lookup_matches_fresh_one() {
        let mut pal = Palette::transparent_plan9();
        let px = RGBA8::new(123, 45, 67, 255);
        let first = pal.index_of(px, ALPHA_THRESHOLD);
        assert_eq!(first, pal.index_of(px, ALPHA_THRESHOLD));
        assert_eq!(first, Palette::transparent_plan9().nearest_opaque(px.rgb()));
    }
}
