//! Colour palette drawn from the material stream.

use ship_core::{RandomStream, ShipResult};
use ship_mesh::Palette;

/// Convert hue, lightness and saturation (all in `[0, 1]`) to linear RGB.
pub fn hls_to_rgb(h: f32, l: f32, s: f32) -> [f32; 3] {
    if s <= 0.0 {
        return [l; 3];
    }
    let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let m1 = 2.0 * l - m2;
    let channel = |hue: f32| {
        let hue = hue.rem_euclid(1.0);
        if hue < 1.0 / 6.0 {
            m1 + (m2 - m1) * hue * 6.0
        } else if hue < 0.5 {
            m2
        } else if hue < 2.0 / 3.0 {
            m1 + (m2 - m1) * (2.0 / 3.0 - hue) * 6.0
        } else {
            m1
        }
    };
    [channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0)]
}

/// Dim, desaturated hull; bright pale windows; a fully saturated glow.
pub fn draw_palette(material: &mut RandomStream) -> ShipResult<Palette> {
    let hull = hls_to_rgb(material.unit(), material.next_float(0.05, 0.5)?, material.next_float(0.0, 0.25)?);
    let windows = hls_to_rgb(material.unit(), material.next_float(0.5, 1.0)?, material.next_float(0.0, 0.5)?);
    let glow = hls_to_rgb(material.unit(), material.next_float(0.5, 1.0)?, 1.0);
    Ok(Palette { hull, windows, glow })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn primaries() {
        assert!(close(hls_to_rgb(0.0, 0.5, 1.0), [1.0, 0.0, 0.0]));
        assert!(close(hls_to_rgb(1.0 / 3.0, 0.5, 1.0), [0.0, 1.0, 0.0]));
        assert!(close(hls_to_rgb(2.0 / 3.0, 0.5, 1.0), [0.0, 0.0, 1.0]));
        assert!(close(hls_to_rgb(0.3, 0.4, 0.0), [0.4, 0.4, 0.4]));
        assert!(close(hls_to_rgb(0.5, 1.0, 1.0), [1.0, 1.0, 1.0]));
    }

    #[test]
    fn palette_channels_are_in_range() {
        let mut rng = RandomStream::new("material", 8);
        for _ in 0..64 {
            let palette = draw_palette(&mut rng).unwrap();
            for colour in [palette.hull, palette.windows, palette.glow] {
                assert!(colour.iter().all(|c| (-1e-6..=1.0 + 1e-6).contains(c)));
            }
            // Hull lightness never exceeds one half
            assert!(palette.hull.iter().all(|c| *c <= 0.5 * 1.25 + 1e-6));
        }
    }
}
