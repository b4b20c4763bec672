//! Raster rendering of challenge codes.
//!
//! A fixed canvas gets a light background, a few random line segments and
//! scattered single-pixel marks. Each character sits in an equal-width cell
//! and is nudged by a few pixels in both directions. The result is a PNG.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::glyphs::{glyph, lit, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::ChallengeError;

/// Canvas geometry and noise levels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptchaStyle {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub jitter: u32,
    pub noise_lines: u32,
    pub noise_dots: u32,
}

impl Default for CaptchaStyle {
    fn default() -> Self {
        Self {
            width: 120,
            height: 40,
            margin: 8,
            jitter: 3,
            noise_lines: 5,
            noise_dots: 60,
        }
    }
}

impl CaptchaStyle {
    /// Longest code whose glyphs fit side by side on this canvas.
    pub fn max_chars(&self) -> usize {
        if self.height < GLYPH_HEIGHT {
            return 0;
        }
        (self.width.saturating_sub(2 * self.margin) / GLYPH_WIDTH) as usize
    }
}

type Rgb = [u8; 3];

struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(width: u32, height: u32, background: Rgb) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&background);
        }
        Self { width, height, pixels }
    }

    /// Out-of-bounds writes are dropped.
    fn set(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let offset = ((y as u32 * self.width + x as u32) * 3) as usize;
        self.pixels[offset..offset + 3].copy_from_slice(&color);
    }

    #[cfg(test)]
    fn get(&self, x: u32, y: u32) -> Rgb {
        let offset = ((y * self.width + x) * 3) as usize;
        [self.pixels[offset], self.pixels[offset + 1], self.pixels[offset + 2]]
    }

    /// Bresenham.
    fn line(&mut self, (mut x0, mut y0): (i64, i64), (x1, y1): (i64, i64), color: Rgb) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.set(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn glyph(&mut self, rows: &[u8], left: i64, top: i64, scale: u32, color: Rgb) {
        for (gy, row) in rows.iter().enumerate() {
            for gx in 0..GLYPH_WIDTH {
                if !lit(*row, gx) {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        self.set(
                            left + (gx * scale + dx) as i64,
                            top + (gy as u32 * scale + dy) as i64,
                            color,
                        );
                    }
                }
            }
        }
    }

    fn encode_png(&self) -> Result<Vec<u8>, ChallengeError> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_compression(png::Compression::Best);
            let mut writer = encoder
                .write_header()
                .map_err(|e| ChallengeError::Render(e.to_string()))?;
            writer
                .write_image_data(&self.pixels)
                .map_err(|e| ChallengeError::Render(e.to_string()))?;
            writer
                .finish()
                .map_err(|e| ChallengeError::Render(e.to_string()))?;
        }
        Ok(out)
    }
}

fn light<R: Rng + ?Sized>(rng: &mut R) -> Rgb {
    [rng.gen_range(230..=255), rng.gen_range(230..=255), rng.gen_range(230..=255)]
}

fn mid<R: Rng + ?Sized>(rng: &mut R) -> Rgb {
    [rng.gen_range(100..=200), rng.gen_range(100..=200), rng.gen_range(100..=200)]
}

fn dark<R: Rng + ?Sized>(rng: &mut R) -> Rgb {
    [rng.gen_range(0..=90), rng.gen_range(0..=90), rng.gen_range(0..=90)]
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, amount: u32) -> i64 {
    let amount = amount as i64;
    rng.gen_range(-amount..=amount)
}

fn draw<R: Rng + ?Sized>(code: &str, style: &CaptchaStyle, rng: &mut R) -> Result<Canvas, ChallengeError> {
    let chars: Vec<char> = code.chars().collect();
    if chars.is_empty() {
        return Err(ChallengeError::Render("empty code".into()));
    }
    if chars.len() > style.max_chars() {
        return Err(ChallengeError::Render(format!(
            "{}x{} canvas cannot hold {} characters",
            style.width,
            style.height,
            chars.len()
        )));
    }
    let cell = style.width.saturating_sub(2 * style.margin) / chars.len() as u32;
    let scale = (cell / (GLYPH_WIDTH + 1))
        .min(style.height.saturating_sub(2 * style.jitter) / GLYPH_HEIGHT)
        .max(1);

    let mut canvas = Canvas::new(style.width, style.height, light(rng));
    let (w, h) = (style.width as i64, style.height as i64);

    for _ in 0..style.noise_lines {
        let from = (rng.gen_range(0..w), rng.gen_range(0..h));
        let to = (rng.gen_range(0..w), rng.gen_range(0..h));
        let color = mid(rng);
        canvas.line(from, to, color);
    }

    let glyph_w = (GLYPH_WIDTH * scale) as i64;
    let glyph_h = (GLYPH_HEIGHT * scale) as i64;
    for (i, c) in chars.iter().enumerate() {
        let rows = glyph(*c).ok_or_else(|| ChallengeError::Render(format!("no glyph for {c:?}")))?;
        let cell_left = style.margin as i64 + i as i64 * cell as i64;
        let left = cell_left + (cell as i64 - glyph_w) / 2 + jitter(rng, style.jitter);
        let top = (h - glyph_h) / 2 + jitter(rng, style.jitter);
        let color = dark(rng);
        canvas.glyph(rows, left, top, scale, color);
    }

    for _ in 0..style.noise_dots {
        let (x, y) = (rng.gen_range(0..w), rng.gen_range(0..h));
        let color = mid(rng);
        canvas.set(x, y, color);
    }

    Ok(canvas)
}

/// Render `code` as a PNG using `rng` for every random choice.
pub fn render_png<R: Rng + ?Sized>(
    code: &str,
    style: &CaptchaStyle,
    rng: &mut R,
) -> Result<Vec<u8>, ChallengeError> {
    draw(code, style, rng)?.encode_png()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn renders_a_png_of_the_configured_size() {
        let style = CaptchaStyle::default();
        let bytes = render_png("K7QZ", &style, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(bytes[..8], PNG_SIGNATURE);

        let decoder = png::Decoder::new(bytes.as_slice());
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!((info.width, info.height), (style.width, style.height));
    }

    #[test]
    fn same_seed_renders_identically() {
        let style = CaptchaStyle::default();
        let a = render_png("AB23", &style, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = render_png("AB23", &style, &mut StdRng::seed_from_u64(1)).unwrap();
        let c = render_png("AB23", &style, &mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn glyph_ink_lands_inside_the_margins() {
        let style = CaptchaStyle {
            noise_lines: 0,
            noise_dots: 0,
            ..CaptchaStyle::default()
        };
        let canvas = draw("HHHH", &style, &mut StdRng::seed_from_u64(3)).unwrap();
        let background = canvas.get(0, 0);
        let mut inked = 0;
        for y in 0..canvas.height {
            for x in 0..canvas.width {
                if canvas.get(x, y) != background {
                    inked += 1;
                    assert!(x + style.jitter >= style.margin);
                    assert!(x < style.width - style.margin + style.jitter);
                }
            }
        }
        assert!(inked > 0);
    }

    #[test]
    fn rejects_codes_that_cannot_fit() {
        let style = CaptchaStyle {
            width: 20,
            ..CaptchaStyle::default()
        };
        let err = render_png("ABCDEFGH", &style, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, ChallengeError::Render(_)));
        assert!(render_png("", &CaptchaStyle::default(), &mut StdRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn rejects_characters_without_glyphs() {
        let err = render_png("AB0!", &CaptchaStyle::default(), &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, ChallengeError::Render(_)));
    }

    #[test]
    fn longest_fitting_code_renders_and_one_more_does_not() {
        let style = CaptchaStyle::default();
        let max = style.max_chars();
        assert_eq!(max, 20);
        let mut rng = StdRng::seed_from_u64(5);
        assert!(render_png(&"H".repeat(max), &style, &mut rng).is_ok());
        assert!(matches!(
            render_png(&"H".repeat(max + 1), &style, &mut rng),
            Err(ChallengeError::Render(_))
        ));

        let squat = CaptchaStyle { height: GLYPH_HEIGHT - 1, ..style };
        assert_eq!(squat.max_chars(), 0);
    }
}
