//! Render surface abstraction and a software framebuffer implementation.
//!
//! [`Canvas`] is everything the scene needs from a renderer: clear, filled
//! circles and centred text.  [`FrameCanvas`] implements it over a packed
//! ARGB `Vec<u32>` that the visualizer hands to `minifb` each frame, so the
//! drawing code is testable without a window.

// ════════════════════════════════════════════════════════════════════════════
// Rgb
// ════════════════════════════════════════════════════════════════════════════

/// Floating-point RGB in 0–255, so colours can be smoothed without banding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255.0, 255.0, 255.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Rgb { r, g, b }
    }

    pub const fn gray(v: f32) -> Self {
        Rgb { r: v, g: v, b: v }
    }

    /// Linear interpolation toward `target`; `t` = 0.0 → self, 1.0 → target.
    pub fn lerp(self, target: Rgb, t: f32) -> Rgb {
        Rgb {
            r: self.r + (target.r - self.r) * t,
            g: self.g + (target.g - self.g) * t,
            b: self.b + (target.b - self.b) * t,
        }
    }

    /// Pack as opaque 0xAARRGGBB.
    pub fn to_argb(self) -> u32 {
        let c = |v: f32| v.round().clamp(0.0, 255.0) as u32;
        0xFF000000 | (c(self.r) << 16) | (c(self.g) << 8) | c(self.b)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Canvas trait
// ════════════════════════════════════════════════════════════════════════════

pub trait Canvas {
    fn width(&self) -> f32;
    fn height(&self) -> f32;
    fn clear(&mut self, color: Rgb);
    /// Filled circle centred on (`x`, `y`).
    fn draw_filled_circle(&mut self, x: f32, y: f32, diameter: f32, color: Rgb);
    /// Text centred on (`x`, `y`).  `size` is the glyph height in pixels;
    /// `font` is a family name the surface may ignore.
    fn draw_text(&mut self, text: &str, x: f32, y: f32, size: f32, font: &str, color: Rgb);
}

// ════════════════════════════════════════════════════════════════════════════
// FrameCanvas
// ════════════════════════════════════════════════════════════════════════════

/// Bitmap glyph cell: 3 columns × 5 rows plus a one-column gap.
const GLYPH_W: usize = 3;
const GLYPH_H: usize = 5;
const GLYPH_ADVANCE: usize = GLYPH_W + 1;

pub struct FrameCanvas {
    width:  usize,
    height: usize,
    buf:    Vec<u32>,
}

impl FrameCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        FrameCanvas {
            width,
            height,
            buf: vec![0xFF000000; width * height],
        }
    }

    pub fn buffer(&self) -> &[u32] {
        &self.buf
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Colour at (`x`, `y`), or `None` outside the surface.
    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.buf[y * self.width + x])
    }

    fn set_pixel(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.buf[y as usize * self.width + x as usize] = color;
        }
    }

    fn fill_rect(&mut self, x: isize, y: isize, w: usize, h: usize, color: u32) {
        for row in y..y + h as isize {
            for col in x..x + w as isize {
                self.set_pixel(col, row, color);
            }
        }
    }
}

impl Canvas for FrameCanvas {
    fn width(&self) -> f32 {
        self.width as f32
    }

    fn height(&self) -> f32 {
        self.height as f32
    }

    fn clear(&mut self, color: Rgb) {
        self.buf.fill(color.to_argb());
    }

    fn draw_filled_circle(&mut self, x: f32, y: f32, diameter: f32, color: Rgb) {
        let r = diameter.max(0.0) / 2.0;
        if r <= 0.0 { return; }
        let argb = color.to_argb();
        let y0 = (y - r).floor() as isize;
        let y1 = (y + r).ceil() as isize;
        let r2 = r * r;
        for py in y0..=y1 {
            // Sample at pixel centres so small circles stay symmetric.
            let dy = py as f32 + 0.5 - y;
            let span2 = r2 - dy * dy;
            if span2 < 0.0 { continue; }
            let span = span2.sqrt();
            let x0 = (x - span - 0.5).ceil() as isize;
            let x1 = (x + span - 0.5).floor() as isize;
            for px in x0..=x1 {
                self.set_pixel(px, py, argb);
            }
        }
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, size: f32, _font: &str, color: Rgb) {
        let scale = ((size / GLYPH_H as f32).round() as usize).max(1);
        let argb = color.to_argb();
        let count = text.chars().count();
        if count == 0 { return; }
        let text_w = (count * GLYPH_ADVANCE - 1) * scale;
        let text_h = GLYPH_H * scale;
        let mut cx = x.round() as isize - (text_w / 2) as isize;
        let cy = y.round() as isize - (text_h / 2) as isize;

        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_W {
                    if bits & (1 << (GLYPH_W - 1 - col)) != 0 {
                        self.fill_rect(
                            cx + (col * scale) as isize,
                            cy + (row * scale) as isize,
                            scale, scale, argb,
                        );
                    }
                }
            }
            cx += (GLYPH_ADVANCE * scale) as isize;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '"' => [0b101, 0b101, 0b000, 0b000, 0b000],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_packs_opaque() {
        assert_eq!(Rgb::new(255.0, 0.0, 0.0).to_argb(), 0xFFFF0000);
        assert_eq!(Rgb::new(300.0, -4.0, 16.0).to_argb(), 0xFFFF0010);
    }

    #[test]
    fn lerp_endpoints() {
        let a = Rgb::gray(0.0);
        let b = Rgb::WHITE;
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
    }

    #[test]
    fn circle_fills_centre_not_corner() {
        let mut c = FrameCanvas::new(40, 40);
        c.clear(Rgb::gray(0.0));
        c.draw_filled_circle(20.0, 20.0, 20.0, Rgb::WHITE);
        assert_eq!(c.pixel(20, 20), Some(0xFFFFFFFF));
        assert_eq!(c.pixel(11, 20), Some(0xFFFFFFFF));
        assert_eq!(c.pixel(11, 11), Some(0xFF000000));
        assert_eq!(c.pixel(0, 0), Some(0xFF000000));
    }

    #[test]
    fn circle_clips_at_edges() {
        let mut c = FrameCanvas::new(10, 10);
        c.draw_filled_circle(0.0, 0.0, 30.0, Rgb::WHITE);
        assert_eq!(c.pixel(9, 9), Some(0xFFFFFFFF));
        assert_eq!(c.pixel(10, 10), None);
    }

    #[test]
    fn text_is_centred() {
        let mut c = FrameCanvas::new(60, 20);
        c.clear(Rgb::gray(0.0));
        // "1" at scale 2: 6×10 block centred on (30, 10).
        c.draw_text("1", 30.0, 10.0, 10.0, "mono", Rgb::WHITE);
        // middle column of the glyph is always lit for '1'
        assert_eq!(c.pixel(30, 10), Some(0xFFFFFFFF));
        assert_eq!(c.pixel(5, 10), Some(0xFF000000));
    }
}
