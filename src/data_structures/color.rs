//! Linear RGB colors and the HSL mapping used for hue cycling.

/// An RGB color with components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build a color from a `0xRRGGBB` literal.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }

    /// Convert hue/saturation/lightness (all in `[0, 1]`) to RGB.
    ///
    /// Hue wraps, saturation and lightness are clamped. This is the textbook
    /// two-ramp formula (`p`/`q` with a piecewise hue ramp), so the result can
    /// be checked against any reference HSL converter.
    pub fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        let h = f64::from(h).rem_euclid(1.0);
        let s = f64::from(s).clamp(0.0, 1.0);
        let l = f64::from(l).clamp(0.0, 1.0);

        if s == 0.0 {
            return Self::new(l as f32, l as f32, l as f32);
        }

        let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        Self::new(
            hue_to_rgb(p, q, h + 1.0 / 3.0) as f32,
            hue_to_rgb(p, q, h) as f32,
            hue_to_rgb(p, q, h - 1.0 / 3.0) as f32,
        )
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Pack into a 4-component array as expected by uniform buffers.
    pub fn to_vec4(self, w: f32) -> [f32; 4] {
        [self.r, self.g, self.b, w]
    }
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * 6.0 * (2.0 / 3.0 - t);
    }
    p
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<Color> for wgpu::Color {
    fn from(c: Color) -> Self {
        wgpu::Color {
            r: f64::from(c.r),
            g: f64::from(c.g),
            b: f64::from(c.b),
            a: 1.0,
        }
    }
}

impl From<[f32; 3]> for Color {
    fn from(rgb: [f32; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }
}
