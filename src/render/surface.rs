/// How source pixels combine with what is already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMode {
    /// Normal painting: source covers destination by its alpha.
    #[default]
    SourceOver,
    /// Additive painting: source light accumulates, channels clamp at 1.
    Lighter,
}

/// HSLA color: hue in degrees (wrapped), saturation/lightness in percent,
/// alpha in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsla {
    pub h: f64,
    pub s: f64,
    pub l: f64,
    pub a: f64,
}

impl Hsla {
    pub fn new(h: f64, s: f64, l: f64, a: f64) -> Self {
        Hsla { h, s, l, a }
    }

    /// Straight (non-premultiplied) RGB channels in 0..=1.
    pub fn rgb(&self) -> (f32, f32, f32) {
        let h = self.h.rem_euclid(360.0);
        let s = (self.s / 100.0).clamp(0.0, 1.0);
        let l = (self.l / 100.0).clamp(0.0, 1.0);

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
        let m = l - c / 2.0;

        let (r1, g1, b1) = if h < 60.0 {
            (c, x, 0.0)
        } else if h < 120.0 {
            (x, c, 0.0)
        } else if h < 180.0 {
            (0.0, c, x)
        } else if h < 240.0 {
            (0.0, x, c)
        } else if h < 300.0 {
            (x, 0.0, c)
        } else {
            (c, 0.0, x)
        };

        ((r1 + m) as f32, (g1 + m) as f32, (b1 + m) as f32)
    }
}

/// One pixel, premultiplied alpha, f32 channels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl From<Hsla> for Rgba {
    /// Converts and premultiplies.
    fn from(color: Hsla) -> Self {
        let (r, g, b) = color.rgb();
        let a = color.a.clamp(0.0, 1.0) as f32;
        Rgba {
            r: r * a,
            g: g * a,
            b: b * a,
            a,
        }
    }
}

impl Rgba {
    /// Premultiplied source-over: `self` painted on top of `dst`.
    fn over(self, dst: Rgba) -> Rgba {
        let inv = 1.0 - self.a;
        Rgba {
            r: self.r + dst.r * inv,
            g: self.g + dst.g * inv,
            b: self.b + dst.b * inv,
            a: self.a + dst.a * inv,
        }
    }

    /// Additive blend, clamped at 1 per channel.
    fn plus(self, dst: Rgba) -> Rgba {
        Rgba {
            r: (self.r + dst.r).min(1.0),
            g: (self.g + dst.g).min(1.0),
            b: (self.b + dst.b).min(1.0),
            a: (self.a + dst.a).min(1.0),
        }
    }

    /// All four channels scaled by `k`. Premultiplied scaling is linear, so
    /// this is how coverage and halo weights are applied.
    fn scaled(self, k: f32) -> Rgba {
        Rgba {
            r: self.r * k,
            g: self.g * k,
            b: self.b * k,
            a: self.a * k,
        }
    }

    /// Displayed color over the black terminal background. Premultiplied
    /// channels over black are the final color directly.
    pub fn rgb8(self) -> (u8, u8, u8) {
        (
            (self.r.clamp(0.0, 1.0) * 255.0) as u8,
            (self.g.clamp(0.0, 1.0) * 255.0) as u8,
            (self.b.clamp(0.0, 1.0) * 255.0) as u8,
        )
    }

    /// Perceived brightness of the displayed color, 0..=1.
    pub fn luma(self) -> f64 {
        (0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b) as f64
    }
}

#[derive(Clone, Copy)]
struct Glow {
    /// Halo tint, premultiplied.
    color: Rgba,
    /// How far past the shape edge the halo reaches, in pixels.
    blur: f64,
}

/// A 2D raster surface in sub-cell pixel space.
///
/// This is the drawing target for the animation: a premultiplied-RGBA buffer
/// with canvas-style paint state (composite mode plus an optional glow).
/// Terminal renderers read it back per pixel via [`Surface::pixel`].
pub struct Surface {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
    composite: CompositeMode,
    glow: Option<Glow>,
}

impl Surface {
    pub fn new(width: usize, height: usize) -> Self {
        Surface {
            width,
            height,
            pixels: vec![Rgba::default(); width * height],
            composite: CompositeMode::SourceOver,
            glow: None,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Reset every pixel to transparent. Paint state is left alone.
    pub fn clear(&mut self) {
        self.pixels.fill(Rgba::default());
    }

    pub fn set_composite(&mut self, mode: CompositeMode) {
        self.composite = mode;
    }

    #[allow(dead_code)]
    pub fn composite(&self) -> CompositeMode {
        self.composite
    }

    /// Arm the glow: subsequent fills cast a halo of the given color
    /// reaching `blur` pixels past the shape edge. A non-positive blur
    /// disarms it.
    pub fn set_glow(&mut self, color: Hsla, blur: f64) {
        if blur > 0.0 {
            self.glow = Some(Glow {
                color: Rgba::from(color),
                blur,
            });
        } else {
            self.glow = None;
        }
    }

    pub fn clear_glow(&mut self) {
        self.glow = None;
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        self.pixels[y * self.width + x]
    }

    #[inline]
    fn blend(&mut self, idx: usize, src: Rgba) {
        let dst = self.pixels[idx];
        self.pixels[idx] = match self.composite {
            CompositeMode::SourceOver => src.over(dst),
            CompositeMode::Lighter => src.plus(dst),
        };
    }

    /// Paint a filled circle under the current composite mode.
    ///
    /// With glow armed, the halo goes down first (the blurred silhouette of
    /// the disc, tinted with the glow color and weighted by the fill alpha),
    /// then the disc itself with a half-pixel soft edge. The center may lie
    /// outside the surface; the visible part is painted.
    pub fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Hsla) {
        let fill = Rgba::from(color);
        let glow = self.glow;
        let blur = glow.map_or(0.0, |g| g.blur);

        let reach = radius + blur + 1.0;
        let x0 = (cx - reach).floor().max(0.0) as usize;
        let y0 = (cy - reach).floor().max(0.0) as usize;
        let x1 = ((cx + reach).ceil().max(0.0) as usize).min(self.width);
        let y1 = ((cy + reach).ceil().max(0.0) as usize).min(self.height);

        let halo_alpha = color.a.clamp(0.0, 1.0);

        for py in y0..y1 {
            for px in x0..x1 {
                let dx = px as f64 + 0.5 - cx;
                let dy = py as f64 + 0.5 - cy;
                let dist = (dx * dx + dy * dy).sqrt();
                let idx = py * self.width + px;

                if let Some(g) = glow {
                    // Blurred disc silhouette: full inside, fading to zero
                    // at radius + blur.
                    let mask = 1.0 - smoothstep(radius - g.blur, radius + g.blur, dist);
                    if mask > 0.0 {
                        self.blend(idx, g.color.scaled((mask * halo_alpha) as f32));
                    }
                }

                let coverage = (radius + 0.5 - dist).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(idx, fill.scaled(coverage as f32));
                }
            }
        }
    }

    /// Blit `image` at the origin under the current composite mode. Both
    /// surfaces are expected to have identical dimensions.
    pub fn draw_image(&mut self, image: &Surface) {
        debug_assert_eq!((self.width, self.height), (image.width, image.height));
        match self.composite {
            CompositeMode::SourceOver => {
                for (dst, src) in self.pixels.iter_mut().zip(&image.pixels) {
                    *dst = src.over(*dst);
                }
            }
            CompositeMode::Lighter => {
                for (dst, src) in self.pixels.iter_mut().zip(&image.pixels) {
                    *dst = src.plus(*dst);
                }
            }
        }
    }

    /// Brightness multiplier applied to the displayed channels
    /// (1.0 = no change). Alpha is left alone; presentation is over black.
    pub fn apply_gain(&mut self, gain: f64) {
        if (gain - 1.0).abs() < 1e-10 {
            return;
        }
        let g = gain.max(0.0) as f32;
        for p in &mut self.pixels {
            p.r = (p.r * g).clamp(0.0, 1.0);
            p.g = (p.g * g).clamp(0.0, 1.0);
            p.b = (p.b * g).clamp(0.0, 1.0);
        }
    }
}

fn smoothstep(a: f64, b: f64, x: f64) -> f64 {
    if x <= a {
        return 0.0;
    }
    if x >= b {
        return 1.0;
    }
    let t = (x - a) / (b - a);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn test_new_surface_is_transparent() {
        let s = Surface::new(4, 3);
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(s.pixel(x, y), Rgba::default());
            }
        }
    }

    #[test]
    fn test_clear_resets_pixels_but_not_paint_state() {
        let mut s = Surface::new(2, 2);
        s.set_composite(CompositeMode::Lighter);
        s.fill_circle(1.0, 1.0, 2.0, Hsla::new(0.0, 0.0, 100.0, 1.0));
        assert!(s.pixel(1, 1).a > 0.0);

        s.clear();
        assert_eq!(s.pixel(1, 1), Rgba::default());
        assert_eq!(s.composite(), CompositeMode::Lighter);
    }

    #[test]
    fn test_source_over_opaque_replaces() {
        let mut s = Surface::new(3, 3);
        s.fill_circle(1.5, 1.5, 5.0, Hsla::new(0.0, 100.0, 50.0, 1.0));
        s.fill_circle(1.5, 1.5, 5.0, Hsla::new(0.0, 0.0, 100.0, 1.0));
        let p = s.pixel(1, 1);
        assert!(close(p.r, 1.0) && close(p.g, 1.0) && close(p.b, 1.0));
        assert!(close(p.a, 1.0));
    }

    #[test]
    fn test_source_over_translucent_blends() {
        let mut s = Surface::new(1, 1);
        // Opaque red, then 50% white over it: channels meet in the middle.
        s.fill_circle(0.5, 0.5, 2.0, Hsla::new(0.0, 100.0, 50.0, 1.0));
        s.fill_circle(0.5, 0.5, 2.0, Hsla::new(0.0, 0.0, 100.0, 0.5));
        let p = s.pixel(0, 0);
        assert!(close(p.r, 1.0));
        assert!(close(p.g, 0.5));
        assert!(close(p.b, 0.5));
        assert!(close(p.a, 1.0));
    }

    #[test]
    fn test_lighter_accumulates_and_clamps() {
        let mut s = Surface::new(1, 1);
        s.set_composite(CompositeMode::Lighter);
        let white = Hsla::new(0.0, 0.0, 100.0, 0.6);
        s.fill_circle(0.5, 0.5, 2.0, white);
        let first = s.pixel(0, 0);
        assert!(close(first.r, 0.6));

        s.fill_circle(0.5, 0.5, 2.0, white);
        let second = s.pixel(0, 0);
        assert!(close(second.r, 1.0), "additive blend must clamp at 1");
    }

    #[test]
    fn test_lighter_opaque_black_adds_no_light() {
        // The backdrop paints opaque black discs whose halos carry the
        // light; the disc itself must not brighten anything.
        let mut s = Surface::new(1, 1);
        s.set_composite(CompositeMode::Lighter);
        s.fill_circle(0.5, 0.5, 2.0, Hsla::new(120.0, 50.0, 40.0, 0.3));
        let before = s.pixel(0, 0);
        s.fill_circle(0.5, 0.5, 2.0, Hsla::new(0.0, 0.0, 0.0, 1.0));
        let after = s.pixel(0, 0);
        assert!(close(before.r, after.r));
        assert!(close(before.g, after.g));
        assert!(close(before.b, after.b));
        assert!(after.a > before.a);
    }

    #[test]
    fn test_fill_circle_hits_center_misses_far_pixels() {
        let mut s = Surface::new(20, 20);
        s.fill_circle(10.0, 10.0, 3.0, Hsla::new(0.0, 0.0, 100.0, 1.0));
        assert!(s.pixel(10, 10).a > 0.9);
        assert_eq!(s.pixel(0, 0), Rgba::default());
        assert_eq!(s.pixel(15, 10), Rgba::default());
    }

    #[test]
    fn test_fill_circle_edge_is_partial() {
        let mut s = Surface::new(20, 20);
        s.fill_circle(10.5, 10.5, 3.0, Hsla::new(0.0, 0.0, 100.0, 1.0));
        // Pixel center at distance 3.0 gets coverage 0.5.
        let edge = s.pixel(13, 10);
        assert!(edge.a > 0.2 && edge.a < 0.8);
    }

    #[test]
    fn test_fill_circle_off_surface_center_paints_visible_part() {
        let mut s = Surface::new(10, 10);
        s.fill_circle(-2.0, 5.0, 4.0, Hsla::new(0.0, 0.0, 100.0, 1.0));
        assert!(s.pixel(0, 5).a > 0.9);
        assert_eq!(s.pixel(9, 5), Rgba::default());
    }

    #[test]
    fn test_glow_reaches_past_disc_edge() {
        let mut s = Surface::new(40, 40);
        s.set_composite(CompositeMode::Lighter);
        s.set_glow(Hsla::new(0.0, 0.0, 100.0, 1.0), 10.0);
        s.fill_circle(20.0, 20.0, 3.0, Hsla::new(0.0, 0.0, 100.0, 1.0));
        // Well outside the disc but inside the blur reach.
        let halo = s.pixel(28, 20);
        assert!(halo.a > 0.0, "halo must extend beyond the disc");
        // Outside radius + blur there is nothing.
        assert_eq!(s.pixel(35, 20), Rgba::default());
    }

    #[test]
    fn test_no_glow_means_no_halo() {
        let mut s = Surface::new(40, 40);
        s.fill_circle(20.0, 20.0, 3.0, Hsla::new(0.0, 0.0, 100.0, 1.0));
        assert_eq!(s.pixel(28, 20), Rgba::default());
    }

    #[test]
    fn test_glow_weighted_by_fill_alpha() {
        let mut s = Surface::new(40, 40);
        s.set_composite(CompositeMode::Lighter);
        s.set_glow(Hsla::new(0.0, 0.0, 100.0, 1.0), 10.0);

        s.fill_circle(10.0, 20.0, 3.0, Hsla::new(0.0, 0.0, 100.0, 0.1));
        s.fill_circle(30.0, 20.0, 3.0, Hsla::new(0.0, 0.0, 100.0, 1.0));

        let faint = s.pixel(15, 20).a;
        let strong = s.pixel(35, 20).a;
        assert!(faint > 0.0);
        assert!(strong > faint * 5.0);
    }

    #[test]
    fn test_set_glow_with_zero_blur_disarms() {
        let mut s = Surface::new(40, 40);
        s.set_glow(Hsla::new(0.0, 0.0, 100.0, 1.0), 0.0);
        s.fill_circle(20.0, 20.0, 3.0, Hsla::new(0.0, 0.0, 100.0, 1.0));
        assert_eq!(s.pixel(28, 20), Rgba::default());
    }

    #[test]
    fn test_draw_image_source_over_copies_onto_cleared() {
        let mut src = Surface::new(8, 8);
        src.fill_circle(4.0, 4.0, 2.0, Hsla::new(200.0, 80.0, 50.0, 0.7));

        let mut dst = Surface::new(8, 8);
        dst.draw_image(&src);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(dst.pixel(x, y), src.pixel(x, y));
            }
        }
    }

    #[test]
    fn test_draw_image_lighter_adds() {
        let mut src = Surface::new(4, 4);
        src.fill_circle(2.0, 2.0, 4.0, Hsla::new(0.0, 0.0, 100.0, 0.4));

        let mut dst = Surface::new(4, 4);
        dst.fill_circle(2.0, 2.0, 4.0, Hsla::new(0.0, 0.0, 100.0, 0.4));
        dst.set_composite(CompositeMode::Lighter);
        dst.draw_image(&src);
        assert!(close(dst.pixel(2, 2).r, 0.8));
    }

    #[test]
    fn test_hsla_white_and_black() {
        let (r, g, b) = Hsla::new(0.0, 0.0, 100.0, 1.0).rgb();
        assert!(close(r, 1.0) && close(g, 1.0) && close(b, 1.0));
        let (r, g, b) = Hsla::new(123.0, 45.0, 0.0, 1.0).rgb();
        assert!(close(r, 0.0) && close(g, 0.0) && close(b, 0.0));
    }

    #[test]
    fn test_hsla_primaries() {
        let (r, g, b) = Hsla::new(0.0, 100.0, 50.0, 1.0).rgb();
        assert!(close(r, 1.0) && close(g, 0.0) && close(b, 0.0));
        let (r, g, b) = Hsla::new(120.0, 100.0, 50.0, 1.0).rgb();
        assert!(close(r, 0.0) && close(g, 1.0) && close(b, 0.0));
        let (r, g, b) = Hsla::new(240.0, 100.0, 50.0, 1.0).rgb();
        assert!(close(r, 0.0) && close(g, 0.0) && close(b, 1.0));
    }

    #[test]
    fn test_hsla_hue_wraps() {
        let a = Hsla::new(30.0, 60.0, 40.0, 1.0).rgb();
        let b = Hsla::new(390.0, 60.0, 40.0, 1.0).rgb();
        let c = Hsla::new(-330.0, 60.0, 40.0, 1.0).rgb();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_premultiply_from_hsla() {
        let p = Rgba::from(Hsla::new(0.0, 0.0, 100.0, 0.25));
        assert!(close(p.r, 0.25) && close(p.g, 0.25) && close(p.b, 0.25));
        assert!(close(p.a, 0.25));
    }

    #[test]
    fn test_apply_gain_scales_and_clamps() {
        let mut s = Surface::new(1, 1);
        s.fill_circle(0.5, 0.5, 2.0, Hsla::new(0.0, 0.0, 100.0, 0.4));
        s.apply_gain(2.0);
        let p = s.pixel(0, 0);
        assert!(close(p.r, 0.8));
        assert!(close(p.a, 0.4), "gain must not touch alpha");

        s.apply_gain(10.0);
        assert!(close(s.pixel(0, 0).r, 1.0));
    }

    #[test]
    fn test_rgb8_reads_premultiplied_channels() {
        let mut s = Surface::new(1, 1);
        s.fill_circle(0.5, 0.5, 2.0, Hsla::new(0.0, 0.0, 100.0, 0.5));
        let (r, g, b) = s.pixel(0, 0).rgb8();
        assert_eq!((r, g, b), (127, 127, 127));
    }
}
