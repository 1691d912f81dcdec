use crate::random::Randomness;
use crate::render::{CompositeMode, Hsla, Surface};

/// Paint the static glow-speckled backdrop into `surface`.
///
/// Additive compositing with `floor((width + height) * 0.3)` soft blobs.
/// Each blob is an opaque black disc that contributes no light of its own;
/// the sampled HSLA glow halo around it is the visible artifact. Generated
/// once per animation instance and cached by the caller.
pub fn render_backdrop(
    surface: &mut Surface,
    width: f64,
    height: f64,
    base_hue: f64,
    rng: &mut dyn Randomness,
) {
    let size_base = width + height;
    let count = (size_base * 0.3).floor() as usize;

    surface.clear();
    surface.set_composite(CompositeMode::Lighter);

    for _ in 0..count {
        let radius = rng.range(1.0, size_base * 0.04);
        let blur = rng.range(10.0, size_base * 0.04);
        let x = rng.range(0.0, width);
        let y = rng.range(0.0, height);
        let hue = rng.range(base_hue, base_hue + 100.0);
        let saturation = rng.range(10.0, 70.0);
        let lightness = rng.range(20.0, 50.0);
        let alpha = rng.range(0.1, 0.5);

        surface.set_glow(Hsla::new(hue, saturation, lightness, alpha), blur);
        surface.fill_circle(x, y, radius, Hsla::new(0.0, 0.0, 0.0, 1.0));
    }
}
