pub mod backdrop;
pub mod circles;

/// Base hue for the backdrop when nothing else is configured (violet-blue).
/// 190 gives the teal variant; any hue works, the backdrop spans
/// `[base_hue, base_hue + 100]`.
pub const BASE_HUE_DEFAULT: f64 = 250.0;

/// Anything the frame loop can drive.
pub trait AnimatedObject {
    /// Advance the animation by `delta_ms` milliseconds and repaint.
    fn update(&mut self, delta_ms: f64);
}
