use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

use crate::animations::backdrop::render_backdrop;
use crate::animations::AnimatedObject;
use crate::random::Randomness;
use crate::render::{CompositeMode, Hsla, Surface};

/// Resting alpha of a sprite fill.
const BASE_LINE_ALPHA: f64 = 0.075;
/// Amplitude of the flicker oscillation around the base line.
const FLICKER_RANGE: f64 = 0.05;
/// Radians of flicker phase per millisecond of sprite clock.
const FLICKER_RATE: f64 = 0.0015;
/// Glow radius applied to every sprite, in pixels.
const SPRITE_GLOW_BLUR: f64 = 15.0;

/// Fill alpha for a sprite at clock `tick`, in [0.025, 0.125].
fn flicker_alpha(tick: f64) -> f64 {
    BASE_LINE_ALPHA + (tick * FLICKER_RATE).cos() * FLICKER_RANGE
}

/// One drifting glow circle.
struct CircleSprite {
    radius: f64,
    x: f64,
    y: f64,
    /// Heading in radians.
    angle: f64,
    /// Pixels per millisecond along the heading.
    speed: f64,
    /// Private clock in milliseconds, drives the flicker phase.
    tick: f64,
}

impl CircleSprite {
    /// Advance kinematics by `delta_ms` and wrap around the world edges.
    fn update(
        &mut self,
        delta_ms: f64,
        world_width: f64,
        world_height: f64,
        rng: &mut dyn Randomness,
    ) {
        self.x += self.angle.cos() * self.speed * delta_ms;
        self.y += self.angle.sin() * self.speed * delta_ms;
        self.angle += rng.range(-0.05, 0.05);

        // Four independent edge checks. A sprite leaving one edge re-enters
        // just outside the opposite edge, so it drifts back into view
        // instead of popping. Not a modulo: each axis resets to a fixed
        // off-screen line regardless of how far the sprite overshot.
        if self.x - self.radius > world_width {
            self.x = -self.radius;
        }
        if self.x + self.radius < 0.0 {
            self.x = world_width + self.radius;
        }
        if self.y - self.radius > world_height {
            self.y = -self.radius;
        }
        if self.y + self.radius < 0.0 {
            self.y = world_height + self.radius;
        }

        self.tick += delta_ms;
    }

    fn draw(&self, surface: &mut Surface) {
        let alpha = flicker_alpha(self.tick);
        surface.fill_circle(self.x, self.y, self.radius, Hsla::new(0.0, 0.0, 100.0, alpha));
    }
}

/// Drifting glow circles over a cached nebula backdrop.
///
/// The backdrop is rendered into the lent background surface on the first
/// update and blitted onto the canvas every frame after a clear. Sprites
/// are then drawn additively with a white glow, each updated immediately
/// before it is drawn so a frame never mixes stale and fresh positions.
pub struct CircleField {
    base_hue: f64,
    background: Rc<RefCell<Surface>>,
    backdrop_drawn: bool,
    canvas: Rc<RefCell<Surface>>,
    sprites: Vec<CircleSprite>,
    world_width: f64,
    world_height: f64,
    rng: Box<dyn Randomness>,
}

impl CircleField {
    pub fn new(
        base_hue: f64,
        background: Rc<RefCell<Surface>>,
        canvas: Rc<RefCell<Surface>>,
        mut rng: Box<dyn Randomness>,
    ) -> Self {
        let (world_width, world_height) = {
            let canvas = canvas.borrow();
            let background = background.borrow();
            debug_assert_eq!(canvas.width(), background.width());
            debug_assert_eq!(canvas.height(), background.height());
            (canvas.width() as f64, canvas.height() as f64)
        };

        let size_base = world_width + world_height;
        let count = (size_base * 0.03).floor() as usize;
        let mut sprites = Vec::with_capacity(count);
        for _ in 0..count {
            sprites.push(CircleSprite {
                radius: rng.range(1.0, size_base * 0.03),
                x: rng.range(0.0, world_width),
                y: rng.range(0.0, world_height),
                angle: rng.range(0.0, TAU),
                speed: rng.range(0.01, 0.03),
                tick: rng.range(0.0, 10_000.0),
            });
        }

        Self {
            base_hue,
            background,
            backdrop_drawn: false,
            canvas,
            sprites,
            world_width,
            world_height,
            rng,
        }
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }
}

impl AnimatedObject for CircleField {
    fn update(&mut self, delta_ms: f64) {
        if !self.backdrop_drawn {
            render_backdrop(
                &mut self.background.borrow_mut(),
                self.world_width,
                self.world_height,
                self.base_hue,
                &mut *self.rng,
            );
            self.backdrop_drawn = true;
        }

        let mut canvas = self.canvas.borrow_mut();
        canvas.clear();
        canvas.set_composite(CompositeMode::SourceOver);
        canvas.clear_glow();
        canvas.draw_image(&self.background.borrow());

        canvas.set_composite(CompositeMode::Lighter);
        canvas.set_glow(Hsla::new(0.0, 0.0, 100.0, 1.0), SPRITE_GLOW_BLUR);

        for sprite in &mut self.sprites {
            sprite.update(
                delta_ms,
                self.world_width,
                self.world_height,
                &mut *self.rng,
            );
            sprite.draw(&mut canvas);
        }
    }
}
