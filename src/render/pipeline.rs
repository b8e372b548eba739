//! Frame-driven render pipeline
//!
//! One call per display frame: derive the behavior profile from presence
//! state, advance the particle pools, and composite weather, ambient and
//! face layers back-to-front. The pipeline only reads the latest snapshot
//! values handed to it; it never awaits anything.

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::atmosphere::WeatherLayer;
use super::canvas::Canvas;
use super::color::Color;
use super::face::FaceLayer;
use super::particles::{BehaviorProfile, ParticlePool};
use crate::config::{FaceOptions, ThemeConfig};
use crate::errors::Result;
use crate::gateway::PresenceState;
use crate::mood::Mood;
use crate::weather::WeatherSample;

/// Everything a frame needs, sampled once by the caller
#[derive(Debug, Clone)]
pub struct FrameInput {
    /// Elapsed time since pipeline start, in milliseconds
    pub t_ms: f64,
    pub state: PresenceState,
    pub mood: Mood,
    /// Pre-capped pupil offset from the pointer tracker
    pub eye_offset: (f64, f64),
    /// Latest weather sample; `None` renders no underlay
    pub weather: Option<WeatherSample>,
}

/// The full compositor owning every visual layer
pub struct RenderPipeline {
    face: FaceLayer,
    particles: ParticlePool,
    weather: WeatherLayer,
    rng: StdRng,
    particle_scale: f64,
    primary: Color,

    weather_canvas: Canvas,
    ambient_canvas: Canvas,
    face_canvas: Canvas,
    frame: Canvas,
}

impl RenderPipeline {
    /// Build the pipeline. A `seed` makes particle phases, shake jitter and
    /// thunderstorm flashes reproducible frame-for-frame.
    pub fn new(theme: &ThemeConfig, options: &FaceOptions, seed: Option<u64>) -> Result<Self> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            face: FaceLayer::new(theme)?,
            particles: ParticlePool::new(),
            weather: WeatherLayer::new(),
            rng,
            particle_scale: options.particle_scale,
            primary: Color::from_hex_str(&theme.primary)?,
            weather_canvas: Canvas::new(0, 0),
            ambient_canvas: Canvas::new(0, 0),
            face_canvas: Canvas::new(0, 0),
            frame: Canvas::new(0, 0),
        })
    }

    /// Render one frame at the given surface size and return the composed
    /// canvas
    pub fn render(&mut self, input: &FrameInput, width: u32, height: u32) -> &Canvas {
        self.ensure_size(width, height);

        self.weather_canvas.clear();
        self.ambient_canvas.clear();
        self.face_canvas.clear();
        self.frame.clear();

        if width == 0 || height == 0 {
            return &self.frame;
        }

        // Weather underlay, independent of connection state
        if let Some(sample) = &input.weather {
            self.weather
                .advance(input.t_ms, sample, width, height, &mut self.rng);
            self.weather.draw(&mut self.weather_canvas);
        }

        // Ambient particles follow the presence state
        let profile = BehaviorProfile::for_state(input.state);
        let particle_color = self.particle_color(input.state);
        self.particles.advance(
            input.t_ms,
            profile,
            self.particle_scale,
            width,
            height,
            &mut self.rng,
        );
        self.particles.draw(&mut self.ambient_canvas, particle_color);

        self.face.draw(
            &mut self.face_canvas,
            input.state,
            input.mood,
            input.eye_offset,
            input.t_ms,
        );

        // Back-to-front composite
        self.frame.composite_over(&self.weather_canvas);
        self.frame.composite_over(&self.ambient_canvas);
        self.frame.composite_over(&self.face_canvas);
        &self.frame
    }

    fn particle_color(&self, state: PresenceState) -> Color {
        if state == PresenceState::Error {
            Color::from_rgb8(239, 68, 68)
        } else {
            self.primary
        }
    }

    fn ensure_size(&mut self, width: u32, height: u32) {
        if self.frame.width != width || self.frame.height != height {
            self.weather_canvas = Canvas::new(width, height);
            self.ambient_canvas = Canvas::new(width, height);
            self.face_canvas = Canvas::new(width, height);
            self.frame = Canvas::new(width, height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::WeatherCondition;

    fn pipeline() -> RenderPipeline {
        RenderPipeline::new(&ThemeConfig::default(), &FaceOptions::default(), Some(11)).unwrap()
    }

    fn input(state: PresenceState) -> FrameInput {
        FrameInput {
            t_ms: 1000.0,
            state,
            mood: Mood::Neutral,
            eye_offset: (0.0, 0.0),
            weather: Some(WeatherSample {
                condition: WeatherCondition::Clear,
                is_day: true,
                temperature: None,
                fetched_at_ms: 0,
            }),
        }
    }

    #[test]
    fn test_render_produces_pixels() {
        let mut pipeline = pipeline();
        let frame = pipeline.render(&input(PresenceState::Idle), 100, 100);
        assert_eq!(frame.width, 100);
        assert!(frame.pixels().iter().any(|p| p.a > 0.05));
    }

    #[test]
    fn test_zero_surface_renders_nothing() {
        let mut pipeline = pipeline();
        let frame = pipeline.render(&input(PresenceState::Idle), 0, 0);
        assert_eq!(frame.pixels().len(), 0);
    }

    #[test]
    fn test_no_weather_sample_skips_underlay() {
        let mut pipeline = pipeline();
        let mut no_weather = input(PresenceState::Idle);
        no_weather.weather = None;
        pipeline.render(&no_weather, 60, 60);
        assert!(pipeline
            .weather_canvas
            .pixels()
            .iter()
            .all(|p| p.a == 0.0));
    }

    #[test]
    fn test_state_switch_reseeds_pool() {
        let mut pipeline = pipeline();
        pipeline.render(&input(PresenceState::Idle), 80, 80);
        assert_eq!(pipeline.particles.profile(), BehaviorProfile::Float);
        assert_eq!(pipeline.particles.len(), 30);

        pipeline.render(&input(PresenceState::Speaking), 80, 80);
        assert_eq!(pipeline.particles.profile(), BehaviorProfile::Burst);
        assert_eq!(pipeline.particles.len(), 60);
    }

    #[test]
    fn test_resize_recreates_surfaces() {
        let mut pipeline = pipeline();
        pipeline.render(&input(PresenceState::Idle), 80, 80);
        let frame = pipeline.render(&input(PresenceState::Idle), 40, 20);
        assert_eq!((frame.width, frame.height), (40, 20));
    }
}
