//! Ambient particle field
//!
//! One bounded pool of animated points whose motion strategy is bound to
//! the presence state. Motion is a closed-form function of elapsed time and
//! per-particle random phase (shake being the deliberate exception), so a
//! frame can be computed for any timestamp without history.

use std::f64::consts::TAU;

use rand::Rng;

use super::canvas::Canvas;
use super::color::Color;
use super::shapes::{Circle, Point};
use crate::gateway::PresenceState;

/// Named particle-motion strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BehaviorProfile {
    /// Gentle drift around a home position
    #[default]
    Float,
    /// Swirling vortex around the face center
    Orbit,
    /// Synchronized outward pulsing
    Burst,
    /// Jittery warning shake
    Shake,
}

impl BehaviorProfile {
    /// The profile the face shows for a given presence state
    pub fn for_state(state: PresenceState) -> Self {
        match state {
            PresenceState::Thinking => Self::Orbit,
            PresenceState::Speaking => Self::Burst,
            PresenceState::Error => Self::Shake,
            _ => Self::Float,
        }
    }

    pub fn tuning(self) -> &'static ProfileTuning {
        match self {
            Self::Float => &FLOAT_TUNING,
            Self::Orbit => &ORBIT_TUNING,
            Self::Burst => &BURST_TUNING,
            Self::Shake => &SHAKE_TUNING,
        }
    }
}

/// Per-profile population and appearance ranges
#[derive(Debug, Clone)]
pub struct ProfileTuning {
    pub count: usize,
    pub speed: f64,
    pub size_min: f64,
    pub size_max: f64,
    pub opacity_min: f64,
    pub opacity_max: f64,
}

const FLOAT_TUNING: ProfileTuning = ProfileTuning {
    count: 30,
    speed: 0.3,
    size_min: 2.0,
    size_max: 4.0,
    opacity_min: 0.2,
    opacity_max: 0.5,
};

const ORBIT_TUNING: ProfileTuning = ProfileTuning {
    count: 50,
    speed: 1.5,
    size_min: 2.0,
    size_max: 5.0,
    opacity_min: 0.3,
    opacity_max: 0.7,
};

const BURST_TUNING: ProfileTuning = ProfileTuning {
    count: 60,
    speed: 2.5,
    size_min: 3.0,
    size_max: 6.0,
    opacity_min: 0.4,
    opacity_max: 0.8,
};

const SHAKE_TUNING: ProfileTuning = ProfileTuning {
    count: 40,
    speed: 1.0,
    size_min: 2.0,
    size_max: 4.0,
    opacity_min: 0.3,
    opacity_max: 0.6,
};

/// One animated point. Lifetime is bound to the pool; pools reseed
/// wholesale on profile or count changes, never migrate.
#[derive(Debug, Clone)]
pub struct Particle {
    pos: Point,
    base: Point,
    /// Radial direction assigned at seed time (burst rays)
    angle: f64,
    /// Accumulated vortex angle (orbit)
    orbit_angle: f64,
    size: f64,
    opacity: f64,
    speed_multiplier: f64,
    phase_offset: f64,
    pulse_phase: f64,
}

impl Particle {
    /// Seed in a ring around the surface center
    fn seed<R: Rng>(rng: &mut R, width: f64, height: f64, tuning: &ProfileTuning) -> Self {
        let center_x = width / 2.0;
        let center_y = height / 2.0;
        let ring_radius = width.min(height) * 0.4;

        let angle = rng.random_range(0.0..TAU);
        let distance = ring_radius * (0.8 + rng.random_range(0.0..0.4));
        let pos = Point::new(
            center_x + angle.cos() * distance,
            center_y + angle.sin() * distance,
        );

        Self {
            pos,
            base: pos,
            angle,
            orbit_angle: angle,
            size: rng.random_range(tuning.size_min..=tuning.size_max),
            opacity: rng.random_range(tuning.opacity_min..=tuning.opacity_max),
            speed_multiplier: 0.5 + rng.random_range(0.0..1.0),
            phase_offset: rng.random_range(0.0..TAU),
            pulse_phase: rng.random_range(0.0..TAU),
        }
    }

    /// Advance to elapsed time `t_ms`. Float, orbit and burst are closed
    /// forms of time and phase; shake alone re-rolls every frame.
    fn update<R: Rng>(
        &mut self,
        t_ms: f64,
        profile: BehaviorProfile,
        tuning: &ProfileTuning,
        width: f64,
        height: f64,
        rng: &mut R,
    ) {
        let center_x = width / 2.0;
        let center_y = height / 2.0;
        let speed = tuning.speed * self.speed_multiplier;

        match profile {
            BehaviorProfile::Float => {
                self.pos.x = self.base.x + (t_ms * 0.001 + self.phase_offset).sin() * 20.0;
                self.pos.y = self.base.y + (t_ms * 0.0008 + self.phase_offset).cos() * 15.0;
                self.opacity = tuning.opacity_min + (t_ms * 0.002 + self.pulse_phase).sin() * 0.1;
            }
            BehaviorProfile::Orbit => {
                self.orbit_angle += speed * 0.02;
                let radius = width.min(height)
                    * 0.35
                    * (0.8 + (t_ms * 0.001 + self.phase_offset).sin() * 0.2);
                self.pos.x = center_x + self.orbit_angle.cos() * radius;
                self.pos.y = center_y + self.orbit_angle.sin() * radius;
                self.opacity = tuning.opacity_min + self.orbit_angle.sin().abs() * 0.3;
            }
            BehaviorProfile::Burst => {
                let pulse = (t_ms * 0.003 + self.phase_offset) % TAU;
                let radius = width.min(height) * 0.3 * (0.5 + pulse.sin() * 0.5);
                self.pos.x =
                    center_x + self.angle.cos() * radius * (1.0 + (t_ms * 0.005).sin() * 0.2);
                self.pos.y =
                    center_y + self.angle.sin() * radius * (1.0 + (t_ms * 0.005).cos() * 0.2);
                // Opacity and size pulse in sync on the same phase
                self.opacity = tuning.opacity_max * (0.5 + pulse.sin() * 0.5);
                self.size = tuning.size_min + (tuning.size_max - tuning.size_min) * pulse.sin();
            }
            BehaviorProfile::Shake => {
                let intensity = 5.0;
                self.pos.x = self.base.x + (rng.random_range(0.0..1.0) - 0.5) * intensity;
                self.pos.y = self.base.y + (rng.random_range(0.0..1.0) - 0.5) * intensity;
                self.opacity = tuning.opacity_min
                    + rng.random_range(0.0..1.0) * (tuning.opacity_max - tuning.opacity_min);
            }
        }
    }
}

/// Bounded, reseedable particle pool driving the ambient layer
#[derive(Debug, Default)]
pub struct ParticlePool {
    profile: BehaviorProfile,
    particles: Vec<Particle>,
    width: u32,
    height: u32,
}

impl ParticlePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(&self) -> BehaviorProfile {
        self.profile
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Advance one frame: reseed lazily when the governing profile, the
    /// target population or the surface changed, then update every
    /// particle in place.
    pub fn advance<R: Rng>(
        &mut self,
        t_ms: f64,
        profile: BehaviorProfile,
        count_scale: f64,
        width: u32,
        height: u32,
        rng: &mut R,
    ) {
        let tuning = profile.tuning();
        let target = scaled_count(tuning.count, count_scale);

        let needs_reseed = profile != self.profile
            || target != self.particles.len()
            || width != self.width
            || height != self.height;

        if needs_reseed {
            self.profile = profile;
            self.width = width;
            self.height = height;
            self.particles = (0..target)
                .map(|_| Particle::seed(rng, f64::from(width), f64::from(height), tuning))
                .collect();
        }

        for particle in &mut self.particles {
            particle.update(
                t_ms,
                profile,
                tuning,
                f64::from(width),
                f64::from(height),
                rng,
            );
        }
    }

    /// Draw every particle plus its soft glow copy
    pub fn draw(&self, canvas: &mut Canvas, color: Color) {
        for particle in &self.particles {
            let radius = particle.size.max(0.0);
            let opacity = particle.opacity.clamp(0.0, 1.0) as f32;
            if radius <= 0.0 || opacity <= 0.0 {
                continue;
            }
            canvas.draw(&Circle::new(particle.pos, radius, color.with_alpha(opacity)).filled());
            canvas.draw(
                &Circle::new(particle.pos, radius * 2.0, color.with_alpha(opacity * 0.3)).filled(),
            );
        }
    }
}

fn scaled_count(base: usize, scale: f64) -> usize {
    if scale <= 0.0 {
        return 0;
    }
    (base as f64 * scale).round() as usize
}
