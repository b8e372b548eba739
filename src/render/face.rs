//! Face geometry
//!
//! Rings, angular eyes with pointer-driven pupils, a state-dependent mouth
//! and the mood halo. Everything is drawn relative to the surface center so
//! the face scales with the terminal.

use super::canvas::Canvas;
use super::color::Color;
use super::shapes::{Circle, Line, Point, Quad};
use crate::config::ThemeConfig;
use crate::errors::Result;
use crate::gateway::PresenceState;
use crate::mood::Mood;

/// Halo color for a mood: green for happy, red for angry, amber otherwise
pub fn mood_color(mood: Mood) -> Color {
    match mood {
        Mood::Happy => Color::from_rgb8(34, 197, 94),
        Mood::Angry => Color::from_rgb8(239, 68, 68),
        Mood::Neutral => Color::from_rgb8(251, 191, 36),
    }
}

/// The face layer of the render pipeline
pub struct FaceLayer {
    primary: Color,
    accent: Color,
}

impl FaceLayer {
    pub fn new(theme: &ThemeConfig) -> Result<Self> {
        Ok(Self {
            primary: Color::from_hex_str(&theme.primary)?,
            accent: Color::from_hex_str(&theme.accent)?,
        })
    }

    /// Face tint for a state: red in error, dim slate while unreachable,
    /// theme primary otherwise
    fn face_color(&self, state: PresenceState) -> (Color, f32) {
        match state {
            PresenceState::Error => (Color::from_rgb8(239, 68, 68), 1.0),
            PresenceState::Disconnected | PresenceState::Connecting => {
                (Color::from_rgb8(100, 116, 139), 0.3)
            }
            _ => (self.primary, 1.0),
        }
    }

    pub fn draw(
        &self,
        canvas: &mut Canvas,
        state: PresenceState,
        mood: Mood,
        eye_offset: (f64, f64),
        t_ms: f64,
    ) {
        let w = f64::from(canvas.width);
        let h = f64::from(canvas.height);
        let cx = w / 2.0;
        let cy = h / 2.0;
        let r = w.min(h) * 0.45;
        if r < 4.0 {
            return;
        }

        let (color, dim) = self.face_color(state);

        // Glow breathes wider while the agent is active
        let glow_radius = match state {
            PresenceState::Speaking => r * 1.4,
            PresenceState::Thinking => r * 1.25,
            _ => r * 1.1,
        };
        canvas.radial_wash(
            cx,
            cy,
            glow_radius,
            color.with_alpha(0.18 * dim),
            Color::TRANSPARENT,
        );

        // Mood halo, purely additive decoration
        canvas.draw(&Circle::new(
            Point::new(cx, cy),
            r * 1.04,
            mood_color(mood).with_alpha(0.25),
        ));

        // Outer ring and dashed inner ring
        canvas.draw(&Circle::new(
            Point::new(cx, cy),
            r,
            color.with_alpha(0.8 * dim),
        ));
        self.draw_dashed_ring(canvas, cx, cy, r * 0.83, color.with_alpha(0.3 * dim));

        // Eyes
        let eye_dx = r * 0.33;
        let eye_y = cy - r * 0.2;
        for side in [-1.0, 1.0] {
            self.draw_eye(
                canvas,
                Point::new(cx + side * eye_dx, eye_y),
                r,
                color.with_alpha(dim),
                eye_offset,
                state,
            );
        }

        // Mouth
        match state {
            PresenceState::Speaking => self.draw_speaking_bars(canvas, cx, cy, r, color, t_ms),
            PresenceState::Thinking => self.draw_thinking_dots(canvas, cx, cy, r, color, t_ms),
            _ => self.draw_smile(canvas, cx, cy, r, color.with_alpha(0.8 * dim)),
        }
    }

    fn draw_eye(
        &self,
        canvas: &mut Canvas,
        center: Point,
        r: f64,
        color: Color,
        eye_offset: (f64, f64),
        state: PresenceState,
    ) {
        let half_w = r * 0.16;
        let half_h = r * 0.11;
        canvas.draw(&Quad::new(
            [
                Point::new(center.x - half_w, center.y),
                Point::new(center.x, center.y - half_h),
                Point::new(center.x + half_w, center.y),
                Point::new(center.x, center.y + half_h),
            ],
            color,
        ));

        // Pupil glows in the accent color and follows the pointer; the
        // offset arrives pre-capped from the tracker
        let pupil = Point::new(center.x + eye_offset.0, center.y + eye_offset.1);
        let pupil_alpha = if state == PresenceState::Speaking { 1.0 } else { 0.85 };
        canvas.draw(
            &Circle::new(pupil, r * 0.045, self.accent.with_alpha(pupil_alpha)).filled(),
        );
    }

    fn draw_dashed_ring(&self, canvas: &mut Canvas, cx: f64, cy: f64, radius: f64, color: Color) {
        // 24 short arcs approximated by chords
        let segments = 24;
        for i in 0..segments {
            if i % 2 == 1 {
                continue;
            }
            let a0 = f64::from(i) / f64::from(segments) * std::f64::consts::TAU;
            let a1 = f64::from(i + 1) / f64::from(segments) * std::f64::consts::TAU;
            canvas.draw(&Line::new(
                Point::new(cx + a0.cos() * radius, cy + a0.sin() * radius),
                Point::new(cx + a1.cos() * radius, cy + a1.sin() * radius),
                color,
            ));
        }
    }

    fn draw_speaking_bars(
        &self,
        canvas: &mut Canvas,
        cx: f64,
        cy: f64,
        r: f64,
        color: Color,
        t_ms: f64,
    ) {
        let base_y = cy + r * 0.45;
        for (i, offset) in [-0.3, -0.15, 0.0, 0.15, 0.3].iter().enumerate() {
            let sway = (t_ms * 0.012 + i as f64 * 1.5).sin();
            let half = r * (0.08 + sway.abs() * 0.06);
            let x = cx + offset * r;
            canvas.draw(&Line::new(
                Point::new(x, base_y - half),
                Point::new(x, base_y + half),
                color,
            ));
        }
    }

    fn draw_thinking_dots(
        &self,
        canvas: &mut Canvas,
        cx: f64,
        cy: f64,
        r: f64,
        color: Color,
        t_ms: f64,
    ) {
        let y = cy + r * 0.45;
        for (i, offset) in [-0.14, 0.0, 0.14].iter().enumerate() {
            let pulse = ((t_ms * 0.006 - i as f64 * 1.2).sin() + 1.0) / 2.0;
            let alpha = 0.3 + 0.7 * pulse as f32;
            canvas.draw(
                &Circle::new(
                    Point::new(cx + offset * r, y),
                    r * 0.035,
                    color.with_alpha(color.a * alpha),
                )
                .filled(),
            );
        }
    }

    fn draw_smile(&self, canvas: &mut Canvas, cx: f64, cy: f64, r: f64, color: Color) {
        // Quadratic arc sampled as a polyline
        let start = Point::new(cx - r * 0.22, cy + r * 0.38);
        let end = Point::new(cx + r * 0.22, cy + r * 0.38);
        let control = Point::new(cx, cy + r * 0.55);

        let steps = 16;
        let mut prev = start;
        for i in 1..=steps {
            let t = f64::from(i) / f64::from(steps);
            let inv = 1.0 - t;
            let x = inv * inv * start.x + 2.0 * inv * t * control.x + t * t * end.x;
            let y = inv * inv * start.y + 2.0 * inv * t * control.y + t * t * end.y;
            let next = Point::new(x, y);
            canvas.draw(&Line::new(prev, next, color));
            prev = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> FaceLayer {
        FaceLayer::new(&ThemeConfig::default()).unwrap()
    }

    #[test]
    fn test_mood_colors_are_distinct() {
        let happy = mood_color(Mood::Happy);
        let angry = mood_color(Mood::Angry);
        let neutral = mood_color(Mood::Neutral);
        assert!(happy.distance(&angry) > 0.3);
        assert!(happy.distance(&neutral) > 0.3);
        assert!(angry.distance(&neutral) > 0.3);
    }

    #[test]
    fn test_draw_paints_something_in_every_state() {
        let layer = layer();
        for state in [
            PresenceState::Idle,
            PresenceState::Thinking,
            PresenceState::Speaking,
            PresenceState::Error,
            PresenceState::Disconnected,
        ] {
            let mut canvas = Canvas::new(120, 120);
            layer.draw(&mut canvas, state, Mood::Neutral, (0.0, 0.0), 500.0);
            assert!(
                canvas.pixels().iter().any(|p| p.a > 0.05),
                "nothing drawn for {state:?}"
            );
        }
    }

    #[test]
    fn test_tiny_surface_degrades_to_nothing() {
        let layer = layer();
        let mut canvas = Canvas::new(4, 4);
        layer.draw(&mut canvas, PresenceState::Idle, Mood::Neutral, (0.0, 0.0), 0.0);
        // No panic; nothing meaningful to draw at this size
    }

    #[test]
    fn test_bad_theme_color_is_rejected() {
        let mut theme = ThemeConfig::default();
        theme.primary = "not-a-color".to_string();
        assert!(FaceLayer::new(&theme).is_err());
    }
}
