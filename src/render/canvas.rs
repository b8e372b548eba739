//! Virtual framebuffer the face layers draw into
//!
//! Float coordinates, RGBA pixels, alpha compositing. Layers are separate
//! canvases composited back-to-front once per frame.

use super::color::Color;
use super::shapes::Shape;

#[derive(Debug, Clone)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pixels: Vec<Color>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        let size = (width * height) as usize;
        Self {
            width,
            height,
            pixels: vec![Color::TRANSPARENT; size],
        }
    }

    /// Clear to fully transparent
    pub fn clear(&mut self) {
        self.pixels.fill(Color::TRANSPARENT);
    }

    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    #[inline]
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) as usize;
            self.pixels[idx] = color.blend_over(&self.pixels[idx]);
        }
    }

    /// Draw a shape onto the canvas
    pub fn draw<S: Shape>(&mut self, shape: &S) {
        shape.rasterize(self.width, self.height, &mut self.pixels);
    }

    /// Blend a uniform color over the whole surface (flash overlays, washes)
    pub fn wash(&mut self, color: Color) {
        if color.a <= 0.0 {
            return;
        }
        for px in &mut self.pixels {
            *px = color.blend_over(px);
        }
    }

    /// Radial wash centered on (cx, cy): `inner` at the center fading to
    /// `outer` at `radius` and beyond
    pub fn radial_wash(&mut self, cx: f64, cy: f64, radius: f64, inner: Color, outer: Color) {
        if radius <= 0.0 {
            return;
        }
        for y in 0..self.height {
            for x in 0..self.width {
                let dx = f64::from(x) - cx;
                let dy = f64::from(y) - cy;
                let t = ((dx * dx + dy * dy).sqrt() / radius).min(1.0) as f32;
                let color = inner.mix(&outer, t);
                if color.a > 0.0 {
                    let idx = (y * self.width + x) as usize;
                    self.pixels[idx] = color.blend_over(&self.pixels[idx]);
                }
            }
        }
    }

    /// Composite another canvas of the same dimensions over this one
    pub fn composite_over(&mut self, layer: &Canvas) {
        debug_assert_eq!(self.width, layer.width);
        debug_assert_eq!(self.height, layer.height);
        for (dst, src) in self.pixels.iter_mut().zip(layer.pixels.iter()) {
            *dst = src.blend_over(dst);
        }
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shapes::{Circle, Point};

    #[test]
    fn test_new_canvas_is_transparent() {
        let canvas = Canvas::new(8, 4);
        assert_eq!(canvas.pixels().len(), 32);
        assert!(canvas.pixels().iter().all(|p| p.a == 0.0));
    }

    #[test]
    fn test_wash_covers_everything() {
        let mut canvas = Canvas::new(4, 4);
        canvas.wash(Color::rgba(1.0, 1.0, 1.0, 0.8));
        assert!(canvas.get_pixel(2, 2).unwrap().a > 0.7);
    }

    #[test]
    fn test_composite_layers() {
        let mut base = Canvas::new(4, 4);
        base.wash(Color::rgb(0.0, 0.0, 1.0));

        let mut top = Canvas::new(4, 4);
        top.draw(&Circle::new(Point::new(1.0, 1.0), 0.8, Color::rgb(1.0, 0.0, 0.0)).filled());

        base.composite_over(&top);
        let hit = base.get_pixel(1, 1).unwrap();
        assert!(hit.r > 0.5);
        // Pixels outside the circle keep the base color
        let miss = base.get_pixel(3, 3).unwrap();
        assert!(miss.b > 0.9);
    }

    #[test]
    fn test_radial_wash_fades_outward() {
        let mut canvas = Canvas::new(9, 9);
        canvas.radial_wash(
            4.0,
            4.0,
            4.0,
            Color::rgba(1.0, 1.0, 1.0, 0.5),
            Color::TRANSPARENT,
        );
        let center = canvas.get_pixel(4, 4).unwrap().a;
        let edge = canvas.get_pixel(8, 4).unwrap().a;
        assert!(center > edge);
    }
}
