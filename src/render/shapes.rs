//! Drawable primitives for the face surface
//!
//! Rasterization is separated from motion math: behaviors compute positions
//! as pure functions, shapes only turn them into pixels.

use super::color::Color;

/// 2D point with f64 coordinates (subpixel precision)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl std::ops::Add for Point {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Trait for drawable primitives
pub trait Shape {
    /// Draw the shape onto a pixel buffer
    fn rasterize(&self, width: u32, height: u32, pixels: &mut [Color]);
}

#[inline]
fn blend_at(pixels: &mut [Color], width: u32, height: u32, x: i32, y: i32, color: Color) {
    if x >= 0 && x < width as i32 && y >= 0 && y < height as i32 {
        let idx = (y as u32 * width + x as u32) as usize;
        pixels[idx] = color.blend_over(&pixels[idx]);
    }
}

/// Line segment, used for rain streaks and mouth strokes
#[derive(Debug, Clone, Copy)]
pub struct Line {
    pub start: Point,
    pub end: Point,
    pub color: Color,
}

impl Line {
    pub fn new(start: Point, end: Point, color: Color) -> Self {
        Self { start, end, color }
    }
}

impl Shape for Line {
    fn rasterize(&self, width: u32, height: u32, pixels: &mut [Color]) {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0);

        let mut prev: Option<(i32, i32)> = None;
        for i in 0..=steps as u32 {
            let t = f64::from(i) / steps;
            let x = self.start.x + dx * t;
            let y = self.start.y + dy * t;

            // Split coverage between the two nearest pixels along the minor
            // axis for a cheap anti-aliased edge
            let (px, py) = (x.floor() as i32, y.floor() as i32);
            if prev == Some((px, py)) {
                continue;
            }
            prev = Some((px, py));

            let fx = (x - x.floor()) as f32;
            let fy = (y - y.floor()) as f32;
            if dx.abs() >= dy.abs() {
                blend_at(pixels, width, height, px, py, self.color.with_alpha(self.color.a * (1.0 - fy)));
                blend_at(pixels, width, height, px, py + 1, self.color.with_alpha(self.color.a * fy));
            } else {
                blend_at(pixels, width, height, px, py, self.color.with_alpha(self.color.a * (1.0 - fx)));
                blend_at(pixels, width, height, px + 1, py, self.color.with_alpha(self.color.a * fx));
            }
        }
    }
}

/// Circle, filled or outline
#[derive(Debug, Clone, Copy)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
    pub color: Color,
    pub filled: bool,
}

impl Circle {
    pub fn new(center: Point, radius: f64, color: Color) -> Self {
        Self {
            center,
            radius,
            color,
            filled: false,
        }
    }

    pub fn filled(mut self) -> Self {
        self.filled = true;
        self
    }
}

impl Shape for Circle {
    fn rasterize(&self, width: u32, height: u32, pixels: &mut [Color]) {
        let r = self.radius.max(0.0);
        let min_x = ((self.center.x - r - 1.0).max(0.0)) as u32;
        let max_x = ((self.center.x + r + 1.0).min(f64::from(width) - 1.0)).max(0.0) as u32;
        let min_y = ((self.center.y - r - 1.0).max(0.0)) as u32;
        let max_y = ((self.center.y + r + 1.0).min(f64::from(height) - 1.0)).max(0.0) as u32;

        for py in min_y..=max_y {
            for px in min_x..=max_x {
                let dist = Point::new(f64::from(px), f64::from(py)).distance(&self.center);

                // Coverage falls off linearly across the half-pixel band at
                // the edge
                let coverage = if self.filled {
                    (r + 0.5 - dist).clamp(0.0, 1.0)
                } else {
                    (1.0 - (dist - r).abs()).clamp(0.0, 1.0)
                } as f32;

                if coverage > 0.0 {
                    blend_at(
                        pixels,
                        width,
                        height,
                        px as i32,
                        py as i32,
                        self.color.with_alpha(self.color.a * coverage),
                    );
                }
            }
        }
    }
}

/// Convex quad, used for the angular diamond eyes
#[derive(Debug, Clone, Copy)]
pub struct Quad {
    pub corners: [Point; 4],
    pub color: Color,
}

impl Quad {
    pub fn new(corners: [Point; 4], color: Color) -> Self {
        Self { corners, color }
    }

    fn contains(&self, p: Point) -> bool {
        // Point is inside a convex polygon iff it is on the same side of
        // every edge
        let mut sign = 0.0f64;
        for i in 0..4 {
            let a = self.corners[i];
            let b = self.corners[(i + 1) % 4];
            let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
            if cross.abs() < f64::EPSILON {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        true
    }
}

impl Shape for Quad {
    fn rasterize(&self, width: u32, height: u32, pixels: &mut [Color]) {
        let min_x = self.corners.iter().map(|p| p.x).fold(f64::MAX, f64::min).max(0.0) as u32;
        let max_x = self
            .corners
            .iter()
            .map(|p| p.x)
            .fold(f64::MIN, f64::max)
            .min(f64::from(width) - 1.0)
            .max(0.0) as u32;
        let min_y = self.corners.iter().map(|p| p.y).fold(f64::MAX, f64::min).max(0.0) as u32;
        let max_y = self
            .corners
            .iter()
            .map(|p| p.y)
            .fold(f64::MIN, f64::max)
            .min(f64::from(height) - 1.0)
            .max(0.0) as u32;

        for py in min_y..=max_y {
            for px in min_x..=max_x {
                if self.contains(Point::new(f64::from(px) + 0.5, f64::from(py) + 0.5)) {
                    blend_at(pixels, width, height, px as i32, py as i32, self.color);
                }
            }
        }
    }
}
