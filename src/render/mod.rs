//! Animation/Render Pipeline
//!
//! Virtual RGBA canvases, shape rasterization, the state-driven particle
//! field, the weather underlay and the face geometry, composited once per
//! frame. Motion math is pure (time + phase in, position out) and draws
//! through the [`shapes::Shape`] seam, so every formula is testable without
//! a display surface.

pub mod atmosphere;
pub mod canvas;
pub mod color;
pub mod face;
pub mod particles;
pub mod pipeline;
pub mod shapes;

pub use atmosphere::WeatherLayer;
pub use canvas::Canvas;
pub use color::Color;
pub use face::{mood_color, FaceLayer};
pub use particles::{BehaviorProfile, ParticlePool, ProfileTuning};
pub use pipeline::{FrameInput, RenderPipeline};
pub use shapes::{Circle, Line, Point, Quad, Shape};
