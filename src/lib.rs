//! A recursive ray tracer: one primary ray per pixel, mirror bounces up to a
//! cap, point lights with power-law falloff and soft multi-sample shadows.

pub mod camera;
pub mod geometry;
pub mod math;
pub mod ppm;
pub mod scene;
pub mod shading;
