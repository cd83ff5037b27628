use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::geometry::{closest_hit, Primitive};
use super::math::{Ray, Vec3};
use super::shading::{light_contribution, Light};

/// Receives finished pixels.  The render loop is the only writer, one call
/// per (col, row).
pub trait PixelSink {
    fn set_pixel(&mut self, col: usize, row: usize, r: u8, g: u8, b: u8);
}

/// Observes row completion at a coarse interval.  Must not block; it is
/// called from whichever worker happens to finish a row.
pub trait ProgressSink: Sync {
    fn rows_completed(&self, rows_done: usize, total_rows: usize, elapsed: Duration);
}

/// Casts one primary ray per pixel and follows specular bounces.
///
/// The camera sits at `origin` looking along +Z; `canvas_offset` is the
/// distance to the image plane and `fov` the horizontal field of view in
/// radians.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub origin: Vec3,
    pub canvas_offset: f32,
    pub width: usize,
    pub height: usize,
    pub fov: f32,
    pub max_bounces: usize,
    pub shadow_resolution: usize,
}

fn to_channel(value: f32) -> u8 {
    (255.0 * value).clamp(0.0, 255.0) as u8
}

impl Camera {
    /// Renders the scene into `sink`, row-parallel.
    ///
    /// Each row owns an rng seeded from `seed` and its row index, so the
    /// output is identical for a given seed regardless of thread scheduling.
    pub fn render(
        &self,
        primitives: &[Primitive],
        lights: &[Light],
        sink: &mut dyn PixelSink,
        progress: Option<&dyn ProgressSink>,
        seed: u64,
    ) {
        let plane_width = 2.0 * (self.fov / 2.0).tan() * self.canvas_offset;
        let plane_height = plane_width * self.height as f32 / self.width as f32;

        let start = Instant::now();
        let update_freq = (self.height / 25).max(1);
        let rows_done = AtomicUsize::new(0);

        let rows: Vec<Vec<[u8; 3]>> = (0..self.height)
            .into_par_iter()
            .map(|row| {
                let mut rng = SmallRng::seed_from_u64(
                    seed ^ (row as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15),
                );
                let pixels = (0..self.width)
                    .map(|col| {
                        let colour = self.trace_pixel(
                            col,
                            row,
                            plane_width,
                            plane_height,
                            primitives,
                            lights,
                            &mut rng,
                        );
                        [to_channel(colour.x), to_channel(colour.y), to_channel(colour.z)]
                    })
                    .collect();

                let done = rows_done.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(progress) = progress {
                    if done % update_freq == 0 || done == self.height {
                        progress.rows_completed(done, self.height, start.elapsed());
                    }
                }
                pixels
            })
            .collect();

        // Workers never touch the sink; completed rows land here in order
        for (row, pixels) in rows.iter().enumerate() {
            for (col, [r, g, b]) in pixels.iter().enumerate() {
                sink.set_pixel(col, row, *r, *g, *b);
            }
        }
    }

    /// Maps (col, row) onto the centered image plane and traces the primary
    /// ray from the camera origin through that point.
    fn trace_pixel<R: Rng>(
        &self,
        col: usize,
        row: usize,
        plane_width: f32,
        plane_height: f32,
        primitives: &[Primitive],
        lights: &[Light],
        rng: &mut R,
    ) -> Vec3 {
        let px_x = (col as f32 / self.width as f32) * plane_width - plane_width / 2.0;
        let px_y = (row as f32 / self.height as f32) * plane_height - plane_height / 2.0;
        let direction = Vec3::new(px_x, px_y, self.canvas_offset).normalise();

        self.trace_ray(Ray::new(self.origin, direction), primitives, lights, rng)
    }

    fn trace_ray<R: Rng>(
        &self,
        mut ray: Ray,
        primitives: &[Primitive],
        lights: &[Light],
        rng: &mut R,
    ) -> Vec3 {
        let mut energy = 1.0;
        let mut summed = Vec3::zero();
        for _ in 0..self.max_bounces {
            let Some((primitive, hit)) = closest_hit(&ray, primitives) else {
                break;
            };
            let normal = primitive.surface_normal(&hit.point);
            let material = primitive.material();
            for light in lights {
                summed = summed
                    + light_contribution(
                        light,
                        &hit.point,
                        &normal,
                        material,
                        primitives,
                        energy,
                        self.shadow_resolution,
                        rng,
                    );
            }

            // Continue along the mirror bounce with weakened energy
            ray = Ray::new(hit.point, hit.reflected);
            energy *= material.reflectivity;
        }

        // Average over the bounce cap, not bounces taken: rays that escape
        // the scene early come out darker on purpose
        summed * (1.0 / self.max_bounces as f32)
    }
}
