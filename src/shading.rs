use rand::Rng;

use super::geometry::{Material, Primitive};
use super::math::{Ray, Vec3};

/// A point light with a hard influence radius and a power-law falloff.
/// `color` channels may exceed 1.0; lights double as emissive multipliers.
#[derive(Clone, Copy, Debug)]
pub struct Light {
    pub origin: Vec3,
    pub color: Vec3,
    /// Hard cutoff; beyond this the light contributes nothing.
    pub max_distance: f32,
    /// Falloff exponent, typically in (0, 2].
    pub power: f32,
}

/// Colour contributed by one light at one surface hit.
///
/// Returns zero when the light is out of range or fully occluded.  The caller
/// accumulates contributions across lights and bounces.
pub fn light_contribution<R: Rng>(
    light: &Light,
    hit_point: &Vec3,
    normal: &Vec3,
    material: &Material,
    primitives: &[Primitive],
    energy: f32,
    shadow_resolution: usize,
    rng: &mut R,
) -> Vec3 {
    let to_light = light.origin - *hit_point;
    if to_light.length() > light.max_distance {
        return Vec3::zero();
    }
    let light_dir = to_light.normalise();

    let shadow_intensity = shadow_intensity(
        hit_point,
        &light_dir,
        material.roughness,
        primitives,
        shadow_resolution,
        rng,
    );

    // Map the cosine term from [-1,1] into [0,1] before the specular
    // exponent, so surfaces facing side-on still catch some light
    let similarity = (light_dir.dot(normal) / 2.0 + 0.5).powf(material.specular);

    let distance_ratio = to_light.length() / light.max_distance;
    let falloff = (1.0 - distance_ratio).powf(light.power);

    let strength = falloff * similarity * energy * shadow_intensity;
    material.color.mul_vec(&(light.color * strength))
}

/// Soft-shadow occlusion: the fraction of perturbed sample rays that reach
/// the light unblocked.  `shadow_resolution = 1` with zero roughness
/// degenerates to a hard binary shadow test.
fn shadow_intensity<R: Rng>(
    hit_point: &Vec3,
    light_dir: &Vec3,
    roughness: f32,
    primitives: &[Primitive],
    shadow_resolution: usize,
    rng: &mut R,
) -> f32 {
    let mut blocked = 0;
    for _ in 0..shadow_resolution {
        let sample_dir = perturb(light_dir, roughness, rng);
        let sample_ray = Ray::new(*hit_point, sample_dir);
        if primitives.iter().any(|p| p.intersect(&sample_ray).is_some()) {
            blocked += 1;
        }
    }

    1.0 - blocked as f32 / shadow_resolution as f32
}

/// Jitter a unit direction by a uniform offset in [-roughness/2, roughness/2]
/// per axis, then renormalise.  Re-samples on near-exact cancellation so the
/// normalise contract holds even for extreme roughness values.
fn perturb<R: Rng>(dir: &Vec3, roughness: f32, rng: &mut R) -> Vec3 {
    loop {
        let jitter = Vec3::new(
            rng.gen::<f32>() * roughness - roughness / 2.0,
            rng.gen::<f32>() * roughness - roughness / 2.0,
            rng.gen::<f32>() * roughness - roughness / 2.0,
        );
        let candidate = *dir + jitter;
        if candidate.len_sq() > 1e-12 {
            return candidate.normalise();
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::ApproxEqUlps;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::super::geometry::{Floor, Sphere};
    use super::*;

    fn test_light(origin: Vec3, max_distance: f32) -> Light {
        Light { origin, color: Vec3::new(1.0, 1.0, 1.0), max_distance, power: 1.0 }
    }

    fn floor_scene() -> Vec<Primitive> {
        vec![Primitive::Floor(Floor {
            origin: Vec3::new(0.0, 16.0, 0.0),
            rotation: Vec3::zero(),
            material: Material { color: Vec3::new(1.0, 1.0, 1.0), ..Material::default() },
        })]
    }

    #[test]
    fn light_out_of_range_contributes_nothing() {
        let primitives = floor_scene();
        let light = test_light(Vec3::new(0.0, -100.0, 0.0), 50.0);
        let mut rng = SmallRng::seed_from_u64(1);

        let color = light_contribution(
            &light,
            &Vec3::new(0.0, 16.0, 0.0),
            &Vec3::new(0.0, -1.0, 0.0),
            primitives[0].material(),
            &primitives,
            1.0,
            4,
            &mut rng,
        );
        assert_eq!(color, Vec3::zero());
    }

    #[test]
    fn unoccluded_point_follows_falloff_and_similarity() {
        let primitives = floor_scene();
        // Light straight above the hit point (towards -Y), 10 units away
        let light = test_light(Vec3::new(0.0, 6.0, 0.0), 20.0);
        let material = Material {
            color: Vec3::new(1.0, 1.0, 1.0),
            specular: 1.0,
            roughness: 0.0,
            ..Material::default()
        };
        let mut rng = SmallRng::seed_from_u64(1);

        let color = light_contribution(
            &light,
            &Vec3::new(0.0, 16.0, 0.0),
            &Vec3::new(0.0, -1.0, 0.0),
            &material,
            &primitives,
            1.0,
            1,
            &mut rng,
        );

        // similarity = (1/2 + 0.5)^1 = 1, falloff = (1 - 10/20)^1 = 0.5
        assert!(color.x.approx_eq_ulps(&0.5, 2));
        assert!(color.y.approx_eq_ulps(&0.5, 2));
        assert!(color.z.approx_eq_ulps(&0.5, 2));
    }

    #[test]
    fn hard_shadow_blocks_fully() {
        let mut primitives = floor_scene();
        // Sphere sits between the floor point and the light
        primitives.push(Primitive::Sphere(Sphere {
            origin: Vec3::new(0.0, 10.0, 0.0),
            rotation: Vec3::zero(),
            radius: 1.0,
            material: Material::default(),
        }));
        let light = test_light(Vec3::new(0.0, 6.0, 0.0), 20.0);
        let material = Material { roughness: 0.0, ..*primitives[0].material() };
        let mut rng = SmallRng::seed_from_u64(1);

        let color = light_contribution(
            &light,
            &Vec3::new(0.0, 16.0, 0.0),
            &Vec3::new(0.0, -1.0, 0.0),
            &material,
            &primitives,
            1.0,
            1,
            &mut rng,
        );
        assert_eq!(color, Vec3::zero());
    }

    #[test]
    fn contribution_scales_linearly_with_energy() {
        let primitives = floor_scene();
        let light = test_light(Vec3::new(3.0, 6.0, 1.0), 30.0);
        let material = Material {
            color: Vec3::new(0.5, 0.5, 0.5),
            roughness: 0.0,
            ..Material::default()
        };
        let point = Vec3::new(0.0, 16.0, 0.0);
        let normal = Vec3::new(0.0, -1.0, 0.0);

        let mut rng = SmallRng::seed_from_u64(1);
        let full =
            light_contribution(&light, &point, &normal, &material, &primitives, 1.0, 1, &mut rng);
        let half =
            light_contribution(&light, &point, &normal, &material, &primitives, 0.5, 1, &mut rng);

        assert!(half.x.approx_eq_ulps(&(full.x * 0.5), 2));
        assert!(half.y.approx_eq_ulps(&(full.y * 0.5), 2));
        assert!(half.z.approx_eq_ulps(&(full.z * 0.5), 2));
    }

    #[test]
    fn perturb_with_zero_roughness_is_identity() {
        let mut rng = SmallRng::seed_from_u64(7);
        let dir = Vec3::new(0.0, 0.0, 1.0);
        assert_eq!(perturb(&dir, 0.0, &mut rng), dir);
    }

    #[test]
    fn perturb_stays_unit_length() {
        let mut rng = SmallRng::seed_from_u64(7);
        let dir = Vec3::new(0.0, 1.0, 0.0);
        for _ in 0..64 {
            let sample = perturb(&dir, 0.85, &mut rng);
            assert!(sample.length().approx_eq_ulps(&1.0, 4));
        }
    }
}
