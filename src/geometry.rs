use super::math::*;

/// Surface properties shared by every renderable primitive.
///
/// `specular` shapes the highlight falloff, `reflectivity` is the fraction of
/// ray energy kept after a bounce, and `roughness` sets the magnitude of the
/// random perturbation used for soft-shadow sampling.
#[derive(Clone, Copy, Debug)]
pub struct Material {
    pub color: Vec3,
    pub specular: f32,
    pub reflectivity: f32,
    pub roughness: f32,
}

impl Default for Material {
    fn default() -> Material {
        Material {
            color: Vec3::zero(),
            specular: 1.5,
            reflectivity: 0.8,
            roughness: 0.125,
        }
    }
}

/// Where a ray met a primitive: the surface point and the mirror-reflected
/// direction the ray continues in.
#[derive(Clone, Copy, Debug)]
pub struct Intersection {
    pub point: Vec3,
    pub reflected: Vec3,
}

#[derive(Clone, Copy, Debug)]
pub struct Sphere {
    pub origin: Vec3,
    /// Reserved; no primitive rotates yet.
    pub rotation: Vec3,
    pub radius: f32,
    pub material: Material,
}

impl Sphere {
    /// Analytic ray/sphere test.  Returns `None` when the sphere is behind
    /// the ray origin or the ray line passes outside the radius.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        // Vector from the ray origin to the centre, and its projection onto
        // the ray line
        let a = self.origin - ray.origin;
        let b = a.dot(&ray.direction);

        // Centre is behind the ray origin
        if b < 0.0 {
            return None;
        }

        // Perpendicular distance from the centre to the ray line.  The
        // radicand is non-negative for a unit direction; clamp against
        // floating error rather than taking sqrt of a tiny negative.
        let c = (a.len_sq() - b * b).max(0.0).sqrt();
        if c > self.radius {
            return None;
        }

        // At near-tangency floating error can push this negative; treat as a
        // miss rather than produce NaN
        let rem = self.radius * self.radius - c * c;
        if rem < 0.0 {
            return None;
        }

        let d = b - rem.sqrt();
        let point = ray.at_t(d);
        let reflected = reflect(&ray.direction, &self.surface_normal(&point));

        Some(Intersection { point, reflected })
    }

    pub fn surface_normal(&self, point: &Vec3) -> Vec3 {
        (*point - self.origin).normalise()
    }
}

/// Infinite horizontal plane at a fixed world Y.  One-sided: only rays with a
/// positive Y component ever hit it, and the normal is always `(0,-1,0)`
/// because the plane never rotates.
#[derive(Clone, Copy, Debug)]
pub struct Floor {
    pub origin: Vec3,
    /// Reserved; no primitive rotates yet.
    pub rotation: Vec3,
    pub material: Material,
}

const FLOOR_NORMAL: Vec3 = Vec3 { x: 0.0, y: -1.0, z: 0.0 };

impl Floor {
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        // The one-sided test also excludes exactly horizontal rays, so the
        // parametric division below never divides by zero
        if ray.direction.y <= 0.0 {
            return None;
        }

        let dif_y = self.origin.y - ray.origin.y;
        let t = dif_y / ray.direction.y;
        let point = ray.origin + Vec3::new(t * ray.direction.x, dif_y, t * ray.direction.z);
        let reflected = reflect(&ray.direction, &FLOOR_NORMAL);

        Some(Intersection { point, reflected })
    }

    pub fn surface_normal(&self, _point: &Vec3) -> Vec3 {
        FLOOR_NORMAL
    }
}

/// Every renderable shape in a scene.  A closed enum keeps intersection
/// dispatch exhaustive; adding a variant breaks every match until handled.
#[derive(Clone, Copy, Debug)]
pub enum Primitive {
    Sphere(Sphere),
    Floor(Floor),
}

impl Primitive {
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        match self {
            Primitive::Sphere(sphere) => sphere.intersect(ray),
            Primitive::Floor(floor) => floor.intersect(ray),
        }
    }

    /// Only defined for points previously returned by `intersect`.
    pub fn surface_normal(&self, point: &Vec3) -> Vec3 {
        match self {
            Primitive::Sphere(sphere) => sphere.surface_normal(point),
            Primitive::Floor(floor) => floor.surface_normal(point),
        }
    }

    pub fn material(&self) -> &Material {
        match self {
            Primitive::Sphere(sphere) => &sphere.material,
            Primitive::Floor(floor) => &floor.material,
        }
    }
}

/// Brute-force closest-hit query over all primitives.  Ties go to the first
/// primitive encountered.
pub fn closest_hit<'a>(
    ray: &Ray,
    primitives: &'a [Primitive],
) -> Option<(&'a Primitive, Intersection)> {
    let mut result: Option<(&Primitive, Intersection)> = None;
    let mut closest_so_far = f32::INFINITY;
    for primitive in primitives {
        if let Some(intersection) = primitive.intersect(ray) {
            let distance = (intersection.point - ray.origin).length();
            if distance < closest_so_far {
                closest_so_far = distance;
                result = Some((primitive, intersection));
            }
        }
    }

    result
}
