use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::camera::{Camera, PixelSink, ProgressSink};
use super::geometry::{Floor, Material, Primitive, Sphere};
use super::math::Vec3;
use super::shading::Light;

/// Configuration faults caught before any rendering starts, plus scene-file
/// read/parse failures.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("scene has no primitives")]
    NoPrimitives,

    #[error("scene has no lights")]
    NoLights,

    #[error("canvas dimensions must be positive, got {width}x{height}")]
    BadCanvas { width: usize, height: usize },

    #[error("canvas offset must be positive, got {0}")]
    BadCanvasOffset(f32),

    #[error("field of view must lie in (0, pi) radians, got {0}")]
    BadFov(f32),

    #[error("max_bounces must be at least 1")]
    BadBounceCap,

    #[error("shadow_resolution must be at least 1")]
    BadShadowResolution,

    #[error("sphere radius must be positive, got {0}")]
    BadRadius(f32),

    #[error("reflectivity must lie in [0, 1], got {0}")]
    BadReflectivity(f32),

    #[error("specular exponent must be non-negative, got {0}")]
    BadSpecular(f32),

    #[error("roughness must be non-negative, got {0}")]
    BadRoughness(f32),

    #[error("light max_distance must be positive, got {0}")]
    BadLightRange(f32),

    #[error("failed to read scene file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scene file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A validated, immutable description of everything to render.
#[derive(Debug)]
pub struct Scene {
    pub primitives: Vec<Primitive>,
    pub lights: Vec<Light>,
    pub camera: Camera,
}

impl Scene {
    /// Rejects every configuration fault up front; a constructed `Scene`
    /// always renders to completion.
    pub fn new(
        primitives: Vec<Primitive>,
        lights: Vec<Light>,
        camera: Camera,
    ) -> Result<Scene, SceneError> {
        if primitives.is_empty() {
            return Err(SceneError::NoPrimitives);
        }
        if lights.is_empty() {
            return Err(SceneError::NoLights);
        }
        if camera.width == 0 || camera.height == 0 {
            return Err(SceneError::BadCanvas { width: camera.width, height: camera.height });
        }
        if camera.canvas_offset <= 0.0 {
            return Err(SceneError::BadCanvasOffset(camera.canvas_offset));
        }
        if camera.fov <= 0.0 || camera.fov >= std::f32::consts::PI {
            return Err(SceneError::BadFov(camera.fov));
        }
        if camera.max_bounces == 0 {
            return Err(SceneError::BadBounceCap);
        }
        if camera.shadow_resolution == 0 {
            return Err(SceneError::BadShadowResolution);
        }

        for primitive in &primitives {
            if let Primitive::Sphere(sphere) = primitive {
                if sphere.radius <= 0.0 {
                    return Err(SceneError::BadRadius(sphere.radius));
                }
            }
            validate_material(primitive.material())?;
        }
        for light in &lights {
            if light.max_distance <= 0.0 {
                return Err(SceneError::BadLightRange(light.max_distance));
            }
        }

        Ok(Scene { primitives, lights, camera })
    }

    pub fn render(
        &self,
        sink: &mut dyn PixelSink,
        progress: Option<&dyn ProgressSink>,
        seed: u64,
    ) {
        self.camera.render(&self.primitives, &self.lights, sink, progress, seed);
    }
}

fn validate_material(material: &Material) -> Result<(), SceneError> {
    if !(0.0..=1.0).contains(&material.reflectivity) {
        return Err(SceneError::BadReflectivity(material.reflectivity));
    }
    if material.specular < 0.0 {
        return Err(SceneError::BadSpecular(material.specular));
    }
    if material.roughness < 0.0 {
        return Err(SceneError::BadRoughness(material.roughness));
    }
    Ok(())
}

fn default_specular() -> f32 {
    Material::default().specular
}

fn default_reflectivity() -> f32 {
    Material::default().reflectivity
}

fn default_roughness() -> f32 {
    Material::default().roughness
}

fn default_power() -> f32 {
    0.8
}

fn default_canvas_offset() -> f32 {
    0.5
}

fn default_fov() -> f32 {
    2.0944
}

fn default_max_bounces() -> usize {
    5
}

fn default_shadow_resolution() -> usize {
    16
}

#[derive(Debug, Deserialize, Serialize)]
struct SphereDeclaration {
    origin: Vec3,
    #[serde(default = "Vec3::zero")]
    rotation: Vec3,
    radius: f32,
    color: Vec3,
    #[serde(default = "default_specular")]
    specular: f32,
    #[serde(default = "default_reflectivity")]
    reflectivity: f32,
    #[serde(default = "default_roughness")]
    roughness: f32,
}

#[derive(Debug, Deserialize, Serialize)]
struct FloorDeclaration {
    origin: Vec3,
    #[serde(default = "Vec3::zero")]
    rotation: Vec3,
    color: Vec3,
    #[serde(default = "default_specular")]
    specular: f32,
    #[serde(default = "default_reflectivity")]
    reflectivity: f32,
    #[serde(default = "default_roughness")]
    roughness: f32,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "lowercase", tag = "shape")]
enum ShapeDeclaration {
    Sphere(SphereDeclaration),
    Floor(FloorDeclaration),
}

#[derive(Debug, Deserialize, Serialize)]
struct LightDeclaration {
    origin: Vec3,
    color: Vec3,
    max_distance: f32,
    #[serde(default = "default_power")]
    power: f32,
}

#[derive(Debug, Deserialize, Serialize)]
struct CameraDeclaration {
    #[serde(default = "Vec3::zero")]
    origin: Vec3,
    #[serde(default = "default_canvas_offset")]
    canvas_offset: f32,
    #[serde(default = "default_fov")]
    fov: f32,
    #[serde(default = "default_max_bounces")]
    max_bounces: usize,
    #[serde(default = "default_shadow_resolution")]
    shadow_resolution: usize,
}

#[derive(Debug, Deserialize, Serialize)]
struct SceneDeclaration {
    objects: Vec<ShapeDeclaration>,
    lights: Vec<LightDeclaration>,
    camera: CameraDeclaration,
}

/// Builds a validated scene from a JSON declaration.  Canvas dimensions come
/// from the caller, everything else from the declaration.
pub fn parse_scene(json: &str, width: usize, height: usize) -> Result<Scene, SceneError> {
    let spec: SceneDeclaration = serde_json::from_str(json)?;
    debug!(
        "scene declaration: {} objects, {} lights",
        spec.objects.len(),
        spec.lights.len()
    );

    let primitives = spec
        .objects
        .into_iter()
        .map(|shape| match shape {
            ShapeDeclaration::Sphere(dec) => Primitive::Sphere(Sphere {
                origin: dec.origin,
                rotation: dec.rotation,
                radius: dec.radius,
                material: Material {
                    color: dec.color,
                    specular: dec.specular,
                    reflectivity: dec.reflectivity,
                    roughness: dec.roughness,
                },
            }),
            ShapeDeclaration::Floor(dec) => Primitive::Floor(Floor {
                origin: dec.origin,
                rotation: dec.rotation,
                material: Material {
                    color: dec.color,
                    specular: dec.specular,
                    reflectivity: dec.reflectivity,
                    roughness: dec.roughness,
                },
            }),
        })
        .collect();

    let lights = spec
        .lights
        .into_iter()
        .map(|dec| Light {
            origin: dec.origin,
            color: dec.color,
            max_distance: dec.max_distance,
            power: dec.power,
        })
        .collect();

    let camera = Camera {
        origin: spec.camera.origin,
        canvas_offset: spec.camera.canvas_offset,
        width,
        height,
        fov: spec.camera.fov,
        max_bounces: spec.camera.max_bounces,
        shadow_resolution: spec.camera.shadow_resolution,
    };

    Scene::new(primitives, lights, camera)
}

pub fn load_scene<P: AsRef<Path>>(
    path: P,
    width: usize,
    height: usize,
) -> Result<Scene, SceneError> {
    let json = fs::read_to_string(path)?;
    parse_scene(&json, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_camera() -> Camera {
        Camera {
            origin: Vec3::zero(),
            canvas_offset: 0.5,
            width: 8,
            height: 6,
            fov: 2.0944,
            max_bounces: 5,
            shadow_resolution: 4,
        }
    }

    fn test_sphere() -> Primitive {
        Primitive::Sphere(Sphere {
            origin: Vec3::new(0.0, 0.0, 10.0),
            rotation: Vec3::zero(),
            radius: 1.0,
            material: Material::default(),
        })
    }

    fn test_light() -> Light {
        Light { origin: Vec3::zero(), color: Vec3::new(1.0, 1.0, 1.0), max_distance: 50.0, power: 0.5 }
    }

    #[test]
    fn rejects_empty_primitives() {
        let err = Scene::new(vec![], vec![test_light()], test_camera()).unwrap_err();
        assert!(matches!(err, SceneError::NoPrimitives));
    }

    #[test]
    fn rejects_empty_lights() {
        let err = Scene::new(vec![test_sphere()], vec![], test_camera()).unwrap_err();
        assert!(matches!(err, SceneError::NoLights));
    }

    #[test]
    fn rejects_zero_canvas() {
        let mut camera = test_camera();
        camera.width = 0;
        let err = Scene::new(vec![test_sphere()], vec![test_light()], camera).unwrap_err();
        assert!(matches!(err, SceneError::BadCanvas { .. }));
    }

    #[test]
    fn rejects_zero_bounce_cap() {
        let mut camera = test_camera();
        camera.max_bounces = 0;
        let err = Scene::new(vec![test_sphere()], vec![test_light()], camera).unwrap_err();
        assert!(matches!(err, SceneError::BadBounceCap));
    }

    #[test]
    fn rejects_out_of_range_reflectivity() {
        let mut sphere = test_sphere();
        if let Primitive::Sphere(ref mut s) = sphere {
            s.material.reflectivity = 1.5;
        }
        let err = Scene::new(vec![sphere], vec![test_light()], test_camera()).unwrap_err();
        assert!(matches!(err, SceneError::BadReflectivity(_)));
    }

    #[test]
    fn rejects_non_positive_light_range() {
        let mut light = test_light();
        light.max_distance = 0.0;
        let err = Scene::new(vec![test_sphere()], vec![light], test_camera()).unwrap_err();
        assert!(matches!(err, SceneError::BadLightRange(_)));
    }

    #[test]
    fn parses_declaration_with_defaults() {
        let json = r#"{
            "objects": [
                { "shape": "sphere", "origin": { "x": 0.0, "y": 4.0, "z": 32.0 },
                  "radius": 8.0, "color": { "x": 0.858, "y": 0.858, "z": 0.858 } },
                { "shape": "floor", "origin": { "x": 0.0, "y": 16.0, "z": 0.0 },
                  "color": { "x": 0.5, "y": 0.5, "z": 0.5 }, "reflectivity": 0.32 }
            ],
            "lights": [
                { "origin": { "x": 24.0, "y": -8.0, "z": 8.0 },
                  "color": { "x": 16.0, "y": 16.0, "z": 16.0 }, "max_distance": 50.0 }
            ],
            "camera": { "origin": { "x": 0.0, "y": 5.0, "z": 0.0 } }
        }"#;

        let scene = parse_scene(json, 80, 60).expect("declaration should parse");
        assert_eq!(scene.primitives.len(), 2);
        assert_eq!(scene.lights.len(), 1);
        assert_eq!(scene.camera.width, 80);
        assert_eq!(scene.camera.max_bounces, 5);
        assert_eq!(scene.lights[0].power, 0.8);

        // Material defaults filled in for unspecified fields
        assert_eq!(scene.primitives[0].material().specular, 1.5);
        assert_eq!(scene.primitives[1].material().reflectivity, 0.32);
    }

    #[test]
    fn malformed_declaration_is_a_parse_error() {
        let err = parse_scene("{ not json", 8, 6).unwrap_err();
        assert!(matches!(err, SceneError::Parse(_)));
    }
}
