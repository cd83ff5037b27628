use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, LevelFilter};
use rand::Rng;

use glint::camera::{Camera, ProgressSink};
use glint::geometry::{Floor, Material, Primitive, Sphere};
use glint::math::Vec3;
use glint::ppm::PpmImage;
use glint::scene::{self, Scene, SceneError};
use glint::shading::Light;

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Parser)]
#[command(name = "glint")]
#[command(about = "A recursive ray tracer with soft shadows")]
struct Args {
    /// Scene declaration file (JSON); renders the built-in demo scene when
    /// omitted
    #[arg(short, long)]
    scene: Option<PathBuf>,

    /// Output file path (plain-text PPM)
    #[arg(short, long, default_value = "render.ppm")]
    output: PathBuf,

    /// Image width in pixels
    #[arg(long, default_value = "800")]
    width: usize,

    /// Image height in pixels
    #[arg(long, default_value = "600")]
    height: usize,

    /// Seed for shadow sampling; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value = "info")]
    log_level: LogLevel,
}

struct BarProgress {
    bar: ProgressBar,
}

impl ProgressSink for BarProgress {
    fn rows_completed(&self, rows_done: usize, _total_rows: usize, _elapsed: Duration) {
        self.bar.set_position(rows_done as u64);
    }
}

fn sphere(
    origin: Vec3,
    radius: f32,
    color: Vec3,
    specular: f32,
    reflectivity: f32,
    roughness: f32,
) -> Primitive {
    Primitive::Sphere(Sphere {
        origin,
        rotation: Vec3::zero(),
        radius,
        material: Material { color, specular, reflectivity, roughness },
    })
}

/// The built-in demo arrangement: a mirror ball over a reflective floor,
/// flanked by dull spheres, lit by one bright white and two tinted lights.
fn demo_scene(width: usize, height: usize) -> Result<Scene, SceneError> {
    let grey = |v| Vec3::new(v, v, v);

    let primitives = vec![
        sphere(Vec3::new(0.0, 4.0, 32.0), 8.0, grey(0.858), 2.0, 0.6, 0.15),
        sphere(Vec3::new(-12.0, 2.0, 24.0), 4.0, grey(0.5), 4.0, 0.1, 0.85),
        sphere(Vec3::new(-18.0, 8.0, 18.0), 4.0, grey(0.12), 2.0, 0.2, 0.15),
        sphere(Vec3::new(19.0, -4.0, 22.0), 5.0, grey(0.1), 1.6, 0.2, 0.25),
        Primitive::Floor(Floor {
            origin: Vec3::new(0.0, 16.0, 0.0),
            rotation: Vec3::zero(),
            material: Material { color: grey(0.5), reflectivity: 0.32, ..Material::default() },
        }),
        sphere(Vec3::new(16.0, 8.0, 18.0), 5.0, grey(1.0), 1.0, 1.0, 0.01),
        sphere(Vec3::new(4.0, 14.0, 24.0), 2.0, grey(1.0), 2.0, 0.6, 0.125),
        sphere(Vec3::new(-8.0, 14.0, 16.0), 2.0, grey(1.0), 2.0, 0.6, 0.125),
    ];

    let lights = vec![
        Light {
            origin: Vec3::new(24.0, -8.0, 8.0),
            color: grey(16.0),
            max_distance: 50.0,
            power: 0.5,
        },
        Light {
            origin: Vec3::new(0.0, -16.0, 32.0),
            color: Vec3::new(2.0, 0.8, 0.8),
            max_distance: 64.0,
            power: 0.5,
        },
        Light {
            origin: Vec3::new(-16.0, -22.0, 24.0),
            color: Vec3::new(1.0, 0.8, 2.0),
            max_distance: 64.0,
            power: 0.5,
        },
    ];

    let camera = Camera {
        origin: Vec3::new(0.0, 5.0, 0.0),
        canvas_offset: 0.5,
        width,
        height,
        fov: 2.0944,
        max_bounces: 5,
        shadow_resolution: 64,
    };

    Scene::new(primitives, lights, camera)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.into())
        .init();

    let scene = match &args.scene {
        Some(path) => {
            info!("loading scene from {}", path.display());
            scene::load_scene(path, args.width, args.height)?
        }
        None => demo_scene(args.width, args.height)?,
    };

    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!(
        "rendering {}x{} on {} threads, seed {}",
        args.width,
        args.height,
        rayon::current_num_threads(),
        seed
    );

    let bar = ProgressBar::new(args.height as u64);
    bar.set_style(ProgressStyle::default_bar().template("{bar:40} {pos}/{len} ETA: {eta}")?);
    let progress = BarProgress { bar };

    let mut image = PpmImage::create(args.width, args.height);
    let start = Instant::now();
    scene.render(&mut image, Some(&progress), seed);
    progress.bar.finish();
    info!("render complete in {:.2?}", start.elapsed());

    fs::write(&args.output, image.get_text())?;
    info!("wrote {}", args.output.display());

    Ok(())
}
