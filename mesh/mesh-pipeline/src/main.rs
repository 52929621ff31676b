//! Command-line front end for reconstruction, rendering and composition.
//!
//! ```text
//! mesh-pipeline reconstruct photo.jpg depth.png --mask mask.png --job chair -o out/
//! mesh-pipeline turntable out/chair_mesh.ply -o out/chair.gif --frames 36
//! mesh-pipeline orbit out/chair_mesh.ply -o out/chair_orbit.gif
//! mesh-pipeline compose a.ply b.obj --scale 2 --position 1,0,0 --name room -o out/
//! mesh-pipeline depth-vis depth.png --name chair -o out/
//! mesh-pipeline info out/chair.gif
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mesh_assembly::{compose_files, SceneFile};
use mesh_io::MeshFormat;
use mesh_pipeline::{load_depth_map, load_image, load_mask, reconstruct_job, PipelineConfig};
use mesh_scan::ReconstructionMethod;
use mesh_turntable::{create_orbit, create_turntable, export_info, AnimationFormat, OrbitConfig};
use mesh_types::MeshBounds;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Image + depth map to textured mesh, and tools around it.
#[derive(Parser)]
#[command(name = "mesh-pipeline")]
#[command(about = "Single-view 3D reconstruction", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct a textured mesh from an image and its depth map
    Reconstruct {
        /// Source photograph
        image: PathBuf,

        /// Grayscale depth map (8 or 16 bit), brighter is farther
        depth: PathBuf,

        /// Segmentation mask; white pixels are kept
        #[arg(long)]
        mask: Option<PathBuf>,

        /// Job identifier used in artifact names
        #[arg(long, default_value = "output")]
        job: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// JSON configuration file; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Reconstruction method (poisson, ball_pivoting)
        #[arg(long)]
        method: Option<String>,

        /// Focal length as a fraction of the image width
        #[arg(long)]
        focal_factor: Option<f64>,

        /// Poisson octree depth
        #[arg(long)]
        poisson_depth: Option<u32>,

        /// Mesh formats to write (ply, obj)
        #[arg(long, value_delimiter = ',')]
        formats: Option<Vec<String>>,

        /// Also render a turntable GIF of the result
        #[arg(long)]
        turntable: bool,
    },

    /// Render a mesh spinning about its vertical axis
    Turntable {
        /// Mesh files (PLY or OBJ); several are combined
        #[arg(required = true)]
        meshes: Vec<PathBuf>,

        /// Output animation
        #[arg(short, long)]
        output: PathBuf,

        /// Frames per revolution
        #[arg(long, default_value_t = 36)]
        frames: usize,

        /// Seconds per frame
        #[arg(long, default_value_t = 0.1)]
        duration: f64,

        /// Frame width
        #[arg(long, default_value_t = 800)]
        width: u32,

        /// Frame height
        #[arg(long, default_value_t = 600)]
        height: u32,

        /// Animation format (gif)
        #[arg(long, default_value = "gif")]
        format: String,
    },

    /// Render a camera orbit around a mesh
    Orbit {
        /// Mesh files (PLY or OBJ); several are combined
        #[arg(required = true)]
        meshes: Vec<PathBuf>,

        /// Output animation
        #[arg(short, long)]
        output: PathBuf,

        /// Frames per orbit
        #[arg(long, default_value_t = 60)]
        frames: usize,

        /// Camera distance in mesh radii
        #[arg(long, default_value_t = 2.0)]
        radius: f64,

        /// Camera elevation in degrees
        #[arg(long, default_value_t = 30.0, allow_hyphen_values = true)]
        elevation: f64,

        /// Frame width
        #[arg(long, default_value_t = 800)]
        width: u32,

        /// Frame height
        #[arg(long, default_value_t = 600)]
        height: u32,

        /// Animation format (gif)
        #[arg(long, default_value = "gif")]
        format: String,
    },

    /// Combine meshes into one scene
    Compose {
        /// Mesh files (PLY or OBJ)
        #[arg(required = true)]
        meshes: Vec<PathBuf>,

        /// Scale per mesh, in order; missing entries leave the mesh unscaled
        #[arg(long = "scale")]
        scales: Vec<f64>,

        /// Position offset per mesh as x,y,z, in order
        #[arg(long = "position", allow_hyphen_values = true)]
        positions: Vec<String>,

        /// Scene name; the output is {name}_combined.<format>
        #[arg(long, default_value = "scene")]
        name: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Mesh format (ply, obj)
        #[arg(long, default_value = "ply")]
        format: String,
    },

    /// Save a colour-mapped preview of a depth map
    DepthVis {
        /// Grayscale depth map
        depth: PathBuf,

        /// Preview name; the output is {name}_depth.png
        #[arg(long, default_value = "output")]
        name: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Describe an exported file or mesh
    Info {
        /// Animation, image or mesh file
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Reconstruct {
            image,
            depth,
            mask,
            job,
            output_dir,
            config,
            method,
            focal_factor,
            poisson_depth,
            formats,
            turntable,
        } => {
            let mut config = match config {
                Some(path) => PipelineConfig::from_json_file(&path)?,
                None => PipelineConfig::default(),
            };
            if let Some(method) = method {
                config.method = method.parse::<ReconstructionMethod>()?;
            }
            if let Some(focal_factor) = focal_factor {
                config.focal_factor = focal_factor;
            }
            if let Some(depth) = poisson_depth {
                config.poisson.depth = depth;
            }
            if let Some(formats) = formats {
                config.mesh_formats = formats.iter().map(|f| f.parse::<MeshFormat>()).collect::<Result<Vec<_>, _>>()?;
            }
            reconstruct(&image, &depth, mask.as_deref(), &job, &output_dir, &config, turntable)
        }
        Commands::Turntable {
            meshes,
            output,
            frames,
            duration,
            width,
            height,
            format,
        } => {
            format.parse::<AnimationFormat>()?.ensure_supported()?;
            let config = mesh_turntable::TurntableConfig::default()
                .with_frames(frames)
                .with_frame_duration(duration)
                .with_resolution(width, height);
            let report = create_turntable(&meshes, &output, &config).context("turntable failed")?;
            println!("{report}");
            Ok(())
        }
        Commands::Orbit {
            meshes,
            output,
            frames,
            radius,
            elevation,
            width,
            height,
            format,
        } => {
            let format = format.parse::<AnimationFormat>()?;
            let config = OrbitConfig::default()
                .with_frames(frames)
                .with_orbit_radius(radius)
                .with_elevation(elevation)
                .with_resolution(width, height);
            let report = create_orbit(&meshes, &output, &config, format).context("orbit failed")?;
            println!("{report}");
            Ok(())
        }
        Commands::Compose {
            meshes,
            scales,
            positions,
            name,
            output_dir,
            format,
        } => {
            let format = format.parse::<MeshFormat>()?;
            if scales.len() > meshes.len() || positions.len() > meshes.len() {
                bail!("more scales or positions than meshes");
            }
            let positions = positions.iter().map(|p| parse_position(p)).collect::<Result<Vec<_>>>()?;
            let files: Vec<SceneFile> = meshes
                .iter()
                .enumerate()
                .map(|(i, path)| {
                    let mut file = SceneFile::new(path);
                    file.scale = scales.get(i).copied();
                    file.translation = positions.get(i).copied();
                    file
                })
                .collect();
            let report = compose_files(&files, &output_dir, &name, format).context("composition failed")?;
            println!("{report}");
            Ok(())
        }
        Commands::DepthVis { depth, name, output_dir } => {
            let depth = load_depth_map(&depth)?;
            let path = mesh_depth::save_depth_visualization(&depth, &output_dir, &name)
                .context("cannot save depth preview")?;
            println!("{}", path.display());
            Ok(())
        }
        Commands::Info { path } => describe(&path),
    }
}

fn reconstruct(
    image: &Path,
    depth: &Path,
    mask: Option<&Path>,
    job: &str,
    output_dir: &Path,
    config: &PipelineConfig,
    turntable: bool,
) -> Result<()> {
    config.validate()?;
    let image = load_image(image)?;
    let depth = load_depth_map(depth)?;
    let mask = mask.map(load_mask).transpose()?;

    let result = reconstruct_job(job, &image, &depth, mask.as_ref(), output_dir, config)
        .map_err(|e| anyhow::anyhow!("job {job} failed [{}]: {}", e.kind(), e.message()))?;
    print!("{result}");

    if turntable {
        let mesh = result
            .mesh_paths
            .first()
            .context("no mesh was written")?;
        let output = output_dir.join(format!("{job}.gif"));
        let report = create_turntable(&[mesh], &output, &config.turntable).context("turntable failed")?;
        println!("  turntable: {report}");
    }
    Ok(())
}

fn parse_position(token: &str) -> Result<nalgebra::Vector3<f64>> {
    let values = token
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("invalid position '{token}'"))?;
    match values.as_slice() {
        &[x, y, z] => Ok(nalgebra::Vector3::new(x, y, z)),
        _ => bail!("position '{token}' must have three components"),
    }
}

fn describe(path: &Path) -> Result<()> {
    if MeshFormat::from_path(path).is_some() {
        let mesh = mesh_io::load_mesh(path).with_context(|| format!("cannot load {}", path.display()))?;
        info!(path = %path.display(), "mesh loaded");
        println!(
            "{}: {} vertices, {} faces",
            path.display(),
            mesh.vertices.len(),
            mesh.faces.len()
        );
        println!("  bounds: {}", mesh.bounds().report());
        if let Some(center) = mesh.centroid() {
            println!("  centroid: ({:.4}, {:.4}, {:.4})", center.x, center.y, center.z);
        }
        return Ok(());
    }
    let info = export_info(path).with_context(|| format!("cannot inspect {}", path.display()))?;
    println!("{info}");
    Ok(())
}
