//! Full jobs on synthetic inputs: a red disc floating in front of a gray
//! background.

use image::{Rgb, RgbImage};
use mesh_io::MeshFormat;
use mesh_pipeline::{reconstruct_job, ErrorKind, PipelineConfig};
use mesh_scan::{PointCloud, ReconstructionMethod};
use mesh_types::VertexColor;
use sensor_types::{CameraIntrinsics, DepthMap, Mask};

const SIZE: u32 = 100;
const RADIUS: f64 = 30.0;
const CENTER: f64 = 50.0;

fn in_disc(x: f64, y: f64) -> bool {
    (x - CENTER).hypot(y - CENTER) <= RADIUS
}

fn disc_inputs() -> (RgbImage, DepthMap) {
    let image = RgbImage::from_fn(SIZE, SIZE, |x, y| {
        if in_disc(f64::from(x), f64::from(y)) {
            Rgb([220, 20, 20])
        } else {
            Rgb([128, 128, 128])
        }
    });
    let depth = DepthMap::from_fn(SIZE, SIZE, |x, y| {
        if in_disc(f64::from(x), f64::from(y)) {
            1.0
        } else {
            0.0
        }
    })
    .unwrap();
    (image, depth)
}

#[test]
fn disc_job_keeps_only_disc_pixels_and_colours_only_disc_vertices() {
    let dir = tempfile::tempdir().unwrap();
    let (image, depth) = disc_inputs();
    let config = PipelineConfig::default();
    assert_eq!(config.poisson.depth, 9);

    let result = reconstruct_job("disc", &image, &depth, None, dir.path(), &config).unwrap();

    let disc_pixels = (0..SIZE)
        .flat_map(|y| (0..SIZE).map(move |x| (x, y)))
        .filter(|&(x, y)| in_disc(f64::from(x), f64::from(y)))
        .count();
    assert_eq!(result.stats.original_point_count, disc_pixels);
    assert!(result.stats.cleaned_point_count > disc_pixels / 2);
    assert!(result.stats.vertex_count > 0);
    assert!(result.stats.triangle_count > 0);

    let mesh_path = result.mesh_path(MeshFormat::Ply).unwrap();
    let mesh = mesh_io::load_mesh(mesh_path).unwrap();
    assert_eq!(mesh.vertices.len(), result.stats.vertex_count);

    let camera = CameraIntrinsics::from_image_size(SIZE, SIZE, config.focal_factor).unwrap();
    let mut coloured = 0;
    for vertex in &mesh.vertices {
        let color = vertex.attributes.color.unwrap();
        if color.is_gray() {
            continue;
        }
        coloured += 1;
        let (u, v) = camera.project(&vertex.position).unwrap();
        let (u, v) = (u.clamp(0.0, 99.0), v.clamp(0.0, 99.0));
        assert!(
            in_disc(u.trunc(), v.trunc()),
            "vertex coloured {color:?} reprojects outside the disc at ({u:.1}, {v:.1})"
        );
    }
    assert!(coloured > 0);
}

#[test]
fn every_artifact_is_written_with_deterministic_names() {
    let dir = tempfile::tempdir().unwrap();
    let (image, depth) = disc_inputs();
    let config = PipelineConfig::default().with_method(ReconstructionMethod::BallPivoting);

    let result = reconstruct_job("job7", &image, &depth, None, dir.path(), &config).unwrap();

    assert_eq!(result.method, "ball_pivoting");
    assert_eq!(result.point_cloud_path, dir.path().join("job7_pointcloud.ply"));
    assert_eq!(
        result.mesh_paths,
        vec![dir.path().join("job7_mesh.ply"), dir.path().join("job7_mesh.obj")]
    );

    let cloud = PointCloud::load(&result.point_cloud_path).unwrap();
    assert_eq!(cloud.len(), result.stats.cleaned_point_count);
    assert!(cloud.has_normals());
    assert!(cloud.has_colors());

    let obj = mesh_io::load_mesh(result.mesh_path(MeshFormat::Obj).unwrap()).unwrap();
    assert_eq!(obj.faces.len(), result.stats.triangle_count);
    assert!(obj.vertices.iter().any(|v| v.attributes.color == Some(VertexColor::new(220, 20, 20))));
    assert!(result.to_string().contains("job7"));
}

#[test]
fn masked_out_disc_is_degenerate() {
    let dir = tempfile::tempdir().unwrap();
    let (image, depth) = disc_inputs();
    let mask = Mask::from_fn(SIZE, SIZE, |x, _| x < 5).unwrap();

    let err = reconstruct_job("masked", &image, &depth, Some(&mask), dir.path(), &PipelineConfig::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DegenerateGeometry);
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn smaller_image_is_resampled_onto_the_depth_grid() {
    let dir = tempfile::tempdir().unwrap();
    let (image, depth) = disc_inputs();
    let half = image::imageops::resize(&image, 50, 50, image::imageops::FilterType::Nearest);

    let result = reconstruct_job("half", &half, &depth, None, dir.path(), &PipelineConfig::default()).unwrap();
    assert!(result.stats.triangle_count > 0);
}
