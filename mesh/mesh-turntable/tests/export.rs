//! Export tests: meshes on disk in, looping GIFs out.

use std::fs::File;
use std::io::BufReader;

use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;
use mesh_turntable::{
    create_orbit, create_turntable, export_info, AnimationFormat, OrbitConfig, RenderError, TurntableConfig,
};
use mesh_types::{unit_cube, IndexedMesh, Vertex, VertexColor};

fn decoded_frames(path: &std::path::Path) -> Vec<image::Frame> {
    let decoder = GifDecoder::new(BufReader::new(File::open(path).unwrap())).unwrap();
    decoder.into_frames().collect_frames().unwrap()
}

#[test]
fn turntable_from_two_ply_files() {
    let dir = tempfile::tempdir().unwrap();
    let cube_path = dir.path().join("cube.ply");
    let tri_path = dir.path().join("tri.ply");

    let mut cube = unit_cube();
    for v in &mut cube.vertices {
        v.attributes.color = Some(VertexColor::new(0, 160, 0));
    }
    mesh_io::save_ply(&cube, &cube_path, true).unwrap();
    let tri = IndexedMesh::from_parts(
        vec![
            Vertex::from_coords(1.5, 0.0, 0.0),
            Vertex::from_coords(2.5, 0.0, 0.0),
            Vertex::from_coords(2.0, 1.0, 0.0),
        ],
        vec![[0, 1, 2]],
    );
    mesh_io::save_ply(&tri, &tri_path, false).unwrap();

    let output = dir.path().join("spin.gif");
    let config = TurntableConfig::default().with_frames(12).with_resolution(64, 48);
    let report = create_turntable(&[&cube_path, &tri_path], &output, &config).unwrap();

    assert_eq!(report.frames, 12);
    assert_eq!(report.placeholders, 0);
    let frames = decoded_frames(&output);
    assert_eq!(frames.len(), 12);
    assert_eq!(frames[0].buffer().dimensions(), (64, 48));

    let info = export_info(&output).unwrap();
    assert_eq!(info.frame_count, Some(12));
    assert_eq!(info.dimensions, Some((64, 48)));
}

#[test]
fn orbit_writes_gif() {
    let dir = tempfile::tempdir().unwrap();
    let mesh_path = dir.path().join("cube.obj");
    mesh_io::save_obj(&unit_cube(), &mesh_path).unwrap();

    let output = dir.path().join("orbit.gif");
    let config = OrbitConfig::default().with_frames(5).with_resolution(40, 40);
    let report = create_orbit(&[&mesh_path], &output, &config, AnimationFormat::Gif).unwrap();

    assert_eq!(report.frames, 5);
    assert_eq!(decoded_frames(&output).len(), 5);
}

#[test]
fn missing_mesh_is_an_error_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("spin.gif");
    let result = create_turntable(
        &[dir.path().join("absent.ply")],
        &output,
        &TurntableConfig::default().with_frames(2),
    );
    assert!(matches!(result, Err(RenderError::Mesh(_))));
    assert!(!output.exists());
}
