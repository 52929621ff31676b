//! Per-vertex colour from the source image.
//!
//! Each vertex is projected back through the camera that lifted the points
//! and takes the colour of the nearest pixel. Vertices too close to the
//! camera plane to project get neutral gray.

use image::RgbImage;
use mesh_types::{IndexedMesh, VertexColor};
use rayon::prelude::*;
use sensor_types::{CameraIntrinsics, SensorError};
use tracing::{debug, warn};

use crate::error::DepthResult;

/// Colours every vertex of `mesh` from `image`.
///
/// Returns the number of vertices that fell back to
/// [`VertexColor::NEUTRAL_GRAY`].
///
/// # Errors
///
/// Returns [`DepthError::Sensor`](crate::DepthError::Sensor) if `image` is
/// not on the grid `intrinsics` describes.
///
/// # Example
///
/// ```
/// use image::{Rgb, RgbImage};
/// use mesh_depth::texturize_mesh;
/// use mesh_types::{IndexedMesh, Vertex, VertexColor};
/// use sensor_types::CameraIntrinsics;
///
/// let intrinsics = CameraIntrinsics::from_image_size(4, 4, 0.7).unwrap();
/// let image = RgbImage::from_pixel(4, 4, Rgb([0, 0, 255]));
/// let mut mesh = IndexedMesh::from_parts(vec![Vertex::new(intrinsics.deproject(1.0, 2.0, 1.0))], vec![]);
///
/// let gray = texturize_mesh(&mut mesh, &image, &intrinsics).unwrap();
/// assert_eq!(gray, 0);
/// assert_eq!(mesh.vertices[0].attributes.color, Some(VertexColor::new(0, 0, 255)));
/// ```
pub fn texturize_mesh(
    mesh: &mut IndexedMesh,
    image: &RgbImage,
    intrinsics: &CameraIntrinsics,
) -> DepthResult<usize> {
    let grid = (intrinsics.width, intrinsics.height);
    if image.dimensions() != grid {
        return Err(SensorError::dimension_mismatch(grid, image.dimensions()).into());
    }

    let fallbacks: usize = mesh
        .vertices
        .par_iter_mut()
        .map(|vertex| {
            let (color, fallback) = match intrinsics.project_clamped(&vertex.position) {
                Some((u, v)) => {
                    let [r, g, b] = image.get_pixel(u, v).0;
                    (VertexColor::new(r, g, b), 0)
                }
                None => (VertexColor::NEUTRAL_GRAY, 1),
            };
            vertex.attributes.color = Some(color);
            fallback
        })
        .sum();

    if fallbacks > 0 {
        warn!(fallbacks, "vertices too close to the camera plane were coloured gray");
    }
    debug!(vertices = mesh.vertices.len(), "mesh texturized");
    Ok(fallbacks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DepthError;
    use image::Rgb;
    use mesh_types::Vertex;
    use nalgebra::Point3;

    fn quadrants() -> RgbImage {
        RgbImage::from_fn(10, 10, |x, y| match (x < 5, y < 5) {
            (true, true) => Rgb([255, 0, 0]),
            (false, true) => Rgb([0, 255, 0]),
            (true, false) => Rgb([0, 0, 255]),
            (false, false) => Rgb([255, 255, 0]),
        })
    }

    #[test]
    fn vertices_take_the_pixel_they_project_to() {
        let intrinsics = CameraIntrinsics::from_image_size(10, 10, 0.7).unwrap();
        let vertices = vec![
            Vertex::new(intrinsics.deproject(1.0, 1.0, 0.5)),
            Vertex::new(intrinsics.deproject(8.2, 1.0, 2.0)),
            Vertex::new(intrinsics.deproject(2.0, 9.0, 1.0)),
            Vertex::new(intrinsics.deproject(7.0, 7.0, 1.0)),
        ];
        let mut mesh = IndexedMesh::from_parts(vertices, vec![[0, 1, 2], [1, 3, 2]]);

        assert_eq!(texturize_mesh(&mut mesh, &quadrants(), &intrinsics).unwrap(), 0);
        let colors: Vec<_> = mesh.vertices.iter().map(|v| v.attributes.color.unwrap()).collect();
        assert_eq!(colors[0], VertexColor::new(255, 0, 0));
        assert_eq!(colors[1], VertexColor::new(0, 255, 0));
        assert_eq!(colors[2], VertexColor::new(0, 0, 255));
        assert_eq!(colors[3], VertexColor::new(255, 255, 0));
    }

    #[test]
    fn out_of_frame_vertices_clamp_to_the_border() {
        let intrinsics = CameraIntrinsics::from_image_size(10, 10, 0.7).unwrap();
        let mut mesh = IndexedMesh::from_parts(vec![Vertex::new(intrinsics.deproject(-40.0, 60.0, 1.0))], vec![]);
        texturize_mesh(&mut mesh, &quadrants(), &intrinsics).unwrap();
        // Clamped to (0, 9): bottom-left quadrant
        assert_eq!(mesh.vertices[0].attributes.color, Some(VertexColor::new(0, 0, 255)));
    }

    #[test]
    fn vertices_on_the_camera_plane_are_gray() {
        let intrinsics = CameraIntrinsics::from_image_size(10, 10, 0.7).unwrap();
        let mut mesh = IndexedMesh::from_parts(
            vec![
                Vertex::new(Point3::new(0.3, 0.2, 0.0)),
                Vertex::new(Point3::new(0.0, 0.0, -1.0)),
            ],
            vec![],
        );
        assert_eq!(texturize_mesh(&mut mesh, &quadrants(), &intrinsics).unwrap(), 1);
        assert_eq!(mesh.vertices[0].attributes.color, Some(VertexColor::NEUTRAL_GRAY));
        assert_ne!(mesh.vertices[1].attributes.color, Some(VertexColor::NEUTRAL_GRAY));
    }

    #[test]
    fn image_must_match_the_camera_grid() {
        let intrinsics = CameraIntrinsics::from_image_size(20, 10, 0.7).unwrap();
        let mut mesh = IndexedMesh::new();
        assert!(matches!(
            texturize_mesh(&mut mesh, &quadrants(), &intrinsics),
            Err(DepthError::Sensor(_))
        ));
    }
}
