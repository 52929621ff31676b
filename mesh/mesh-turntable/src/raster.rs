//! Z-buffered software rasterization of coloured triangle meshes.
//!
//! Each triangle is flat-lit with a two-sided Lambert term from a light
//! just above the camera, plus ambient, and its vertex colours are
//! interpolated across it. Uncoloured vertices are drawn light gray on a
//! white background.

use image::{Rgb, RgbImage};
use mesh_types::{IndexedMesh, Vertex, VertexColor};
use nalgebra::{Isometry3, Matrix4, Perspective3, Point3, Vector3};

use crate::error::RenderFrameError;

/// Vertical field of view used when framing a mesh.
pub(crate) const DEFAULT_FOV_Y: f64 = std::f64::consts::FRAC_PI_4;

/// Extra room around the bounding sphere when framing.
const FRAME_MARGIN: f64 = 1.1;

const AMBIENT: f64 = 0.3;
const DIFFUSE: f64 = 0.7;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// A perspective camera with its output resolution.
#[derive(Debug, Clone)]
pub(crate) struct Camera {
    eye: Point3<f64>,
    target: Point3<f64>,
    view_projection: Matrix4<f64>,
    width: u32,
    height: u32,
}

impl Camera {
    /// Camera at `eye` looking at `target`, Y up, whose clip range covers a
    /// sphere of `radius` around `target`.
    pub(crate) fn looking_at(
        eye: Point3<f64>,
        target: Point3<f64>,
        radius: f64,
        fov_y: f64,
        width: u32,
        height: u32,
    ) -> Self {
        let distance = (eye - target).norm();
        let znear = (distance - radius * 1.2).max(distance * 0.01).max(1e-6);
        let zfar = (distance + radius * 1.2).max(znear * 2.0);
        let view = Isometry3::look_at_rh(&eye, &target, &Vector3::y());
        let projection = Perspective3::new(f64::from(width) / f64::from(height), fov_y, znear, zfar);
        Self {
            eye,
            target,
            view_projection: projection.to_homogeneous() * view.to_homogeneous(),
            width,
            height,
        }
    }

    /// Camera on the +Z side of `center` that fits a sphere of `radius` in
    /// view. A degenerate radius frames a unit sphere.
    pub(crate) fn framing(center: Point3<f64>, radius: f64, width: u32, height: u32) -> Self {
        let radius = if radius.is_finite() && radius > 0.0 { radius } else { 1.0 };
        let aspect = f64::from(width) / f64::from(height);
        let half_y = DEFAULT_FOV_Y / 2.0;
        let half_x = (half_y.tan() * aspect).atan();
        let distance = radius / half_y.min(half_x).sin() * FRAME_MARGIN;
        Self::looking_at(center + Vector3::z() * distance, center, radius, DEFAULT_FOV_Y, width, height)
    }

    /// Direction towards the light: from the target to the camera, tilted up.
    fn light_direction(&self) -> Vector3<f64> {
        let view = (self.eye - self.target).try_normalize(1e-12).unwrap_or_else(Vector3::z);
        (view + Vector3::y() * 0.5).normalize()
    }

    /// Screen position (pixels, y down) and NDC depth, or `None` if the
    /// point is behind the camera or outside the depth range.
    fn to_screen(&self, p: &Point3<f64>) -> Option<ScreenPoint> {
        let clip = self.view_projection * p.to_homogeneous();
        if clip.w <= 1e-12 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        if !(-1.0..=1.0).contains(&ndc.z) {
            return None;
        }
        Some(ScreenPoint {
            x: (ndc.x + 1.0) / 2.0 * f64::from(self.width),
            y: (1.0 - ndc.y) / 2.0 * f64::from(self.height),
            z: ndc.z,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct ScreenPoint {
    x: f64,
    y: f64,
    z: f64,
}

/// Radius of the smallest sphere around `center` containing every vertex.
pub(crate) fn bounding_radius(mesh: &IndexedMesh, center: &Point3<f64>) -> f64 {
    mesh.vertices
        .iter()
        .map(|v| (v.position - center).norm())
        .fold(0.0, f64::max)
}

/// Draws `mesh` as seen by `camera`.
pub(crate) fn render_mesh(mesh: &IndexedMesh, camera: &Camera) -> Result<RgbImage, RenderFrameError> {
    if mesh.faces.is_empty() {
        return Err(RenderFrameError::NoTriangles);
    }
    if let Some(index) = mesh
        .vertices
        .iter()
        .position(|v| !v.position.coords.iter().all(|c| c.is_finite()))
    {
        return Err(RenderFrameError::NonFiniteVertex { index });
    }

    let screen: Vec<Option<ScreenPoint>> = mesh.vertices.iter().map(|v| camera.to_screen(&v.position)).collect();
    let light = camera.light_direction();
    let mut frame = FrameBuffer::new(camera.width, camera.height);

    for (face_index, face) in mesh.faces.iter().enumerate() {
        let vertices = face
            .iter()
            .map(|&i| mesh.vertices.get(i as usize))
            .collect::<Option<Vec<&Vertex>>>()
            .ok_or(RenderFrameError::DanglingIndex { face: face_index })?;
        let Some(corners) = face
            .iter()
            .map(|&i| screen[i as usize])
            .collect::<Option<Vec<ScreenPoint>>>()
        else {
            continue;
        };

        let normal = (vertices[1].position - vertices[0].position)
            .cross(&(vertices[2].position - vertices[0].position));
        let Some(normal) = normal.try_normalize(1e-20) else {
            continue;
        };
        let shade = DIFFUSE.mul_add(normal.dot(&light).abs(), AMBIENT);
        let colors = [0, 1, 2].map(|k| base_color(vertices[k]) * shade);

        frame.fill_triangle([corners[0], corners[1], corners[2]], colors);
    }

    Ok(frame.image)
}

fn base_color(vertex: &Vertex) -> Vector3<f64> {
    let c = vertex.attributes.color.unwrap_or(VertexColor::LIGHT_GRAY);
    Vector3::new(f64::from(c.r), f64::from(c.g), f64::from(c.b))
}

struct FrameBuffer {
    image: RgbImage,
    depth: Vec<f64>,
}

impl FrameBuffer {
    fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, BACKGROUND),
            depth: vec![f64::INFINITY; width as usize * height as usize],
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn fill_triangle(&mut self, [a, b, c]: [ScreenPoint; 3], colors: [Vector3<f64>; 3]) {
        let area = edge(&a, &b, c.x, c.y);
        if area.abs() < 1e-12 {
            return;
        }
        let (width, height) = self.image.dimensions();
        let max_x = f64::from(width - 1);
        let max_y = f64::from(height - 1);
        let lo_x = a.x.min(b.x).min(c.x).floor();
        let hi_x = a.x.max(b.x).max(c.x).ceil();
        let lo_y = a.y.min(b.y).min(c.y).floor();
        let hi_y = a.y.max(b.y).max(c.y).ceil();
        if hi_x < 0.0 || hi_y < 0.0 || lo_x > max_x || lo_y > max_y {
            return;
        }

        for y in lo_y.max(0.0) as u32..=hi_y.min(max_y) as u32 {
            for x in lo_x.max(0.0) as u32..=hi_x.min(max_x) as u32 {
                let (px, py) = (f64::from(x) + 0.5, f64::from(y) + 0.5);
                let w0 = edge(&b, &c, px, py) / area;
                let w1 = edge(&c, &a, px, py) / area;
                let w2 = edge(&a, &b, px, py) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let z = w0 * a.z + w1 * b.z + w2 * c.z;
                let slot = y as usize * width as usize + x as usize;
                if z >= self.depth[slot] {
                    continue;
                }
                self.depth[slot] = z;

                let color = colors[0] * w0 + colors[1] * w1 + colors[2] * w2;
                let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
                self.image.put_pixel(x, y, Rgb([channel(color.x), channel(color.y), channel(color.z)]));
            }
        }
    }
}

/// Twice the signed area of `(a, b, p)`.
fn edge(a: &ScreenPoint, b: &ScreenPoint, px: f64, py: f64) -> f64 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::{unit_cube, Vertex};

    fn framed(mesh: &IndexedMesh, width: u32, height: u32) -> Camera {
        let center = mesh.centroid().unwrap();
        Camera::framing(center, bounding_radius(mesh, &center), width, height)
    }

    #[test]
    fn cube_covers_the_center_and_not_the_corners() {
        let cube = unit_cube();
        let image = render_mesh(&cube, &framed(&cube, 64, 48)).unwrap();

        assert_ne!(*image.get_pixel(32, 24), BACKGROUND);
        assert_eq!(*image.get_pixel(0, 0), BACKGROUND);
        assert_eq!(*image.get_pixel(63, 47), BACKGROUND);
    }

    #[test]
    fn vertex_colours_are_shaded_not_replaced() {
        let mut cube = unit_cube();
        for v in &mut cube.vertices {
            v.attributes.color = Some(VertexColor::new(255, 0, 0));
        }
        let image = render_mesh(&cube, &framed(&cube, 40, 40)).unwrap();
        let Rgb([r, g, b]) = *image.get_pixel(20, 20);
        assert!(r > 70);
        assert_eq!((g, b), (0, 0));
    }

    #[test]
    fn nearer_triangle_wins() {
        let red = VertexColor::new(255, 0, 0);
        let blue = VertexColor::new(0, 0, 255);
        let tri = |z: f64, color: VertexColor| {
            [
                Vertex::from_coords(-1.0, -1.0, z).with_color(color),
                Vertex::from_coords(1.0, -1.0, z).with_color(color),
                Vertex::from_coords(0.0, 1.0, z).with_color(color),
            ]
        };
        let mut vertices = tri(0.0, blue).to_vec();
        vertices.extend(tri(0.5, red));
        // Draw the far triangle last so the depth test has to reject it
        let mesh = IndexedMesh::from_parts(vertices, vec![[3, 4, 5], [0, 1, 2]]);

        let camera = Camera::looking_at(Point3::new(0.0, 0.0, 5.0), Point3::origin(), 2.0, DEFAULT_FOV_Y, 32, 32);
        let Rgb([r, _, b]) = *render_mesh(&mesh, &camera).unwrap().get_pixel(16, 18);
        assert!(r > 0);
        assert_eq!(b, 0);
    }

    #[test]
    fn unusable_meshes_are_frame_errors() {
        let camera = Camera::framing(Point3::origin(), 1.0, 8, 8);
        assert_eq!(
            render_mesh(&IndexedMesh::new(), &camera).unwrap_err(),
            RenderFrameError::NoTriangles
        );

        let mut cube = unit_cube();
        cube.vertices[2].position.x = f64::NAN;
        assert_eq!(
            render_mesh(&cube, &camera).unwrap_err(),
            RenderFrameError::NonFiniteVertex { index: 2 }
        );

        let mut dangling = unit_cube();
        dangling.faces.push([0, 1, 99]);
        assert!(matches!(
            render_mesh(&dangling, &camera),
            Err(RenderFrameError::DanglingIndex { .. })
        ));
    }

    #[test]
    fn bounding_radius_of_cube() {
        let cube = unit_cube();
        let center = cube.centroid().unwrap();
        approx::assert_relative_eq!(bounding_radius(&cube, &center), 3f64.sqrt() / 2.0, epsilon = 1e-12);
    }
}
