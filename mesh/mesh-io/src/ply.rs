//! PLY (Polygon File Format) support.
//!
//! # Supported Properties
//!
//! - Vertex positions (x, y, z) - required
//! - Vertex normals (nx, ny, nz) - optional
//! - Vertex colors (red, green, blue) as `uchar` or `float` - optional
//! - Face vertex indices (`vertex_indices` or `vertex_index`)
//!
//! A file with no `face` element loads as a vertex-only mesh, which is how
//! point clouds are stored.
//!
//! # Example
//!
//! ```no_run
//! use mesh_io::{load_ply, save_ply};
//!
//! let mesh = load_ply("model.ply").unwrap();
//! save_ply(&mesh, "output.ply", true).unwrap(); // Binary
//! ```

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use mesh_types::{IndexedMesh, Vector3, Vertex, VertexColor};
use ply_rs::parser::Parser;
use ply_rs::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs::writer::Writer;

use crate::atomic::write_atomic;
use crate::error::{IoError, IoResult};

const PLY_COMMENT: &str = "Generated by mesh-io";

/// Load a mesh from a PLY file.
///
/// Supports ASCII, binary little-endian, and binary big-endian formats.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The file is not valid PLY format
/// - A face references a vertex that does not exist
pub fn load_ply<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::on_open(path, e))?;
    let mut reader = BufReader::new(file);

    let parser = Parser::<DefaultElement>::new();
    let header = parser
        .read_header(&mut reader)
        .map_err(|e| IoError::invalid_content(format!("failed to parse PLY header: {e}")))?;
    let payload = parser
        .read_payload(&mut reader, &header)
        .map_err(|e| IoError::invalid_content(format!("failed to read PLY payload: {e}")))?;

    let mut mesh = IndexedMesh::new();

    if let Some(vertex_elements) = payload.get("vertex") {
        mesh.vertices.reserve(vertex_elements.len());
        for element in vertex_elements {
            let coord = |key| get_float_property(element, key).unwrap_or(0.0);
            let mut vertex = Vertex::from_coords(coord("x"), coord("y"), coord("z"));
            if let (Some(nx), Some(ny), Some(nz)) = (
                get_float_property(element, "nx"),
                get_float_property(element, "ny"),
                get_float_property(element, "nz"),
            ) {
                vertex.attributes.normal = Some(Vector3::new(nx, ny, nz));
            }
            vertex.attributes.color = get_color(element);
            mesh.vertices.push(vertex);
        }
    }

    if let Some(face_elements) = payload.get("face") {
        mesh.faces.reserve(face_elements.len());
        for element in face_elements {
            let indices = get_index_list(element);
            if indices.len() < 3 {
                continue;
            }
            if let Some(&bad) = indices.iter().find(|&&i| i >= mesh.vertices.len()) {
                return Err(IoError::invalid_content(format!(
                    "face references vertex {bad} but only {} exist",
                    mesh.vertices.len()
                )));
            }
            // Fan triangulation for polygons
            #[allow(clippy::cast_possible_truncation)]
            for i in 1..indices.len() - 1 {
                mesh.faces
                    .push([indices[0] as u32, indices[i] as u32, indices[i + 1] as u32]);
            }
        }
    }

    Ok(mesh)
}

fn get_float_property(element: &DefaultElement, key: &str) -> Option<f64> {
    match element.get(key)? {
        Property::Float(v) => Some(f64::from(*v)),
        Property::Double(v) => Some(*v),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn get_color(element: &DefaultElement) -> Option<VertexColor> {
    let channel = |key: &str| match element.get(key)? {
        Property::UChar(v) => Some(*v),
        Property::Float(v) => Some(VertexColor::from_float(*v, *v, *v).r),
        Property::Double(v) => {
            let v = *v as f32;
            Some(VertexColor::from_float(v, v, v).r)
        }
        _ => None,
    };
    Some(VertexColor::new(
        channel("red")?,
        channel("green")?,
        channel("blue")?,
    ))
}

#[allow(clippy::cast_sign_loss)]
fn get_index_list(element: &DefaultElement) -> Vec<usize> {
    for key in &["vertex_indices", "vertex_index"] {
        if let Some(prop) = element.get(*key) {
            return match prop {
                Property::ListInt(v) => v.iter().map(|&i| i as usize).collect(),
                Property::ListUInt(v) => v.iter().map(|&i| i as usize).collect(),
                Property::ListUChar(v) => v.iter().map(|&i| i as usize).collect(),
                Property::ListUShort(v) => v.iter().map(|&i| i as usize).collect(),
                Property::ListShort(v) => v.iter().map(|&i| i as usize).collect(),
                _ => continue,
            };
        }
    }
    Vec::new()
}

/// Save a mesh to a PLY file.
///
/// Normals and colors are written when present on the mesh. The file is
/// written atomically.
///
/// # Arguments
///
/// * `mesh` - The mesh to save
/// * `path` - Output file path
/// * `binary` - If true, save as binary little-endian; if false, save as ASCII
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_ply<P: AsRef<Path>>(mesh: &IndexedMesh, path: P, binary: bool) -> IoResult<()> {
    write_atomic(path, |writer| {
        if binary {
            save_ply_binary(mesh, writer)
        } else {
            save_ply_ascii(mesh, writer)
        }
    })
}

/// Which optional vertex properties a file carries.
#[derive(Debug, Clone, Copy)]
struct VertexLayout {
    normals: bool,
    colors: bool,
}

impl VertexLayout {
    fn of(mesh: &IndexedMesh) -> Self {
        Self {
            normals: mesh.has_normals(),
            colors: mesh.has_colors(),
        }
    }
}

/// Save mesh as binary PLY (little-endian).
///
/// Written by hand: ply-rs writes the element count instead of the list
/// length for binary list properties.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn save_ply_binary<W: Write>(mesh: &IndexedMesh, writer: &mut W) -> IoResult<()> {
    let layout = VertexLayout::of(mesh);

    writeln!(writer, "ply")?;
    writeln!(writer, "format binary_little_endian 1.0")?;
    writeln!(writer, "comment {PLY_COMMENT}")?;
    writeln!(writer, "element vertex {}", mesh.vertices.len())?;
    for axis in ["x", "y", "z"] {
        writeln!(writer, "property float {axis}")?;
    }
    if layout.normals {
        for axis in ["nx", "ny", "nz"] {
            writeln!(writer, "property float {axis}")?;
        }
    }
    if layout.colors {
        for channel in ["red", "green", "blue"] {
            writeln!(writer, "property uchar {channel}")?;
        }
    }
    writeln!(writer, "element face {}", mesh.faces.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for v in &mesh.vertices {
        for c in v.position.coords.iter() {
            writer.write_all(&(*c as f32).to_le_bytes())?;
        }
        if layout.normals {
            let n = v.attributes.normal.unwrap_or_else(Vector3::zeros);
            for c in n.iter() {
                writer.write_all(&(*c as f32).to_le_bytes())?;
            }
        }
        if layout.colors {
            let c = v.attributes.color.unwrap_or(VertexColor::NEUTRAL_GRAY);
            writer.write_all(&[c.r, c.g, c.b])?;
        }
    }

    for face in &mesh.faces {
        writer.write_all(&[3u8])?;
        for &i in face {
            writer.write_all(&(i as i32).to_le_bytes())?;
        }
    }

    Ok(())
}

fn scalar_property(name: &str, scalar: ScalarType) -> PropertyDef {
    PropertyDef::new(name.to_string(), PropertyType::Scalar(scalar))
}

/// Save mesh as ASCII PLY using ply-rs.
#[allow(clippy::cast_possible_truncation)]
fn save_ply_ascii<W: Write>(mesh: &IndexedMesh, writer: &mut W) -> IoResult<()> {
    let layout = VertexLayout::of(mesh);

    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::Ascii;
    ply.header.comments.push(PLY_COMMENT.to_string());

    let mut vertex_def = ElementDef::new("vertex".to_string());
    for axis in ["x", "y", "z"] {
        vertex_def.properties.add(scalar_property(axis, ScalarType::Float));
    }
    if layout.normals {
        for axis in ["nx", "ny", "nz"] {
            vertex_def.properties.add(scalar_property(axis, ScalarType::Float));
        }
    }
    if layout.colors {
        for channel in ["red", "green", "blue"] {
            vertex_def.properties.add(scalar_property(channel, ScalarType::UChar));
        }
    }
    vertex_def.count = mesh.vertices.len();
    ply.header.elements.add(vertex_def);

    let mut face_def = ElementDef::new("face".to_string());
    face_def.properties.add(PropertyDef::new(
        "vertex_indices".to_string(),
        PropertyType::List(ScalarType::UChar, ScalarType::Int),
    ));
    face_def.count = mesh.faces.len();
    ply.header.elements.add(face_def);

    let vertex_elements = mesh
        .vertices
        .iter()
        .map(|v| {
            let mut element = DefaultElement::new();
            element.insert("x".to_string(), Property::Float(v.position.x as f32));
            element.insert("y".to_string(), Property::Float(v.position.y as f32));
            element.insert("z".to_string(), Property::Float(v.position.z as f32));
            if layout.normals {
                let n = v.attributes.normal.unwrap_or_else(Vector3::zeros);
                element.insert("nx".to_string(), Property::Float(n.x as f32));
                element.insert("ny".to_string(), Property::Float(n.y as f32));
                element.insert("nz".to_string(), Property::Float(n.z as f32));
            }
            if layout.colors {
                let c = v.attributes.color.unwrap_or(VertexColor::NEUTRAL_GRAY);
                element.insert("red".to_string(), Property::UChar(c.r));
                element.insert("green".to_string(), Property::UChar(c.g));
                element.insert("blue".to_string(), Property::UChar(c.b));
            }
            element
        })
        .collect();
    ply.payload.insert("vertex".to_string(), vertex_elements);

    let face_elements = mesh
        .faces
        .iter()
        .map(|&[i0, i1, i2]| {
            let mut element = DefaultElement::new();
            #[allow(clippy::cast_possible_wrap)]
            let indices = vec![i0 as i32, i1 as i32, i2 as i32];
            element.insert("vertex_indices".to_string(), Property::ListInt(indices));
            element
        })
        .collect();
    ply.payload.insert("face".to_string(), face_elements);

    Writer::new()
        .write_ply(writer, &mut ply)
        .map_err(|e| IoError::invalid_content(format!("failed to write PLY: {e}")))?;

    Ok(())
}
