//! Wavefront OBJ support.
//!
//! Vertex colors use the widely supported `v x y z r g b` extension with
//! channels in `[0, 1]`. Normals are written as `vn` records and referenced
//! from faces with the `v//vn` syntax.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use mesh_types::{IndexedMesh, Vector3, Vertex, VertexColor};

use crate::atomic::write_atomic;
use crate::error::{IoError, IoResult};

/// Load a mesh from an OBJ file.
///
/// Polygons are fan-triangulated. Texture coordinates, groups and
/// materials are ignored. Negative (relative) indices are supported.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a number fails to parse, or
/// a face references a vertex that does not exist.
pub fn load_obj<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::on_open(path, e))?;
    let reader = BufReader::new(file);

    let mut mesh = IndexedMesh::new();
    let mut normals: Vec<Vector3<f64>> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let values = tokens
                    .map(str::parse::<f64>)
                    .collect::<Result<Vec<_>, _>>()?;
                if values.len() < 3 {
                    return Err(IoError::invalid_content(format!(
                        "line {}: vertex needs 3 coordinates",
                        line_no + 1
                    )));
                }
                let mut vertex = Vertex::from_coords(values[0], values[1], values[2]);
                if values.len() >= 6 {
                    #[allow(clippy::cast_possible_truncation)]
                    let color = VertexColor::from_float(
                        values[3] as f32,
                        values[4] as f32,
                        values[5] as f32,
                    );
                    vertex.attributes.color = Some(color);
                }
                mesh.vertices.push(vertex);
            }
            Some("vn") => {
                let values = tokens
                    .map(str::parse::<f64>)
                    .collect::<Result<Vec<_>, _>>()?;
                if values.len() != 3 {
                    return Err(IoError::invalid_content(format!(
                        "line {}: normal needs 3 components",
                        line_no + 1
                    )));
                }
                normals.push(Vector3::new(values[0], values[1], values[2]));
            }
            Some("f") => {
                let mut corners = Vec::with_capacity(4);
                for token in tokens {
                    let (v, n) = parse_corner(token, mesh.vertices.len(), normals.len())
                        .map_err(|e| annotate(e, line_no))?;
                    if let Some(n) = n {
                        mesh.vertices[v].attributes.normal = Some(normals[n]);
                    }
                    corners.push(v);
                }
                if corners.len() < 3 {
                    return Err(IoError::invalid_content(format!(
                        "line {}: face needs at least 3 vertices",
                        line_no + 1
                    )));
                }
                #[allow(clippy::cast_possible_truncation)]
                for i in 1..corners.len() - 1 {
                    mesh.faces
                        .push([corners[0] as u32, corners[i] as u32, corners[i + 1] as u32]);
                }
            }
            _ => {}
        }
    }

    Ok(mesh)
}

fn annotate(err: IoError, line_no: usize) -> IoError {
    match err {
        IoError::InvalidContent { message } => {
            IoError::invalid_content(format!("line {}: {message}", line_no + 1))
        }
        other => other,
    }
}

/// Parse one `v`, `v/vt`, `v//vn` or `v/vt/vn` face corner into zero-based
/// vertex and optional normal indices.
fn parse_corner(
    token: &str,
    vertex_count: usize,
    normal_count: usize,
) -> IoResult<(usize, Option<usize>)> {
    let mut parts = token.split('/');
    let v = resolve_index(parts.next().unwrap_or(""), vertex_count)?;
    let _texture = parts.next();
    let n = match parts.next() {
        Some(s) if !s.is_empty() => Some(resolve_index(s, normal_count)?),
        _ => None,
    };
    Ok((v, n))
}

#[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
fn resolve_index(token: &str, count: usize) -> IoResult<usize> {
    let raw: i64 = token.parse()?;
    let index = match raw {
        0 => None,
        r if r > 0 => Some(r as usize - 1),
        r => (count as i64 + r).try_into().ok(),
    };
    index
        .filter(|&i| i < count)
        .ok_or_else(|| IoError::invalid_content(format!("index {raw} out of range ({count})")))
}

/// Save a mesh to an OBJ file.
///
/// Vertex colors and normals are written when present. The file is written
/// atomically.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_obj<P: AsRef<Path>>(mesh: &IndexedMesh, path: P) -> IoResult<()> {
    write_atomic(path, |writer| write_obj(mesh, writer))
}

fn write_obj<W: Write>(mesh: &IndexedMesh, writer: &mut W) -> IoResult<()> {
    let colors = mesh.has_colors();
    let normals = mesh.has_normals();

    writeln!(writer, "# Generated by mesh-io")?;
    writeln!(
        writer,
        "# {} vertices, {} faces",
        mesh.vertices.len(),
        mesh.faces.len()
    )?;

    for v in &mesh.vertices {
        let p = v.position;
        if colors {
            let (r, g, b) = v
                .attributes
                .color
                .unwrap_or(VertexColor::NEUTRAL_GRAY)
                .to_float();
            writeln!(writer, "v {} {} {} {r:.6} {g:.6} {b:.6}", p.x, p.y, p.z)?;
        } else {
            writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
        }
    }

    if normals {
        for v in &mesh.vertices {
            let n = v.attributes.normal.unwrap_or_else(Vector3::zeros);
            writeln!(writer, "vn {} {} {}", n.x, n.y, n.z)?;
        }
    }

    for &[a, b, c] in &mesh.faces {
        let (a, b, c) = (a + 1, b + 1, c + 1);
        if normals {
            writeln!(writer, "f {a}//{a} {b}//{b} {c}//{c}")?;
        } else {
            writeln!(writer, "f {a} {b} {c}")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::{unit_cube, MeshTopology};

    #[test]
    fn roundtrip_colored_mesh() {
        let mut original = unit_cube();
        for (i, v) in original.vertices.iter_mut().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let level = (i * 30) as u8;
            v.attributes.color = Some(VertexColor::new(level, 255 - level, 7));
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.obj");
        save_obj(&original, &path).unwrap();

        let loaded = load_obj(&path).unwrap();
        assert_eq!(loaded.vertex_count(), 8);
        assert_eq!(loaded.faces, original.faces);
        for (a, b) in original.vertices.iter().zip(&loaded.vertices) {
            assert!((a.position - b.position).norm() < 1e-12);
            assert_eq!(a.attributes.color, b.attributes.color);
        }
    }

    #[test]
    fn roundtrip_normals() {
        let mut original = unit_cube();
        for v in &mut original.vertices {
            v.attributes.normal = Some(Vector3::y());
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube_n.obj");
        save_obj(&original, &path).unwrap();

        let loaded = load_obj(&path).unwrap();
        assert!(loaded
            .vertices
            .iter()
            .all(|v| v.attributes.normal == Some(Vector3::y())));
    }

    #[test]
    fn parses_quads_and_relative_indices() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.obj");
        std::fs::write(
            &path,
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvt 0 0\nf 1/1 2/1 3/1 4/1\nf -4 -3 -2\n",
        )
        .unwrap();

        let mesh = load_obj(&path).unwrap();
        assert_eq!(mesh.face_count(), 3);
        assert_eq!(mesh.faces[0], [0, 1, 2]);
        assert_eq!(mesh.faces[1], [0, 2, 3]);
        assert_eq!(mesh.faces[2], [0, 1, 2]);
        assert!(!mesh.has_colors());
    }

    #[test]
    fn rejects_out_of_range_face() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.obj");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nf 1 2 3\n").unwrap();
        let err = load_obj(&path).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn rejects_malformed_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.obj");
        std::fs::write(&path, "v 0 zero 0\n").unwrap();
        assert!(matches!(load_obj(&path), Err(IoError::ParseFloat(_))));
    }
}
