//! Wavefront OBJ export.
//!
//! Writes one `v x y z` line per vertex and one `f` line per face with
//! 1-based indices, all under a single `g skin` group. Faces keep their
//! degree, so quads from skinning or subdivision stay quads.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::Result;
use crate::mesh::HalfEdgeMesh;

/// Write indexed polygons as OBJ.
pub fn write_polygons<W: Write>(
    writer: &mut W,
    positions: &[Point3<f64>],
    polygons: &[Vec<usize>],
) -> Result<()> {
    writeln!(writer, "# Generated by bonemesh")?;
    for p in positions {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    writeln!(writer, "g skin")?;
    for polygon in polygons {
        write!(writer, "f")?;
        for &i in polygon {
            write!(writer, " {}", i + 1)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Write a mesh as OBJ.
pub fn write<W: Write>(writer: &mut W, mesh: &HalfEdgeMesh) -> Result<()> {
    let (positions, polygons) = mesh.to_polygons();
    write_polygons(writer, &positions, &polygons)
}

/// Save a mesh to an OBJ file.
///
/// # Example
///
/// ```no_run
/// use bonemesh::io::obj;
/// use bonemesh::mesh::HalfEdgeMesh;
///
/// let mesh = HalfEdgeMesh::new();
/// obj::save(&mesh, "skin.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>>(mesh: &HalfEdgeMesh, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write(&mut writer, mesh)?;
    writer.flush()?;
    log::info!(
        "wrote {} vertices and {} faces to {}",
        mesh.num_vertices(),
        mesh.num_faces(),
        path.as_ref().display()
    );
    Ok(())
}
