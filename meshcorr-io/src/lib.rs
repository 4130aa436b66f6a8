//! I/O operations for vertex lists and correspondence results
//!
//! Mesh files are read as ordered vertex lists only: faces are skipped and
//! never interpreted, since vertex order alone identifies the points being
//! matched. Supported inputs are OFF, COFF and the `v` lines of OBJ files.

pub mod off;
pub mod obj;
pub mod correspondence;

#[cfg(test)]
mod tests;

pub use correspondence::*;

use meshcorr_core::{Error, Point3d, PointCloud3d, Result, Rgba};
use std::io::BufRead;
use std::path::Path;

/// Ordered vertex positions with optional per-vertex RGBA colors
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshVertices {
    pub positions: Vec<Point3d>,
    /// Parallel to `positions` when present
    pub colors: Option<Vec<Rgba>>,
}

impl MeshVertices {
    pub fn new(positions: Vec<Point3d>) -> Self {
        Self {
            positions,
            colors: None,
        }
    }

    pub fn with_colors(positions: Vec<Point3d>, colors: Vec<Rgba>) -> Result<Self> {
        if positions.len() != colors.len() {
            return Err(Error::InvalidData(format!(
                "{} vertices but {} colors",
                positions.len(),
                colors.len()
            )));
        }
        Ok(Self {
            positions,
            colors: Some(colors),
        })
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn colors(&self) -> Option<&[Rgba]> {
        self.colors.as_deref()
    }

    pub fn point_cloud(&self) -> PointCloud3d {
        PointCloud3d::from_points(self.positions.clone())
    }
}

/// Trait for reading vertex lists
pub trait VertexReader {
    fn read_from<R: BufRead>(reader: R) -> Result<MeshVertices>;

    fn read_vertices<P: AsRef<Path>>(path: P) -> Result<MeshVertices> {
        let file = std::fs::File::open(path.as_ref())?;
        let vertices = Self::read_from(std::io::BufReader::new(file))?;
        tracing::debug!(
            path = %path.as_ref().display(),
            vertices = vertices.len(),
            colored = vertices.colors.is_some(),
            "read vertex list"
        );
        Ok(vertices)
    }
}

/// Trait for writing vertex lists
pub trait VertexWriter {
    fn write_to<W: std::io::Write>(vertices: &MeshVertices, writer: W) -> Result<()>;

    fn write_vertices<P: AsRef<Path>>(vertices: &MeshVertices, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        Self::write_to(vertices, std::io::BufWriter::new(file))
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}

/// Auto-detect format and read vertices
pub fn read_vertices<P: AsRef<Path>>(path: P) -> Result<MeshVertices> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("off") => off::OffReader::read_vertices(path),
        Some("obj") => obj::ObjReader::read_vertices(path),
        _ => Err(Error::UnsupportedFormat(format!(
            "Unsupported vertex list format: {:?}",
            path.extension()
        ))),
    }
}

/// Auto-detect format and write vertices
pub fn write_vertices<P: AsRef<Path>>(vertices: &MeshVertices, path: P) -> Result<()> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("off") => off::OffWriter::write_vertices(vertices, path),
        Some("obj") => obj::ObjWriter::write_vertices(vertices, path),
        _ => Err(Error::UnsupportedFormat(format!(
            "Unsupported vertex list format: {:?}",
            path.extension()
        ))),
    }
}

/// Parse one coordinate field, rejecting NaN and infinities
pub(crate) fn parse_coordinate(field: &str, line: usize) -> Result<f64> {
    let value: f64 = field
        .parse()
        .map_err(|_| Error::parse(line, format!("invalid coordinate '{}'", field)))?;
    if !value.is_finite() {
        return Err(Error::parse(line, format!("non-finite coordinate '{}'", field)));
    }
    Ok(value)
}

/// Parse the first three fields of a line as a point
pub(crate) fn parse_point(fields: &[&str], line: usize) -> Result<Point3d> {
    if fields.len() < 3 {
        return Err(Error::parse(
            line,
            format!("expected 3 coordinates, found {}", fields.len()),
        ));
    }
    Ok(Point3d::new(
        parse_coordinate(fields[0], line)?,
        parse_coordinate(fields[1], line)?,
        parse_coordinate(fields[2], line)?,
    ))
}
