//! OBJ vertex list support
//!
//! Only `v x y z` lines are read; normals, texture coordinates, faces and
//! any trailing per-vertex fields are skipped.

use crate::{parse_point, MeshVertices, VertexReader, VertexWriter};
use meshcorr_core::Result;
use std::io::{BufRead, Write};

pub struct ObjReader;
pub struct ObjWriter;

impl VertexReader for ObjReader {
    fn read_from<R: BufRead>(reader: R) -> Result<MeshVertices> {
        let mut positions = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let mut fields = line.split_whitespace();
            if fields.next() != Some("v") {
                continue;
            }
            let fields: Vec<&str> = fields.collect();
            positions.push(parse_point(&fields, i + 1)?);
        }

        Ok(MeshVertices::new(positions))
    }
}

impl VertexWriter for ObjWriter {
    fn write_to<W: Write>(vertices: &MeshVertices, mut writer: W) -> Result<()> {
        if vertices.colors.is_some() {
            tracing::debug!("OBJ vertex lists carry no colors; dropping them");
        }
        for p in &vertices.positions {
            writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
        }
        writer.flush()?;
        Ok(())
    }
}
