//! OFF and COFF vertex support
//!
//! Layout: a `OFF` or `COFF` header, a counts line `nv nf ne`, then `nv`
//! vertex lines `x y z [r g b [a]]`. Anything after the vertices (faces) is
//! ignored. Vertices without color fields get [`DEFAULT_RGBA`]; an RGB color
//! without alpha is opaque.

use crate::{parse_point, MeshVertices, VertexReader, VertexWriter};
use meshcorr_core::{Error, Result, Rgba, DEFAULT_RGBA};
use std::io::{BufRead, Write};

pub struct OffReader;
pub struct OffWriter;

/// Lines with comments and surrounding whitespace removed, numbered from 1
fn content_lines<R: BufRead>(reader: R) -> impl Iterator<Item = Result<(usize, String)>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(i, line)| match line {
            Ok(line) => {
                let content = line.split('#').next().unwrap_or("").trim().to_string();
                (!content.is_empty()).then_some(Ok((i + 1, content)))
            }
            Err(e) => Some(Err(Error::Io(e))),
        })
}

/// Initial vertex capacity at most; the header count is not trusted
const MAX_PREALLOCATED_VERTICES: usize = 1 << 20;

/// Parse the fields after the coordinates as RGB or RGBA
fn parse_color(fields: &[&str], line: usize) -> Result<Option<Rgba>> {
    if fields.is_empty() {
        return Ok(None);
    }
    if fields.len() < 3 {
        return Err(Error::parse(
            line,
            format!("expected 3 or 4 color channels, found {}", fields.len()),
        ));
    }

    let mut color = DEFAULT_RGBA;
    for (channel, field) in color.iter_mut().zip(fields) {
        *channel = field
            .parse()
            .map_err(|_| Error::parse(line, format!("invalid color channel '{}'", field)))?;
    }
    Ok(Some(color))
}

impl VertexReader for OffReader {
    fn read_from<R: BufRead>(reader: R) -> Result<MeshVertices> {
        let mut lines = content_lines(reader);

        let (header_line, header) = lines
            .next()
            .transpose()?
            .ok_or_else(|| Error::parse(1, "empty OFF file"))?;
        let mut header_fields = header.split_whitespace();
        let colored_header = match header_fields.next() {
            Some("OFF") => false,
            Some("COFF") => true,
            other => {
                return Err(Error::parse(
                    header_line,
                    format!("expected OFF or COFF header, found '{}'", other.unwrap_or("")),
                ))
            }
        };

        // Counts may share the header line
        let rest: Vec<&str> = header_fields.collect();
        let (counts_line, counts) = if rest.is_empty() {
            lines
                .next()
                .transpose()?
                .ok_or_else(|| Error::parse(header_line + 1, "missing vertex count"))?
        } else {
            (header_line, rest.join(" "))
        };
        let vertex_count: usize = counts
            .split_whitespace()
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::parse(counts_line, format!("invalid counts line '{}'", counts)))?;

        let capacity = vertex_count.min(MAX_PREALLOCATED_VERTICES);
        let mut positions = Vec::with_capacity(capacity);
        let mut colors = Vec::with_capacity(capacity);
        let mut any_color = false;
        let mut last_line = counts_line;

        while positions.len() < vertex_count {
            let (line_number, line) = match lines.next().transpose()? {
                Some(entry) => entry,
                None => {
                    return Err(Error::parse(
                        last_line + 1,
                        format!(
                            "expected {} vertices, found {}",
                            vertex_count,
                            positions.len()
                        ),
                    ))
                }
            };
            last_line = line_number;

            let fields: Vec<&str> = line.split_whitespace().collect();
            positions.push(parse_point(&fields, line_number)?);
            match parse_color(&fields[3..], line_number)? {
                Some(color) => {
                    colors.push(color);
                    any_color = true;
                }
                None => colors.push(DEFAULT_RGBA),
            }
        }

        Ok(MeshVertices {
            positions,
            colors: (colored_header || any_color).then_some(colors),
        })
    }
}

impl VertexWriter for OffWriter {
    fn write_to<W: Write>(vertices: &MeshVertices, mut writer: W) -> Result<()> {
        let header = if vertices.colors.is_some() { "COFF" } else { "OFF" };
        writeln!(writer, "{}", header)?;
        writeln!(writer, "{} 0 0", vertices.len())?;

        match vertices.colors() {
            Some(colors) => {
                if colors.len() != vertices.len() {
                    return Err(Error::InvalidData(format!(
                        "{} vertices but {} colors",
                        vertices.len(),
                        colors.len()
                    )));
                }
                for (p, c) in vertices.positions.iter().zip(colors) {
                    writeln!(
                        writer,
                        "{} {} {} {} {} {} {}",
                        p.x, p.y, p.z, c[0], c[1], c[2], c[3]
                    )?;
                }
            }
            None => {
                for p in &vertices.positions {
                    writeln!(writer, "{} {} {}", p.x, p.y, p.z)?;
                }
            }
        }

        writer.flush()?;
        Ok(())
    }
}
