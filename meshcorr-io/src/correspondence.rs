//! Text tables produced by a correspondence run
//!
//! - mapping table: header row, then `source_id target_id dist` rows with the
//!   distance at six decimals
//! - point tables: `x y z` or `x y z r g b a` per matched pair, in source order
//! - index lists: one index per line

use meshcorr_algorithms::{CorrespondenceRecord, CorrespondenceSet, MatchPolicy, ReprojectedPoint};
use meshcorr_core::{Error, Point3d, Result, Rgba};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Column names of the mapping table
pub const CORRESPONDENCE_HEADER: &str = "source_id  target_id  dist";

/// Write the mapping table
pub fn write_correspondence_table<W: Write>(
    mut writer: W,
    records: &[CorrespondenceRecord],
) -> Result<()> {
    writeln!(writer, "{}", CORRESPONDENCE_HEADER)?;
    for r in records {
        writeln!(writer, "{:7}     {:7}   {:.6}", r.source_id, r.target_id, r.distance)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a mapping table; the header row is optional
pub fn read_correspondence_table<R: BufRead>(reader: R) -> Result<Vec<CorrespondenceRecord>> {
    let mut records = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if records.is_empty() && fields[0].parse::<usize>().is_err() {
            // Header
            continue;
        }
        if fields.len() != 3 {
            return Err(Error::parse(
                i + 1,
                format!("expected 3 columns, found {}", fields.len()),
            ));
        }

        let field_error = |name: &str, value: &str| {
            Error::parse(i + 1, format!("invalid {} '{}'", name, value))
        };
        records.push(CorrespondenceRecord {
            source_id: fields[0].parse().map_err(|_| field_error("source_id", fields[0]))?,
            target_id: fields[1].parse().map_err(|_| field_error("target_id", fields[1]))?,
            distance: fields[2].parse().map_err(|_| field_error("dist", fields[2]))?,
        });
    }

    Ok(records)
}

/// Write one `x y z` row per point
pub fn write_xyz_table<W: Write>(mut writer: W, points: &[Point3d]) -> Result<()> {
    for p in points {
        writeln!(writer, "{:.6} {:.6} {:.6}", p.x, p.y, p.z)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write re-projected target points, optionally with their colors.
///
/// Requesting colors for a point that has none is an error.
pub fn write_reprojected_points<W: Write>(
    mut writer: W,
    points: &[ReprojectedPoint],
    with_color: bool,
) -> Result<()> {
    for point in points {
        let p = &point.position;
        if with_color {
            let c: Rgba = point.color.ok_or_else(|| {
                Error::InvalidData(format!("source point {} has no target color", point.source_id))
            })?;
            writeln!(
                writer,
                "{:.6} {:.6} {:.6} {} {} {} {}",
                p.x, p.y, p.z, c[0], c[1], c[2], c[3]
            )?;
        } else {
            writeln!(writer, "{:.6} {:.6} {:.6}", p.x, p.y, p.z)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write one index per line
pub fn write_index_list<W: Write>(mut writer: W, indices: &[usize]) -> Result<()> {
    for index in indices {
        writeln!(writer, "{}", index)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read one index per line, skipping blank lines
pub fn read_index_list<R: BufRead>(reader: R) -> Result<Vec<usize>> {
    let mut indices = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        indices.push(
            trimmed
                .parse()
                .map_err(|_| Error::parse(i + 1, format!("invalid index '{}'", trimmed)))?,
        );
    }
    Ok(indices)
}

/// Save the mapping table to a file
pub fn save_correspondence_table<P: AsRef<Path>>(
    path: P,
    records: &[CorrespondenceRecord],
) -> Result<()> {
    write_correspondence_table(BufWriter::new(File::create(path)?), records)
}

/// Load a mapping table from a file
pub fn load_correspondence_table<P: AsRef<Path>>(path: P) -> Result<Vec<CorrespondenceRecord>> {
    read_correspondence_table(BufReader::new(File::open(path)?))
}

/// Everything a run writes, relative to one output directory
#[derive(Debug, Clone)]
pub struct RunOutputs<'a> {
    pub set: &'a CorrespondenceSet,
    pub source: &'a [Point3d],
    pub target: &'a [Point3d],
    pub target_colors: Option<&'a [Rgba]>,
    /// Pairs further apart than this are left out of the pair files
    pub filter_distance: Option<f64>,
}

impl RunOutputs<'_> {
    /// The records that go into the pair files
    pub fn kept(&self) -> Result<CorrespondenceSet> {
        match self.filter_distance {
            Some(d) if d.is_nan() || d < 0.0 => Err(Error::InvalidConfig(format!(
                "filter distance must be a non-negative number, got {}",
                d
            ))),
            Some(d) => Ok(self.set.filtered(d)),
            None => Ok(self.set.clone()),
        }
    }

    /// Write all result files as `<dir>/<prefix>_*.txt` and return their paths.
    ///
    /// Files:
    /// - `mapping`: the correspondence table, unfiltered
    /// - `points_xyz` and, with colors, `points_xyzrgba`: re-projected targets
    /// - `source_xyz` / `matched_xyz`: both ends of every kept pair
    /// - `matched_source_ids` for kept pairs, and `unmatched_source_ids` for
    ///   the unique policy
    ///
    /// Inputs are checked before anything is written.
    pub fn save(&self, dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
        let reprojected = self.set.reproject(self.target, self.target_colors)?;
        let kept = self.kept()?;
        let (source_points, matched_points): (Vec<Point3d>, Vec<Point3d>) =
            kept.paired_points(self.source, self.target)?.into_iter().unzip();

        fs::create_dir_all(dir)?;
        let path_for = |name: &str| dir.join(format!("{}_{}.txt", prefix, name));
        let mut written = Vec::new();

        let mapping = path_for("mapping");
        save_correspondence_table(&mapping, &self.set.records)?;
        written.push(mapping);

        let xyz = path_for("points_xyz");
        write_reprojected_points(BufWriter::new(File::create(&xyz)?), &reprojected, false)?;
        written.push(xyz);

        if self.target_colors.is_some() {
            let xyzrgba = path_for("points_xyzrgba");
            write_reprojected_points(BufWriter::new(File::create(&xyzrgba)?), &reprojected, true)?;
            written.push(xyzrgba);
        }

        let source_xyz = path_for("source_xyz");
        write_xyz_table(BufWriter::new(File::create(&source_xyz)?), &source_points)?;
        written.push(source_xyz);
        let matched_xyz = path_for("matched_xyz");
        write_xyz_table(BufWriter::new(File::create(&matched_xyz)?), &matched_points)?;
        written.push(matched_xyz);

        let matched_ids = path_for("matched_source_ids");
        write_index_list(
            BufWriter::new(File::create(&matched_ids)?),
            &kept.matched_source_ids(),
        )?;
        written.push(matched_ids);

        if self.set.policy == MatchPolicy::UniqueThreshold {
            let unmatched = path_for("unmatched_source_ids");
            write_index_list(BufWriter::new(File::create(&unmatched)?), &self.set.unmatched)?;
            written.push(unmatched);
        }

        info!(
            dir = %dir.display(),
            files = written.len(),
            kept = kept.matched_count(),
            filtered_out = self.set.matched_count() - kept.matched_count(),
            "saved correspondence outputs"
        );
        Ok(written)
    }
}
