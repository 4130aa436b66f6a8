//! Results of a correspondence run and what can be derived from them

use crate::correspondence::MatchPolicy;
use meshcorr_core::{Error, Point3d, Result, Rgba};
use serde::{Deserialize, Serialize};

/// One matched pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrespondenceRecord {
    pub source_id: usize,
    pub target_id: usize,
    /// Euclidean distance between the two points
    pub distance: f64,
}

/// Distance summary over the matched records
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrespondenceStats {
    pub count: usize,
    pub mean_distance: f64,
    pub rms_distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

/// A target point carried over to the position of its source point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReprojectedPoint {
    pub source_id: usize,
    pub position: Point3d,
    pub color: Option<Rgba>,
}

/// Output of one solver run.
///
/// `records` are in ascending `source_id` order. `unmatched` lists, also in
/// ascending order, the source ids the unique policy could not place; it is
/// always empty under the plain policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrespondenceSet {
    pub policy: MatchPolicy,
    pub source_len: usize,
    pub target_len: usize,
    pub records: Vec<CorrespondenceRecord>,
    pub unmatched: Vec<usize>,
}

impl CorrespondenceSet {
    pub fn matched_count(&self) -> usize {
        self.records.len()
    }

    pub fn unmatched_count(&self) -> usize {
        self.unmatched.len()
    }

    /// Whether every source point received a target
    pub fn is_complete(&self) -> bool {
        self.unmatched.is_empty() && self.records.len() == self.source_len
    }

    pub fn matched_source_ids(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.source_id).collect()
    }

    pub fn target_ids(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.target_id).collect()
    }

    /// Distance summary, `None` when nothing matched
    pub fn stats(&self) -> Option<CorrespondenceStats> {
        if self.records.is_empty() {
            return None;
        }

        let count = self.records.len();
        let mut sum = 0.0;
        let mut sum_squared = 0.0;
        let mut min_distance = f64::INFINITY;
        let mut max_distance = 0.0_f64;
        for record in &self.records {
            sum += record.distance;
            sum_squared += record.distance * record.distance;
            min_distance = min_distance.min(record.distance);
            max_distance = max_distance.max(record.distance);
        }

        Some(CorrespondenceStats {
            count,
            mean_distance: sum / count as f64,
            rms_distance: (sum_squared / count as f64).sqrt(),
            min_distance,
            max_distance,
        })
    }

    /// Records at most `max_distance` apart, as used to filter plain matches
    /// before fitting
    pub fn within(&self, max_distance: f64) -> Vec<CorrespondenceRecord> {
        self.records
            .iter()
            .filter(|r| r.distance <= max_distance)
            .copied()
            .collect()
    }

    /// A copy keeping only the records at most `max_distance` apart.
    ///
    /// Dropped records are not added to `unmatched`, which stays a list of
    /// source points the solver could not place.
    pub fn filtered(&self, max_distance: f64) -> CorrespondenceSet {
        CorrespondenceSet {
            records: self.within(max_distance),
            ..self.clone()
        }
    }

    /// The matched target points in source order, with colors when given.
    ///
    /// `target_colors`, if present, must be parallel to `target`.
    pub fn reproject(
        &self,
        target: &[Point3d],
        target_colors: Option<&[Rgba]>,
    ) -> Result<Vec<ReprojectedPoint>> {
        self.check_target_len(target.len())?;
        if let Some(colors) = target_colors {
            if colors.len() != target.len() {
                return Err(Error::InvalidData(format!(
                    "{} target points but {} target colors",
                    target.len(),
                    colors.len()
                )));
            }
        }

        Ok(self
            .records
            .iter()
            .map(|r| ReprojectedPoint {
                source_id: r.source_id,
                position: target[r.target_id],
                color: target_colors.map(|colors| colors[r.target_id]),
            })
            .collect())
    }

    /// `(source point, target point)` for every record
    pub fn paired_points(
        &self,
        source: &[Point3d],
        target: &[Point3d],
    ) -> Result<Vec<(Point3d, Point3d)>> {
        if source.len() != self.source_len {
            return Err(Error::InvalidData(format!(
                "correspondence built for {} source points, got {}",
                self.source_len,
                source.len()
            )));
        }
        self.check_target_len(target.len())?;

        Ok(self
            .records
            .iter()
            .map(|r| (source[r.source_id], target[r.target_id]))
            .collect())
    }

    fn check_target_len(&self, len: usize) -> Result<()> {
        if len != self.target_len {
            return Err(Error::InvalidData(format!(
                "correspondence built for {} target points, got {}",
                self.target_len, len
            )));
        }
        Ok(())
    }
}
