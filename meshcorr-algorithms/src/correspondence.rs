//! Vertex correspondence between a source and a target point set
//!
//! Source points are visited in ascending index order under either policy.
//! Under [`MatchPolicy::UniqueThreshold`] that order decides which source
//! point wins a contested target: the first one to reach it keeps it, and the
//! claim is never revisited.

use crate::correspondence_set::{CorrespondenceRecord, CorrespondenceSet};
use crate::usage_mask::UsageMask;
use meshcorr_core::{ensure_finite, Error, NearestNeighborSearch, Point3d, PointSetRole, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// How source points are assigned to target points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// Nearest target for every source point; targets may repeat
    Plain,
    /// First unused target closer than `max_distance` among the `k` nearest
    #[serde(alias = "unique")]
    UniqueThreshold,
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPolicy::Plain => f.write_str("plain"),
            MatchPolicy::UniqueThreshold => f.write_str("unique-threshold"),
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(MatchPolicy::Plain),
            "unique-threshold" | "unique" => Ok(MatchPolicy::UniqueThreshold),
            other => Err(Error::InvalidConfig(format!(
                "unknown policy '{}', expected 'plain' or 'unique-threshold'",
                other
            ))),
        }
    }
}

/// Parameters of one correspondence run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrespondenceConfig {
    pub policy: MatchPolicy,
    /// Candidate breadth for the unique policy. The plain policy always
    /// queries a single neighbor.
    pub k: usize,
    /// Admissibility cutoff for the unique policy, compared with `<`
    pub max_distance: Option<f64>,
    /// Run plain-policy queries on the rayon pool
    #[serde(default)]
    pub parallel: bool,
}

impl CorrespondenceConfig {
    /// Plain nearest-neighbor matching
    pub fn plain() -> Self {
        Self {
            policy: MatchPolicy::Plain,
            k: 1,
            max_distance: None,
            parallel: false,
        }
    }

    /// Injective matching with `k` candidates and a strict distance cutoff
    pub fn unique(k: usize, max_distance: f64) -> Self {
        Self {
            policy: MatchPolicy::UniqueThreshold,
            k,
            max_distance: Some(max_distance),
            parallel: false,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check the parameters the selected policy relies on
    pub fn validate(&self) -> Result<()> {
        match self.policy {
            MatchPolicy::Plain => Ok(()),
            MatchPolicy::UniqueThreshold => {
                if self.k == 0 {
                    return Err(Error::InvalidConfig(
                        "k must be a positive integer".to_string(),
                    ));
                }
                match self.max_distance {
                    None => Err(Error::InvalidConfig(
                        "unique-threshold policy requires max_distance".to_string(),
                    )),
                    Some(d) if !(d.is_finite() && d > 0.0) => Err(Error::InvalidConfig(format!(
                        "max_distance must be a positive finite number, got {}",
                        d
                    ))),
                    Some(_) => Ok(()),
                }
            }
        }
    }
}

/// Greedy injective assignment state for one run.
///
/// Owns the [`UsageMask`], so several assigners may share one index.
pub struct UniqueAssigner<'a, S: NearestNeighborSearch + ?Sized> {
    index: &'a S,
    k: usize,
    max_distance: f64,
    mask: UsageMask,
}

impl<'a, S: NearestNeighborSearch + ?Sized> UniqueAssigner<'a, S> {
    /// Unvalidated: callers go through [`CorrespondenceConfig::validate`]
    fn new(index: &'a S, k: usize, max_distance: f64) -> Self {
        Self {
            index,
            k,
            max_distance,
            mask: UsageMask::new(index.len()),
        }
    }

    /// Assign one source point, claiming its target on success
    pub fn assign(&mut self, source_id: usize, point: &Point3d) -> Option<CorrespondenceRecord> {
        for (target_id, distance) in self.index.find_k_nearest(point, self.k) {
            // Candidates arrive sorted, so nothing later can be admissible
            if distance >= self.max_distance {
                break;
            }
            if self.mask.claim(target_id) {
                return Some(CorrespondenceRecord {
                    source_id,
                    target_id,
                    distance,
                });
            }
        }
        None
    }

    pub fn mask(&self) -> &UsageMask {
        &self.mask
    }

    pub fn into_mask(self) -> UsageMask {
        self.mask
    }
}

/// Matches source point sets against one prebuilt target index
pub struct CorrespondenceSolver<'a, S: NearestNeighborSearch + ?Sized> {
    index: &'a S,
    config: CorrespondenceConfig,
}

impl<'a, S> CorrespondenceSolver<'a, S>
where
    S: NearestNeighborSearch + Sync + ?Sized,
{
    /// Validates the configuration before anything is queried
    pub fn new(index: &'a S, config: CorrespondenceConfig) -> Result<Self> {
        config.validate()?;
        if index.is_empty() {
            return Err(Error::EmptyPointSet(PointSetRole::Target));
        }
        Ok(Self { index, config })
    }

    pub fn config(&self) -> &CorrespondenceConfig {
        &self.config
    }

    /// A fresh assigner for stepping through a unique run by hand
    pub fn unique_assigner(&self) -> Result<UniqueAssigner<'a, S>> {
        match (self.config.policy, self.config.max_distance) {
            (MatchPolicy::UniqueThreshold, Some(max_distance)) => {
                Ok(UniqueAssigner::new(self.index, self.config.k, max_distance))
            }
            _ => Err(Error::InvalidConfig(
                "unique assigner requires the unique-threshold policy".to_string(),
            )),
        }
    }

    /// Match every source point under the configured policy
    pub fn solve(&self, source: &[Point3d]) -> Result<CorrespondenceSet> {
        ensure_finite(source, PointSetRole::Source)?;
        debug!(
            policy = %self.config.policy,
            k = self.config.k,
            max_distance = ?self.config.max_distance,
            sources = source.len(),
            targets = self.index.len(),
            "starting correspondence run"
        );

        let set = match self.config.policy {
            MatchPolicy::Plain => self.solve_plain(source)?,
            MatchPolicy::UniqueThreshold => self.solve_unique(source)?,
        };

        info!(
            policy = %set.policy,
            matched = set.matched_count(),
            unmatched = set.unmatched_count(),
            "correspondence run finished"
        );
        Ok(set)
    }

    /// Match several source sets against the same index.
    ///
    /// Runs are independent, each with its own usage mask, so they are
    /// spread over the rayon pool.
    pub fn solve_many(&self, sources: &[&[Point3d]]) -> Result<Vec<CorrespondenceSet>> {
        sources.par_iter().map(|source| self.solve(source)).collect()
    }

    fn nearest_record(&self, source_id: usize, point: &Point3d) -> Result<CorrespondenceRecord> {
        self.index
            .find_nearest(point)
            .map(|(target_id, distance)| CorrespondenceRecord {
                source_id,
                target_id,
                distance,
            })
            .ok_or(Error::EmptyPointSet(PointSetRole::Target))
    }

    fn solve_plain(&self, source: &[Point3d]) -> Result<CorrespondenceSet> {
        let records = if self.config.parallel {
            source
                .par_iter()
                .enumerate()
                .map(|(source_id, point)| self.nearest_record(source_id, point))
                .collect::<Result<Vec<_>>>()?
        } else {
            source
                .iter()
                .enumerate()
                .map(|(source_id, point)| self.nearest_record(source_id, point))
                .collect::<Result<Vec<_>>>()?
        };

        Ok(CorrespondenceSet {
            policy: MatchPolicy::Plain,
            source_len: source.len(),
            target_len: self.index.len(),
            records,
            unmatched: Vec::new(),
        })
    }

    fn solve_unique(&self, source: &[Point3d]) -> Result<CorrespondenceSet> {
        if self.config.parallel {
            debug!("unique-threshold matching shares one usage mask; running sequentially");
        }

        let mut assigner = self.unique_assigner()?;
        let mut records = Vec::new();
        let mut unmatched = Vec::new();

        for (source_id, point) in source.iter().enumerate() {
            match assigner.assign(source_id, point) {
                Some(record) => records.push(record),
                None => {
                    warn!(
                        source_id,
                        k = self.config.k,
                        "source point found no unused target within max_distance among its nearest candidates"
                    );
                    unmatched.push(source_id);
                }
            }
        }

        Ok(CorrespondenceSet {
            policy: MatchPolicy::UniqueThreshold,
            source_len: source.len(),
            target_len: self.index.len(),
            records,
            unmatched,
        })
    }
}

/// Nearest target for every source point
pub fn match_plain<S>(index: &S, source: &[Point3d]) -> Result<CorrespondenceSet>
where
    S: NearestNeighborSearch + Sync + ?Sized,
{
    CorrespondenceSolver::new(index, CorrespondenceConfig::plain())?.solve(source)
}

/// Injective greedy matching with candidate breadth `k` and a strict cutoff
pub fn match_unique<S>(
    index: &S,
    source: &[Point3d],
    k: usize,
    max_distance: f64,
) -> Result<CorrespondenceSet>
where
    S: NearestNeighborSearch + Sync + ?Sized,
{
    CorrespondenceSolver::new(index, CorrespondenceConfig::unique(k, max_distance))?.solve(source)
}
