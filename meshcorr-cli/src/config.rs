//! Run file loading for meshcorr
//!
//! ```toml
//! [matching]
//! policy = "unique-threshold"
//! k = 10000
//! max_distance = 0.0025
//!
//! [output]
//! dir = "output"
//! prefix = "flame"
//! filter_distance = 0.02
//! ```

use anyhow::{bail, Context, Result};
use meshcorr_algorithms::{CorrespondenceConfig, MatchPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Contents of a run file
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Matching parameters; unset fields may be supplied on the command line
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MatchingConfig {
    pub policy: Option<MatchPolicy>,
    pub k: Option<usize>,
    pub max_distance: Option<f64>,
    #[serde(default)]
    pub parallel: bool,
}

/// Where result tables are written
#[derive(Clone, Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: current directory)
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// File name prefix (default: "correspondence")
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Leave pairs further apart than this out of the pair files and summary
    #[serde(default)]
    pub filter_distance: Option<f64>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            prefix: default_prefix(),
            filter_distance: None,
        }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_prefix() -> String {
    "correspondence".to_string()
}

/// Command-line values that take precedence over the run file
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub policy: Option<MatchPolicy>,
    pub k: Option<usize>,
    pub max_distance: Option<f64>,
    pub parallel: bool,
    pub dir: Option<PathBuf>,
    pub prefix: Option<String>,
    pub filter_distance: Option<f64>,
}

impl RunConfig {
    /// Load a run file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read run file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid run file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply command-line values on top of the file values
    pub fn apply(&mut self, overrides: Overrides) {
        if overrides.policy.is_some() {
            self.matching.policy = overrides.policy;
        }
        if overrides.k.is_some() {
            self.matching.k = overrides.k;
        }
        if overrides.max_distance.is_some() {
            self.matching.max_distance = overrides.max_distance;
        }
        self.matching.parallel |= overrides.parallel;
        if let Some(dir) = overrides.dir {
            self.output.dir = dir;
        }
        if let Some(prefix) = overrides.prefix {
            self.output.prefix = prefix;
        }
        if overrides.filter_distance.is_some() {
            self.output.filter_distance = overrides.filter_distance;
        }
    }

    /// Post-filter distance for the pair files, if set
    pub fn filter_distance(&self) -> Result<Option<f64>> {
        match self.output.filter_distance {
            Some(d) if !(d.is_finite() && d >= 0.0) => {
                bail!("filter_distance must be a non-negative finite number, got {}", d)
            }
            other => Ok(other),
        }
    }

    /// Solver parameters for this run.
    ///
    /// The policy defaults to plain. The unique policy has no fallback for
    /// `k` or `max_distance`.
    pub fn correspondence_config(&self) -> Result<CorrespondenceConfig> {
        let matching = &self.matching;
        let config = match matching.policy.unwrap_or(MatchPolicy::Plain) {
            MatchPolicy::Plain => CorrespondenceConfig::plain(),
            MatchPolicy::UniqueThreshold => {
                let Some(k) = matching.k else {
                    bail!("unique-threshold policy requires k (--k or [matching] k)");
                };
                let Some(max_distance) = matching.max_distance else {
                    bail!(
                        "unique-threshold policy requires max_distance (--max-distance or [matching] max_distance)"
                    );
                };
                CorrespondenceConfig::unique(k, max_distance)
            }
        }
        .with_parallel(matching.parallel);

        config.validate()?;
        Ok(config)
    }
}
