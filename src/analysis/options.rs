//! Tunable constants of the outline engine.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for font clustering and heading scoring.
///
/// The defaults are empirical. Every field may be omitted from a JSON
/// configuration file and keeps its default. Score weights and the
/// threshold are `f64`: scores landing exactly on the threshold must stay
/// below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionOptions {
    /// Neighborhood radius for font-size clustering
    pub eps: f32,

    /// Minimum neighbors (self included) for a size to seed a cluster
    pub min_samples: usize,

    /// A cluster is a heading cluster when its median exceeds body size times this
    pub heading_size_ratio: f32,

    /// Cap applied to the size ratio before weighting
    pub max_size_ratio: f64,

    /// Weight of the capped size ratio
    pub size_weight: f64,

    /// Bonus for bold lines
    pub bold_weight: f64,

    /// Bonus for lines starting with a numbering token
    pub numbering_weight: f64,

    /// Bonus for horizontally centered lines
    pub centered_weight: f64,

    /// Bonus for title-cased or uppercase lines
    pub title_case_weight: f64,

    /// Bonus for lines shorter than `short_text_limit`
    pub short_text_bonus: f64,

    /// Added (negative) for lines at least `short_text_limit` long
    pub long_text_penalty: f64,

    /// Character count separating short from long lines
    pub short_text_limit: usize,

    /// A line is a heading when its score is strictly greater than this
    pub score_threshold: f64,

    /// Maximum distance (exclusive) between a line size and a level size
    pub level_tolerance: f32,

    /// Lines with fewer cleaned characters are never headings
    pub min_text_len: usize,

    /// Left edge of the centering band, as a fraction of page width
    pub center_band_min: f32,

    /// Right edge of the centering band, as a fraction of page width
    pub center_band_max: f32,

    /// Use the document's own table of contents when it has one
    pub prefer_native_toc: bool,
}

impl DetectionOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON file; missing fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&data)
    }

    /// Parse options from a JSON string; missing fields keep their defaults.
    pub fn from_json_str(data: &str) -> Result<Self> {
        let options: Self =
            serde_json::from_str(data).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Reject values that make the algorithms meaningless.
    pub fn validate(&self) -> Result<()> {
        if !(self.eps.is_finite() && self.eps >= 0.0) {
            return Err(Error::InvalidConfig(format!("eps must be >= 0, got {}", self.eps)));
        }
        if self.min_samples == 0 {
            return Err(Error::InvalidConfig("min_samples must be at least 1".into()));
        }
        if self.center_band_min > self.center_band_max {
            return Err(Error::InvalidConfig(format!(
                "center band is empty: {}..{}",
                self.center_band_min, self.center_band_max
            )));
        }
        Ok(())
    }

    /// Set the clustering radius and minimum cluster membership.
    pub fn with_clustering(mut self, eps: f32, min_samples: usize) -> Self {
        self.eps = eps;
        self.min_samples = min_samples;
        self
    }

    /// Set the body-size ratio above which a cluster counts as a heading size.
    pub fn with_heading_size_ratio(mut self, ratio: f32) -> Self {
        self.heading_size_ratio = ratio;
        self
    }

    /// Set the score cutoff.
    pub fn with_score_threshold(mut self, threshold: f64) -> Self {
        self.score_threshold = threshold;
        self
    }

    /// Set the size tolerance used to map a heading to a level.
    pub fn with_level_tolerance(mut self, tolerance: f32) -> Self {
        self.level_tolerance = tolerance;
        self
    }

    /// Set the short/long line bonus and penalty.
    pub fn with_length_weights(mut self, bonus: f64, penalty: f64) -> Self {
        self.short_text_bonus = bonus;
        self.long_text_penalty = penalty;
        self
    }

    /// Set the style feature weights (bold, numbering, centered, title case).
    pub fn with_feature_weights(
        mut self,
        bold: f64,
        numbering: f64,
        centered: f64,
        title_case: f64,
    ) -> Self {
        self.bold_weight = bold;
        self.numbering_weight = numbering;
        self.centered_weight = centered;
        self.title_case_weight = title_case;
        self
    }

    /// Always run the heuristic detector, even when a native outline exists.
    pub fn ignore_native_toc(mut self) -> Self {
        self.prefer_native_toc = false;
        self
    }
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            eps: 0.5,
            min_samples: 5,
            heading_size_ratio: 1.2,
            max_size_ratio: 3.0,
            size_weight: 1.5,
            bold_weight: 1.0,
            numbering_weight: 0.8,
            centered_weight: 0.6,
            title_case_weight: 0.5,
            short_text_bonus: 0.4,
            long_text_penalty: -0.2,
            short_text_limit: 80,
            score_threshold: 3.0,
            level_tolerance: 0.5,
            min_text_len: 3,
            center_band_min: 0.3,
            center_band_max: 0.7,
            prefer_native_toc: true,
        }
    }
}
