//! Font-size clustering and typographic hierarchy discovery.

use std::collections::BTreeMap;

use serde::Serialize;

use super::DetectionOptions;
use crate::model::{Document, HeadingLevel};

/// A group of font sizes treated as visually equivalent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeCluster {
    /// Median of the member sizes
    pub median: f32,
    /// Number of spans in the cluster
    pub members: usize,
    /// Reading-order position of the first member span
    pub first_seen: usize,
}

/// Font statistics of one document.
///
/// Built once per document and never modified afterwards; the detector
/// receives it by reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FontProfile {
    /// Median size of the largest cluster
    body_size: Option<f32>,
    /// Representative size per heading level, non-increasing from H1 to H3
    size_map: BTreeMap<HeadingLevel, f32>,
    /// Span counts per style combination (diagnostic only)
    style_histogram: BTreeMap<String, usize>,
    /// Non-noise clusters in ascending size order
    clusters: Vec<SizeCluster>,
    /// Number of spans that contributed a size
    span_count: usize,
}

impl FontProfile {
    /// Build the profile from every span of the document.
    pub fn build(document: &Document, options: &DetectionOptions) -> Self {
        let mut sizes = Vec::with_capacity(document.span_count());
        let mut style_histogram: BTreeMap<String, usize> = BTreeMap::new();
        let mut skipped = 0usize;

        for span in document.pages.iter().flat_map(|p| p.spans()) {
            match span.rounded_size() {
                Some(size) => {
                    sizes.push(size);
                    *style_histogram.entry(span.flags.to_string()).or_insert(0) += 1;
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            log::debug!("Skipped {} spans without a usable font size", skipped);
        }

        let mut profile = Self::from_sizes(&sizes, options);
        profile.style_histogram = style_histogram;
        profile
    }

    /// Build the profile from rounded sizes given in reading order.
    pub fn from_sizes(sizes: &[f32], options: &DetectionOptions) -> Self {
        if sizes.is_empty() {
            return Self::default();
        }

        let clusters = cluster_sizes(sizes, options.eps, options.min_samples);

        // Largest membership wins; ties go to the cluster seen first.
        let body = clusters
            .iter()
            .min_by(|a, b| b.members.cmp(&a.members).then(a.first_seen.cmp(&b.first_seen)));

        let body_size = body.map(|c| c.median);
        let size_map = match body_size {
            Some(body_size) => {
                let mut heading_sizes: Vec<f32> = clusters
                    .iter()
                    .map(|c| c.median)
                    .filter(|&median| median > body_size * options.heading_size_ratio)
                    .collect();
                heading_sizes.sort_by(|a, b| b.total_cmp(a));
                assign_levels(&heading_sizes)
            }
            None => BTreeMap::new(),
        };

        log::debug!(
            "Font profile: {} sizes, {} clusters, body={:?}, levels={:?}",
            sizes.len(),
            clusters.len(),
            body_size,
            size_map
        );

        Self {
            body_size,
            size_map,
            style_histogram: BTreeMap::new(),
            clusters,
            span_count: sizes.len(),
        }
    }

    /// Whether the document contributed no spans at all.
    pub fn is_empty(&self) -> bool {
        self.span_count == 0
    }

    /// Body text size, if any cluster was found.
    pub fn body_size(&self) -> Option<f32> {
        self.body_size
    }

    /// Representative size per heading level.
    pub fn size_map(&self) -> &BTreeMap<HeadingLevel, f32> {
        &self.size_map
    }

    /// Representative size of one level.
    pub fn size_for(&self, level: HeadingLevel) -> Option<f32> {
        self.size_map.get(&level).copied()
    }

    /// First level (H1, then H2, then H3) whose size is strictly closer than
    /// `tolerance` to `size`.
    pub fn level_for_size(&self, size: f32, tolerance: f32) -> Option<HeadingLevel> {
        self.size_map
            .iter()
            .find(|(_, &level_size)| (size - level_size).abs() < tolerance)
            .map(|(level, _)| *level)
    }

    /// Span counts keyed by style combination.
    pub fn style_histogram(&self) -> &BTreeMap<String, usize> {
        &self.style_histogram
    }

    /// Discovered clusters in ascending size order.
    pub fn clusters(&self) -> &[SizeCluster] {
        &self.clusters
    }

    /// Number of spans that contributed a size.
    pub fn span_count(&self) -> usize {
        self.span_count
    }
}

/// Map descending heading sizes onto H1..H3.
///
/// With fewer than three sizes, H2 reuses the first and H3 the smallest.
fn assign_levels(descending: &[f32]) -> BTreeMap<HeadingLevel, f32> {
    let mut map = BTreeMap::new();
    let (Some(&first), Some(&last)) = (descending.first(), descending.last()) else {
        return map;
    };

    map.insert(HeadingLevel::H1, first);
    map.insert(HeadingLevel::H2, descending.get(1).copied().unwrap_or(first));
    map.insert(HeadingLevel::H3, descending.get(2).copied().unwrap_or(last));
    map
}

/// One-dimensional density clustering (DBSCAN) of `sizes`.
///
/// A size is a core point when at least `min_samples` sizes (itself
/// included) lie within `eps` of it. Core points within `eps` of each other
/// chain into one cluster; a non-core size within `eps` of a core point
/// joins that point's cluster (the smaller one when two qualify); the rest
/// is noise.
fn cluster_sizes(sizes: &[f32], eps: f32, min_samples: usize) -> Vec<SizeCluster> {
    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|&a, &b| sizes[a].total_cmp(&sizes[b]).then(a.cmp(&b)));
    let sorted: Vec<f32> = order.iter().map(|&i| sizes[i]).collect();
    let n = sorted.len();

    let mut is_core = vec![false; n];
    let (mut lo, mut hi) = (0usize, 0usize);
    for i in 0..n {
        while sorted[i] - sorted[lo] > eps {
            lo += 1;
        }
        hi = hi.max(i);
        while hi + 1 < n && sorted[hi + 1] - sorted[i] <= eps {
            hi += 1;
        }
        is_core[i] = hi - lo + 1 >= min_samples;
    }

    let mut labels: Vec<Option<usize>> = vec![None; n];
    let mut cluster_count = 0usize;
    let mut last_core: Option<(f32, usize)> = None;
    for i in (0..n).filter(|&i| is_core[i]) {
        let label = match last_core {
            Some((value, label)) if sorted[i] - value <= eps => label,
            _ => {
                cluster_count += 1;
                cluster_count - 1
            }
        };
        labels[i] = Some(label);
        last_core = Some((sorted[i], label));
    }

    for i in (0..n).filter(|&i| !is_core[i]) {
        let previous = (0..i)
            .rev()
            .take_while(|&j| sorted[i] - sorted[j] <= eps)
            .find(|&j| is_core[j]);
        let next = (i + 1..n)
            .take_while(|&j| sorted[j] - sorted[i] <= eps)
            .find(|&j| is_core[j]);
        labels[i] = previous.or(next).and_then(|j| labels[j]);
    }

    let mut members: Vec<Vec<f32>> = vec![Vec::new(); cluster_count];
    let mut first_seen = vec![usize::MAX; cluster_count];
    for (pos, label) in labels.iter().enumerate() {
        if let Some(label) = *label {
            members[label].push(sorted[pos]);
            first_seen[label] = first_seen[label].min(order[pos]);
        }
    }

    members
        .into_iter()
        .zip(first_seen)
        .map(|(values, first_seen)| SizeCluster {
            median: median(&values),
            members: values.len(),
            first_seen,
        })
        .collect()
}

/// Median of an ascending, non-empty slice (mean of the middle pair when even).
fn median(sorted: &[f32]) -> f32 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
