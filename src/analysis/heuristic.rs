//! Heading detection from visual and textual line features.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{DetectionOptions, FontProfile};
use crate::model::{Document, HeadingLevel, Line, OutlineEntry};
use crate::text::{clean, is_title_case, is_upper};

/// Leading chapter/section keyword, outline numeral (`1`, `1.2.3`) or a
/// single letter optionally followed by a period.
static NUMBERING_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(chapter|section|appendix|part|article|\d+(\.\d+)*|[A-Z]\.?)\b")
        .expect("numbering pattern is valid")
});

/// Features of one line that feed the heading score.
#[derive(Debug, Clone, PartialEq)]
pub struct LineFeatures {
    /// Cleaned line text
    pub text: String,
    /// Largest span size on the line
    pub size: f32,
    /// `size / body_size`, or 1.0 without a body size
    pub size_ratio: f64,
    pub is_bold: bool,
    pub has_numbering: bool,
    pub is_centered: bool,
    pub is_title_cased: bool,
    /// Length of the cleaned text in characters
    pub char_len: usize,
}

/// Scores lines against a font profile.
pub struct HeadingScorer<'a> {
    profile: &'a FontProfile,
    options: &'a DetectionOptions,
}

impl<'a> HeadingScorer<'a> {
    /// Create a scorer for one document.
    pub fn new(profile: &'a FontProfile, options: &'a DetectionOptions) -> Self {
        Self { profile, options }
    }

    /// Extract features of `line`, or `None` when its cleaned text is too short.
    pub fn features(&self, line: &Line, page_width: f32) -> Option<LineFeatures> {
        let text = clean(&line.text());
        let char_len = text.chars().count();
        if char_len < self.options.min_text_len {
            return None;
        }

        let size = line.size();
        let size_ratio = match self.profile.body_size() {
            Some(body) if body > 0.0 => f64::from(size) / f64::from(body),
            _ => 1.0,
        };

        let center = line.bbox().center_x();
        let is_centered = page_width > 0.0
            && center > page_width * self.options.center_band_min
            && center < page_width * self.options.center_band_max;

        Some(LineFeatures {
            size,
            size_ratio,
            is_bold: line.flags().is_bold(),
            has_numbering: NUMBERING_PATTERN.is_match(&text),
            is_centered,
            is_title_cased: is_title_case(&text) || is_upper(&text),
            char_len,
            text,
        })
    }

    /// Weighted sum of the line features.
    pub fn score(&self, features: &LineFeatures) -> f64 {
        let o = self.options;
        let mut score = features.size_ratio.min(o.max_size_ratio) * o.size_weight;
        if features.is_bold {
            score += o.bold_weight;
        }
        if features.has_numbering {
            score += o.numbering_weight;
        }
        if features.is_centered {
            score += o.centered_weight;
        }
        if features.is_title_cased {
            score += o.title_case_weight;
        }
        score += if features.char_len < o.short_text_limit {
            o.short_text_bonus
        } else {
            o.long_text_penalty
        };
        score
    }

    /// A score classifies as a heading only when strictly above the threshold.
    pub fn is_heading(&self, score: f64) -> bool {
        score > self.options.score_threshold
    }

    /// Level of a heading line, H3 when no level size is close enough.
    pub fn level(&self, size: f32) -> HeadingLevel {
        self.profile
            .level_for_size(size, self.options.level_tolerance)
            .unwrap_or(HeadingLevel::H3)
    }
}

/// Detect headings across the whole document.
///
/// Pages are visited in ascending index order and lines in the order the
/// page lists them. The result keeps only the first occurrence of each
/// heading text. A profile built from zero spans yields no headings.
pub fn detect_headings(
    document: &Document,
    profile: &FontProfile,
    options: &DetectionOptions,
) -> Vec<OutlineEntry> {
    if profile.is_empty() {
        log::debug!("Empty font profile, no headings detected");
        return Vec::new();
    }

    let scorer = HeadingScorer::new(profile, options);
    let mut pages: Vec<_> = document.pages.iter().collect();
    pages.sort_by_key(|p| p.index);

    let mut outline = Vec::new();
    let mut skipped = 0usize;
    for page in pages {
        for line in &page.lines {
            if !line.is_well_formed() {
                skipped += 1;
                continue;
            }
            let Some(features) = scorer.features(line, page.width) else {
                continue;
            };

            let score = scorer.score(&features);
            if scorer.is_heading(score) {
                let level = scorer.level(features.size);
                log::trace!(
                    "Heading {} on page {} (score {:.2}): {:?}",
                    level,
                    page.index,
                    score,
                    features.text
                );
                outline.push(OutlineEntry::new(level, features.text, page.index));
            }
        }
    }

    if skipped > 0 {
        log::debug!("Skipped {} malformed lines", skipped);
    }

    dedup_by_text(outline)
}

/// Keep the first entry for every distinct text, preserving order.
fn dedup_by_text(entries: Vec<OutlineEntry>) -> Vec<OutlineEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.text.clone()))
        .collect()
}
