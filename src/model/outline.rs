//! Outline result types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Title used for documents that could not be processed.
pub const FAILED_TITLE: &str = "Extraction Failed";

/// Heading level of an outline entry.
///
/// The set is closed: nothing deeper than H3 is ever produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    /// All levels, outermost first.
    pub const ALL: [HeadingLevel; 3] = [HeadingLevel::H1, HeadingLevel::H2, HeadingLevel::H3];

    /// Level for a 1-based depth, if it is within 1..=3.
    pub fn from_depth(depth: u32) -> Option<Self> {
        match depth {
            1 => Some(HeadingLevel::H1),
            2 => Some(HeadingLevel::H2),
            3 => Some(HeadingLevel::H3),
            _ => None,
        }
    }

    /// 1-based depth of this level.
    pub fn depth(self) -> u32 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }

    /// Tag used in serialized output ("H1", "H2", "H3").
    pub fn as_str(self) -> &'static str {
        match self {
            HeadingLevel::H1 => "H1",
            HeadingLevel::H2 => "H2",
            HeadingLevel::H3 => "H3",
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A heading in the produced outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Heading level
    pub level: HeadingLevel,
    /// Cleaned heading text
    pub text: String,
    /// Page index (0-based)
    pub page: u32,
}

impl OutlineEntry {
    /// Create a new outline entry.
    pub fn new(level: HeadingLevel, text: impl Into<String>, page: u32) -> Self {
        Self {
            level,
            text: text.into(),
            page,
        }
    }
}

/// The `{title, outline}` summary of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineResult {
    /// Resolved document title
    pub title: String,
    /// Headings in reading order
    pub outline: Vec<OutlineEntry>,
    /// Failure description, present only for failed documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutlineResult {
    /// Create a successful result.
    pub fn new(title: impl Into<String>, outline: Vec<OutlineEntry>) -> Self {
        Self {
            title: title.into(),
            outline,
            error: None,
        }
    }

    /// Create the fallback result written for a document that failed.
    pub fn failed(error: impl fmt::Display) -> Self {
        Self {
            title: FAILED_TITLE.to_string(),
            outline: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    /// Check if this is a failure result.
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}
