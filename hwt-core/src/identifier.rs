//! Hierarchical node identifiers
//!
//! An [`Identifier`] addresses a node in the sensor tree and doubles as the
//! key prefix for everything persisted about that node. It renders as
//! `/segment/segment/...`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{HwTreeError, Result};

const SEPARATOR: char = '/';

/// Immutable path key; equality, ordering and hashing use the full path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier {
    segments: Vec<String>,
}

fn check_segment(segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(HwTreeError::InvalidIdentifier {
            segment: segment.to_string(),
            reason: "empty segment",
        });
    }
    if segment.contains(SEPARATOR) {
        return Err(HwTreeError::InvalidIdentifier {
            segment: segment.to_string(),
            reason: "contains '/'",
        });
    }
    Ok(())
}

impl Identifier {
    /// Build an identifier from its segments
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(HwTreeError::InvalidIdentifier {
                segment: String::new(),
                reason: "no segments",
            });
        }
        for segment in &segments {
            check_segment(segment)?;
        }
        Ok(Self { segments })
    }

    /// Build from segments known to be valid (numbers, constants)
    pub(crate) fn trusted<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        debug_assert!(!segments.is_empty() && segments.iter().all(|s| check_segment(s).is_ok()));
        Self { segments }
    }

    /// Parse the rendered `/a/b/c` form
    pub fn parse(s: &str) -> Result<Self> {
        let rest = s.strip_prefix(SEPARATOR).ok_or_else(|| HwTreeError::InvalidIdentifier {
            segment: s.to_string(),
            reason: "missing leading '/'",
        })?;
        Self::new(rest.split(SEPARATOR))
    }

    /// Identifier of a child node
    pub fn child(&self, segment: impl Into<String>) -> Result<Self> {
        let segment = segment.into();
        check_segment(&segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    /// Identifier one level up, `None` for a single-segment identifier
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn last(&self) -> &str {
        // new() guarantees at least one segment
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn starts_with(&self, prefix: &Identifier) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Persistence key of a per-node preference, e.g. `/lpc/nct6798/plot`
    pub fn setting_key(&self, suffix: &str) -> String {
        format!("{self}{SEPARATOR}{suffix}")
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{SEPARATOR}{segment}")?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Identifier {
    type Error = HwTreeError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.to_string()
    }
}
