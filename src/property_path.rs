//! Typed property paths.
//!
//! Console commands and oscillators address numeric object state with dotted
//! paths like `transform.position.x` or `parameters.radius`. The first
//! segment selects one of a fixed set of root buckets; the rest is resolved
//! inside that bucket. Parsing validates the bucket up front so both the
//! oscillator engine and generic property edits share one resolution rule
//! instead of duplicating string splitting.

use std::fmt;
use std::str::FromStr;

/// The fixed table of animatable root buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Transform,
    Modifiers,
    Parameters,
    Settings,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Transform => "transform",
            Bucket::Modifiers => "modifiers",
            Bucket::Parameters => "parameters",
            Bucket::Settings => "settings",
        }
    }
}

impl FromStr for Bucket {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transform" => Ok(Bucket::Transform),
            "modifiers" => Ok(Bucket::Modifiers),
            "parameters" => Ok(Bucket::Parameters),
            "settings" => Ok(Bucket::Settings),
            other => Err(PathError::UnknownBucket(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The first segment is not one of the animatable root buckets.
    UnknownBucket(String),
    /// The path has no segments after the bucket.
    MissingLeaf(String),
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::UnknownBucket(b) => {
                write!(f, "'{b}' is not a valid animatable root property")
            }
            PathError::MissingLeaf(p) => {
                write!(f, "property path '{p}' does not name a field")
            }
        }
    }
}

impl std::error::Error for PathError {}

/// A parsed, bucket-validated property path.
///
/// Whether the leaf actually exists and is numeric on a given object is only
/// known against live scene state; `SceneApi::read_property` answers that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    pub bucket: Bucket,
    /// Path segments after the bucket, e.g. `["position", "x"]`.
    pub segments: Vec<String>,
    raw: String,
}

impl PropertyPath {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let mut parts = raw.split('.');
        let bucket = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PathError::MissingLeaf(raw.to_string()))?
            .parse::<Bucket>()?;

        let segments: Vec<String> = parts.map(str::to_string).collect();
        if segments.is_empty() || segments.iter().any(String::is_empty) {
            return Err(PathError::MissingLeaf(raw.to_string()));
        }

        Ok(Self {
            bucket,
            segments,
            raw: raw.to_string(),
        })
    }

    /// The original dotted form, used as the descriptor identity.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transform_path() {
        let path = PropertyPath::parse("transform.position.x").unwrap();
        assert_eq!(path.bucket, Bucket::Transform);
        assert_eq!(path.segments, vec!["position", "x"]);
        assert_eq!(path.as_str(), "transform.position.x");
    }

    #[test]
    fn test_parse_flat_bucket_path() {
        let path = PropertyPath::parse("parameters.radius").unwrap();
        assert_eq!(path.bucket, Bucket::Parameters);
        assert_eq!(path.segments, vec!["radius"]);
    }

    #[test]
    fn test_unknown_bucket_rejected() {
        let err = PropertyPath::parse("velocity.x").unwrap_err();
        assert!(matches!(err, PathError::UnknownBucket(b) if b == "velocity"));
    }

    #[test]
    fn test_bare_bucket_rejected() {
        assert!(matches!(
            PropertyPath::parse("transform"),
            Err(PathError::MissingLeaf(_))
        ));
        assert!(matches!(
            PropertyPath::parse("transform."),
            Err(PathError::MissingLeaf(_))
        ));
    }
}
