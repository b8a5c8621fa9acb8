//! Error types for the transform crate.

use canopy_types::Kind;

/// Errors raised while compiling or applying path transforms.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    /// No transform was registered.
    #[error("no transforms registered; register at least one path with `when`")]
    NoTransforms,

    /// A registered path was empty or contained an empty segment.
    #[error("invalid path '{path}': empty segment")]
    EmptySegment { path: String },

    /// A path was registered both as a leaf and as a prefix of another path.
    #[error("conflicting registration at '{path}': a transformed path cannot also be a prefix")]
    PathConflict { path: String },

    /// A `{}` path resolved to something other than a mapping.
    #[error("expected a mapping at '{path}', got {}", .actual.describe())]
    ExpectedMap { path: String, actual: Kind },

    /// A `[]` path resolved to something other than a sequence.
    #[error("expected a sequence at '{path}', got {}", .actual.describe())]
    ExpectedSeq { path: String, actual: Kind },
}

/// Convenience alias for transform results.
pub type MapResult<T> = Result<T, MapError>;
