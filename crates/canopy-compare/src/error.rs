//! Error types for mask construction.

/// Errors raised while building a mask.
///
/// Comparing a tree against a valid mask never fails: mismatches are
/// reported as [`DiffRecord`](crate::DiffRecord)s. These errors only cover
/// masks that cannot be built in the first place.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MaskError {
    /// A tail wildcard appeared before the last element of a sequence mask.
    #[error("tail wildcard must be the last element of a sequence mask (found at index {index})")]
    InteriorTail { index: usize },

    /// A tail wildcard appeared outside of a sequence or set mask.
    #[error("tail wildcard is only valid inside a sequence or set mask")]
    MisplacedTail,

    /// A set mask declaration was malformed.
    #[error("invalid set mask: {0}")]
    InvalidSetMask(String),

    /// A directive mapping (e.g. `$exact`) was malformed.
    #[error("invalid mask directive: {0}")]
    InvalidDirective(String),
}

/// Convenience alias for mask results.
pub type MaskResult<T> = Result<T, MaskError>;
