//! Foundation types for canopy.
//!
//! Every other canopy crate depends on `canopy-types`. It provides the
//! persistent tree value that masks are compared against and that path
//! transforms rewrite.
//!
//! # Key Types
//!
//! - [`Tree`] -- JSON-like value with reference-counted containers
//! - [`Key`] -- Mapping key / path segment
//! - [`Path`] -- Location of a node relative to a root tree
//! - [`Kind`] -- Node shape, used in diagnostics

pub mod error;
pub mod key;
pub mod path;
pub mod tree;

pub use error::TypeError;
pub use key::Key;
pub use path::Path;
pub use tree::{Kind, Tree, TreeMap};

#[doc(hidden)]
pub use serde_json as __serde_json;

/// Build a [`Tree`] from JSON syntax.
///
/// ```
/// use canopy_types::tree;
///
/// let t = tree!({"a": [1, 2], "b": null});
/// assert_eq!(t.pointer("a/1").and_then(|n| n.as_i64()), Some(2));
/// ```
#[macro_export]
macro_rules! tree {
    ($($json:tt)+) => {
        $crate::Tree::from($crate::__serde_json::json!($($json)+))
    };
}
