//! Path-driven tree transforms for canopy.
//!
//! Handlers are registered against `/`-separated key paths, compiled once
//! into a [`PathTree`], and applied to any number of trees. Application is
//! non-destructive: the input tree is never modified and every subtree no
//! handler touched is shared with the output.
//!
//! # Key Types
//!
//! - [`Transforms`] -- Registration surface (`when`, `delete`)
//! - [`TreeMapper`] -- Compiled, reusable transform
//! - [`PathTree`] -- Registered paths as a nested lookup structure
//! - [`Outcome`] / [`Position`] -- Handler result and call site
//! - [`recursive_delete`] -- In-place key removal at every depth

pub mod delete;
pub mod error;
pub mod path_tree;
pub mod transform;
pub mod transforms;

pub use delete::recursive_delete;
pub use error::{MapError, MapResult};
pub use path_tree::{Iteration, Leaf, PathTree};
pub use transform::{tree_map, TreeMapper};
pub use transforms::{Outcome, Position, Transforms};
