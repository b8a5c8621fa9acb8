//! Mask comparison engine for canopy.
//!
//! Compares a [`Tree`](canopy_types::Tree) against a declarative [`Mask`]
//! and reports every structural difference as a [`DiffRecord`]. Masks
//! describe a required subset: mapping keys the mask does not name are
//! ignored, sentinels relax or tighten individual positions, and set masks
//! compare sequences without regard to order.
//!
//! # Key Types
//!
//! - [`Mask`] / [`SeqMask`] / [`Predicate`] -- Mask variants
//! - [`SetMask`] -- Order-independent keyed sequence comparison
//! - [`Comparator`] -- Seam for custom comparison logic ([`AnyValue`], [`OneOf`])
//! - [`DiffRecord`] / [`Actual`] / [`Expected`] -- One reported mismatch
//! - [`MaskSyntax`] -- Masks written as plain JSON documents

pub mod builtins;
pub mod compare;
pub mod error;
pub mod mask;
pub mod record;
pub mod set_mask;
pub mod syntax;

pub use builtins::{AnyValue, OneOf};
pub use compare::{compare_at, compare_map, tree_compare};
pub use error::{MaskError, MaskResult};
pub use mask::{Comparator, Mask, MaskItem, Predicate, SeqMask};
pub use record::{render_report, Actual, DiffRecord, Expected};
pub use set_mask::SetMask;
pub use syntax::MaskSyntax;
