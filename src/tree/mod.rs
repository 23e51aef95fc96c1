//! Incrementally loaded item tree.
//!
//! [`TreeNode`] composes optional capabilities (a child source, a delete
//! hook) instead of requiring subtypes per node kind. [`TreeDataProvider`]
//! projects nodes into flat rows with a `Load more...` pseudo-row and a
//! broadcast refresh feed, and [`pick_tree_item`] drives quick-pick
//! navigation over the same tree.

mod item;
mod picker;
mod provider;

pub use item::{
    ChildPage, ChildSource, Comparator, DeleteHook, ERROR_CONTEXT_VALUE, TreeError, TreeItemSpec,
    TreeNode,
};
pub use picker::pick_tree_item;
pub use provider::{LOAD_MORE_SUFFIX, RowKind, TreeDataProvider, TreeRow};
