//! Flat row projection of the tree plus a refresh feed.
//!
//! The provider turns nodes into display rows, appends a `Load more...`
//! pseudo-row while a parent has unfetched pages, and broadcasts the full id
//! of any node whose subtree changed so views can re-render it.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::item::{TreeError, TreeNode};

/// Full id suffix of the load-more pseudo-row.
pub const LOAD_MORE_SUFFIX: &str = "load-more";

const LOAD_MORE_LABEL: &str = "Load more...";
const REFRESH_CHANNEL_CAPACITY: usize = 16;

/// What a row represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// A real tree node.
    Item,
    /// The pseudo-row that triggers loading the next page.
    LoadMore,
}

/// One renderable row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    /// Stable path-like identifier.
    pub full_id: String,
    /// Primary text.
    pub label: String,
    /// Secondary text, if any.
    pub description: Option<String>,
    /// Context tag for command enablement.
    pub context_value: String,
    /// Whether the row can be expanded.
    pub collapsible: bool,
    /// Row kind.
    pub kind: RowKind,
}

/// Serves rows for a tree rooted at a single node and notifies subscribers
/// when a subtree needs re-rendering.
pub struct TreeDataProvider {
    root: Arc<TreeNode>,
    refresh_tx: broadcast::Sender<String>,
}

impl TreeDataProvider {
    /// Creates a provider over `root`.
    #[must_use]
    pub fn new(root: Arc<TreeNode>) -> Self {
        let (refresh_tx, _) = broadcast::channel(REFRESH_CHANNEL_CAPACITY);
        Self { root, refresh_tx }
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> &Arc<TreeNode> {
        &self.root
    }

    /// Subscribes to refresh notifications; each message is the full id of
    /// the node whose subtree changed.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.refresh_tx.subscribe()
    }

    /// Rows for the children of `node`, including the load-more pseudo-row
    /// while further pages remain.
    pub async fn children(&self, node: &Arc<TreeNode>) -> Vec<TreeRow> {
        let children = node.get_cached_children().await;
        let mut rows: Vec<TreeRow> = children.iter().map(|child| Self::row(child)).collect();
        if node.has_more() {
            rows.push(Self::load_more_row(node));
        }
        rows
    }

    /// Rows for the top level of the tree.
    pub async fn top_level(&self) -> Vec<TreeRow> {
        let root = Arc::clone(&self.root);
        self.children(&root).await
    }

    /// Loads the next page under `node` and notifies subscribers.
    ///
    /// # Errors
    ///
    /// Propagates load failures from the child source.
    pub async fn load_more(&self, node: &Arc<TreeNode>) -> Result<(), TreeError> {
        node.load_more().await?;
        self.notify(node);
        Ok(())
    }

    /// Clears the cache under `node` and notifies subscribers.
    pub fn refresh(&self, node: &Arc<TreeNode>) {
        node.refresh();
        self.notify(node);
    }

    fn notify(&self, node: &Arc<TreeNode>) {
        // Send only fails with no live subscribers, which is fine.
        drop(self.refresh_tx.send(node.full_id()));
    }

    fn row(node: &Arc<TreeNode>) -> TreeRow {
        TreeRow {
            full_id: node.full_id(),
            label: node.label().to_owned(),
            description: node.description().map(str::to_owned),
            context_value: node.context_value().to_owned(),
            collapsible: node.is_parent(),
            kind: RowKind::Item,
        }
    }

    fn load_more_row(node: &Arc<TreeNode>) -> TreeRow {
        TreeRow {
            full_id: format!("{}/{LOAD_MORE_SUFFIX}", node.full_id()),
            label: LOAD_MORE_LABEL.to_owned(),
            description: None,
            context_value: LOAD_MORE_SUFFIX.to_owned(),
            collapsible: false,
            kind: RowKind::LoadMore,
        }
    }
}
