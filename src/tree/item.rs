//! Tree nodes with incrementally loaded, cached children.
//!
//! Nodes are plain data plus optional capabilities: a [`ChildSource`] for
//! parents and a [`DeleteHook`] for deletable items. Child caches load one
//! page at a time; at most one load is in flight per node and concurrent
//! callers share the result of whichever load wins.

use std::cmp::Ordering;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;

/// Errors surfaced by tree operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    /// Loading a page of children failed.
    #[error("failed to load children: {message}")]
    Load {
        /// Failure detail from the child source.
        message: String,
    },

    /// The node has no delete capability.
    #[error("item `{label}` cannot be deleted")]
    NotDeletable {
        /// Label of the node.
        label: String,
    },

    /// The delete hook failed.
    #[error("delete failed: {message}")]
    Delete {
        /// Failure detail from the hook.
        message: String,
    },
}

/// Context value assigned to synthetic error leaves.
pub const ERROR_CONTEXT_VALUE: &str = "error";

const ERROR_LABEL_MAX: usize = 80;

/// One page of child descriptors.
pub struct ChildPage {
    /// Descriptors for the nodes on this page.
    pub items: Vec<TreeItemSpec>,
    /// Whether another page can be loaded.
    pub has_more: bool,
}

/// Supplies pages of children for a parent node.
#[async_trait]
pub trait ChildSource: Send + Sync {
    /// Loads the page starting at `offset` (the number of children already
    /// cached).
    async fn load_page(&self, offset: usize) -> Result<ChildPage, TreeError>;
}

/// Deletes whatever a node represents.
#[async_trait]
pub trait DeleteHook: Send + Sync {
    /// Performs the deletion.
    async fn delete(&self) -> Result<(), TreeError>;
}

/// Orders sibling nodes within a cache.
pub type Comparator = Arc<dyn Fn(&TreeNode, &TreeNode) -> Ordering + Send + Sync>;

/// Case-insensitive label ordering with a case-sensitive tiebreak.
fn default_comparator(a: &TreeNode, b: &TreeNode) -> Ordering {
    a.label
        .to_lowercase()
        .cmp(&b.label.to_lowercase())
        .then_with(|| a.label.cmp(&b.label))
}

/// Descriptor used to build a [`TreeNode`].
#[derive(Default)]
pub struct TreeItemSpec {
    label: String,
    context_value: String,
    id: Option<String>,
    description: Option<String>,
    icon: Option<String>,
    children: Option<(Arc<dyn ChildSource>, Option<Comparator>)>,
    delete_hook: Option<Arc<dyn DeleteHook>>,
}

impl TreeItemSpec {
    /// Creates a leaf descriptor.
    #[must_use]
    pub fn new(label: impl Into<String>, context_value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            context_value: context_value.into(),
            ..Self::default()
        }
    }

    /// Sets an explicit id used in the full id instead of the label.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the secondary text.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the icon identifier.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Makes the node a parent backed by the given source, sorted by the
    /// default label comparator.
    #[must_use]
    pub fn with_children(mut self, source: Arc<dyn ChildSource>) -> Self {
        self.children = Some((source, None));
        self
    }

    /// Makes the node a parent with a custom sibling comparator.
    #[must_use]
    pub fn with_sorted_children(
        mut self,
        source: Arc<dyn ChildSource>,
        comparator: Comparator,
    ) -> Self {
        self.children = Some((source, Some(comparator)));
        self
    }

    /// Makes the node deletable through the given hook.
    #[must_use]
    pub fn with_delete_hook(mut self, hook: Arc<dyn DeleteHook>) -> Self {
        self.delete_hook = Some(hook);
        self
    }
}

struct ChildCache {
    children: Vec<Arc<TreeNode>>,
    has_more: bool,
    loaded: bool,
    /// Bumped by refresh so a stale in-flight load cannot repopulate the
    /// cache it was started against.
    epoch: u64,
    pages_loaded: u64,
}

struct ChildSet {
    source: Arc<dyn ChildSource>,
    comparator: Comparator,
    state: StdMutex<ChildCache>,
    /// Serialises loads: at most one page fetch in flight per node.
    load_gate: AsyncMutex<()>,
}

impl ChildSet {
    fn state(&self) -> MutexGuard<'_, ChildCache> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A node in the item tree.
///
/// Nodes hold an upward [`Weak`] reference only; ownership flows from parent
/// caches down to children.
pub struct TreeNode {
    label: String,
    context_value: String,
    id: Option<String>,
    description: Option<String>,
    icon: Option<String>,
    parent: Weak<TreeNode>,
    children: Option<ChildSet>,
    delete_hook: Option<Arc<dyn DeleteHook>>,
}

impl std::fmt::Debug for TreeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeNode")
            .field("label", &self.label)
            .field("context_value", &self.context_value)
            .field("id", &self.id)
            .field("description", &self.description)
            .field("icon", &self.icon)
            .finish_non_exhaustive()
    }
}

impl TreeNode {
    /// Builds a root node from a descriptor.
    #[must_use]
    pub fn new_root(spec: TreeItemSpec) -> Arc<Self> {
        Self::from_spec(spec, Weak::new())
    }

    fn from_spec(spec: TreeItemSpec, parent: Weak<Self>) -> Arc<Self> {
        let children = spec.children.map(|(source, comparator)| ChildSet {
            source,
            comparator: comparator.unwrap_or_else(|| Arc::new(default_comparator)),
            state: StdMutex::new(ChildCache {
                children: Vec::new(),
                has_more: false,
                loaded: false,
                epoch: 0,
                pages_loaded: 0,
            }),
            load_gate: AsyncMutex::new(()),
        });

        Arc::new(Self {
            label: spec.label,
            context_value: spec.context_value,
            id: spec.id,
            description: spec.description,
            icon: spec.icon,
            parent,
            children,
            delete_hook: spec.delete_hook,
        })
    }

    fn error_leaf(parent: &Arc<Self>, error: &TreeError) -> Arc<Self> {
        let mut label = error.to_string();
        if label.chars().count() > ERROR_LABEL_MAX {
            label = label.chars().take(ERROR_LABEL_MAX).collect();
        }
        Self::from_spec(
            TreeItemSpec::new(label, ERROR_CONTEXT_VALUE),
            Arc::downgrade(parent),
        )
    }

    /// Node label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Context tag used by pickers and command enablement.
    #[must_use]
    pub fn context_value(&self) -> &str {
        &self.context_value
    }

    /// Secondary text, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Icon identifier, if any.
    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// The parent node, when it is still alive.
    #[must_use]
    pub fn parent(&self) -> Option<Arc<Self>> {
        self.parent.upgrade()
    }

    /// Whether the node can have children at all.
    #[must_use]
    pub const fn is_parent(&self) -> bool {
        self.children.is_some()
    }

    /// Whether the node can be deleted.
    #[must_use]
    pub const fn is_deletable(&self) -> bool {
        self.delete_hook.is_some()
    }

    /// Whether another page of children can be loaded.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.children
            .as_ref()
            .is_some_and(|set| set.state().has_more)
    }

    /// Path-like id built from the ancestor chain.
    ///
    /// Each segment is the node's explicit id, falling back to its label;
    /// segments are joined root-first with `/`.
    #[must_use]
    pub fn full_id(&self) -> String {
        let mut segments = vec![self.id_segment().to_owned()];
        let mut ancestor = self.parent();
        while let Some(node) = ancestor {
            segments.push(node.id_segment().to_owned());
            ancestor = node.parent();
        }
        segments.reverse();
        segments.join("/")
    }

    fn id_segment(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.label)
    }

    /// Returns the cached children, loading the first page on first access.
    ///
    /// A failed load is surfaced as a single synthetic error leaf so the
    /// rendering layer never hard-fails on a broken subtree.
    pub async fn get_cached_children(self: &Arc<Self>) -> Vec<Arc<Self>> {
        let Some(set) = &self.children else {
            return Vec::new();
        };

        let needs_load = !set.state().loaded;
        if needs_load
            && let Err(error) = self.load_more().await
        {
            return vec![Self::error_leaf(self, &error)];
        }

        set.state().children.clone()
    }

    /// Loads the next page of children, returning whether more remain.
    ///
    /// Idempotent under concurrent callers: loads serialise on an async
    /// gate, and a caller that waited out another caller's load observes the
    /// page that load appended instead of fetching again.
    ///
    /// # Errors
    ///
    /// Propagates [`TreeError::Load`] from the child source.
    pub async fn load_more(self: &Arc<Self>) -> Result<bool, TreeError> {
        let Some(set) = &self.children else {
            return Ok(false);
        };

        let (epoch_before, pages_before) = {
            let state = set.state();
            (state.epoch, state.pages_loaded)
        };

        let _gate = set.load_gate.lock().await;

        let offset = {
            let state = set.state();
            if state.pages_loaded != pages_before || state.epoch != epoch_before {
                // Another caller's load completed while we waited.
                return Ok(state.has_more);
            }
            if state.loaded && !state.has_more {
                return Ok(false);
            }
            state.children.len()
        };

        let page = set.source.load_page(offset).await?;

        let mut state = set.state();
        if state.epoch != epoch_before {
            // Refreshed while loading; drop the stale page.
            return Ok(state.has_more);
        }

        let parent = Arc::downgrade(self);
        for spec in page.items {
            state.children.push(Self::from_spec(spec, parent.clone()));
        }
        state.children.sort_by(|a, b| (set.comparator)(a, b));
        state.has_more = page.has_more;
        state.loaded = true;
        state.pages_loaded += 1;
        Ok(page.has_more)
    }

    /// Loads every remaining page and returns the full child list.
    ///
    /// # Errors
    ///
    /// Propagates the first load failure.
    pub async fn load_all_children(self: &Arc<Self>) -> Result<Vec<Arc<Self>>, TreeError> {
        while self.load_more().await? {}
        Ok(self
            .children
            .as_ref()
            .map_or_else(Vec::new, |set| set.state().children.clone()))
    }

    /// Clears the child cache so the next read reloads from the source.
    pub fn refresh(&self) {
        let Some(set) = &self.children else {
            return;
        };
        let mut state = set.state();
        state.children.clear();
        state.has_more = false;
        state.loaded = false;
        state.epoch += 1;
    }

    /// Deletes the node through its hook and drops it from the parent cache.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotDeletable`] when the node has no delete hook
    /// and propagates hook failures.
    pub async fn delete(self: &Arc<Self>) -> Result<(), TreeError> {
        let Some(hook) = &self.delete_hook else {
            return Err(TreeError::NotDeletable {
                label: self.label.clone(),
            });
        };
        hook.delete().await?;

        if let Some(parent) = self.parent()
            && let Some(set) = &parent.children
        {
            set.state()
                .children
                .retain(|child| !Arc::ptr_eq(child, self));
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use async_trait::async_trait;

    use super::test_sources::{BrokenSource, PagedSource};
    use super::{DeleteHook, ERROR_CONTEXT_VALUE, TreeError, TreeItemSpec, TreeNode};

    fn paged_root(total: usize, page_size: usize) -> (Arc<TreeNode>, Arc<PagedSource>) {
        let source = Arc::new(PagedSource::new(total, page_size));
        let root = TreeNode::new_root(
            TreeItemSpec::new("root", "container").with_children(Arc::clone(&source) as _),
        );
        (root, source)
    }

    #[tokio::test]
    async fn first_read_loads_one_page() {
        let (root, source) = paged_root(10, 2);

        let children = root.get_cached_children().await;
        assert_eq!(children.len(), 2);
        assert!(root.has_more());
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);

        // A second read serves from cache.
        let again = root.get_cached_children().await;
        assert_eq!(again.len(), 2);
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn load_all_children_drains_the_source() {
        let (root, source) = paged_root(10, 2);

        let children = root
            .load_all_children()
            .await
            .expect("loading should succeed");
        assert_eq!(children.len(), 10);
        assert!(!root.has_more());
        assert_eq!(source.loads.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn concurrent_load_more_fetches_one_page() {
        let (root, source) = paged_root(10, 2);

        let (first, second) = tokio::join!(root.load_more(), root.load_more());
        assert!(first.expect("load should succeed"));
        assert!(second.expect("load should succeed"));
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert_eq!(root.get_cached_children().await.len(), 2);
    }

    #[tokio::test]
    async fn children_are_sorted_case_insensitively() {
        use super::{ChildPage, ChildSource};

        struct Unsorted;

        #[async_trait]
        impl ChildSource for Unsorted {
            async fn load_page(&self, _offset: usize) -> Result<ChildPage, TreeError> {
                Ok(ChildPage {
                    items: vec![
                        TreeItemSpec::new("banana", "leaf"),
                        TreeItemSpec::new("Apple", "leaf"),
                        TreeItemSpec::new("cherry", "leaf"),
                    ],
                    has_more: false,
                })
            }
        }

        let root = TreeNode::new_root(
            TreeItemSpec::new("root", "container").with_children(Arc::new(Unsorted)),
        );
        let labels: Vec<String> = root
            .get_cached_children()
            .await
            .iter()
            .map(|child| child.label().to_owned())
            .collect();
        assert_eq!(labels, vec!["Apple", "banana", "cherry"]);
    }

    #[tokio::test]
    async fn failed_load_yields_error_leaf() {
        let root = TreeNode::new_root(
            TreeItemSpec::new("root", "container").with_children(Arc::new(BrokenSource)),
        );

        let children = root.get_cached_children().await;
        assert_eq!(children.len(), 1);
        let leaf = children.first().expect("error leaf should be present");
        assert_eq!(leaf.context_value(), ERROR_CONTEXT_VALUE);
        assert!(leaf.label().contains("subscription unreachable"));
    }

    #[tokio::test]
    async fn refresh_clears_cache_and_reloads() {
        let (root, source) = paged_root(4, 2);

        root.load_all_children().await.expect("load should succeed");
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);

        root.refresh();
        assert!(!root.has_more());
        let children = root.get_cached_children().await;
        assert_eq!(children.len(), 2);
        assert_eq!(source.loads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn full_id_joins_ancestor_segments() {
        let (root, _source) = paged_root(2, 2);
        let children = root.get_cached_children().await;
        let child = children.first().expect("child should be present");

        assert_eq!(root.full_id(), "root");
        assert_eq!(child.full_id(), "root/item-00");
        assert_eq!(
            child.parent().map(|parent| parent.full_id()),
            Some("root".to_owned())
        );
    }

    #[tokio::test]
    async fn delete_runs_hook_and_prunes_parent_cache() {
        use super::{ChildPage, ChildSource};

        struct OneDeletable;

        #[async_trait]
        impl ChildSource for OneDeletable {
            async fn load_page(&self, _offset: usize) -> Result<ChildPage, TreeError> {
                Ok(ChildPage {
                    items: vec![
                        TreeItemSpec::new("keep", "leaf"),
                        TreeItemSpec::new("remove", "leaf").with_delete_hook(Arc::new(NoopHook)),
                    ],
                    has_more: false,
                })
            }
        }

        struct NoopHook;

        #[async_trait]
        impl DeleteHook for NoopHook {
            async fn delete(&self) -> Result<(), TreeError> {
                Ok(())
            }
        }

        let root = TreeNode::new_root(
            TreeItemSpec::new("root", "container").with_children(Arc::new(OneDeletable)),
        );
        let children = root.get_cached_children().await;
        let deletable = children
            .iter()
            .find(|child| child.is_deletable())
            .expect("a deletable child should exist");

        deletable.delete().await.expect("delete should succeed");
        assert_eq!(root.get_cached_children().await.len(), 1);

        let keeper = children
            .iter()
            .find(|child| !child.is_deletable())
            .expect("the other child should exist");
        let error = keeper.delete().await.expect_err("leaf is not deletable");
        assert!(matches!(error, TreeError::NotDeletable { .. }));
    }
}
