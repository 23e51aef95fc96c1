//! Behavioural tests for incremental tree loading through the public API.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use mothball::tree::{
    ChildPage, ChildSource, RowKind, TreeDataProvider, TreeError, TreeItemSpec, TreeNode,
};

/// Serves `total` leaf items in pages of `page_size`, counting loads.
struct PagedSource {
    total: usize,
    page_size: usize,
    loads: AtomicUsize,
}

#[async_trait]
impl ChildSource for PagedSource {
    async fn load_page(&self, offset: usize) -> Result<ChildPage, TreeError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        // Yield so overlapping loads genuinely contend for the gate.
        tokio::task::yield_now().await;
        let end = (offset + self.page_size).min(self.total);
        let items = (offset..end)
            .map(|index| TreeItemSpec::new(format!("issue-{index:02}"), "issue"))
            .collect();
        Ok(ChildPage {
            items,
            has_more: end < self.total,
        })
    }
}

fn paged_root(total: usize, page_size: usize) -> (Arc<TreeNode>, Arc<PagedSource>) {
    let source = Arc::new(PagedSource {
        total,
        page_size,
        loads: AtomicUsize::new(0),
    });
    let root = TreeNode::new_root(
        TreeItemSpec::new("repository", "repository").with_children(Arc::clone(&source) as _),
    );
    (root, source)
}

#[tokio::test]
async fn load_all_children_yields_every_item_exactly_once() {
    let (root, source) = paged_root(10, 2);

    let children = root
        .load_all_children()
        .await
        .expect("loading should succeed");

    assert_eq!(children.len(), 10);
    assert!(!root.has_more());
    assert_eq!(source.loads.load(Ordering::SeqCst), 5);

    // Nothing left to load; a further call is a no-op.
    assert!(!root.load_more().await.expect("no-op load should succeed"));
    assert_eq!(source.loads.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn provider_pages_through_rows_with_a_load_more_entry() {
    let (root, _source) = paged_root(5, 2);
    let provider = TreeDataProvider::new(root);
    let mut refreshes = provider.subscribe();

    let first_page = provider.top_level().await;
    assert_eq!(first_page.len(), 3);
    assert_eq!(
        first_page.last().map(|row| row.kind),
        Some(RowKind::LoadMore)
    );

    let target = Arc::clone(provider.root());
    provider
        .load_more(&target)
        .await
        .expect("load should succeed");
    assert_eq!(
        refreshes.recv().await.expect("a refresh should arrive"),
        "repository"
    );

    provider
        .load_more(&target)
        .await
        .expect("load should succeed");
    let full = provider.top_level().await;
    assert_eq!(full.len(), 5);
    assert!(full.iter().all(|row| row.kind == RowKind::Item));
}

#[tokio::test]
async fn concurrent_loads_share_a_single_page_fetch() {
    let (root, source) = paged_root(6, 2);

    let (first, second, third) =
        tokio::join!(root.load_more(), root.load_more(), root.load_more());
    assert!(first.expect("load should succeed"));
    assert!(second.expect("load should succeed"));
    assert!(third.expect("load should succeed"));

    assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    assert_eq!(root.get_cached_children().await.len(), 2);
}
