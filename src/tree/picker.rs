//! Quick-pick driven tree navigation.
//!
//! Walks the tree level by level through a [`Prompter`] until the user picks
//! a node carrying the requested context value. A `Load more...` entry is
//! offered whenever the current level has unfetched pages.

use std::sync::Arc;

use crate::wizard::{PickItem, Prompter, WizardError};

use super::item::TreeNode;

const LOAD_MORE_LABEL: &str = "Load more...";

/// Walks the tree from `root` until a node with `context_value` is picked.
///
/// Intermediate levels offer parents to descend into and matching nodes to
/// select; the pseudo entry at the bottom loads the next page in place.
///
/// # Errors
///
/// Returns [`WizardError::Validation`] when a level offers nothing useful or
/// the pick lands on a leaf that does not match, and propagates
/// [`WizardError::GoBack`] and [`WizardError::UserCancelled`] from the
/// prompter so enclosing wizards can unwind.
pub async fn pick_tree_item(
    root: &Arc<TreeNode>,
    context_value: &str,
    prompter: &dyn Prompter,
) -> Result<Arc<TreeNode>, WizardError> {
    let mut current = Arc::clone(root);
    loop {
        let children = current.get_cached_children().await;
        let mut items: Vec<PickItem> = children.iter().map(|child| pick_entry(child)).collect();
        let offers_load_more = current.has_more();
        if offers_load_more {
            items.push(PickItem::new(LOAD_MORE_LABEL));
        }
        if items.is_empty() {
            return Err(WizardError::Validation {
                message: format!(
                    "no `{context_value}` item found under `{}`",
                    current.label()
                ),
            });
        }

        let prompt = format!("Select a {context_value}");
        let index = prompter.pick(&prompt, &items).await?;

        if offers_load_more && index == children.len() {
            current
                .load_more()
                .await
                .map_err(|error| WizardError::Validation {
                    message: error.to_string(),
                })?;
            continue;
        }

        let Some(chosen) = children.get(index) else {
            return Err(WizardError::Validation {
                message: format!("pick index {index} is out of range"),
            });
        };

        if chosen.context_value() == context_value {
            return Ok(Arc::clone(chosen));
        }
        if chosen.is_parent() {
            current = Arc::clone(chosen);
            continue;
        }
        return Err(WizardError::Validation {
            message: format!("`{}` is not a {context_value}", chosen.label()),
        });
    }
}

fn pick_entry(node: &Arc<TreeNode>) -> PickItem {
    let mut item = PickItem::new(node.label());
    if let Some(description) = node.description() {
        item = item.with_description(description);
    }
    item
}
