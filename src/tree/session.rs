//! A category tree bound to a remote [`CategoryApi`].
//!
//! Every mutation goes to the remote side first; the local tree only changes once the
//! call succeeded, so a failed request leaves it exactly as it was.

use std::sync::Arc;

use tracing::{info, warn};

use super::{filter, CategoryApi, CategoryTree, NavNode};
use crate::errors::AppError;
use crate::models::{ActionRequest, BulkAction, Category, CategoryQuery};

pub struct CategorySession<A> {
    api: A,
    tree: CategoryTree,
}

impl<A: CategoryApi> CategorySession<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            tree: CategoryTree::new(),
        }
    }

    pub fn tree(&self) -> &CategoryTree {
        &self.tree
    }

    pub fn nav_list(&self) -> Arc<Vec<NavNode>> {
        self.tree.nav_list()
    }

    /// The navigation tree pruned to `term`.
    pub fn search(&self, term: &str) -> Arc<Vec<NavNode>> {
        filter(&self.tree.nav_list(), term)
    }

    pub fn toggle_selection(&mut self, id: i64) -> bool {
        self.tree.toggle_selection(id)
    }

    /// Fetch the children of `parent_id` and merge them into the tree.
    pub async fn load_children(&mut self, parent_id: i64) -> Result<usize, AppError> {
        let response = self
            .api
            .load_records(&CategoryQuery::children_of(parent_id))
            .await
            .inspect_err(|e| warn!(parent_id, error = %e, "loading children failed"))?;

        let records = response.posts.unwrap_or_default();
        Ok(self.tree.load_children(parent_id, records))
    }

    /// Save `record` remotely, then add or update it locally with the stored version.
    pub async fn save(&mut self, record: Category) -> Result<Category, AppError> {
        let response = self.api.process_record(&record).await?;
        let saved = response.record.ok_or_else(|| {
            AppError::Upstream("save response carried no record".to_string())
        })?;

        if self.tree.contains(saved.id) {
            self.tree.update_record(saved.clone());
        } else {
            self.tree.add_record(saved.clone());
        }
        info!(id = saved.id, parent_id = saved.parent_id, "category saved");
        Ok(saved)
    }

    /// Delete `id` remotely, then drop it and its loaded descendants locally.
    pub async fn delete(&mut self, id: i64) -> Result<Vec<i64>, AppError> {
        self.api
            .process_actions(&ActionRequest::uniform(&[id], BulkAction::Delete))
            .await?;
        Ok(self.tree.delete_record(id))
    }

    /// Delete every selected category in one remote request.
    pub async fn delete_selected(&mut self) -> Result<Vec<i64>, AppError> {
        let selected = self.tree.selection();
        if selected.is_empty() {
            return Ok(Vec::new());
        }

        self.api
            .process_actions(&ActionRequest::uniform(&selected, BulkAction::Delete))
            .await?;

        let mut removed = Vec::new();
        for id in selected {
            removed.extend(self.tree.delete_record(id));
        }
        Ok(removed)
    }
}
