//! Backend collaborator interfaces.
//!
//! The core only needs two things from the outside world: component lists per
//! category and a place to keep named builds. Both are traits so the session
//! can run against the REST backend ([`ApiClient`]) or an in-memory catalog
//! loaded from a file ([`crate::catalog::StaticCatalog`]).

mod client;
mod types;

use async_trait::async_trait;

use crate::build::SavedBuild;
use crate::catalog::{Component, Slot};
use crate::error::{DroneClearError, Result};

pub use client::ApiClient;
pub use types::CategoryInfo;

/// Read access to the parts catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Categories with their display names and part counts.
    async fn list_categories(&self) -> Result<Vec<CategoryInfo>>;

    /// Every component in one category.
    async fn list_components(&self, slot: Slot) -> Result<Vec<Component>>;

    /// A single component. The default looks it up in the category listing.
    async fn get_component(&self, slot: Slot, pid: &str) -> Result<Component> {
        self.list_components(slot)
            .await?
            .into_iter()
            .find(|c| c.pid == pid)
            .ok_or_else(|| DroneClearError::NotFound(format!("{} in {}", pid, slot)))
    }
}

/// Named build persistence ("drone models" on the backend).
#[async_trait]
pub trait BuildStore: Send + Sync {
    async fn save_build(&self, build: &SavedBuild) -> Result<SavedBuild>;
    async fn list_saved_builds(&self) -> Result<Vec<SavedBuild>>;
    async fn get_saved_build(&self, pid: &str) -> Result<SavedBuild>;
    async fn delete_saved_build(&self, pid: &str) -> Result<()>;
}
