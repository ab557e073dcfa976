// src/registry/mod.rs
//! Source registry seam. The relational CRUD store lives elsewhere; the
//! harvester only needs a count and an offset/limit page joined with publishers.

pub mod file;

use async_trait::async_trait;

use crate::domain::Source;
use crate::error::RegistryError;

pub use file::StaticRegistry;

#[async_trait]
pub trait SourceRegistry: Send + Sync {
    async fn count(&self) -> Result<u64, RegistryError>;

    /// Sources in stable order, each joined with its publisher.
    async fn find_batch_with_publisher(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Source>, RegistryError>;
}
