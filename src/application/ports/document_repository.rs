use async_trait::async_trait;

use crate::domain::documents::document::Document as DomainDocument;

#[derive(thiserror::Error, Debug)]
pub enum RepositoryError {
    #[error("document {0} not found")]
    NotFound(i64),
    #[error("document {0} was modified concurrently")]
    ConcurrencyConflict(i64),
    #[error("{0}")]
    PersistenceConflict(String),
    #[error("storage failure")]
    Storage(#[source] anyhow::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Document with its data row and tag graph; `None` when the id is unknown.
    async fn get_by_id(&self, id: i64) -> RepositoryResult<Option<DomainDocument>>;

    async fn get_all(&self) -> RepositoryResult<Vec<DomainDocument>>;

    // Every tag name becomes a new tag row. Returns the stored id
    // (assigned by the store when document.id <= 0).
    async fn add(&self, document: &DomainDocument) -> RepositoryResult<i64>;

    // Replaces data and tag links of an existing document.
    async fn update(&self, document: &DomainDocument) -> RepositoryResult<()>;

    // Removes the document, its data and its tag links; tag rows survive.
    async fn delete(&self, id: i64) -> RepositoryResult<()>;

    async fn ping(&self) -> RepositoryResult<()>;
}
