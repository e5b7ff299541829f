use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::document_repository::{
    DocumentRepository, RepositoryError, RepositoryResult,
};
use crate::domain::documents::document::{
    Document as DomainDocument, DocumentData, DocumentTag, Tag,
};

#[derive(Default)]
struct Tables {
    documents: BTreeMap<i64, StoredDocument>,
    tags: BTreeMap<i64, String>,
    next_document_id: i64,
    next_tag_id: i64,
}

struct StoredDocument {
    data: DocumentData,
    tag_ids: Vec<i64>,
}

/// Process-local store used by the `InMemoryDb` backend. Mirrors the
/// relational tables, including orphaned tags and store-assigned ids.
#[derive(Default)]
pub struct InMemoryDocumentRepository {
    tables: RwLock<Tables>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn tag_count(&self) -> usize {
        self.tables.read().await.tags.len()
    }
}

impl Tables {
    fn hydrate(&self, id: i64, stored: &StoredDocument) -> DomainDocument {
        let tags = stored
            .tag_ids
            .iter()
            .filter_map(|tag_id| {
                self.tags.get(tag_id).map(|name| DocumentTag {
                    document_id: id,
                    tag_id: *tag_id,
                    tag: Tag {
                        id: *tag_id,
                        name: name.clone(),
                    },
                })
            })
            .collect();
        DomainDocument {
            id,
            data: stored.data.clone(),
            tags,
        }
    }

    fn insert_tags(&mut self, tags: &[DocumentTag]) -> Vec<i64> {
        tags.iter()
            .map(|link| {
                self.next_tag_id += 1;
                self.tags.insert(self.next_tag_id, link.tag.name.clone());
                self.next_tag_id
            })
            .collect()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn get_by_id(&self, id: i64) -> RepositoryResult<Option<DomainDocument>> {
        let tables = self.tables.read().await;
        Ok(tables
            .documents
            .get(&id)
            .map(|stored| tables.hydrate(id, stored)))
    }

    async fn get_all(&self) -> RepositoryResult<Vec<DomainDocument>> {
        let tables = self.tables.read().await;
        Ok(tables
            .documents
            .iter()
            .map(|(id, stored)| tables.hydrate(*id, stored))
            .collect())
    }

    async fn add(&self, document: &DomainDocument) -> RepositoryResult<i64> {
        let mut tables = self.tables.write().await;
        let id = if document.id > 0 {
            if tables.documents.contains_key(&document.id) {
                return Err(RepositoryError::PersistenceConflict(format!(
                    "A document with id {} already exists.",
                    document.id
                )));
            }
            document.id
        } else {
            tables
                .next_document_id
                .max(tables.documents.keys().next_back().copied().unwrap_or(0))
                .checked_add(1)
                .ok_or_else(|| {
                    RepositoryError::PersistenceConflict(
                        "No document id is left to assign.".to_string(),
                    )
                })?
        };
        tables.next_document_id = tables.next_document_id.max(id);

        let tag_ids = tables.insert_tags(&document.tags);
        let data = DocumentData {
            document_id: id,
            ..document.data.clone()
        };
        tables.documents.insert(
            id,
            StoredDocument {
                data,
                tag_ids,
            },
        );
        Ok(id)
    }

    async fn update(&self, document: &DomainDocument) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.documents.contains_key(&document.id) {
            return Err(RepositoryError::NotFound(document.id));
        }

        let tag_ids = tables.insert_tags(&document.tags);
        let data = DocumentData {
            document_id: document.id,
            ..document.data.clone()
        };
        tables.documents.insert(
            document.id,
            StoredDocument {
                data,
                tag_ids,
            },
        );
        Ok(())
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        match tables.documents.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound(id)),
        }
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}
