use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::any::AnyRow;
use sqlx::AnyConnection;
use sqlx::Row;

use crate::application::ports::document_repository::{
    DocumentRepository, RepositoryError, RepositoryResult,
};
use crate::domain::documents::document::{
    Document as DomainDocument, DocumentData, DocumentTag, Tag,
};
use crate::infrastructure::db::DbPool;

pub struct SqlxDocumentRepository {
    pub pool: DbPool,
}

impl SqlxDocumentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_links(&self, document_id: Option<i64>) -> sqlx::Result<HashMap<i64, Vec<DocumentTag>>> {
        let rows = match document_id {
            Some(id) => {
                sqlx::query(
                    r#"SELECT dt.document_id, t.id AS tag_id, t.name
                       FROM document_tags dt
                       JOIN tags t ON t.id = dt.tag_id
                       WHERE dt.document_id = $1
                       ORDER BY t.id"#,
                )
                .bind(id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"SELECT dt.document_id, t.id AS tag_id, t.name
                       FROM document_tags dt
                       JOIN tags t ON t.id = dt.tag_id
                       ORDER BY dt.document_id, t.id"#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut links: HashMap<i64, Vec<DocumentTag>> = HashMap::new();
        for r in rows {
            let document_id: i64 = r.try_get("document_id")?;
            let tag_id: i64 = r.try_get("tag_id")?;
            links.entry(document_id).or_default().push(DocumentTag {
                document_id,
                tag_id,
                tag: Tag {
                    id: tag_id,
                    name: r.try_get("name")?,
                },
            });
        }
        Ok(links)
    }
}

fn document_from_row(r: &AnyRow, links: &mut HashMap<i64, Vec<DocumentTag>>) -> sqlx::Result<DomainDocument> {
    let id: i64 = r.try_get("id")?;
    Ok(DomainDocument {
        id,
        data: DocumentData {
            document_id: id,
            file_data: r.try_get("file_data")?,
            extension: r.try_get("extension")?,
            file_name: r.try_get("file_name")?,
            mime_type: r.try_get("mime_type")?,
        },
        tags: links.remove(&id).unwrap_or_default(),
    })
}

// A fresh tag row per link; names are never matched against existing tags.
async fn insert_links(conn: &mut AnyConnection, document_id: i64, tags: &[DocumentTag]) -> sqlx::Result<()> {
    for link in tags {
        let tag_id: i64 = sqlx::query("INSERT INTO tags (name) VALUES ($1) RETURNING id")
            .bind(&link.tag.name)
            .fetch_one(&mut *conn)
            .await?
            .try_get("id")?;
        sqlx::query("INSERT INTO document_tags (document_id, tag_id) VALUES ($1, $2)")
            .bind(document_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

fn storage(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Storage(e.into())
}

// Rejections raised by the database itself carry its diagnostic text.
fn write_rejected(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::Database(db) => RepositoryError::PersistenceConflict(db.message().to_string()),
        other => storage(other),
    }
}

#[async_trait]
impl DocumentRepository for SqlxDocumentRepository {
    async fn get_by_id(&self, id: i64) -> RepositoryResult<Option<DomainDocument>> {
        let row = sqlx::query(
            r#"SELECT d.id, dd.file_data, dd.extension, dd.file_name, dd.mime_type
               FROM documents d
               JOIN document_data dd ON dd.document_id = d.id
               WHERE d.id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut links = self.load_links(Some(id)).await.map_err(storage)?;
        document_from_row(&row, &mut links).map(Some).map_err(storage)
    }

    async fn get_all(&self) -> RepositoryResult<Vec<DomainDocument>> {
        let rows = sqlx::query(
            r#"SELECT d.id, dd.file_data, dd.extension, dd.file_name, dd.mime_type
               FROM documents d
               JOIN document_data dd ON dd.document_id = d.id"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        let mut links = self.load_links(None).await.map_err(storage)?;
        rows.iter()
            .map(|r| document_from_row(r, &mut links))
            .collect::<sqlx::Result<Vec<_>>>()
            .map_err(storage)
    }

    async fn add(&self, document: &DomainDocument) -> RepositoryResult<i64> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let row = if document.id > 0 {
            sqlx::query("INSERT INTO documents (id, revision) VALUES ($1, 0) RETURNING id")
                .bind(document.id)
                .fetch_one(&mut *tx)
                .await
        } else {
            sqlx::query("INSERT INTO documents (revision) VALUES (0) RETURNING id")
                .fetch_one(&mut *tx)
                .await
        }
        .map_err(write_rejected)?;
        let id: i64 = row.try_get("id").map_err(storage)?;

        let data = &document.data;
        sqlx::query(
            r#"INSERT INTO document_data (document_id, file_data, extension, file_name, mime_type)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(id)
        .bind(&data.file_data)
        .bind(&data.extension)
        .bind(&data.file_name)
        .bind(&data.mime_type)
        .execute(&mut *tx)
        .await
        .map_err(write_rejected)?;

        insert_links(&mut tx, id, &document.tags)
            .await
            .map_err(write_rejected)?;

        tx.commit().await.map_err(write_rejected)?;
        Ok(id)
    }

    async fn update(&self, document: &DomainDocument) -> RepositoryResult<()> {
        let id = document.id;
        let revision: i64 = sqlx::query("SELECT revision FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?
            .ok_or(RepositoryError::NotFound(id))?
            .try_get("revision")
            .map_err(storage)?;

        let mut tx = self.pool.begin().await.map_err(storage)?;
        let bumped = sqlx::query(
            "UPDATE documents SET revision = revision + 1 WHERE id = $1 AND revision = $2",
        )
        .bind(id)
        .bind(revision)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;
        if bumped.rows_affected() == 0 {
            return Err(RepositoryError::ConcurrencyConflict(id));
        }

        let data = &document.data;
        sqlx::query(
            r#"UPDATE document_data
               SET file_data = $1, extension = $2, file_name = $3, mime_type = $4
               WHERE document_id = $5"#,
        )
        .bind(&data.file_data)
        .bind(&data.extension)
        .bind(&data.file_name)
        .bind(&data.mime_type)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        sqlx::query("DELETE FROM document_tags WHERE document_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        insert_links(&mut tx, id, &document.tags)
            .await
            .map_err(storage)?;

        tx.commit().await.map_err(storage)?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        sqlx::query("DELETE FROM document_tags WHERE document_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        sqlx::query("DELETE FROM document_data WHERE document_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        let res = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        if res.rows_affected() == 0 {
            // dropping the transaction rolls back the no-op deletes above
            return Err(RepositoryError::NotFound(id));
        }
        tx.commit().await.map_err(storage)?;
        Ok(())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::{Dialect, migrate};
    use sqlx::any::AnyPoolOptions;

    async fn repo() -> SqlxDocumentRepository {
        sqlx::any::install_default_drivers();
        // one connection keeps every query on the same in-memory database
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        migrate(&pool, Dialect::Sqlite).await.unwrap();
        SqlxDocumentRepository::new(pool)
    }

    fn doc(id: i64, tags: &[&str]) -> DomainDocument {
        DomainDocument {
            id,
            data: DocumentData {
                document_id: id,
                file_data: format!("content {id}"),
                extension: ".txt".into(),
                file_name: format!("file-{id}"),
                mime_type: "text/plain".into(),
            },
            tags: tags.iter().map(|t| DocumentTag::new_named(*t)).collect(),
        }
    }

    async fn count(repo: &SqlxDocumentRepository, table: &str) -> i64 {
        sqlx::query(&format!("SELECT COUNT(*) AS n FROM {table}"))
            .fetch_one(&repo.pool)
            .await
            .unwrap()
            .get("n")
    }

    #[tokio::test]
    async fn add_then_get_hydrates_data_and_tags() {
        let repo = repo().await;
        let id = repo.add(&doc(1, &["a", "b"])).await.unwrap();
        assert_eq!(id, 1);

        let stored = repo.get_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.tag_names(), vec!["a", "b"]);
        assert_eq!(stored.data.file_data, "content 1");
        assert_eq!(stored.data.document_id, 1);
        assert!(stored.tags.iter().all(|t| t.document_id == 1 && t.tag_id == t.tag.id));
    }

    #[tokio::test]
    async fn missing_id_is_none() {
        let repo = repo().await;
        assert!(repo.get_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn non_positive_id_gets_assigned() {
        let repo = repo().await;
        repo.add(&doc(5, &[])).await.unwrap();
        let id = repo.add(&doc(0, &["x"])).await.unwrap();
        assert!(id > 5);
        assert_eq!(repo.get_by_id(id).await.unwrap().unwrap().tag_names(), vec!["x"]);
    }

    #[tokio::test]
    async fn duplicate_id_is_a_persistence_conflict_and_rolls_back() {
        let repo = repo().await;
        repo.add(&doc(1, &["a"])).await.unwrap();
        let err = repo.add(&doc(1, &["b"])).await.unwrap_err();
        assert!(matches!(err, RepositoryError::PersistenceConflict(ref m) if !m.is_empty()));
        assert_eq!(count(&repo, "tags").await, 1);
        assert_eq!(repo.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn same_tag_name_creates_new_rows() {
        let repo = repo().await;
        repo.add(&doc(1, &["shared"])).await.unwrap();
        repo.add(&doc(2, &["shared"])).await.unwrap();
        assert_eq!(count(&repo, "tags").await, 2);
    }

    #[tokio::test]
    async fn update_replaces_data_and_links() {
        let repo = repo().await;
        repo.add(&doc(1, &["old"])).await.unwrap();

        let mut changed = doc(1, &["new", "newer"]);
        changed.data.file_data = "rewritten".into();
        repo.update(&changed).await.unwrap();

        let stored = repo.get_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.data.file_data, "rewritten");
        assert_eq!(stored.tag_names(), vec!["new", "newer"]);
        // the old tag row is orphaned, not removed
        assert_eq!(count(&repo, "tags").await, 3);
        assert_eq!(count(&repo, "document_tags").await, 2);
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_id_are_not_found() {
        let repo = repo().await;
        repo.add(&doc(1, &["a"])).await.unwrap();

        let err = repo.update(&doc(2, &["b"])).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(2)));
        let err = repo.delete(2).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(2)));

        assert_eq!(count(&repo, "documents").await, 1);
        assert_eq!(count(&repo, "tags").await, 1);
    }

    #[tokio::test]
    async fn delete_cascades_to_data_and_links_but_keeps_tags() {
        let repo = repo().await;
        repo.add(&doc(1, &["a", "b"])).await.unwrap();
        repo.delete(1).await.unwrap();

        assert!(repo.get_by_id(1).await.unwrap().is_none());
        assert_eq!(count(&repo, "document_data").await, 0);
        assert_eq!(count(&repo, "document_tags").await, 0);
        assert_eq!(count(&repo, "tags").await, 2);
    }

    #[tokio::test]
    async fn concurrent_adds_are_all_visible() {
        let repo = std::sync::Arc::new(repo().await);
        let adds = (1..=8).map(|id| {
            let repo = repo.clone();
            async move { repo.add(&doc(id, &["t"])).await }
        });
        for res in futures_util::future::join_all(adds).await {
            res.unwrap();
        }
        let mut ids: Vec<i64> = repo.get_all().await.unwrap().iter().map(|d| d.id).collect();
        ids.sort();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn ping_succeeds() {
        repo().await.ping().await.unwrap();
    }
}
