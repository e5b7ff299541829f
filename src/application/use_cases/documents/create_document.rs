use crate::application::dto::documents::DocumentDto;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::use_cases::documents::DocumentError;
use crate::domain::documents::document::Document as DomainDocument;

pub struct CreateDocument<'a, R: DocumentRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: DocumentRepository + ?Sized> CreateDocument<'a, R> {
    /// Stores the document and returns the submitted DTO carrying the stored id.
    pub async fn execute(&self, dto: &DocumentDto) -> Result<DocumentDto, DocumentError> {
        let doc = DomainDocument::try_from(dto)?;
        let id = self.repo.add(&doc).await?;
        Ok(DocumentDto { id, ..dto.clone() })
    }
}
