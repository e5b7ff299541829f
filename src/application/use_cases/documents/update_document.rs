use crate::application::dto::documents::DocumentDto;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::use_cases::documents::DocumentError;
use crate::domain::documents::document::Document as DomainDocument;

pub struct UpdateDocument<'a, R: DocumentRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: DocumentRepository + ?Sized> UpdateDocument<'a, R> {
    pub async fn execute(&self, dto: &DocumentDto) -> Result<(), DocumentError> {
        let doc = DomainDocument::try_from(dto)?;
        self.repo.update(&doc).await?;
        Ok(())
    }
}
