//! Conversions between persisted documents and their wire shape.
//!
//! Tags are carried by name only: every name on the way in becomes a fresh
//! tag, nothing is matched against tags that already exist.

use crate::application::dto::documents::{DataDto, DocumentDto, DtoError};
use crate::domain::documents::document::{Document, DocumentData, DocumentTag};

impl From<&Document> for DocumentDto {
    fn from(doc: &Document) -> Self {
        DocumentDto {
            id: doc.id,
            tags: Some(doc.tag_names()),
            data: Some(DataDto {
                extension: Some(doc.data.extension.clone()),
                file_name: Some(doc.data.file_name.clone()),
                mime_type: Some(doc.data.mime_type.clone()),
                document_data: Some(doc.data.file_data.clone()),
            }),
        }
    }
}

impl From<Document> for DocumentDto {
    fn from(doc: Document) -> Self {
        DocumentDto::from(&doc)
    }
}

impl TryFrom<&DocumentDto> for Document {
    type Error = DtoError;

    fn try_from(dto: &DocumentDto) -> Result<Self, Self::Error> {
        dto.validate()?;
        let tags = dto.tags.as_deref().unwrap_or_default();
        let data = dto.data.as_ref().ok_or(DtoError::Missing("Data"))?;
        let field = |v: &Option<String>, name: &'static str| {
            v.clone().ok_or(DtoError::Missing(name))
        };

        Ok(Document {
            id: dto.id,
            tags: tags.iter().map(DocumentTag::new_named).collect(),
            data: DocumentData {
                document_id: dto.id,
                file_data: field(&data.document_data, "Data.DocumentData")?,
                extension: field(&data.extension, "Data.Extension")?,
                file_name: field(&data.file_name, "Data.FileName")?,
                mime_type: field(&data.mime_type, "Data.MimeType")?,
            },
        })
    }
}
