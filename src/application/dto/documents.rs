use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MAX_MIME_TYPE_LEN: usize = 50;
pub const MAX_FILE_NAME_LEN: usize = 255;
pub const MAX_EXTENSION_LEN: usize = 5;
pub const MAX_TAG_LEN: usize = 255;

/// Wire shape of a document. Required members are optional here so that a
/// missing one is reported by [`DocumentDto::validate`] instead of the decoder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDto {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub data: Option<DataDto>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataDto {
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub document_data: Option<String>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DtoError {
    #[error("Required field {0} is missing")]
    Missing(&'static str),
    #[error("{message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl DocumentDto {
    /// Presence first (any absent member wins), then length constraints.
    pub fn validate(&self) -> Result<(), DtoError> {
        let tags = self.tags.as_ref().ok_or(DtoError::Missing("Tags"))?;
        let data = self.data.as_ref().ok_or(DtoError::Missing("Data"))?;
        data.validate()?;

        if tags.iter().any(|t| t.chars().count() > MAX_TAG_LEN) {
            return Err(DtoError::Invalid {
                field: "Tags",
                message: format!("Items in Tags cannot exceed {MAX_TAG_LEN} characters."),
            });
        }
        if tags.iter().any(|t| t.is_empty()) {
            return Err(DtoError::Invalid {
                field: "Tags",
                message: "Items in Tags cannot be empty.".into(),
            });
        }
        Ok(())
    }
}

impl DataDto {
    fn validate(&self) -> Result<(), DtoError> {
        let extension = required(&self.extension, "Data.Extension")?;
        let file_name = required(&self.file_name, "Data.FileName")?;
        let mime_type = required(&self.mime_type, "Data.MimeType")?;
        required(&self.document_data, "Data.DocumentData")?;

        max_len(mime_type, MAX_MIME_TYPE_LEN, "Data.MimeType")?;
        max_len(file_name, MAX_FILE_NAME_LEN, "Data.FileName")?;
        max_len(extension, MAX_EXTENSION_LEN, "Data.Extension")?;
        Ok(())
    }
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, DtoError> {
    value.as_deref().ok_or(DtoError::Missing(field))
}

fn max_len(value: &str, max: usize, field: &'static str) -> Result<(), DtoError> {
    if value.chars().count() > max {
        return Err(DtoError::Invalid {
            field,
            message: format!("The field {field} must be a string with a maximum length of {max}."),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DocumentDto {
        DocumentDto {
            id: 1,
            tags: Some(vec!["tag1".into()]),
            data: Some(DataDto {
                extension: Some(".txt".into()),
                file_name: Some("TestFile".into()),
                mime_type: Some("text/plain".into()),
                document_data: Some("Sample text document content".into()),
            }),
        }
    }

    #[test]
    fn accepts_complete_document() {
        assert_eq!(sample().validate(), Ok(()));
    }

    #[test]
    fn missing_data_is_reported_before_lengths() {
        let mut dto = sample();
        dto.data = None;
        dto.tags = Some(vec!["x".repeat(300)]);
        assert_eq!(dto.validate(), Err(DtoError::Missing("Data")));
    }

    #[test]
    fn missing_nested_field_names_its_path() {
        let mut dto = sample();
        dto.data.as_mut().unwrap().document_data = None;
        assert_eq!(dto.validate(), Err(DtoError::Missing("Data.DocumentData")));
    }

    #[test]
    fn extension_longer_than_five_chars_is_invalid() {
        let mut dto = sample();
        dto.data.as_mut().unwrap().extension = Some(".backup".into());
        let err = dto.validate().unwrap_err();
        assert!(matches!(err, DtoError::Invalid { field: "Data.Extension", .. }));
    }

    #[test]
    fn long_tags_are_invalid() {
        let mut dto = sample();
        dto.tags = Some(vec!["ok".into(), "x".repeat(MAX_TAG_LEN + 1)]);
        assert_eq!(
            dto.validate().unwrap_err().to_string(),
            "Items in Tags cannot exceed 255 characters."
        );
    }

    #[test]
    fn only_zero_length_tags_are_empty() {
        let mut dto = sample();
        dto.tags = Some(vec!["  ".into()]);
        assert_eq!(dto.validate(), Ok(()));

        dto.tags = Some(vec!["a".into(), String::new()]);
        assert_eq!(
            dto.validate().unwrap_err().to_string(),
            "Items in Tags cannot be empty."
        );
    }

    #[test]
    fn decodes_camel_case_json() {
        let dto: DocumentDto = serde_json::from_str(
            r##"{"id":7,"tags":["a"],"data":{"extension":".md","fileName":"n","mimeType":"text/markdown","documentData":"# hi"}}"##,
        )
        .unwrap();
        assert_eq!(dto.id, 7);
        assert_eq!(
            dto.data.unwrap().document_data.as_deref(),
            Some("# hi")
        );
    }
}
