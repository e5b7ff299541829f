/// A stored payload together with its metadata and tag links.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: i64,
    pub data: DocumentData,
    pub tags: Vec<DocumentTag>,
}

/// Payload and descriptive metadata; shares its identifier with the owning document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentData {
    pub document_id: i64,
    pub file_data: String,
    pub extension: String,
    pub file_name: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Association row between one document and one tag.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTag {
    pub document_id: i64,
    pub tag_id: i64,
    pub tag: Tag,
}

impl Document {
    /// Tag names in link order.
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|link| link.tag.name.clone()).collect()
    }
}

impl DocumentTag {
    /// A link to a tag row that does not exist yet; the repository assigns both ids.
    pub fn new_named(name: impl Into<String>) -> Self {
        Self {
            document_id: 0,
            tag_id: 0,
            tag: Tag {
                id: 0,
                name: name.into(),
            },
        }
    }
}
