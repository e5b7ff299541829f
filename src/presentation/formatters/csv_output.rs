//! Tabular rendering of a DTO graph: one header record of field paths
//! (`Data.FileName`, `Tags[0]`, ...) and one record of the matching values.
//!
//! Shapes describe their fields through a static schema, so a missing nested
//! object still yields the full set of headers, paired with empty values.

use std::any::Any;

use crate::application::dto::documents::{DataDto, DocumentDto};

pub const UNSUPPORTED_MESSAGE: &str =
    "Not supported object type for CSV output. Use application/JSON or text/JSON content type instead.";

#[derive(Debug)]
pub enum FieldKind {
    /// Scalar rendered with its string form.
    Simple,
    /// Indexed per element; elements are stringified, never descended into.
    Sequence,
    Nested(&'static [Field]),
}

#[derive(Debug)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn simple(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Simple,
        }
    }

    pub const fn sequence(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Sequence,
        }
    }

    pub const fn nested(name: &'static str, fields: &'static [Field]) -> Self {
        Self {
            name,
            kind: FieldKind::Nested(fields),
        }
    }
}

pub enum FieldValue<'a> {
    Simple(Option<String>),
    Sequence(Option<Vec<String>>),
    Nested(Option<&'a dyn Flatten>),
}

pub trait Flatten {
    /// Declared fields in declaration order.
    fn schema(&self) -> &'static [Field];
    /// One value per schema entry, same order.
    fn values(&self) -> Vec<FieldValue<'_>>;
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct FlatRecord {
    pub headers: Vec<String>,
    pub values: Vec<String>,
}

impl FlatRecord {
    fn push(&mut self, header: String, value: String) {
        self.headers.push(header);
        self.values.push(value);
    }
}

const DATA_FIELDS: &[Field] = &[
    Field::simple("Extension"),
    Field::simple("FileName"),
    Field::simple("MimeType"),
    Field::simple("DocumentData"),
];

const DOCUMENT_FIELDS: &[Field] = &[
    Field::simple("Id"),
    Field::sequence("Tags"),
    Field::nested("Data", DATA_FIELDS),
];

impl Flatten for DocumentDto {
    fn schema(&self) -> &'static [Field] {
        DOCUMENT_FIELDS
    }

    fn values(&self) -> Vec<FieldValue<'_>> {
        vec![
            FieldValue::Simple(Some(self.id.to_string())),
            FieldValue::Sequence(self.tags.clone()),
            FieldValue::Nested(self.data.as_ref().map(|d| d as &dyn Flatten)),
        ]
    }
}

impl Flatten for DataDto {
    fn schema(&self) -> &'static [Field] {
        DATA_FIELDS
    }

    fn values(&self) -> Vec<FieldValue<'_>> {
        vec![
            FieldValue::Simple(self.extension.clone()),
            FieldValue::Simple(self.file_name.clone()),
            FieldValue::Simple(self.mime_type.clone()),
            FieldValue::Simple(self.document_data.clone()),
        ]
    }
}

fn path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

pub fn flatten(value: &dyn Flatten) -> FlatRecord {
    let mut out = FlatRecord::default();
    flatten_into(value, "", &mut out);
    out
}

fn flatten_into(value: &dyn Flatten, parent: &str, out: &mut FlatRecord) {
    for (field, v) in value.schema().iter().zip(value.values()) {
        let p = path(parent, field.name);
        match v {
            FieldValue::Simple(s) => out.push(p, s.unwrap_or_default()),
            // an absent sequence has no elements
            FieldValue::Sequence(items) => {
                for (i, item) in items.into_iter().flatten().enumerate() {
                    out.push(format!("{p}[{i}]"), item);
                }
            }
            FieldValue::Nested(Some(inner)) => flatten_into(inner, &p, out),
            FieldValue::Nested(None) => push_empty(field, &p, out),
        }
    }
}

fn push_empty(field: &Field, p: &str, out: &mut FlatRecord) {
    match field.kind {
        FieldKind::Nested(fields) => {
            for f in fields {
                push_empty(f, &path(p, f.name), out);
            }
        }
        FieldKind::Simple | FieldKind::Sequence => out.push(p.to_string(), String::new()),
    }
}

/// Renders `value` as a header line and a value line. Anything other than a
/// single [`DocumentDto`] yields one explanatory line instead.
pub fn write_csv(value: Option<&dyn Any>) -> anyhow::Result<String> {
    let Some(dto) = value.and_then(|v| v.downcast_ref::<DocumentDto>()) else {
        return Ok(format!("{UNSUPPORTED_MESSAGE}\n"));
    };
    let record = flatten(dto);

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(&record.headers)?;
    writer.write_record(&record.values)?;
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DocumentDto {
        DocumentDto {
            id: 1,
            tags: Some(vec!["a".into(), "b".into()]),
            data: Some(DataDto {
                extension: Some(".txt".into()),
                file_name: Some("f".into()),
                mime_type: Some("text/plain".into()),
                document_data: Some("hi".into()),
            }),
        }
    }

    #[test]
    fn document_renders_header_and_value_lines() {
        let dto = sample();
        let out = write_csv(Some(&dto)).unwrap();
        assert_eq!(
            out,
            "Id,Tags[0],Tags[1],Data.Extension,Data.FileName,Data.MimeType,Data.DocumentData\n\
             1,a,b,.txt,f,text/plain,hi\n"
        );
    }

    #[test]
    fn missing_data_still_emits_every_header() {
        let dto = DocumentDto {
            data: None,
            ..sample()
        };
        let record = flatten(&dto);
        assert_eq!(
            record.headers,
            vec![
                "Id",
                "Tags[0]",
                "Tags[1]",
                "Data.Extension",
                "Data.FileName",
                "Data.MimeType",
                "Data.DocumentData"
            ]
        );
        assert_eq!(record.values[3..], ["", "", "", ""]);
    }

    #[test]
    fn null_leaf_is_empty_and_no_tags_means_no_tag_columns() {
        let mut dto = sample();
        dto.tags = Some(Vec::new());
        dto.data.as_mut().unwrap().mime_type = None;
        let record = flatten(&dto);
        assert_eq!(record.headers.len(), 5);
        assert_eq!(record.values, vec!["1", ".txt", "f", "", "hi"]);
    }

    #[test]
    fn values_with_delimiters_are_quoted() {
        let mut dto = sample();
        dto.data.as_mut().unwrap().document_data = Some("x,y".into());
        let out = write_csv(Some(&dto)).unwrap();
        assert!(out.ends_with(",\"x,y\"\n"));
    }

    #[test]
    fn unsupported_values_produce_one_line() {
        let out = write_csv(Some(&42_i32)).unwrap();
        assert_eq!(out, format!("{UNSUPPORTED_MESSAGE}\n"));
        assert_eq!(out.lines().count(), 1);

        let list = vec![sample()];
        assert_eq!(write_csv(Some(&list)).unwrap().lines().count(), 1);
        assert_eq!(write_csv(None).unwrap().lines().count(), 1);
    }
}
