use std::any::Any;
use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::dto::documents::DocumentDto;
use crate::presentation::formatters::csv_output::write_csv;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Xml,
    Csv,
}

impl ResponseFormat {
    /// Picks the representation for an `Accept` header value. Highest q wins,
    /// header order breaks ties; JSON when nothing supported is asked for.
    pub fn from_accept(accept: Option<&str>) -> Self {
        let Some(accept) = accept else {
            return ResponseFormat::Json;
        };
        let mut ranked: Vec<(f32, ResponseFormat)> = accept
            .split(',')
            .filter_map(|item| item.trim().parse::<mime::Mime>().ok())
            .filter_map(|m| {
                let q = m
                    .get_param("q")
                    .and_then(|q| q.as_str().parse::<f32>().ok())
                    .unwrap_or(1.0);
                Self::for_mime(&m).map(|f| (q, f))
            })
            .filter(|(q, _)| *q > 0.0)
            .collect();
        // stable: equal weights keep header order
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
        ranked
            .first()
            .map(|(_, f)| *f)
            .unwrap_or(ResponseFormat::Json)
    }

    fn for_mime(m: &mime::Mime) -> Option<Self> {
        let (ty, sub) = (m.type_(), m.subtype());
        if ty == mime::STAR || sub == mime::JSON || m.suffix() == Some(mime::JSON) {
            Some(ResponseFormat::Json)
        } else if sub == mime::XML && (ty == mime::APPLICATION || ty == mime::TEXT) {
            Some(ResponseFormat::Xml)
        } else if ty == mime::TEXT && sub == mime::CSV {
            Some(ResponseFormat::Csv)
        } else if ty == mime::APPLICATION && sub == mime::STAR {
            Some(ResponseFormat::Json)
        } else {
            None
        }
    }

    fn content_type(self) -> HeaderValue {
        match self {
            ResponseFormat::Json => HeaderValue::from_static("application/json"),
            ResponseFormat::Xml => HeaderValue::from_static("application/xml; charset=utf-8"),
            ResponseFormat::Csv => HeaderValue::from_static("text/csv; charset=utf-8"),
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ResponseFormat
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let accept = parts
            .headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok());
        Ok(ResponseFormat::from_accept(accept))
    }
}

/// Shapes that have an XML representation.
pub trait XmlBody {
    fn to_xml(&self) -> anyhow::Result<String>;
}

impl XmlBody for DocumentDto {
    fn to_xml(&self) -> anyhow::Result<String> {
        Ok(quick_xml::se::to_string_with_root("DocumentDTO", self)?)
    }
}

#[derive(Serialize)]
struct DocumentList<'a> {
    #[serde(rename = "DocumentDTO")]
    items: &'a [DocumentDto],
}

impl XmlBody for Vec<DocumentDto> {
    fn to_xml(&self) -> anyhow::Result<String> {
        Ok(quick_xml::se::to_string_with_root(
            "ArrayOfDocumentDTO",
            &DocumentList { items: self },
        )?)
    }
}

/// A response body rendered in the negotiated representation.
pub struct Negotiated<T> {
    pub format: ResponseFormat,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: T,
}

impl<T> Negotiated<T> {
    pub fn ok(format: ResponseFormat, body: T) -> Self {
        Self {
            format,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body,
        }
    }
}

impl<T> IntoResponse for Negotiated<T>
where
    T: Serialize + XmlBody + Any,
{
    fn into_response(self) -> Response {
        let rendered = match self.format {
            ResponseFormat::Json => serde_json::to_string(&self.body).map_err(anyhow::Error::from),
            ResponseFormat::Xml => self.body.to_xml(),
            ResponseFormat::Csv => write_csv(Some(&self.body as &dyn Any)),
        };
        match rendered {
            Ok(text) => {
                let mut headers = self.headers;
                headers.insert(header::CONTENT_TYPE, self.format.content_type());
                (self.status, headers, text).into_response()
            }
            Err(e) => {
                tracing::error!(format = ?self.format, error = ?e, "response_render_failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::documents::DataDto;

    #[test]
    fn absent_or_wildcard_accept_is_json() {
        assert_eq!(ResponseFormat::from_accept(None), ResponseFormat::Json);
        assert_eq!(ResponseFormat::from_accept(Some("*/*")), ResponseFormat::Json);
        assert_eq!(
            ResponseFormat::from_accept(Some("image/png")),
            ResponseFormat::Json
        );
    }

    #[test]
    fn picks_explicit_types() {
        assert_eq!(
            ResponseFormat::from_accept(Some("text/csv")),
            ResponseFormat::Csv
        );
        assert_eq!(
            ResponseFormat::from_accept(Some("application/xml")),
            ResponseFormat::Xml
        );
        assert_eq!(
            ResponseFormat::from_accept(Some("text/json")),
            ResponseFormat::Json
        );
    }

    #[test]
    fn honours_quality_then_order() {
        assert_eq!(
            ResponseFormat::from_accept(Some("application/json;q=0.5, text/csv")),
            ResponseFormat::Csv
        );
        assert_eq!(
            ResponseFormat::from_accept(Some("text/xml, text/csv")),
            ResponseFormat::Xml
        );
        assert_eq!(
            ResponseFormat::from_accept(Some("text/csv;q=0, application/xml;q=0.1")),
            ResponseFormat::Xml
        );
    }

    #[test]
    fn xml_uses_document_root() {
        let dto = DocumentDto {
            id: 1,
            tags: Some(vec!["a".into()]),
            data: Some(DataDto {
                extension: Some(".txt".into()),
                file_name: Some("f".into()),
                mime_type: Some("text/plain".into()),
                document_data: Some("hi".into()),
            }),
        };
        let xml = dto.to_xml().unwrap();
        assert!(xml.starts_with("<DocumentDTO>"));
        assert!(xml.contains("<fileName>f</fileName>"));

        let list = vec![dto.clone(), dto].to_xml().unwrap();
        assert!(list.starts_with("<ArrayOfDocumentDTO>"));
        assert_eq!(list.matches("<DocumentDTO>").count(), 2);
    }
}
