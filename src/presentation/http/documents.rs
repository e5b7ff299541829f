use std::collections::BTreeMap;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    routing::{get, put},
};

use crate::application::dto::documents::{DataDto, DocumentDto, DtoError};
use crate::application::ports::document_repository::RepositoryError;
use crate::application::use_cases::documents::DocumentError;
use crate::application::use_cases::documents::create_document::CreateDocument;
use crate::application::use_cases::documents::delete_document::DeleteDocument;
use crate::application::use_cases::documents::get_document::GetDocument;
use crate::application::use_cases::documents::list_documents::ListDocuments;
use crate::application::use_cases::documents::update_document::UpdateDocument;
use crate::bootstrap::app_context::AppContext;
use crate::presentation::http::negotiate::{Negotiated, ResponseFormat};

type ApiError = (StatusCode, String);

fn error_response(id: i64, err: DocumentError) -> ApiError {
    match err {
        DocumentError::Repository(RepositoryError::NotFound(_)) => {
            tracing::warn!(document_id = id, "document_not_found");
            (StatusCode::NOT_FOUND, String::new())
        }
        DocumentError::Repository(RepositoryError::ConcurrencyConflict(_)) => {
            tracing::warn!(document_id = id, "document_concurrency_conflict");
            (StatusCode::BAD_REQUEST, String::new())
        }
        DocumentError::Repository(RepositoryError::PersistenceConflict(message)) => {
            tracing::error!(document_id = id, %message, "document_write_rejected");
            (StatusCode::BAD_REQUEST, message)
        }
        DocumentError::Repository(RepositoryError::Storage(e)) => {
            tracing::error!(document_id = id, error = ?e, "document_storage_failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        DocumentError::Input(e @ DtoError::Missing(_)) => {
            tracing::error!(document_id = id, error = %e, "document_input_missing");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        DocumentError::Input(e @ DtoError::Invalid { .. }) => {
            tracing::warn!(document_id = id, error = %e, "document_input_invalid");
            (StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}

#[utoipa::path(get, path = "/api/documents/list", tag = "Documents",
    responses((status = 200, body = [DocumentDto])))]
pub async fn list_documents(
    State(ctx): State<AppContext>,
    format: ResponseFormat,
) -> Result<Negotiated<Vec<DocumentDto>>, ApiError> {
    tracing::info!("list_documents");
    let repo = ctx.document_repo();
    let uc = ListDocuments {
        repo: repo.as_ref(),
    };
    let items = uc.execute().await.map_err(|e| error_response(0, e))?;
    tracing::info!(count = items.len(), "list_documents_fetched");
    Ok(Negotiated::ok(format, items))
}

#[utoipa::path(get, path = "/api/documents/{id}", tag = "Documents",
    params(("id" = i64, Path, description = "Document ID")),
    responses((status = 200, body = DocumentDto), (status = 404, description = "Document not found")))]
pub async fn get_document(
    State(ctx): State<AppContext>,
    format: ResponseFormat,
    Path(id): Path<i64>,
) -> Result<Negotiated<DocumentDto>, ApiError> {
    let repo = ctx.document_repo();
    let uc = GetDocument {
        repo: repo.as_ref(),
    };
    match uc.execute(id).await.map_err(|e| error_response(id, e))? {
        Some(doc) => Ok(Negotiated::ok(format, doc)),
        None => {
            tracing::warn!(document_id = id, "document_not_found");
            Err((StatusCode::NOT_FOUND, String::new()))
        }
    }
}

#[utoipa::path(post, path = "/api/documents", tag = "Documents", request_body = DocumentDto,
    responses((status = 201, body = DocumentDto), (status = 400, description = "Rejected by the store"), (status = 500)))]
pub async fn create_document(
    State(ctx): State<AppContext>,
    format: ResponseFormat,
    Json(req): Json<DocumentDto>,
) -> Result<Negotiated<DocumentDto>, ApiError> {
    let repo = ctx.document_repo();
    let uc = CreateDocument {
        repo: repo.as_ref(),
    };
    let created = uc.execute(&req).await.map_err(|e| error_response(req.id, e))?;
    tracing::info!(document_id = created.id, "document_created");

    let mut headers = HeaderMap::new();
    let location = HeaderValue::from_str(&format!("/api/documents/{}", created.id))
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    headers.insert(header::LOCATION, location);
    Ok(Negotiated {
        format,
        status: StatusCode::CREATED,
        headers,
        body: created,
    })
}

#[utoipa::path(put, path = "/api/documents", tag = "Documents",
    request_body(content = DocumentDto, content_type = "application/x-www-form-urlencoded"),
    responses((status = 204), (status = 404), (status = 400, description = "Concurrent modification"), (status = 500)))]
pub async fn update_document(
    State(ctx): State<AppContext>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<StatusCode, ApiError> {
    let dto = document_from_form(fields)?;
    apply_update(&ctx, dto).await
}

#[utoipa::path(put, path = "/api/documents/{id}", tag = "Documents",
    params(("id" = i64, Path, description = "Document ID")),
    request_body(content = DocumentDto, content_type = "application/x-www-form-urlencoded"),
    responses((status = 204), (status = 404), (status = 400, description = "Concurrent modification"), (status = 500)))]
pub async fn update_document_by_id(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<StatusCode, ApiError> {
    let dto = document_from_form(fields)?;
    apply_update(&ctx, DocumentDto { id, ..dto }).await
}

async fn apply_update(ctx: &AppContext, dto: DocumentDto) -> Result<StatusCode, ApiError> {
    tracing::info!(document_id = dto.id, "update_document");
    let repo = ctx.document_repo();
    let uc = UpdateDocument {
        repo: repo.as_ref(),
    };
    uc.execute(&dto)
        .await
        .map_err(|e| error_response(dto.id, e))?;
    tracing::info!(document_id = dto.id, "document_updated");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(delete, path = "/api/documents/{id}", tag = "Documents",
    params(("id" = i64, Path, description = "Document ID")),
    responses((status = 204), (status = 404, description = "Document not found")))]
pub async fn delete_document(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let repo = ctx.document_repo();
    let uc = DeleteDocument {
        repo: repo.as_ref(),
    };
    uc.execute(id).await.map_err(|e| error_response(id, e))?;
    tracing::info!(document_id = id, "document_deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Binds form fields named like the flattened shape (`Id`, `Tags`, `Tags[1]`,
/// `Data.FileName`, ...). Names are case-insensitive; unknown names are ignored.
pub fn document_from_form(fields: Vec<(String, String)>) -> Result<DocumentDto, ApiError> {
    let mut dto = DocumentDto::default();
    let mut plain_tags = Vec::new();
    let mut indexed_tags = BTreeMap::new();

    for (key, value) in fields {
        let key = key.to_ascii_lowercase();
        if key == "id" {
            dto.id = value.trim().parse().map_err(|_| {
                (
                    StatusCode::BAD_REQUEST,
                    format!("The value '{value}' is not valid for Id."),
                )
            })?;
        } else if key == "tags" {
            plain_tags.push(value);
        } else if let Some(index) = key
            .strip_prefix("tags[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let index: usize = index.parse().map_err(|_| {
                (StatusCode::BAD_REQUEST, format!("Invalid tag index in '{key}'."))
            })?;
            indexed_tags.insert(index, value);
        } else if let Some(field) = key.strip_prefix("data.") {
            let data = dto.data.get_or_insert_with(DataDto::default);
            match field {
                "extension" => data.extension = Some(value),
                "filename" => data.file_name = Some(value),
                "mimetype" => data.mime_type = Some(value),
                "documentdata" => data.document_data = Some(value),
                _ => {}
            }
        }
    }

    if !plain_tags.is_empty() || !indexed_tags.is_empty() {
        plain_tags.extend(indexed_tags.into_values());
        dto.tags = Some(plain_tags);
    }
    Ok(dto)
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/documents/list", get(list_documents))
        .route("/documents", put(update_document).post(create_document))
        .route(
            "/documents/:id",
            get(get_document)
                .put(update_document_by_id)
                .delete(delete_document),
        )
        .with_state(ctx)
}
