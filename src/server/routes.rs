use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::content::{Content, ContentForm, LocalizedContent};
use crate::contents::ContentStore;
use crate::locale;
use crate::page::Page;
use crate::resolver::PageResolver;
use crate::server::AppState;
use crate::Error;

type ApiError = (StatusCode, Json<serde_json::Value>);
type ApiResult<T> = Result<T, ApiError>;

#[derive(Deserialize)]
pub struct LocaleParams {
    pub locale: Option<String>,
}

#[derive(Deserialize)]
pub struct PositionsRequest {
    #[serde(default)]
    pub positions: BTreeMap<i64, i64>,
}

#[derive(Serialize)]
pub struct PageResponse {
    pub page: Page,
    pub locale: String,
    pub contents: Vec<LocalizedContent>,
}

/// The one 404 body, shared by missing pages and unmatched routes
pub fn not_found() -> ApiError {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" })))
}

fn reject(err: Error) -> ApiError {
    if err.is_not_found() {
        return not_found();
    }
    let status = match &err {
        Error::Validation(errors) => {
            let report = serde_json::to_value(errors.report()).unwrap_or_default();
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(report));
        }
        Error::DuplicatePath(_) => StatusCode::CONFLICT,
        Error::InvalidLocale(_) | Error::InvalidAttachment(_) => StatusCode::BAD_REQUEST,
        _ => {
            tracing::error!("Request failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": err.to_string() })))
}

/// Content `id` as long as it belongs to `page_id`
fn scoped(contents: &ContentStore<'_>, page_id: i64, id: i64) -> Result<Content, Error> {
    let content = contents.get(id)?;
    if content.page_id != page_id {
        return Err(Error::ContentNotFound(id));
    }
    Ok(content)
}

/// Public boundary: any GET that no other route claims is a page lookup.
///
/// The path is percent-decoded before the exact match.
pub async fn show_page(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
) -> ApiResult<Json<PageResponse>> {
    if method != Method::GET && method != Method::HEAD {
        return Err(not_found());
    }

    let path = match urlencoding::decode(uri.path()) {
        Ok(path) => path,
        Err(_) => return Err(not_found()),
    };

    let resolved = PageResolver::new(&state.store)
        .resolve_request(&path, &state.locales)
        .map_err(reject)?;
    let contents = ContentStore::new(&state.store)
        .list(resolved.page.id, &resolved.locale)
        .map_err(reject)?;

    Ok(Json(PageResponse {
        page: resolved.page,
        locale: resolved.locale,
        contents,
    }))
}

pub async fn list_pages(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Page>>> {
    state.store.list_pages().map(Json).map_err(reject)
}

/// Localized listing with `?locale=`, admin listing with translations otherwise
pub async fn list_contents(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<i64>,
    Query(params): Query<LocaleParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let contents = ContentStore::new(&state.store);
    let value = match params.locale {
        Some(tag) => {
            let tag = locale::parse_tag(&tag).map_err(reject)?;
            serde_json::to_value(contents.list(page_id, &tag).map_err(reject)?)
        }
        None => serde_json::to_value(contents.list_all(page_id).map_err(reject)?),
    };
    value
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))))
}

pub async fn create_content(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<i64>,
    Json(form): Json<ContentForm>,
) -> ApiResult<(StatusCode, Json<Content>)> {
    let content = ContentStore::new(&state.store)
        .create(page_id, &form)
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(content)))
}

pub async fn edit_content(
    State(state): State<Arc<AppState>>,
    Path((page_id, id)): Path<(i64, i64)>,
) -> ApiResult<Json<Content>> {
    let contents = ContentStore::new(&state.store);
    scoped(&contents, page_id, id).map(Json).map_err(reject)
}

pub async fn update_content(
    State(state): State<Arc<AppState>>,
    Path((page_id, id)): Path<(i64, i64)>,
    Json(form): Json<ContentForm>,
) -> ApiResult<Json<Content>> {
    let contents = ContentStore::new(&state.store);
    scoped(&contents, page_id, id).map_err(reject)?;
    contents.update(id, &form).map(Json).map_err(reject)
}

pub async fn destroy_content(
    State(state): State<Arc<AppState>>,
    Path((page_id, id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    let contents = ContentStore::new(&state.store);
    scoped(&contents, page_id, id).map_err(reject)?;
    contents.destroy(id).map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_positions(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<i64>,
    Json(request): Json<PositionsRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    ContentStore::new(&state.store)
        .reorder(page_id, &request.positions)
        .map_err(reject)?;
    Ok(Json(json!({ "status": "ok", "updated": request.positions.len() })))
}

pub async fn download_attachment(
    State(state): State<Arc<AppState>>,
    Path((page_id, id)): Path<(i64, i64)>,
) -> ApiResult<Response> {
    let contents = ContentStore::new(&state.store);
    scoped(&contents, page_id, id).map_err(reject)?;
    let (meta, data) = contents
        .attachment(id)
        .map_err(reject)?
        .ok_or_else(not_found)?;

    let disposition = format!("attachment; filename=\"{}\"", meta.file_name.replace('"', ""));
    Ok((
        [
            (header::CONTENT_TYPE, meta.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    )
        .into_response())
}
