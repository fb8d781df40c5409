//! Import and lookup API routes

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::CollectionRow;
use crate::error::{AppError, Result};
use crate::iiif::{summarize, IiifUrls};
use crate::state::AppState;
use crate::tasks::{spawn_import, Job};

/// Create the API router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/import", post(import))
        .route("/tasks", get(list_tasks))
        .route("/tasks/:task_id", get(task_status))
        .route("/resolve/:identifier", get(resolve))
        .route("/recent", get(recent))
        .route("/collections", post(create_collection))
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub url: String,
    #[serde(default)]
    pub collection: Option<String>,
}

/// Extract the METS URL from a DFG-Viewer link
///
/// Other URLs are returned unchanged.
pub fn unwrap_dfg_viewer(url: &str) -> Option<String> {
    let is_viewer = ["http://dfg-viewer.de/", "https://dfg-viewer.de/"]
        .iter()
        .any(|prefix| url.starts_with(prefix));
    if !is_viewer {
        return Some(url.to_string());
    }

    let decoded = urlencoding::decode(url).ok()?;
    if let Some((_, rest)) = decoded.split_once("set[mets]=") {
        let mets = rest.split('&').next().unwrap_or_default();
        if mets.starts_with("http") {
            return Some(mets.to_string());
        }
    }
    decoded
        .split_once("tx_dlf[id]=")
        .map(|(_, rest)| rest)
        .filter(|rest| rest.starts_with("http"))
        .map(str::to_string)
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Queue an import; answers 202 with the job and its status URL
async fn import(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> Result<impl IntoResponse> {
    let mets_url = unwrap_dfg_viewer(request.url.trim())
        .filter(|url| is_http_url(url))
        .ok_or_else(|| AppError::BadRequest(format!("Not a METS URL: {}", request.url)))?;
    if let Some(collection_id) = &request.collection {
        if state.store().get_collection(collection_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Collection not found: {}",
                collection_id
            )));
        }
    }

    let pipeline = state.pipeline();
    let info = pipeline.preview(&mets_url).await.map_err(|e| {
        tracing::info!("Rejected import of {}: {}", mets_url, e);
        AppError::BadRequest(format!("There is no METS available at {}", mets_url))
    })?;

    let job = spawn_import(
        pipeline,
        state.jobs().clone(),
        mets_url,
        request.collection,
        Some(info),
    )
    .await;
    let status_url = format!("{}/api/tasks/{}", state.base_url(), job.id);

    Ok((
        StatusCode::ACCEPTED,
        [(header::LOCATION, status_url)],
        Json(job),
    ))
}

#[derive(Serialize)]
struct TaskList {
    tasks: Vec<Job>,
}

async fn list_tasks(State(state): State<AppState>) -> Json<TaskList> {
    Json(TaskList {
        tasks: state.jobs().pending().await,
    })
}

async fn task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Job>> {
    state
        .jobs()
        .get_by_str(&task_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Task not found: {}", task_id)))
}

/// Redirect from a document identifier to its manifest
async fn resolve(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Redirect> {
    let manifest_id = state
        .store()
        .resolve_identifier(&identifier)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Unknown identifier: {}", identifier)))?;
    let url = IiifUrls::new(&state.base_url(), &manifest_id).manifest();
    Ok(Redirect::to(&url))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct RecentManifest {
    #[serde(rename = "@id")]
    pub id: String,
    pub label: String,
    pub thumbnail: Value,
    pub metsurl: String,
    pub attribution: Value,
    pub attribution_logo: Value,
}

#[derive(Debug, Serialize)]
pub struct RecentResponse {
    pub next_page: Option<u32>,
    pub manifests: Vec<RecentManifest>,
}

/// Most recently imported manifests, newest first
async fn recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<RecentResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = i64::from(state.config().import.items_per_page.max(1));
    let offset = i64::from(page - 1) * per_page;

    let mut rows = state.store().recent_manifests(offset, per_page + 1).await?;
    let has_next = rows.len() as i64 > per_page;
    rows.truncate(per_page as usize);

    let base_url = state.base_url();
    let manifests = rows
        .iter()
        .map(|row| -> Result<RecentManifest> {
            let summary = summarize(&base_url, row)?;
            Ok(RecentManifest {
                id: summary.id,
                label: summary.label,
                thumbnail: summary.thumbnail,
                metsurl: row.origin.clone(),
                attribution: summary.attribution,
                attribution_logo: summary.logo,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Json(RecentResponse {
        next_page: has_next.then_some(page + 1),
        manifests,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateCollection {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub parent: Option<String>,
}

async fn create_collection(
    State(state): State<AppState>,
    Json(request): Json<CreateCollection>,
) -> Result<(StatusCode, Json<CollectionRow>)> {
    let valid_id = !request.id.is_empty()
        && request
            .id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid_id || request.id == crate::iiif::INDEX_COLLECTION {
        return Err(AppError::BadRequest(format!(
            "Invalid collection id: {}",
            request.id
        )));
    }

    let collection = CollectionRow {
        id: request.id,
        label: request.label,
        parent_id: request.parent,
    };
    state.store().upsert_collection(&collection).await?;
    tracing::info!(collection_id = %collection.id, "Saved collection");

    Ok((StatusCode::CREATED, Json(collection)))
}
