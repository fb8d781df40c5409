//! IIIF Presentation and Image API routes

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::iiif::{
    build_collection, find_fragment, within_refs, FragmentKind, ImageInfo, ImageRequest, PageToken,
    CollectionPage, INDEX_COLLECTION,
};
use crate::state::AppState;

/// Create the IIIF router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/collection", get(index_collection))
        .route("/collection/:collection_id", get(collection_top))
        .route("/collection/:collection_id/:page", get(collection_page))
        .route("/image/:image_id/info.json", get(image_info))
        .route(
            "/image/:image_id/:region/:size/:rotation/:quality",
            get(image_request),
        )
        .route("/:manifest_id/manifest", get(get_manifest))
        .route("/:manifest_id/manifest.json", get(get_manifest))
        .route("/:manifest_id/:kind/:name", get(get_fragment))
}

async fn collection(state: &AppState, collection_id: &str, token: PageToken) -> Result<Json<CollectionPage>> {
    let config = state.config();
    let page = build_collection(
        state.store(),
        collection_id,
        token,
        config.import.items_per_page,
        &state.base_url(),
        &config.server.server_name,
    )
    .await?;
    Ok(Json(page))
}

async fn index_collection(State(state): State<AppState>) -> Result<Json<CollectionPage>> {
    collection(&state, INDEX_COLLECTION, PageToken::Top).await
}

async fn collection_top(
    State(state): State<AppState>,
    Path(collection_id): Path<String>,
) -> Result<Json<CollectionPage>> {
    collection(&state, &collection_id, PageToken::Top).await
}

async fn collection_page(
    State(state): State<AppState>,
    Path((collection_id, page)): Path<(String, String)>,
) -> Result<Json<CollectionPage>> {
    let token: PageToken = page.parse()?;
    collection(&state, &collection_id, token).await
}

async fn load_manifest(state: &AppState, manifest_id: &str) -> Result<Value> {
    let row = state
        .store()
        .get_manifest(manifest_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Manifest not found: {}", manifest_id)))?;
    row.document()
}

/// Stored manifest plus the collections it is `within`
async fn get_manifest(
    State(state): State<AppState>,
    Path(manifest_id): Path<String>,
) -> Result<Json<Value>> {
    let mut manifest = load_manifest(&state, &manifest_id).await?;
    let collections = state.store().manifest_collections(&manifest_id).await?;
    let within = within_refs(
        &state.base_url(),
        &state.config().server.server_name,
        &collections,
    );
    if let Value::Object(map) = &mut manifest {
        map.insert("within".to_string(), serde_json::to_value(within)?);
    }
    Ok(Json(manifest))
}

async fn get_fragment(
    State(state): State<AppState>,
    Path((manifest_id, kind, name)): Path<(String, String, String)>,
) -> Result<Json<Value>> {
    let kind: FragmentKind = kind
        .parse()
        .map_err(|k| AppError::NotFound(format!("Unknown resource type: {}", k)))?;
    let manifest = load_manifest(&state, &manifest_id).await?;

    find_fragment(&manifest, kind, &name)
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No {} named {} in manifest {}",
                kind.as_str(),
                name,
                manifest_id
            ))
        })
}

async fn image_info(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
) -> Result<Json<ImageInfo>> {
    let info = state
        .store()
        .get_image_info(&image_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Image not found: {}", image_id)))?;
    Ok(Json(info))
}

/// Redirect to the stored image file answering the request
async fn image_request(
    State(state): State<AppState>,
    Path((image_id, region, size, rotation, quality)): Path<(String, String, String, String, String)>,
) -> Result<impl IntoResponse> {
    let (quality, format) = ImageRequest::split_quality(&quality)?;
    let request = ImageRequest::parse(&region, &size, &rotation, quality, format)?;

    let variants = state.store().image_variants(&image_id).await?;
    if variants.is_empty() {
        return Err(AppError::NotFound(format!("Image not found: {}", image_id)));
    }
    let variant = request.select(&variants).ok_or_else(|| {
        AppError::NotImplemented(format!("No stored variant of {} matches {}", image_id, size))
    })?;

    Ok((
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, variant.url.clone())],
    ))
}
