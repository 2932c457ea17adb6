//! Handlers for wiki pages and their hierarchy.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use wikitree_core::models::{CreateWikiPage, MoveWikiPage, UpdateWikiPage};
use wikitree_core::types::DbId;

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::rbac::{RequireContributor, RequireEditor};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /wikis/{id}/pages
///
/// The wiki's pages as an ordered forest of `{..page, children: [...]}` nodes.
pub async fn get_page_tree(
    State(state): State<AppState>,
    Path(wiki_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tree = state.wikis.get_page_tree(wiki_id).await?;
    Ok(Json(DataResponse { data: tree }))
}

/// POST /wikis/{id}/pages
///
/// Appends the page as the last child of `parent_id` (root when absent).
pub async fn create_page(
    RequireContributor(user): RequireContributor,
    State(state): State<AppState>,
    Path(wiki_id): Path<DbId>,
    AppJson(input): AppJson<CreateWikiPage>,
) -> AppResult<impl IntoResponse> {
    let page = state.wikis.create_page(wiki_id, input).await?;
    tracing::debug!(page_id = %page.page.id, user_id = %user.user_id, "Page created via API");
    Ok((StatusCode::CREATED, Json(DataResponse { data: page })))
}

/// GET /wiki-pages/{id}
pub async fn get_page(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let page = state.wikis.get_page(id).await?;
    Ok(Json(DataResponse { data: page }))
}

/// PUT /wiki-pages/{id}
pub async fn update_page(
    RequireContributor(_user): RequireContributor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdateWikiPage>,
) -> AppResult<impl IntoResponse> {
    let page = state.wikis.update_page(id, input).await?;
    Ok(Json(DataResponse { data: page }))
}

/// POST /wiki-pages/{id}/move
///
/// Body: `{"target_id": <page id or null for root>, "index": <n>}`.
pub async fn move_page(
    RequireEditor(user): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<MoveWikiPage>,
) -> AppResult<impl IntoResponse> {
    let page = state
        .wikis
        .move_page(id, input.target_id, input.index)
        .await?;
    tracing::debug!(page_id = %id, user_id = %user.user_id, "Page moved via API");
    Ok(Json(DataResponse { data: page }))
}
