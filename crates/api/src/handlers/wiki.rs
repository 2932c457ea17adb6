//! Handlers for wiki collections.
//!
//! Create and update take `multipart/form-data` so a cover image can ride
//! along with the text fields.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use wikitree_core::attachment::AttachmentUpload;
use wikitree_core::models::{CreateWiki, UpdateWiki};
use wikitree_core::types::DbId;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireEditor;
use crate::response::{DataResponse, DeletedResponse};
use crate::state::AppState;

/* --------------------------------------------------------------------------
Multipart form
-------------------------------------------------------------------------- */

/// Text fields and optional cover file of a wiki form.
#[derive(Debug, Default)]
pub struct WikiForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub tags: Option<String>,
    pub file: Option<AttachmentUpload>,
}

/// Read every known field of a wiki form. Unknown fields are ignored, and a
/// file part with no name and no bytes counts as "no file".
async fn read_wiki_form(mut multipart: Multipart) -> AppResult<WikiForm> {
    let mut form = WikiForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                form.file = Some(AttachmentUpload {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            "name" | "description" | "content" | "tags" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                let slot = match name.as_str() {
                    "name" => &mut form.name,
                    "description" => &mut form.description,
                    "content" => &mut form.content,
                    _ => &mut form.tags,
                };
                *slot = Some(text);
            }
            _ => {}
        }
    }

    Ok(form)
}

/* --------------------------------------------------------------------------
Wiki CRUD
-------------------------------------------------------------------------- */

/// GET /wikis
pub async fn list_wikis(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let wikis = state.wikis.list_wikis().await?;
    Ok(Json(DataResponse { data: wikis }))
}

/// GET /wikis/{id}
///
/// The wiki with its current content.
pub async fn get_wiki(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let wiki = state.wikis.get_wiki_with_content(id).await?;
    Ok(Json(DataResponse { data: wiki }))
}

/// POST /wikis
pub async fn create_wiki(
    RequireEditor(user): RequireEditor,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = read_wiki_form(multipart).await?;
    let input = CreateWiki {
        name: form.name.unwrap_or_default(),
        description: form.description.unwrap_or_default(),
        content: form.content.unwrap_or_default(),
        tags: form.tags,
    };

    let wiki = state.wikis.create_wiki(input, form.file, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: wiki })))
}

/// PUT /wikis/{id}
///
/// Any subset of the form fields may be sent; absent fields are unchanged.
pub async fn update_wiki(
    RequireEditor(user): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = read_wiki_form(multipart).await?;
    let input = UpdateWiki {
        name: form.name,
        description: form.description,
        content: form.content,
        tags: form.tags,
    };

    let wiki = state
        .wikis
        .update_wiki(id, input, form.file, user.user_id)
        .await?;
    Ok(Json(DataResponse { data: wiki }))
}

/// DELETE /wikis/{id}
///
/// Only empty wikis can be deleted (409 otherwise).
pub async fn delete_wiki(
    RequireEditor(user): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let id = state.wikis.delete_wiki(id).await?;
    tracing::info!(wiki_id = %id, user_id = %user.user_id, "Wiki deleted via API");
    Ok(Json(DataResponse {
        data: DeletedResponse { id },
    }))
}
