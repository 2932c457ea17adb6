//! Route definitions for wikis and wiki pages.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{wiki, wiki_page};
use crate::state::AppState;

/// Room for the text fields and multipart framing around a cover upload.
const FORM_OVERHEAD_BYTES: usize = 256 * 1024;

/// Wiki routes, registered as `/wikis`.
///
/// ```text
/// GET    /                 list_wikis
/// POST   /                 create_wiki        (multipart)
/// GET    /{id}             get_wiki
/// PUT    /{id}             update_wiki        (multipart)
/// DELETE /{id}             delete_wiki
/// GET    /{id}/pages       get_page_tree
/// POST   /{id}/pages       create_page
/// ```
pub fn wiki_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(wiki::list_wikis).post(wiki::create_wiki))
        .route(
            "/{id}",
            get(wiki::get_wiki)
                .put(wiki::update_wiki)
                .delete(wiki::delete_wiki),
        )
        .route(
            "/{id}/pages",
            get(wiki_page::get_page_tree).post(wiki_page::create_page),
        )
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES),
        ))
}

/// Page routes, registered as `/wiki-pages`.
///
/// ```text
/// GET    /{id}             get_page
/// PUT    /{id}             update_page
/// POST   /{id}/move        move_page
/// ```
pub fn page_router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(wiki_page::get_page).put(wiki_page::update_page))
        .route("/{id}/move", post(wiki_page::move_page))
}
