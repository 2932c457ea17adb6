pub mod health;
pub mod wiki;

use axum::Router;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /wikis                                   list (public), create (editor)
/// /wikis/{id}                              get (public), update, delete (editor)
/// /wikis/{id}/pages                        page tree (public), create (contributor)
///
/// /wiki-pages/{id}                         get (public), update (contributor)
/// /wiki-pages/{id}/move                    move (editor)
/// ```
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .nest("/wikis", wiki::wiki_router(config.max_upload_bytes))
        .nest("/wiki-pages", wiki::page_router())
}
