use std::sync::Arc;

use wikitree_core::service::WikiService;
use wikitree_core::store::UuidV7Generator;
use wikitree_db::PgWikiStore;

use crate::config::ServerConfig;

/// The wiki service as wired for production.
pub type AppWikiService = WikiService<PgWikiStore, UuidV7Generator>;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: wikitree_db::DbPool,
    /// Server configuration (JWT settings, upload limit).
    pub config: Arc<ServerConfig>,
    /// Wiki and page operations.
    pub wikis: Arc<AppWikiService>,
}

impl AppState {
    pub fn new(pool: wikitree_db::DbPool, config: ServerConfig) -> Self {
        let wikis = WikiService::new(PgWikiStore::new(pool.clone()), UuidV7Generator)
            .with_max_upload_bytes(config.max_upload_bytes);
        Self {
            pool,
            config: Arc::new(config),
            wikis: Arc::new(wikis),
        }
    }
}
