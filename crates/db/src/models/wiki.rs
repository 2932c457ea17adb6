use sqlx::FromRow;
use wikitree_core::models::Wiki;
use wikitree_core::types::{DbId, Timestamp};

/// A row from the `wikis` table.
#[derive(Debug, Clone, FromRow)]
pub struct WikiRow {
    pub id: DbId,
    pub name: String,
    pub description: String,
    pub tags: String,
    pub content_id: DbId,
    pub cover_id: Option<DbId>,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<WikiRow> for Wiki {
    fn from(row: WikiRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            tags: row.tags,
            content_id: row.content_id,
            cover_id: row.cover_id,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
