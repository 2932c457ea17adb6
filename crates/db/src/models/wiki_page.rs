use sqlx::FromRow;
use wikitree_core::models::WikiPage;
use wikitree_core::types::{DbId, Timestamp};

/// A row from the `wiki_pages` table.
#[derive(Debug, Clone, FromRow)]
pub struct WikiPageRow {
    pub id: DbId,
    pub wiki_id: DbId,
    /// `None` for top-level pages.
    pub parent_id: Option<DbId>,
    pub name: String,
    pub content_id: DbId,
    pub display_order: i32,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<WikiPageRow> for WikiPage {
    fn from(row: WikiPageRow) -> Self {
        Self {
            id: row.id,
            wiki_id: row.wiki_id,
            parent_id: row.parent_id,
            name: row.name,
            content_id: row.content_id,
            display_order: row.display_order,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
