use sqlx::FromRow;
use wikitree_core::models::Text;
use wikitree_core::types::{DbId, Timestamp};

/// A row from the `texts` table.
#[derive(Debug, Clone, FromRow)]
pub struct TextRow {
    pub id: DbId,
    pub ref_id: DbId,
    pub value: String,
    pub created_at: Timestamp,
}

impl From<TextRow> for Text {
    fn from(row: TextRow) -> Self {
        Self {
            id: row.id,
            ref_id: row.ref_id,
            value: row.value,
            created_at: row.created_at,
        }
    }
}
