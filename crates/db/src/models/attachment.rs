use sqlx::FromRow;
use wikitree_core::models::Attachment;
use wikitree_core::types::{DbId, Timestamp};

/// Metadata columns of an `attachments` row. The file bytes are never read
/// back through this struct.
#[derive(Debug, Clone, FromRow)]
pub struct AttachmentRow {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub mime: String,
    pub width: i32,
    pub height: i32,
    pub size: i64,
    pub created_at: Timestamp,
}

impl From<AttachmentRow> for Attachment {
    fn from(row: AttachmentRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            mime: row.mime,
            width: row.width,
            height: row.height,
            size: row.size,
            created_at: row.created_at,
        }
    }
}
