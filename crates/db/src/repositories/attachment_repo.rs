//! Repository for the `attachments` table.

use sqlx::PgConnection;
use wikitree_core::models::{Attachment, NewAttachment};

use crate::models::attachment::AttachmentRow;

/// Metadata columns; `data` is write-only from here.
const COLUMNS: &str = "id, user_id, name, mime, width, height, size, created_at";

pub struct AttachmentRepo;

impl AttachmentRepo {
    /// Store an upload. `size` is derived from the byte length.
    pub async fn create(
        conn: &mut PgConnection,
        input: &NewAttachment,
    ) -> Result<Attachment, sqlx::Error> {
        let query = format!(
            "INSERT INTO attachments (id, user_id, name, mime, width, height, size, data)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        let size = i64::try_from(input.data.len()).unwrap_or(i64::MAX);
        let row = sqlx::query_as::<_, AttachmentRow>(&query)
            .bind(input.id)
            .bind(input.user_id)
            .bind(&input.name)
            .bind(&input.mime)
            .bind(input.width)
            .bind(input.height)
            .bind(size)
            .bind(&input.data)
            .fetch_one(conn)
            .await?;
        Ok(row.into())
    }
}
