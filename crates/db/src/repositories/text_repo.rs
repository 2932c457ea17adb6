//! Repository for the `texts` table. Blobs are insert-only; they are removed
//! in bulk when their owner goes away.

use sqlx::PgConnection;
use wikitree_core::models::{NewText, Text};
use wikitree_core::types::DbId;

use crate::models::text::TextRow;

const COLUMNS: &str = "id, ref_id, value, created_at";

pub struct TextRepo;

impl TextRepo {
    pub async fn create(conn: &mut PgConnection, input: &NewText) -> Result<Text, sqlx::Error> {
        let query = format!(
            "INSERT INTO texts (id, ref_id, value) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, TextRow>(&query)
            .bind(input.id)
            .bind(input.ref_id)
            .bind(&input.value)
            .fetch_one(conn)
            .await?;
        Ok(row.into())
    }

    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Text>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM texts WHERE id = $1");
        let row = sqlx::query_as::<_, TextRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Delete every blob owned by `ref_id`. Returns the number removed.
    pub async fn delete_by_ref(conn: &mut PgConnection, ref_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM texts WHERE ref_id = $1")
            .bind(ref_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }
}
