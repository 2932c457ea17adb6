//! Repository for the `wikis` table.

use sqlx::PgConnection;
use wikitree_core::models::{NewWiki, Wiki};
use wikitree_core::types::DbId;

use crate::models::wiki::WikiRow;

/// Column list for wikis queries.
const COLUMNS: &str = "id, name, description, tags, content_id, cover_id, \
    version, created_at, updated_at";

/// Provides CRUD operations for wikis.
pub struct WikiRepo;

impl WikiRepo {
    pub async fn create(conn: &mut PgConnection, input: &NewWiki) -> Result<Wiki, sqlx::Error> {
        let query = format!(
            "INSERT INTO wikis (id, name, description, tags, content_id, cover_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, WikiRow>(&query)
            .bind(input.id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.tags)
            .bind(input.content_id)
            .bind(input.cover_id)
            .fetch_one(conn)
            .await?;
        Ok(row.into())
    }

    /// Find a wiki by ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Wiki>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM wikis WHERE id = $1");
        let row = sqlx::query_as::<_, WikiRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Find a wiki by ID and hold its row lock until the transaction ends.
    ///
    /// Every page mutation takes this lock first, which serializes sibling
    /// re-ranking within one wiki.
    pub async fn lock_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Wiki>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM wikis WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, WikiRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row.map(Into::into))
    }

    /// List all wikis ordered by name.
    pub async fn list(conn: &mut PgConnection) -> Result<Vec<Wiki>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM wikis ORDER BY name, id");
        let rows = sqlx::query_as::<_, WikiRow>(&query)
            .fetch_all(conn)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Write back every mutable field, bumping `version` and `updated_at`.
    pub async fn update(conn: &mut PgConnection, wiki: &Wiki) -> Result<Wiki, sqlx::Error> {
        let query = format!(
            "UPDATE wikis SET
                name = $2,
                description = $3,
                tags = $4,
                content_id = $5,
                cover_id = $6,
                version = version + 1,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, WikiRow>(&query)
            .bind(wiki.id)
            .bind(&wiki.name)
            .bind(&wiki.description)
            .bind(&wiki.tags)
            .bind(wiki.content_id)
            .bind(wiki.cover_id)
            .fetch_one(conn)
            .await?;
        Ok(row.into())
    }

    /// Delete a wiki by ID. Returns `true` if a row was removed.
    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM wikis WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
