//! Repository for the `wiki_pages` table.
//!
//! Pages are always read and ordered by `(parent_id, display_order)`. Rank
//! maintenance itself is planned in `wikitree_core::page_order`; this layer
//! only writes the resulting values.

use sqlx::PgConnection;
use wikitree_core::models::{NewWikiPage, WikiPage};
use wikitree_core::types::DbId;

use crate::models::wiki_page::WikiPageRow;

/// Column list for wiki_pages queries.
const COLUMNS: &str = "id, wiki_id, parent_id, name, content_id, display_order, \
    version, created_at, updated_at";

/// Provides CRUD and ordering operations for wiki pages.
pub struct WikiPageRepo;

impl WikiPageRepo {
    pub async fn create(
        conn: &mut PgConnection,
        input: &NewWikiPage,
    ) -> Result<WikiPage, sqlx::Error> {
        let query = format!(
            "INSERT INTO wiki_pages (id, wiki_id, parent_id, name, content_id, display_order)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, WikiPageRow>(&query)
            .bind(input.id)
            .bind(input.wiki_id)
            .bind(input.parent_id)
            .bind(&input.name)
            .bind(input.content_id)
            .bind(input.display_order)
            .fetch_one(conn)
            .await?;
        Ok(row.into())
    }

    /// Find a page by ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<WikiPage>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM wiki_pages WHERE id = $1");
        let row = sqlx::query_as::<_, WikiPageRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row.map(Into::into))
    }

    /// All pages of a wiki, grouped by parent and ordered by rank.
    pub async fn list_by_wiki(
        conn: &mut PgConnection,
        wiki_id: DbId,
    ) -> Result<Vec<WikiPage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM wiki_pages
             WHERE wiki_id = $1
             ORDER BY parent_id NULLS FIRST, display_order, id"
        );
        let rows = sqlx::query_as::<_, WikiPageRow>(&query)
            .bind(wiki_id)
            .fetch_all(conn)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn count_by_wiki(conn: &mut PgConnection, wiki_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM wiki_pages WHERE wiki_id = $1")
            .bind(wiki_id)
            .fetch_one(conn)
            .await
    }

    /// Number of pages directly under `parent_id` (`None` = root).
    pub async fn count_children(
        conn: &mut PgConnection,
        wiki_id: DbId,
        parent_id: Option<DbId>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM wiki_pages
             WHERE wiki_id = $1 AND parent_id IS NOT DISTINCT FROM $2",
        )
        .bind(wiki_id)
        .bind(parent_id)
        .fetch_one(conn)
        .await
    }

    /// Write back name and content pointer, bumping `version` and `updated_at`.
    pub async fn update(conn: &mut PgConnection, page: &WikiPage) -> Result<WikiPage, sqlx::Error> {
        let query = format!(
            "UPDATE wiki_pages SET
                name = $2,
                content_id = $3,
                version = version + 1,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, WikiPageRow>(&query)
            .bind(page.id)
            .bind(&page.name)
            .bind(page.content_id)
            .fetch_one(conn)
            .await?;
        Ok(row.into())
    }

    /// Re-rank a sibling. Version and timestamps are left alone.
    pub async fn set_display_order(
        conn: &mut PgConnection,
        id: DbId,
        display_order: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE wiki_pages SET display_order = $2 WHERE id = $1")
            .bind(id)
            .bind(display_order)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Reparent and re-rank the moved page, bumping its `version`.
    pub async fn move_to(
        conn: &mut PgConnection,
        id: DbId,
        parent_id: Option<DbId>,
        display_order: i32,
    ) -> Result<WikiPage, sqlx::Error> {
        let query = format!(
            "UPDATE wiki_pages SET
                parent_id = $2,
                display_order = $3,
                version = version + 1,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, WikiPageRow>(&query)
            .bind(id)
            .bind(parent_id)
            .bind(display_order)
            .fetch_one(conn)
            .await?;
        Ok(row.into())
    }
}
