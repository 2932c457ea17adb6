//! PostgreSQL implementation of the core storage seam.
//!
//! A [`PgWikiTx`] owns one `sqlx` transaction; every repository call of an
//! operation runs on it. Dropping it without commit rolls back, as `sqlx`
//! does for any unfinished transaction.

use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use wikitree_core::error::CoreError;
use wikitree_core::models::{
    Attachment, NewAttachment, NewText, NewWiki, NewWikiPage, Text, Wiki, WikiPage,
};
use wikitree_core::store::{WikiStore, WikiTx};
use wikitree_core::types::DbId;

use crate::repositories::{AttachmentRepo, TextRepo, WikiPageRepo, WikiRepo};
use crate::DbPool;

/// Pool-backed [`WikiStore`].
#[derive(Debug, Clone)]
pub struct PgWikiStore {
    pool: DbPool,
}

impl PgWikiStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl WikiStore for PgWikiStore {
    type Tx = PgWikiTx;

    async fn begin(&self) -> Result<PgWikiTx, CoreError> {
        let tx = self.pool.begin().await.map_err(storage)?;
        Ok(PgWikiTx { tx })
    }
}

/// One open database transaction.
pub struct PgWikiTx {
    tx: Transaction<'static, Postgres>,
}

/// Driver failures surface as storage errors; the core never sees `sqlx`.
fn storage(err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "Database error");
    CoreError::Storage(err.to_string())
}

fn page_not_found(id: DbId) -> CoreError {
    CoreError::NotFound {
        entity: "WikiPage",
        id,
    }
}

#[async_trait]
impl WikiTx for PgWikiTx {
    async fn find_wiki(&mut self, id: DbId) -> Result<Option<Wiki>, CoreError> {
        WikiRepo::find_by_id(&mut self.tx, id).await.map_err(storage)
    }

    async fn lock_wiki(&mut self, id: DbId) -> Result<Option<Wiki>, CoreError> {
        WikiRepo::lock_by_id(&mut self.tx, id).await.map_err(storage)
    }

    async fn list_wikis(&mut self) -> Result<Vec<Wiki>, CoreError> {
        WikiRepo::list(&mut self.tx).await.map_err(storage)
    }

    async fn insert_wiki(&mut self, wiki: &NewWiki) -> Result<Wiki, CoreError> {
        WikiRepo::create(&mut self.tx, wiki).await.map_err(storage)
    }

    async fn update_wiki(&mut self, wiki: &Wiki) -> Result<Wiki, CoreError> {
        WikiRepo::update(&mut self.tx, wiki).await.map_err(storage)
    }

    async fn delete_wiki(&mut self, id: DbId) -> Result<(), CoreError> {
        WikiRepo::delete(&mut self.tx, id).await.map_err(storage)?;
        Ok(())
    }

    async fn find_page(&mut self, id: DbId) -> Result<Option<WikiPage>, CoreError> {
        WikiPageRepo::find_by_id(&mut self.tx, id)
            .await
            .map_err(storage)
    }

    async fn list_pages(&mut self, wiki_id: DbId) -> Result<Vec<WikiPage>, CoreError> {
        WikiPageRepo::list_by_wiki(&mut self.tx, wiki_id)
            .await
            .map_err(storage)
    }

    async fn count_pages(&mut self, wiki_id: DbId) -> Result<i64, CoreError> {
        WikiPageRepo::count_by_wiki(&mut self.tx, wiki_id)
            .await
            .map_err(storage)
    }

    async fn count_children(
        &mut self,
        wiki_id: DbId,
        parent_id: Option<DbId>,
    ) -> Result<i64, CoreError> {
        WikiPageRepo::count_children(&mut self.tx, wiki_id, parent_id)
            .await
            .map_err(storage)
    }

    async fn insert_page(&mut self, page: &NewWikiPage) -> Result<WikiPage, CoreError> {
        WikiPageRepo::create(&mut self.tx, page)
            .await
            .map_err(storage)
    }

    async fn update_page(&mut self, page: &WikiPage) -> Result<WikiPage, CoreError> {
        WikiPageRepo::update(&mut self.tx, page)
            .await
            .map_err(storage)
    }

    async fn set_display_order(
        &mut self,
        page_id: DbId,
        display_order: i32,
    ) -> Result<(), CoreError> {
        let updated = WikiPageRepo::set_display_order(&mut self.tx, page_id, display_order)
            .await
            .map_err(storage)?;
        if updated {
            Ok(())
        } else {
            Err(page_not_found(page_id))
        }
    }

    async fn move_page(
        &mut self,
        page_id: DbId,
        parent_id: Option<DbId>,
        display_order: i32,
    ) -> Result<WikiPage, CoreError> {
        WikiPageRepo::move_to(&mut self.tx, page_id, parent_id, display_order)
            .await
            .map_err(|err| match err {
                sqlx::Error::RowNotFound => page_not_found(page_id),
                other => storage(other),
            })
    }

    async fn insert_text(&mut self, text: &NewText) -> Result<Text, CoreError> {
        TextRepo::create(&mut self.tx, text).await.map_err(storage)
    }

    async fn find_text(&mut self, id: DbId) -> Result<Option<Text>, CoreError> {
        TextRepo::find_by_id(&mut self.tx, id).await.map_err(storage)
    }

    async fn delete_texts_by_ref(&mut self, ref_id: DbId) -> Result<u64, CoreError> {
        TextRepo::delete_by_ref(&mut self.tx, ref_id)
            .await
            .map_err(storage)
    }

    async fn insert_attachment(
        &mut self,
        attachment: &NewAttachment,
    ) -> Result<Attachment, CoreError> {
        AttachmentRepo::create(&mut self.tx, attachment)
            .await
            .map_err(storage)
    }

    async fn commit(self) -> Result<(), CoreError> {
        self.tx.commit().await.map_err(storage)
    }

    async fn rollback(self) -> Result<(), CoreError> {
        self.tx.rollback().await.map_err(storage)
    }
}
