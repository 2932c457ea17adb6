//! Storage and id-generation seams for the wiki service.
//!
//! The service never talks to a database directly. It opens a [`WikiTx`]
//! through a [`WikiStore`], runs every read and write of one operation on it,
//! and commits once at the end. Dropping a transaction without committing
//! discards its writes.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::{
    Attachment, NewAttachment, NewText, NewWiki, NewWikiPage, Text, Wiki, WikiPage,
};
use crate::types::DbId;

/// Source of fresh record ids.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> DbId;
}

/// Time-ordered UUIDv7 ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn next_id(&self) -> DbId {
        uuid::Uuid::now_v7()
    }
}

/// A transactional record store.
#[async_trait]
pub trait WikiStore: Send + Sync {
    type Tx: WikiTx;

    /// Open a transaction.
    async fn begin(&self) -> Result<Self::Tx, CoreError>;
}

/// One open transaction.
#[async_trait]
pub trait WikiTx: Send {
    // -- wikis ---------------------------------------------------------------

    async fn find_wiki(&mut self, id: DbId) -> Result<Option<Wiki>, CoreError>;

    /// Read a wiki and hold an exclusive lock on it until the transaction
    /// ends. Serializes page mutations within one wiki.
    async fn lock_wiki(&mut self, id: DbId) -> Result<Option<Wiki>, CoreError>;

    /// All wikis, ordered by name.
    async fn list_wikis(&mut self) -> Result<Vec<Wiki>, CoreError>;

    async fn insert_wiki(&mut self, wiki: &NewWiki) -> Result<Wiki, CoreError>;

    /// Persist name, description, tags, content and cover references; bumps
    /// `version` and `updated_at`.
    async fn update_wiki(&mut self, wiki: &Wiki) -> Result<Wiki, CoreError>;

    async fn delete_wiki(&mut self, id: DbId) -> Result<(), CoreError>;

    // -- pages ---------------------------------------------------------------

    async fn find_page(&mut self, id: DbId) -> Result<Option<WikiPage>, CoreError>;

    /// Every page of a wiki, unordered.
    async fn list_pages(&mut self, wiki_id: DbId) -> Result<Vec<WikiPage>, CoreError>;

    async fn count_pages(&mut self, wiki_id: DbId) -> Result<i64, CoreError>;

    /// Number of pages in the `(wiki_id, parent_id)` group.
    async fn count_children(
        &mut self,
        wiki_id: DbId,
        parent_id: Option<DbId>,
    ) -> Result<i64, CoreError>;

    async fn insert_page(&mut self, page: &NewWikiPage) -> Result<WikiPage, CoreError>;

    /// Persist name and content reference; bumps `version` and `updated_at`.
    async fn update_page(&mut self, page: &WikiPage) -> Result<WikiPage, CoreError>;

    /// Rewrite a sibling's rank only.
    async fn set_display_order(&mut self, page_id: DbId, display_order: i32)
        -> Result<(), CoreError>;

    /// Reparent and rerank a page; bumps `version` and `updated_at`.
    async fn move_page(
        &mut self,
        page_id: DbId,
        parent_id: Option<DbId>,
        display_order: i32,
    ) -> Result<WikiPage, CoreError>;

    // -- texts ---------------------------------------------------------------

    async fn insert_text(&mut self, text: &NewText) -> Result<Text, CoreError>;

    async fn find_text(&mut self, id: DbId) -> Result<Option<Text>, CoreError>;

    /// Remove every blob owned by `ref_id`, returning how many were removed.
    async fn delete_texts_by_ref(&mut self, ref_id: DbId) -> Result<u64, CoreError>;

    // -- attachments ---------------------------------------------------------

    async fn insert_attachment(
        &mut self,
        attachment: &NewAttachment,
    ) -> Result<Attachment, CoreError>;

    // -- lifecycle -----------------------------------------------------------

    async fn commit(self) -> Result<(), CoreError>;

    async fn rollback(self) -> Result<(), CoreError>;
}
