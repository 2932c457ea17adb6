//! In-memory [`WikiStore`] for tests and embedding without a database.
//!
//! A transaction takes the store's single async lock for its whole lifetime
//! and works on a private copy of the tables; commit swaps the copy in,
//! anything else throws it away. Transactions are therefore fully
//! serialized.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::CoreError;
use crate::models::{
    Attachment, NewAttachment, NewText, NewWiki, NewWikiPage, Text, Wiki, WikiPage,
};
use crate::store::{WikiStore, WikiTx};
use crate::types::DbId;

#[derive(Debug, Clone, Default)]
struct Tables {
    wikis: BTreeMap<DbId, Wiki>,
    pages: BTreeMap<DbId, WikiPage>,
    texts: BTreeMap<DbId, Text>,
    attachments: BTreeMap<DbId, Attachment>,
}

/// Shared, cloneable handle to one in-memory database.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    /// Remaining writes before an injected storage failure; negative = never.
    writes_until_failure: Arc<AtomicI64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::default(),
            writes_until_failure: Arc::new(AtomicI64::new(-1)),
        }
    }

    /// Let `writes` more writes succeed, then fail the next one with
    /// [`CoreError::Storage`]. Used to exercise rollback paths.
    pub fn fail_after_writes(&self, writes: i64) {
        self.writes_until_failure.store(writes, Ordering::SeqCst);
    }

    /// Committed pages of a wiki, for assertions.
    pub async fn committed_pages(&self, wiki_id: DbId) -> Vec<WikiPage> {
        let tables = self.tables.lock().await;
        tables
            .pages
            .values()
            .filter(|p| p.wiki_id == wiki_id)
            .cloned()
            .collect()
    }

    /// Committed blobs owned by `ref_id`, for assertions.
    pub async fn committed_texts(&self, ref_id: DbId) -> Vec<Text> {
        let tables = self.tables.lock().await;
        tables
            .texts
            .values()
            .filter(|t| t.ref_id == ref_id)
            .cloned()
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WikiStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, CoreError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTx {
            guard,
            working,
            writes_until_failure: Arc::clone(&self.writes_until_failure),
        })
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    writes_until_failure: Arc<AtomicI64>,
}

impl MemoryTx {
    fn write(&self) -> Result<(), CoreError> {
        let remaining = self.writes_until_failure.load(Ordering::SeqCst);
        if remaining == 0 {
            self.writes_until_failure.store(-1, Ordering::SeqCst);
            return Err(CoreError::Storage("injected write failure".into()));
        }
        if remaining > 0 {
            self.writes_until_failure.store(remaining - 1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn page_mut(&mut self, id: DbId) -> Result<&mut WikiPage, CoreError> {
        self.working
            .pages
            .get_mut(&id)
            .ok_or(CoreError::NotFound {
                entity: "WikiPage",
                id,
            })
    }
}

fn now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}

#[async_trait]
impl WikiTx for MemoryTx {
    async fn find_wiki(&mut self, id: DbId) -> Result<Option<Wiki>, CoreError> {
        Ok(self.working.wikis.get(&id).cloned())
    }

    async fn lock_wiki(&mut self, id: DbId) -> Result<Option<Wiki>, CoreError> {
        // The whole store is already held exclusively.
        self.find_wiki(id).await
    }

    async fn list_wikis(&mut self) -> Result<Vec<Wiki>, CoreError> {
        let mut wikis: Vec<Wiki> = self.working.wikis.values().cloned().collect();
        wikis.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(wikis)
    }

    async fn insert_wiki(&mut self, wiki: &NewWiki) -> Result<Wiki, CoreError> {
        self.write()?;
        let ts = now();
        let row = Wiki {
            id: wiki.id,
            name: wiki.name.clone(),
            description: wiki.description.clone(),
            tags: wiki.tags.clone(),
            content_id: wiki.content_id,
            cover_id: wiki.cover_id,
            version: 0,
            created_at: ts,
            updated_at: ts,
        };
        self.working.wikis.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_wiki(&mut self, wiki: &Wiki) -> Result<Wiki, CoreError> {
        self.write()?;
        let row = self
            .working
            .wikis
            .get_mut(&wiki.id)
            .ok_or(CoreError::NotFound {
                entity: "Wiki",
                id: wiki.id,
            })?;
        row.name = wiki.name.clone();
        row.description = wiki.description.clone();
        row.tags = wiki.tags.clone();
        row.content_id = wiki.content_id;
        row.cover_id = wiki.cover_id;
        row.version += 1;
        row.updated_at = now();
        Ok(row.clone())
    }

    async fn delete_wiki(&mut self, id: DbId) -> Result<(), CoreError> {
        self.write()?;
        self.working.wikis.remove(&id);
        Ok(())
    }

    async fn find_page(&mut self, id: DbId) -> Result<Option<WikiPage>, CoreError> {
        Ok(self.working.pages.get(&id).cloned())
    }

    async fn list_pages(&mut self, wiki_id: DbId) -> Result<Vec<WikiPage>, CoreError> {
        Ok(self
            .working
            .pages
            .values()
            .filter(|p| p.wiki_id == wiki_id)
            .cloned()
            .collect())
    }

    async fn count_pages(&mut self, wiki_id: DbId) -> Result<i64, CoreError> {
        let count = self
            .working
            .pages
            .values()
            .filter(|p| p.wiki_id == wiki_id)
            .count();
        Ok(count as i64)
    }

    async fn count_children(
        &mut self,
        wiki_id: DbId,
        parent_id: Option<DbId>,
    ) -> Result<i64, CoreError> {
        let count = self
            .working
            .pages
            .values()
            .filter(|p| p.wiki_id == wiki_id && p.parent_id == parent_id)
            .count();
        Ok(count as i64)
    }

    async fn insert_page(&mut self, page: &NewWikiPage) -> Result<WikiPage, CoreError> {
        self.write()?;
        let ts = now();
        let row = WikiPage {
            id: page.id,
            wiki_id: page.wiki_id,
            parent_id: page.parent_id,
            name: page.name.clone(),
            content_id: page.content_id,
            display_order: page.display_order,
            version: 0,
            created_at: ts,
            updated_at: ts,
        };
        self.working.pages.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_page(&mut self, page: &WikiPage) -> Result<WikiPage, CoreError> {
        self.write()?;
        let row = self.page_mut(page.id)?;
        row.name = page.name.clone();
        row.content_id = page.content_id;
        row.version += 1;
        row.updated_at = now();
        Ok(row.clone())
    }

    async fn set_display_order(
        &mut self,
        page_id: DbId,
        display_order: i32,
    ) -> Result<(), CoreError> {
        self.write()?;
        self.page_mut(page_id)?.display_order = display_order;
        Ok(())
    }

    async fn move_page(
        &mut self,
        page_id: DbId,
        parent_id: Option<DbId>,
        display_order: i32,
    ) -> Result<WikiPage, CoreError> {
        self.write()?;
        let row = self.page_mut(page_id)?;
        row.parent_id = parent_id;
        row.display_order = display_order;
        row.version += 1;
        row.updated_at = now();
        Ok(row.clone())
    }

    async fn insert_text(&mut self, text: &NewText) -> Result<Text, CoreError> {
        self.write()?;
        let row = Text {
            id: text.id,
            ref_id: text.ref_id,
            value: text.value.clone(),
            created_at: now(),
        };
        self.working.texts.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_text(&mut self, id: DbId) -> Result<Option<Text>, CoreError> {
        Ok(self.working.texts.get(&id).cloned())
    }

    async fn delete_texts_by_ref(&mut self, ref_id: DbId) -> Result<u64, CoreError> {
        self.write()?;
        let before = self.working.texts.len();
        self.working.texts.retain(|_, t| t.ref_id != ref_id);
        Ok((before - self.working.texts.len()) as u64)
    }

    async fn insert_attachment(
        &mut self,
        attachment: &NewAttachment,
    ) -> Result<Attachment, CoreError> {
        self.write()?;
        let row = Attachment {
            id: attachment.id,
            user_id: attachment.user_id,
            name: attachment.name.clone(),
            mime: attachment.mime.clone(),
            width: attachment.width,
            height: attachment.height,
            size: attachment.data.len() as i64,
            created_at: now(),
        };
        self.working.attachments.insert(row.id, row.clone());
        Ok(row)
    }

    async fn commit(self) -> Result<(), CoreError> {
        let MemoryTx {
            mut guard, working, ..
        } = self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self) -> Result<(), CoreError> {
        Ok(())
    }
}
