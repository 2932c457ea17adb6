//! Wiki domain entities and request DTOs.
//!
//! Entities mirror the `wikis`, `wiki_pages`, `texts`, and `attachments`
//! tables. `New*` structs carry application-generated ids into the storage
//! layer; `Create*` / `Update*` DTOs are the validated caller input.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A top-level page collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Wiki {
    pub id: DbId,
    pub name: String,
    pub description: String,
    /// Normalized comma-separated tag list (see [`crate::wiki::format_tags`]).
    pub tags: String,
    pub content_id: DbId,
    pub cover_id: Option<DbId>,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A wiki with its current content blob resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WikiWithContent {
    #[serde(flatten)]
    pub wiki: Wiki,
    pub content: String,
}

/// A node in a wiki's page hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WikiPage {
    pub id: DbId,
    pub wiki_id: DbId,
    /// `None` places the page at the root of its wiki.
    pub parent_id: Option<DbId>,
    pub name: String,
    pub content_id: DbId,
    /// Zero-based rank among pages sharing `(wiki_id, parent_id)`.
    pub display_order: i32,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A page with its current content blob resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WikiPageWithContent {
    #[serde(flatten)]
    pub page: WikiPage,
    pub content: String,
}

/// A page plus its ordered children, as returned by the page-tree query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WikiPageNode {
    #[serde(flatten)]
    pub page: WikiPage,
    pub children: Vec<WikiPageNode>,
}

/// An immutable content blob owned by a wiki or a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Text {
    pub id: DbId,
    pub ref_id: DbId,
    pub value: String,
    pub created_at: Timestamp,
}

/// A stored upload (wiki cover image).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub mime: String,
    pub width: i32,
    pub height: i32,
    pub size: i64,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Insert records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewWiki {
    pub id: DbId,
    pub name: String,
    pub description: String,
    pub tags: String,
    pub content_id: DbId,
    pub cover_id: Option<DbId>,
}

#[derive(Debug, Clone)]
pub struct NewWikiPage {
    pub id: DbId,
    pub wiki_id: DbId,
    pub parent_id: Option<DbId>,
    pub name: String,
    pub content_id: DbId,
    pub display_order: i32,
}

#[derive(Debug, Clone)]
pub struct NewText {
    pub id: DbId,
    pub ref_id: DbId,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub mime: String,
    pub width: i32,
    pub height: i32,
    pub data: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Input for creating a wiki.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateWiki {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 1000))]
    pub description: String,
    #[validate(length(min = 1, max = 100000))]
    pub content: String,
    /// Raw comma-separated tags; normalized before storage.
    pub tags: Option<String>,
}

/// Input for updating a wiki. Absent fields are left untouched; present
/// fields must be non-empty.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateWiki {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 1000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100000))]
    pub content: Option<String>,
    pub tags: Option<String>,
}

/// Input for creating a page.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateWikiPage {
    /// `None` appends the page at the wiki root.
    #[serde(default)]
    pub parent_id: Option<DbId>,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100000))]
    pub content: String,
}

/// Input for updating a page's name and/or content.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateWikiPage {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100000))]
    pub content: Option<String>,
}

/// Input for relocating a page.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveWikiPage {
    /// New parent page; `None` moves the page to the wiki root.
    #[serde(default)]
    pub target_id: Option<DbId>,
    /// Zero-based insertion index among the target's children.
    pub index: i64,
}
