//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async queries that take
//! `&mut PgConnection`, so callers can run them on a pooled connection or
//! inside an open transaction alike.

pub mod attachment_repo;
pub mod text_repo;
pub mod wiki_page_repo;
pub mod wiki_repo;

pub use attachment_repo::AttachmentRepo;
pub use text_repo::TextRepo;
pub use wiki_page_repo::WikiPageRepo;
pub use wiki_repo::WikiRepo;
