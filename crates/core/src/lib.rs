//! Wiki domain core: models, validation, page ordering, and the service that
//! ties them to a transactional store.
//!
//! Nothing here depends on a database driver or on HTTP. Persistence is
//! reached through the [`store::WikiStore`] seam, implemented in-memory by
//! [`memory_store::MemoryStore`] and against PostgreSQL by the db crate.

pub mod attachment;
pub mod error;
pub mod memory_store;
pub mod models;
pub mod page_order;
pub mod page_tree;
pub mod roles;
pub mod service;
pub mod store;
pub mod types;
pub mod wiki;
