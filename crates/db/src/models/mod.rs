//! Database row structs.
//!
//! Each submodule holds a `FromRow` struct matching one table and a `From`
//! conversion into the corresponding `wikitree_core::models` entity.

pub mod attachment;
pub mod text;
pub mod wiki;
pub mod wiki_page;
