pub mod wiki;
pub mod wiki_page;
