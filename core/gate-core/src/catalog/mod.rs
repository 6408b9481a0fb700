//! Flash-card catalog: categories and the cards in them.
//!
//! The session gate never touches the catalog; it is used by the admin
//! commands and the games.

mod db;
mod types;

pub use db::CatalogDb;
pub use types::{
    default_categories, Category, CategoryUpdate, FlashCard, FlashCardUpdate, NewCategory,
    NewFlashCard,
};
