//! Book records and their normalization
//!
//! The page parser produces a [`RawBook`] straight from the detail page markup.
//! [`normalize`] turns that bundle into a canonical [`BookRecord`], which is the
//! only shape the record store and the query service ever see.

mod normalize;
mod rating;

pub use normalize::{clean_text, normalize};
pub use rating::{rating_from_word, rating_word, RATING_WORDS};

use serde::{Deserialize, Serialize};

/// Column names of the persisted table, in storage order
pub const FIELD_NAMES: [&str; 7] = [
    "id",
    "title",
    "price",
    "category",
    "availability",
    "rating",
    "description",
];

/// One catalog item as persisted and served
///
/// Field order matches [`FIELD_NAMES`] and is the column order of the CSV store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Sequential, 0-based, assigned in order of successful extraction
    pub id: u64,
    pub title: String,
    /// Display price including its currency symbol (e.g. "£51.77")
    pub price: String,
    pub category: String,
    pub availability: String,
    /// One of [`RATING_WORDS`], or empty when the page carried no rating
    pub rating: String,
    pub description: String,
}

/// Field bundle extracted from a detail page before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBook {
    pub title: String,
    pub price: String,
    pub category: String,
    pub availability: String,
    /// Number of rating markers on the page (0-5)
    pub rating_glyph_count: u8,
    pub description: String,
}
