use crate::record::rating::rating_word;
use crate::record::{BookRecord, RawBook};

/// Builds the canonical record for a detail page
///
/// # Rules
///
/// | Field | Treatment |
/// |-------|-----------|
/// | price | cleaned, currency symbol kept, never parsed as a number |
/// | rating | marker count mapped to its ordinal word, empty when unrated |
/// | title, category, availability, description | cleaned |
///
/// Cleaning removes leading/trailing whitespace and replaces every run of embedded
/// control characters with a single space. Delimiters, quotes and line breaks that
/// survive cleaning are left to the store's quoting.
pub fn normalize(raw: &RawBook, id: u64) -> BookRecord {
    BookRecord {
        id,
        title: clean_text(&raw.title),
        price: clean_text(&raw.price),
        category: clean_text(&raw.category),
        availability: clean_text(&raw.availability),
        rating: rating_word(raw.rating_glyph_count)
            .unwrap_or_default()
            .to_string(),
        description: clean_text(&raw.description),
    }
}

/// Trims `text` and collapses runs of control characters into one space
pub fn clean_text(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut in_control_run = false;

    for c in text.chars() {
        if c.is_control() {
            if !in_control_run {
                cleaned.push(' ');
                in_control_run = true;
            }
        } else {
            cleaned.push(c);
            in_control_run = false;
        }
    }

    cleaned.trim().to_string()
}
