/// Ordinal vocabulary used for ratings, index 0 corresponds to one marker
pub const RATING_WORDS: [&str; 5] = ["One", "Two", "Three", "Four", "Five"];

/// Maps a marker count to its ordinal word
///
/// Counts outside 1-5 have no word and yield `None`.
pub fn rating_word(count: u8) -> Option<&'static str> {
    match count {
        1..=5 => Some(RATING_WORDS[usize::from(count) - 1]),
        _ => None,
    }
}

/// Inverse of [`rating_word`]; matching is exact
pub fn rating_from_word(word: &str) -> Option<u8> {
    RATING_WORDS
        .iter()
        .position(|w| *w == word)
        .and_then(|idx| u8::try_from(idx + 1).ok())
}
