//! Statistics generation from the record store
//!
//! This module provides functionality for summarizing a catalog snapshot and
//! displaying it on the command line.

use crate::record::{BookRecord, RATING_WORDS};
use std::collections::BTreeMap;

/// Catalog statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogStatistics {
    /// Total number of persisted books
    pub total_books: u64,

    /// Books per category, keyed and therefore sorted by category name
    pub books_by_category: BTreeMap<String, u64>,

    /// Books per rating word, in `One..Five` order
    pub rating_distribution: Vec<(&'static str, u64)>,

    /// Books without a rating
    pub unrated: u64,
}

impl CatalogStatistics {
    /// Summarizes a catalog snapshot
    pub fn from_snapshot(records: &[BookRecord]) -> Self {
        let mut books_by_category = BTreeMap::new();
        let mut rating_distribution: Vec<(&'static str, u64)> =
            RATING_WORDS.iter().map(|w| (*w, 0)).collect();
        let mut unrated = 0;

        for record in records {
            *books_by_category
                .entry(record.category.clone())
                .or_insert(0) += 1;

            match rating_distribution
                .iter_mut()
                .find(|(word, _)| *word == record.rating)
            {
                Some((_, count)) => *count += 1,
                None => unrated += 1,
            }
        }

        Self {
            total_books: records.len() as u64,
            books_by_category,
            rating_distribution,
            unrated,
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Overview:");
    println!("  Total books: {}", stats.total_books);
    println!("  Categories: {}", stats.books_by_category.len());
    println!();

    println!("Books by Category:");
    for (category, count) in &stats.books_by_category {
        let label = if category.is_empty() {
            "(none)"
        } else {
            category
        };
        println!("  {}: {}", label, count);
    }
    println!();

    println!("Rating Distribution:");
    for (word, count) in &stats.rating_distribution {
        let percentage = if stats.total_books > 0 {
            (*count as f64 / stats.total_books as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", word, count, percentage);
    }
    if stats.unrated > 0 {
        println!("  Unrated: {}", stats.unrated);
    }
}
