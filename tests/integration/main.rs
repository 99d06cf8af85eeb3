//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a miniature catalog and drive the full
//! crawl cycle end-to-end.

mod api_tests;
mod common;
mod crawl_tests;
