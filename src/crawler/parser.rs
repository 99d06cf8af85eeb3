//! HTML parser for catalog pages
//!
//! This module handles the two page shapes of the catalog:
//! - Listing pages: item detail links plus the link to the next page
//! - Detail pages: the raw field bundle of one book

use crate::record::{rating_from_word, RawBook};
use crate::ParseError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Links extracted from one listing page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingPage {
    /// Absolute detail-page URLs in document order, without duplicates
    pub items: Vec<Url>,

    /// Absolute URL of the next listing page, if any
    pub next: Option<Url>,
}

impl ListingPage {
    /// An empty listing means pagination is exhausted
    pub fn is_exhausted(&self) -> bool {
        self.items.is_empty()
    }
}

fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::InvalidSelector(format!("{}: {:?}", css, e)))
}

fn resolve(base_url: &Url, href: &str) -> Result<Url, ParseError> {
    base_url
        .join(href.trim())
        .map_err(|e| ParseError::InvalidUrl {
            href: href.to_string(),
            message: e.to_string(),
        })
}

/// Collects the text of an element, trimmed
fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_text(scope: ElementRef<'_>, css: &str) -> Result<Option<String>, ParseError> {
    let sel = selector(css)?;
    Ok(scope.select(&sel).next().map(text_of))
}

/// Parses a listing page
///
/// # Structure
///
/// | Part | Selector |
/// |------|----------|
/// | page body (required) | `section` |
/// | item links | `article.product_pod h3 a[href]` |
/// | next page | `li.next a[href]` |
///
/// Relative links are resolved against `base_url`, the URL the page was
/// fetched from.
///
/// # Example
///
/// ```
/// use shelf_crawler::crawler::parse_listing;
/// use url::Url;
///
/// let html = r#"<section><article class="product_pod"><h3><a href="book_1/index.html">Book</a></h3></article></section>"#;
/// let base = Url::parse("https://books.example.com/catalogue/page-1.html").unwrap();
/// let page = parse_listing(html, &base).unwrap();
/// assert_eq!(page.items[0].as_str(), "https://books.example.com/catalogue/book_1/index.html");
/// assert!(page.next.is_none());
/// ```
pub fn parse_listing(html: &str, base_url: &Url) -> Result<ListingPage, ParseError> {
    let document = Html::parse_document(html);

    if document.select(&selector("section")?).next().is_none() {
        return Err(ParseError::MissingStructure {
            what: "listing section",
        });
    }

    let mut items: Vec<Url> = Vec::new();
    for link in document.select(&selector("article.product_pod h3 a[href]")?) {
        if let Some(href) = link.value().attr("href") {
            let url = resolve(base_url, href)?;
            if !items.contains(&url) {
                items.push(url);
            }
        }
    }

    let next = document
        .select(&selector("li.next a[href]")?)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|href| resolve(base_url, href))
        .transpose()?;

    Ok(ListingPage { items, next })
}

/// Parses a book detail page
///
/// Only the product container and its title are required; every other field
/// falls back to an empty value.
pub fn parse_detail(html: &str) -> Result<RawBook, ParseError> {
    let document = Html::parse_document(html);

    let main = document
        .select(&selector(".product_main")?)
        .next()
        .ok_or(ParseError::MissingStructure {
            what: "product container",
        })?;

    let title = first_text(main, "h1")?.ok_or(ParseError::MissingStructure {
        what: "product title",
    })?;

    let price = first_text(main, ".price_color")?.unwrap_or_default();
    let availability = first_text(main, ".availability")?.unwrap_or_default();

    // Home > Books > Category > Title
    let category = document
        .select(&selector("ul.breadcrumb li a")?)
        .nth(2)
        .map(text_of)
        .unwrap_or_default();

    let description = document
        .select(&selector("#product_description ~ p")?)
        .next()
        .map(text_of)
        .unwrap_or_default();

    Ok(RawBook {
        title,
        price,
        category,
        availability,
        rating_glyph_count: rating_markers(main)?,
        description,
    })
}

/// Counts the rating markers of a product
///
/// The catalog encodes the rating as an ordinal class on the `.star-rating`
/// element (`star-rating Four`); when that class is absent the filled star
/// icons inside it are counted instead.
fn rating_markers(main: ElementRef<'_>) -> Result<u8, ParseError> {
    let Some(rating) = main.select(&selector(".star-rating")?).next() else {
        return Ok(0);
    };

    if let Some(count) = rating.value().classes().find_map(rating_from_word) {
        return Ok(count);
    }

    let stars = rating.select(&selector("i.icon-star")?).count();
    Ok(u8::try_from(stars).unwrap_or(u8::MAX).min(5))
}
