//! Shared fixtures: test configuration and a wiremock-served catalog

use shelf_crawler::config::{Config, CrawlerConfig, OutputConfig, ServerConfig, UserAgentConfig};
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One book of the mock catalog
#[derive(Debug, Clone, Copy)]
pub struct Item {
    pub slug: &'static str,
    pub title: &'static str,
    pub category: &'static str,
    pub stars: usize,
}

pub const fn item(
    slug: &'static str,
    title: &'static str,
    category: &'static str,
    stars: usize,
) -> Item {
    Item {
        slug,
        title,
        category,
        stars,
    }
}

/// Creates a test configuration for a catalog starting at `start_url`
pub fn create_test_config(start_url: String, csv_path: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            start_url,
            request_timeout_secs: 2,
            max_retries: 1,
            backoff_base_ms: 1,
            politeness_delay_ms: 0,
            max_pages: 50,
            respect_robots: true,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            csv_path: csv_path.display().to_string(),
        },
        server: ServerConfig::default(),
    }
}

pub fn start_url(server: &MockServer) -> String {
    format!("{}/catalogue/page-1.html", server.uri())
}

pub fn listing_html(items: &[Item], next: Option<&str>) -> String {
    let mut html = String::from("<html><body><section><ol class=\"row\">");
    for it in items {
        html.push_str(&format!(
            r#"<li><article class="product_pod"><h3><a href="{}/index.html" title="{}">{}</a></h3></article></li>"#,
            it.slug, it.title, it.title
        ));
    }
    html.push_str("</ol><ul class=\"pager\">");
    if let Some(next) = next {
        html.push_str(&format!(r#"<li class="next"><a href="{}">next</a></li>"#, next));
    }
    html.push_str("</ul></section></body></html>");
    html
}

/// Detail page whose rating is only expressed through star markers
pub fn detail_html(it: &Item) -> String {
    let stars = r#"<i class="icon-star"></i>"#.repeat(it.stars);
    format!(
        r#"<html><body>
        <ul class="breadcrumb">
            <li><a href="../../index.html">Home</a></li>
            <li><a href="../category/books_1/index.html">Books</a></li>
            <li><a href="../category/books/x_2/index.html">{category}</a></li>
            <li class="active">{title}</li>
        </ul>
        <article class="product_page">
            <div class="col-sm-6 product_main">
                <h1>{title}</h1>
                <p class="price_color">£12.50</p>
                <p class="instock availability">
                    In stock (5 available)
                </p>
                <p class="star-rating">{stars}</p>
            </div>
            <div id="product_description" class="sub-header"><h2>Product Description</h2></div>
            <p>About {title}, with a comma and a "quote".</p>
        </article>
        </body></html>"#,
        category = it.category,
        title = it.title,
        stars = stars,
    )
}

pub async fn mount_page(server: &MockServer, route: &str, body: String, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

pub async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mounts listing pages `page-1.html..page-N.html` and every detail page
///
/// Detail responses are delayed by `item_delay`.
pub async fn mount_catalog(server: &MockServer, pages: &[&[Item]], item_delay: Duration) {
    for (idx, items) in pages.iter().enumerate() {
        let number = idx + 1;
        let next = (number < pages.len()).then(|| format!("page-{}.html", number + 1));
        mount_page(
            server,
            &format!("/catalogue/page-{}.html", number),
            listing_html(items, next.as_deref()),
            Duration::ZERO,
        )
        .await;

        for it in items.iter() {
            mount_page(
                server,
                &format!("/catalogue/{}/index.html", it.slug),
                detail_html(it),
                item_delay,
            )
            .await;
        }
    }
}

pub const PAGE_ONE: &[Item] = &[
    item("learning-python_1", "Learning Python", "Programming", 4),
    item("sharp-objects_2", "Sharp Objects", "Fiction", 2),
];

pub const PAGE_TWO: &[Item] = &[
    item("dune_3", "Dune", "Fiction", 5),
    item("the-raven_4", "The Raven", "Poetry", 1),
];

pub const PAGE_THREE: &[Item] = &[item("soumission_5", "Soumission", "Fiction", 3)];
