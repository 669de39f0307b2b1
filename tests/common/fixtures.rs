use page_insight::analysis::analysis_model::PageAnalysis;
use page_insight::browser::fixture::StaticPage;
use page_insight::browser::page::NetworkResponse;
use page_insight::dom::snapshot::Document;
use page_insight::extract::extractor::{ExtractorConfig, PageExtractor};
use page_insight::network::api_model::ApiCall;
use scraper::ElementRef;

pub const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Sign in</title></head>
<body>
  <form id="login-form">
    <input type="email" name="email">
    <input type="password">
    <button type="submit">Login</button>
  </form>
</body>
</html>"#;

pub const LANDING_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Acme Store</title></head>
<body>
  <header role="banner" class="site-header">
    <a href="/" class="logo">Acme</a>
  </header>
  <nav id="main-nav" data-testid="main-nav">
    <a href="/products">Products</a>
    <a href="/about">About</a>
  </nav>
  <main>
    <h1>Welcome to Acme</h1>
    <section class="hero" style="display: flex; cursor: pointer">
      <h2>Spring sale</h2>
      <button class="btn btn-primary" aria-label="Shop now">Shop</button>
    </section>
    <ul id="products">
      <li class="item"><img src="/a.png" alt="A"></li>
      <li class="item"><img src="/b.png" alt="B"></li>
    </ul>
    <form id="newsletter">
      <input type="email" name="email" placeholder="you@example.com">
      <button type="button">Subscribe</button>
    </form>
    <table><tr><td>1</td></tr></table>
  </main>
  <div class="modal" id="promo" role="dialog">
    <p>10% off</p>
  </div>
  <footer>
    <a href="/terms">Terms</a>
  </footer>
</body>
</html>"#;

/// Run extraction only (no navigation, no flows) over `html`.
pub fn extract(html: &str) -> PageAnalysis {
    let mut page = StaticPage::new(html);
    PageExtractor::new(ExtractorConfig::default())
        .extract(&mut page, "https://example.test/")
        .unwrap()
}

/// The single element matching `selector`.
pub fn only<'d>(document: &'d Document, selector: &str) -> ElementRef<'d> {
    let matches = document.select(selector).unwrap();
    assert_eq!(matches.len(), 1, "expected one match for {}", selector);
    matches[0]
}

pub fn xhr(url: &str, body: &str) -> NetworkResponse {
    NetworkResponse {
        url: url.to_string(),
        method: "post".to_string(),
        status: 200,
        resource_type: "xhr".to_string(),
        request_body: Some(r#"{"q":1}"#.to_string()),
        response_body: Some(body.to_string()),
    }
}

pub fn api_call(url: &str) -> ApiCall {
    ApiCall {
        method: "GET".to_string(),
        url: url.to_string(),
        request_body: None,
        response_body: None,
        status: 200,
        mock_response: None,
    }
}
