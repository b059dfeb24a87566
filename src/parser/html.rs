//! HTML product page parser
//!
//! Product pages carry their title in `<h1 class="product-title">` and the
//! product id in its `data-id` attribute.

use crate::parser::{EntityWithTitle, ParseError, ParseInput, ResponseParser};
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

static PRODUCT_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i).*/product-(?P<slug>[^.]+)\.html").expect("Invalid regex")
});

/// Parses HTML product pages into [`EntityWithTitle`]
#[derive(Debug, Clone, Default)]
pub struct ProductHtmlPageParser;

impl ProductHtmlPageParser {
    pub fn new() -> Self {
        Self
    }
}

impl ResponseParser<EntityWithTitle> for ProductHtmlPageParser {
    fn name(&self) -> &'static str {
        "product-html"
    }

    fn can_handle(&self, url: &Url) -> bool {
        PRODUCT_PATH_RE.is_match(url.path())
    }

    fn parse(&self, input: &ParseInput) -> Result<EntityWithTitle, ParseError> {
        let document = Html::parse_document(&input.body);
        let selector = Selector::parse("h1.product-title")
            .map_err(|e| ParseError::Invalid(format!("selector: {:?}", e)))?;

        let heading = document
            .select(&selector)
            .next()
            .ok_or_else(|| ParseError::MissingElement("h1.product-title".to_string()))?;

        let title = heading.text().collect::<String>().trim().to_string();

        Ok(EntityWithTitle {
            id: heading.value().attr("data-id").map(str::to_string),
            title: Some(title).filter(|t| !t.is_empty()),
        })
    }
}
