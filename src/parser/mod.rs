//! Response parsers
//!
//! A parser turns the body of a successful response into a typed entity. Each
//! parser declares which URLs it handles; the [`ParserRegistry`] picks the
//! first parser that accepts a URL, in registration order.

mod html;
mod json;

pub use html::ProductHtmlPageParser;
pub use json::EntityJsonPageParser;

use crate::crawler::RawResponse;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Errors raised while turning a response into an entity
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Response body is empty")]
    EmptyBody,

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing element: {0}")]
    MissingElement(String),

    #[error("URL does not match parser pattern: {0}")]
    UrlMismatch(String),

    #[error("Invalid response: {0}")]
    Invalid(String),

    #[error("Parser {parser} panicked: {message}")]
    Panicked {
        parser: &'static str,
        message: String,
    },
}

/// The part of a successful response a parser needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseInput {
    /// The URL that was requested, even if the server redirected
    pub url: Url,
    pub body: String,
}

impl ParseInput {
    /// Builds parser input from the response to a request for `url`
    ///
    /// # Errors
    ///
    /// * `ParseError::EmptyBody` - The body is empty or only whitespace
    pub fn from_response(url: &Url, response: &RawResponse) -> Result<Self, ParseError> {
        if response.body.trim().is_empty() {
            return Err(ParseError::EmptyBody);
        }

        Ok(Self {
            url: url.clone(),
            body: response.body.clone(),
        })
    }
}

/// Converts responses from a family of URLs into entities of type `E`
pub trait ResponseParser<E>: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Returns true if responses from `url` can be parsed by this parser
    fn can_handle(&self, url: &Url) -> bool;

    fn parse(&self, input: &ParseInput) -> Result<E, ParseError>;
}

/// An entity identified by id and title
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityWithTitle {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl fmt::Display for EntityWithTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EntityWithTitle(id={}, title={})",
            self.id.as_deref().unwrap_or("-"),
            self.title.as_deref().unwrap_or("-")
        )
    }
}

/// Ordered collection of parsers
pub struct ParserRegistry<E> {
    parsers: Vec<Arc<dyn ResponseParser<E>>>,
}

impl<E> ParserRegistry<E> {
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Adds a parser with lower priority than every parser added before it
    pub fn register(mut self, parser: impl ResponseParser<E> + 'static) -> Self {
        self.parsers.push(Arc::new(parser));
        self
    }

    /// Returns the first parser that handles `url`
    pub fn find(&self, url: &Url) -> Option<Arc<dyn ResponseParser<E>>> {
        self.parsers
            .iter()
            .find(|parser| parser.can_handle(url))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl<E> Default for ParserRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserRegistry<EntityWithTitle> {
    /// The built-in parsers: JSON entity pages first, then HTML product pages
    pub fn standard() -> Self {
        Self::new()
            .register(EntityJsonPageParser::new())
            .register(ProductHtmlPageParser::new())
    }
}
