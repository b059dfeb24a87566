use crate::parser::{EntityWithTitle, ParseError, ParseInput, ResponseParser};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Matches `/entity-<slug>-<uuid>.json`; the slug cannot contain `-` or `.`
static ENTITY_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i).*/entity-(?P<slug>[^-.]+)-(?P<uuid>[^.]+)\.json$").expect("Invalid regex")
});

/// Parses JSON entity pages into [`EntityWithTitle`]
///
/// Unknown JSON fields are ignored. The id always comes from the `uuid` part
/// of the URL path, never from the body.
#[derive(Debug, Clone, Default)]
pub struct EntityJsonPageParser;

impl EntityJsonPageParser {
    pub fn new() -> Self {
        Self
    }
}

impl ResponseParser<EntityWithTitle> for EntityJsonPageParser {
    fn name(&self) -> &'static str {
        "entity-json"
    }

    fn can_handle(&self, url: &Url) -> bool {
        ENTITY_PATH_RE.is_match(url.path())
    }

    fn parse(&self, input: &ParseInput) -> Result<EntityWithTitle, ParseError> {
        let mut entity: EntityWithTitle = serde_json::from_str(&input.body)?;

        let captures = ENTITY_PATH_RE
            .captures(input.url.path())
            .ok_or_else(|| ParseError::UrlMismatch(input.url.to_string()))?;
        entity.id = Some(captures["uuid"].to_string());

        Ok(entity)
    }
}
