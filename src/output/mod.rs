//! Output module for reporting batch results
//!
//! This module handles:
//! - Rendering per-URL outcomes as text or JSON
//! - Summarizing a batch into statistics

pub mod stats;

pub use stats::{compute_statistics, print_statistics, ScrapeStatistics};

use crate::Outcome;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt::Display;

/// Renders one line per URL, sorted by URL
///
/// Successful URLs render as `URL: <url> Entity: <entity>`, failed ones as
/// `URL: <url> Error: <error>`.
pub fn render_text<E: Display>(results: &HashMap<String, Outcome<E>>) -> String {
    let mut urls: Vec<&String> = results.keys().collect();
    urls.sort();

    let mut out = String::new();
    for url in urls {
        match &results[url] {
            Ok(entity) => out.push_str(&format!("URL: {} Entity: {}\n", url, entity)),
            Err(e) => out.push_str(&format!("URL: {} Error: {}\n", url, e)),
        }
    }
    out
}

/// Renders the results as a JSON object keyed by URL
///
/// Each value is `{"entity": ...}` or `{"error": {"kind": ..., "message": ...}}`.
pub fn render_json<E: Serialize>(
    results: &HashMap<String, Outcome<E>>,
) -> Result<Value, serde_json::Error> {
    let mut map = serde_json::Map::new();

    for (url, outcome) in results {
        let value = match outcome {
            Ok(entity) => json!({ "entity": serde_json::to_value(entity)? }),
            Err(e) => json!({
                "error": {
                    "kind": e.kind().label(),
                    "message": e.to_string(),
                }
            }),
        };
        map.insert(url.clone(), value);
    }

    Ok(Value::Object(map))
}
