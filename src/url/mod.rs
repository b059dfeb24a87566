//! URL handling module for Sumi-Harvest
//!
//! This module provides domain extraction, validation of caller-supplied
//! URLs, and loading of URL list files.

mod domain;
mod list;

// Re-export main functions
pub use domain::{extract_domain, parse_target};
pub use list::{load_url_list, parse_url_list};
