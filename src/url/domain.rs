use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// The port is not part of the domain.
///
/// # Arguments
///
/// * `url` - The URL to extract the domain from
///
/// # Returns
///
/// * `Some(String)` - The lowercase domain/host
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_harvest::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("https://sub.example.com:8443/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("sub.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Parses a caller-supplied URL into a fetchable target and its domain
///
/// # Errors
///
/// * `UrlError::Parse` - The string is not a URL
/// * `UrlError::InvalidScheme` - The scheme is not http or https
/// * `UrlError::MissingDomain` - The URL has no host
pub fn parse_target(raw: &str) -> UrlResult<(Url, String)> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse {
        url: raw.to_string(),
        message: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let domain = extract_domain(&url).ok_or_else(|| UrlError::MissingDomain(raw.to_string()))?;
    Ok((url, domain))
}
