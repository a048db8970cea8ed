use crate::error::InvalidUrlError;
use url::Url;

/// Canonicalizes user input into a fetchable absolute URL.
///
/// Trims whitespace, strips a single trailing `/`, then prepends `https://`
/// when no `http://`/`https://` prefix is present. The result must parse and
/// carry a non-empty host.
pub fn normalize_url(input: &str) -> Result<String, InvalidUrlError> {
    let mut url = input.trim();

    let host_part = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    if host_part.is_empty() || host_part == "/" {
        return Err(InvalidUrlError::new(input, "no domain"));
    }

    if let Some(stripped) = url.strip_suffix('/') {
        url = stripped;
    }

    let url = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    };

    let parsed = Url::parse(&url).map_err(|e| InvalidUrlError::new(input, e.to_string()))?;
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(InvalidUrlError::new(input, "no domain")),
    }
}
