use crate::config::ScannerSettings;
use crate::error::FetchError;
use crate::http_client::build_http_client;
use crate::models::{FetchResult, HeaderTable};
use anyhow::Result;
use reqwest::header::{HeaderMap, LOCATION};
use url::Url;

/// Performs the primary page request, walking redirects by hand.
pub struct Fetcher {
    client: reqwest::Client,
    max_redirects: usize,
    body_limit: usize,
}

impl Fetcher {
    pub fn new(settings: &ScannerSettings) -> Result<Self> {
        Ok(Self {
            client: build_http_client(&settings.user_agent, settings.request_timeout)?,
            max_redirects: settings.max_redirects,
            body_limit: settings.body_limit,
        })
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let mut current = Url::parse(url).map_err(|e| FetchError::Request(e.to_string()))?;
        let mut redirect_chain = vec![url.to_string()];
        let mut hops = 0;

        loop {
            let response = self.client.get(current.clone()).send().await?;
            let status = response.status();

            if status.is_redirection()
                && let Some(location) = response.headers().get(LOCATION)
            {
                if hops >= self.max_redirects {
                    tracing::warn!(url = %url, limit = self.max_redirects, "Redirect limit exceeded");
                    return Err(FetchError::TooManyRedirects {
                        limit: self.max_redirects,
                    });
                }

                let location = location.to_str().map_err(|e| FetchError::InvalidRedirect {
                    from: current.to_string(),
                    reason: e.to_string(),
                })?;
                let next = current
                    .join(location)
                    .map_err(|e| FetchError::InvalidRedirect {
                        from: current.to_string(),
                        reason: e.to_string(),
                    })?;

                tracing::debug!(from = %current, to = %next, status = %status, "Following redirect");
                hops += 1;
                redirect_chain.push(next.to_string());
                current = next;
                continue;
            }

            let final_url = response.url().to_string();
            let headers = collect_headers(response.headers());
            let body_prefix = read_body_prefix(response, self.body_limit).await?;

            if redirect_chain.last() != Some(&final_url) {
                redirect_chain.push(final_url.clone());
            }

            tracing::debug!(
                url = %final_url,
                status = status.as_u16(),
                hops,
                "Fetched page"
            );

            return Ok(FetchResult {
                final_url,
                redirect_chain,
                status_code: Some(status.as_u16()),
                headers,
                body_prefix,
            });
        }
    }
}

/// Reads chunks until more than `limit` characters are decoded, so a large page
/// is never held in memory whole.
async fn read_body_prefix(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<String, FetchError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        bytes.extend_from_slice(&chunk);
        // chars never outnumber bytes; a split char at the tail is cut below
        if bytes.len() > limit && String::from_utf8_lossy(&bytes).chars().count() > limit {
            break;
        }
    }
    Ok(truncate_chars(&String::from_utf8_lossy(&bytes), limit))
}

/// Lowercases header names; for repeated headers the last value wins.
pub(crate) fn collect_headers(headers: &HeaderMap) -> HeaderTable {
    let mut table = HeaderTable::new();
    for (name, value) in headers {
        table.insert(
            name.as_str().to_lowercase(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        );
    }
    table
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
