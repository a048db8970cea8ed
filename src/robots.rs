use crate::error::RobotsCheckError;
use url::Url;

/// What the best-effort robots.txt request produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotsOutcome {
    /// HTTP 200 with the body text
    Found(String),
    /// HTTP 404
    Missing,
    /// Any other status code
    Other(u16),
    /// The request failed; treated as "no information"
    Unavailable,
}

impl RobotsOutcome {
    /// True when the file both addresses every agent and disallows a root path.
    pub fn blocks_all(&self) -> bool {
        match self {
            RobotsOutcome::Found(content) => {
                let content = content.to_lowercase();
                content.contains("user-agent: *") && content.contains("disallow: /")
            }
            _ => false,
        }
    }
}

/// Fetches robots.txt for the host of `page_url`. Never fails; errors become `Unavailable`.
pub async fn fetch_robots(client: &reqwest::Client, page_url: &str) -> RobotsOutcome {
    match try_fetch_robots(client, page_url).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::debug!(url = %page_url, error = %e, "robots.txt unavailable, skipping check");
            RobotsOutcome::Unavailable
        }
    }
}

async fn try_fetch_robots(
    client: &reqwest::Client,
    page_url: &str,
) -> Result<RobotsOutcome, RobotsCheckError> {
    let robots_url = robots_url(page_url)?;
    let response = client.get(&robots_url).send().await?;

    let outcome = match response.status().as_u16() {
        200 => RobotsOutcome::Found(response.text().await?),
        404 => RobotsOutcome::Missing,
        status => RobotsOutcome::Other(status),
    };

    tracing::debug!(url = %robots_url, outcome = outcome_label(&outcome), "Checked robots.txt");
    Ok(outcome)
}

fn outcome_label(outcome: &RobotsOutcome) -> &'static str {
    match outcome {
        RobotsOutcome::Found(_) => "found",
        RobotsOutcome::Missing => "missing",
        RobotsOutcome::Other(_) => "other",
        RobotsOutcome::Unavailable => "unavailable",
    }
}

/// Gets the robots.txt URL (`scheme://host[:port]/robots.txt`) for a page URL
pub fn robots_url(page_url: &str) -> Result<String, RobotsCheckError> {
    let mut url = Url::parse(page_url).map_err(|e| RobotsCheckError::Location(e.to_string()))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(RobotsCheckError::Location(format!(
            "no host in {}",
            page_url
        )));
    }
    url.set_path("/robots.txt");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.to_string())
}
