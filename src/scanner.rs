use crate::checks::{self, CheckContext};
use crate::config::ScannerSettings;
use crate::error::InvalidUrlError;
use crate::fetcher::Fetcher;
use crate::http_client::build_http_client;
use crate::models::{Finding, FindingCategory, RiskLevel, ScanReport, Severity};
use crate::normalizer::normalize_url;
use crate::robots::fetch_robots;
use crate::scorer;
use anyhow::Result;

/// Runs the normalize, fetch, check and score pipeline.
///
/// Holds only immutable clients and settings, so one instance can serve
/// concurrent scans.
pub struct Scanner {
    fetcher: Fetcher,
    robots_client: reqwest::Client,
}

impl Scanner {
    pub fn new(settings: &ScannerSettings) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(settings)?,
            robots_client: build_http_client(&settings.user_agent, settings.robots_timeout)?,
        })
    }

    /// Scans `target` and always returns a report. Invalid input and fetch
    /// failures become a single "Scan Error" finding with score 0.
    pub async fn scan(&self, target: &str) -> ScanReport {
        match normalize_url(target) {
            Ok(normalized) => self.scan_normalized(target, normalized).await,
            Err(e) => {
                tracing::warn!(target = %target, error = %e, "Rejected scan target");
                failed_report(target, String::new(), &e.to_string())
            }
        }
    }

    /// Like [`Scanner::scan`], but input that cannot be normalized is returned
    /// as an error before any request is made.
    pub async fn try_scan(&self, target: &str) -> Result<ScanReport, InvalidUrlError> {
        let normalized = normalize_url(target)?;
        Ok(self.scan_normalized(target, normalized).await)
    }

    async fn scan_normalized(&self, target: &str, normalized: String) -> ScanReport {
        tracing::info!(url = %normalized, "Starting scan");

        let page = match self.fetcher.fetch(&normalized).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(url = %normalized, error = %e, "Page request failed");
                return failed_report(target, normalized, &e.to_string());
            }
        };

        let robots = fetch_robots(&self.robots_client, &page.final_url).await;

        let findings = checks::run_all(&CheckContext {
            final_url: &page.final_url,
            headers: &page.headers,
            body: &page.body_prefix,
            robots: &robots,
        });
        let (overall_score, risk_level) = scorer::assess(&findings);

        tracing::info!(
            url = %page.final_url,
            findings = findings.len(),
            score = overall_score,
            risk = risk_level.as_str(),
            "Scan complete"
        );

        ScanReport {
            target: target.to_string(),
            normalized_url: normalized,
            final_url: page.final_url,
            redirect_chain: page.redirect_chain,
            response_status: page.status_code,
            findings,
            overall_score,
            risk_level,
        }
    }
}

fn failed_report(target: &str, normalized_url: String, cause: &str) -> ScanReport {
    ScanReport {
        target: target.to_string(),
        normalized_url,
        final_url: String::new(),
        redirect_chain: vec![],
        response_status: None,
        findings: vec![Finding::new(
            FindingCategory::Other,
            Severity::High,
            "Scan Error",
            format!("An error occurred during scanning: {}", cause),
            "Verify the URL is correct and accessible, and check network connectivity.",
        )],
        overall_score: 0.0,
        risk_level: RiskLevel::High,
    }
}
