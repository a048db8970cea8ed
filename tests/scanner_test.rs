mod server;

use server::{
    LARGE_BODY_CHARS, ROBOTS_ALLOW, ROBOTS_BLOCK_ALL, start_slow_robots_server, start_test_server,
};
use sitecheck::config::ScannerSettings;
use sitecheck::error::FetchError;
use sitecheck::fetcher::Fetcher;
use sitecheck::models::{FindingCategory, RiskLevel, ScanReport, Severity};
use sitecheck::scanner::Scanner;
use std::time::{Duration, Instant};

fn scanner() -> Scanner {
    Scanner::new(&ScannerSettings::default()).unwrap()
}

fn titles(report: &ScanReport) -> Vec<&str> {
    report.findings.iter().map(|f| f.title.as_str()).collect()
}

#[tokio::test]
async fn test_http_site_reports_no_https() {
    let base_url = start_test_server(Some(ROBOTS_ALLOW)).await;

    let report = scanner().scan(&base_url).await;

    let no_https: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.title == "No HTTPS")
        .collect();
    assert_eq!(no_https.len(), 1);
    assert_eq!(no_https[0].severity, Severity::Critical);
    assert_eq!(no_https[0].category, FindingCategory::Security);
    assert!(report.overall_score <= 70.0);
    assert_eq!(report.response_status, Some(200));
}

#[tokio::test]
async fn test_hardened_page_only_misses_https() {
    let base_url = start_test_server(Some(ROBOTS_ALLOW)).await;

    let report = scanner().scan(&base_url).await;

    assert_eq!(titles(&report), vec!["No HTTPS"]);
    assert_eq!(report.overall_score, 70.0);
    assert_eq!(report.risk_level, RiskLevel::Low);
}

#[tokio::test]
async fn test_plain_page_full_battery() {
    let base_url = start_test_server(None).await;

    let report = scanner().scan(&format!("{}/plain", base_url)).await;

    assert_eq!(
        titles(&report),
        vec![
            "No HTTPS",
            "Missing Strict-Transport-Security (HSTS)",
            "Missing Content-Security-Policy (CSP)",
            "Missing X-Frame-Options",
            "Missing X-Content-Type-Options",
            "Missing Referrer-Policy",
            "Missing Permissions-Policy",
            "robots.txt not found",
        ]
    );
    assert_eq!(report.overall_score, 19.0);
    assert_eq!(report.risk_level, RiskLevel::High);
}

#[tokio::test]
async fn test_cookie_consent_detection() {
    let base_url = start_test_server(Some(ROBOTS_ALLOW)).await;
    let scanner = scanner();

    let without = scanner.scan(&format!("{}/cookies", base_url)).await;
    let gdpr: Vec<_> = without
        .findings
        .iter()
        .filter(|f| f.category == FindingCategory::Gdpr)
        .collect();
    assert_eq!(gdpr.len(), 1);
    assert_eq!(gdpr[0].title, "Cookies detected, banner not obvious");
    assert_eq!(gdpr[0].severity, Severity::Medium);

    let with = scanner.scan(&format!("{}/cookies-consent", base_url)).await;
    let gdpr: Vec<_> = with
        .findings
        .iter()
        .filter(|f| f.category == FindingCategory::Gdpr)
        .collect();
    assert_eq!(gdpr.len(), 1);
    assert_eq!(gdpr[0].title, "Cookies detected with consent mechanism");
    assert_eq!(gdpr[0].severity, Severity::Info);
}

#[tokio::test]
async fn test_server_version_disclosure() {
    let base_url = start_test_server(Some(ROBOTS_ALLOW)).await;

    let report = scanner().scan(&format!("{}/versioned", base_url)).await;

    let finding = report
        .findings
        .iter()
        .find(|f| f.title == "Server reveals version")
        .expect("version finding");
    assert_eq!(finding.severity, Severity::Low);
    assert!(finding.description.contains("nginx/1.18.0"));
}

#[tokio::test]
async fn test_robots_blocking_everything() {
    let base_url = start_test_server(Some(ROBOTS_BLOCK_ALL)).await;

    let report = scanner().scan(&base_url).await;

    let robots: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.category == FindingCategory::Seo)
        .collect();
    assert_eq!(robots.len(), 1);
    assert_eq!(robots[0].title, "Robots blocking indexing");
    assert_eq!(robots[0].severity, Severity::Low);
}

#[tokio::test]
async fn test_redirect_chain_recorded() {
    let base_url = start_test_server(Some(ROBOTS_ALLOW)).await;
    let start = format!("{}/start", base_url);

    let report = scanner().scan(&start).await;

    assert_eq!(
        report.redirect_chain,
        vec![
            start.clone(),
            format!("{}/middle", base_url),
            format!("{}/final", base_url),
        ]
    );
    assert_eq!(report.final_url, format!("{}/final", base_url));
    assert_eq!(report.normalized_url, start);
    assert_eq!(report.target, start);
}

#[tokio::test]
async fn test_redirect_loop_is_a_scan_error() {
    let base_url = start_test_server(Some(ROBOTS_ALLOW)).await;

    let report = scanner().scan(&format!("{}/loop", base_url)).await;

    assert_eq!(titles(&report), vec!["Scan Error"]);
    assert_eq!(report.overall_score, 0.0);
    assert_eq!(report.risk_level, RiskLevel::High);
}

#[tokio::test]
async fn test_fetcher_redirect_limit() {
    let base_url = start_test_server(None).await;
    let settings = ScannerSettings {
        max_redirects: 1,
        ..ScannerSettings::default()
    };
    let fetcher = Fetcher::new(&settings).unwrap();

    let result = fetcher.fetch(&format!("{}/start", base_url)).await;
    assert!(matches!(
        result,
        Err(FetchError::TooManyRedirects { limit: 1 })
    ));
}

#[tokio::test]
async fn test_error_status_still_scanned() {
    let base_url = start_test_server(Some(ROBOTS_ALLOW)).await;

    let report = scanner().scan(&format!("{}/server-error", base_url)).await;

    assert_eq!(report.response_status, Some(500));
    assert!(titles(&report).contains(&"No HTTPS"));
    assert!(!titles(&report).contains(&"Scan Error"));
}

#[tokio::test]
async fn test_connection_refused_is_fail_soft() {
    let settings = ScannerSettings {
        request_timeout: Duration::from_secs(2),
        ..ScannerSettings::default()
    };
    let scanner = Scanner::new(&settings).unwrap();

    let report = scanner.scan("http://127.0.0.1:1").await;

    assert_eq!(report.findings.len(), 1);
    let finding = &report.findings[0];
    assert_eq!(finding.title, "Scan Error");
    assert_eq!(finding.category, FindingCategory::Other);
    assert_eq!(finding.severity, Severity::High);
    assert_eq!(report.overall_score, 0.0);
    assert_eq!(report.risk_level, RiskLevel::High);
    assert_eq!(report.response_status, None);
}

#[tokio::test]
async fn test_try_scan_rejects_before_any_request() {
    let err = scanner().try_scan("   ").await.unwrap_err();
    assert_eq!(err.input, "   ");
}

#[tokio::test]
async fn test_slow_page_times_out_as_scan_error() {
    let base_url = start_test_server(Some(ROBOTS_ALLOW)).await;
    let settings = ScannerSettings {
        request_timeout: Duration::from_secs(1),
        ..ScannerSettings::default()
    };
    let scanner = Scanner::new(&settings).unwrap();

    let started = Instant::now();
    let report = scanner.scan(&format!("{}/slow", base_url)).await;

    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(titles(&report), vec!["Scan Error"]);
    assert!(report.findings[0].description.contains("Request timeout"));
    assert_eq!(report.overall_score, 0.0);
}

#[tokio::test]
async fn test_slow_robots_is_skipped_without_finding() {
    let base_url = start_slow_robots_server().await;
    let settings = ScannerSettings {
        robots_timeout: Duration::from_secs(1),
        ..ScannerSettings::default()
    };
    let scanner = Scanner::new(&settings).unwrap();

    let started = Instant::now();
    let report = scanner.scan(&base_url).await;

    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(report.findings.len(), 7);
    assert!(
        report
            .findings
            .iter()
            .all(|f| f.category != FindingCategory::Seo)
    );
    assert_eq!(report.overall_score, 20.0);
    assert_eq!(report.response_status, Some(200));
}

#[tokio::test]
async fn test_fetcher_stops_reading_at_body_limit() {
    let base_url = start_test_server(None).await;
    let settings = ScannerSettings {
        body_limit: 1000,
        ..ScannerSettings::default()
    };
    let fetcher = Fetcher::new(&settings).unwrap();

    let result = fetcher.fetch(&format!("{}/large", base_url)).await.unwrap();
    assert_eq!(result.body_prefix.len(), 1000);
    assert!(LARGE_BODY_CHARS > 1000);

    let result = fetcher
        .fetch(&format!("{}/large-multibyte", base_url))
        .await
        .unwrap();
    assert_eq!(result.body_prefix.chars().count(), 1000);
    assert!(result.body_prefix.chars().all(|c| c == 'é'));
}
