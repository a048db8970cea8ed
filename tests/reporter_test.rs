use chrono::Utc;
use sitecheck::models::{
    Alert, AlertType, Finding, FindingCategory, RiskLevel, ScanHistoryEntry, ScanReport, Severity,
    Site, SiteAlerts, SiteSummary, StoredScan,
};
use sitecheck::monitoring::{SweepFailure, SweepReport};
use sitecheck::reporter::{Reporter, ScanDocument};
use std::fs;
use tempfile::tempdir;

fn create_test_report(findings: Vec<Finding>) -> ScanReport {
    let score = sitecheck::scorer::score_findings(&findings);
    ScanReport {
        target: "example.com".to_string(),
        normalized_url: "https://example.com".to_string(),
        final_url: "https://www.example.com/".to_string(),
        redirect_chain: vec![
            "https://example.com".to_string(),
            "https://www.example.com/".to_string(),
        ],
        response_status: Some(200),
        findings,
        overall_score: score,
        risk_level: RiskLevel::from_score(score),
    }
}

fn create_test_finding(severity: Severity, title: &str) -> Finding {
    Finding::new(
        FindingCategory::Security,
        severity,
        title,
        "Description",
        "Recommendation",
    )
}

#[test]
fn test_summarize_counts_each_severity() {
    let report = create_test_report(vec![
        create_test_finding(Severity::Critical, "A"),
        create_test_finding(Severity::High, "B"),
        create_test_finding(Severity::High, "C"),
        create_test_finding(Severity::Low, "D"),
        create_test_finding(Severity::Info, "E"),
    ]);

    let summary = Reporter::summarize(&report);
    assert_eq!(summary.total, 5);
    assert_eq!(summary.critical, 1);
    assert_eq!(summary.high, 2);
    assert_eq!(summary.medium, 0);
    assert_eq!(summary.low, 1);
    assert_eq!(summary.info, 1);
}

#[test]
fn test_generate_document_flattens_report() {
    let report = create_test_report(vec![create_test_finding(Severity::Medium, "M")]);

    let document = Reporter::generate_document(&report);
    assert!(!document.timestamp.is_empty());

    let json = serde_json::to_value(&document).unwrap();
    assert_eq!(json["target"], "example.com");
    assert_eq!(json["overall_score"], 93.0);
    assert_eq!(json["risk_level"], "low");
    assert_eq!(json["summary"]["medium"], 1);
    assert_eq!(json["findings"][0]["severity"], "medium");
}

#[test]
fn test_print_text_report_variants() {
    // Should not panic
    Reporter::print_text_report(&create_test_report(vec![]));
    Reporter::print_text_report(&create_test_report(vec![
        create_test_finding(Severity::Low, "Low first"),
        create_test_finding(Severity::Critical, "Critical later"),
    ]));

    let mut failed = create_test_report(vec![create_test_finding(Severity::High, "Scan Error")]);
    failed.final_url.clear();
    failed.redirect_chain.clear();
    failed.response_status = None;
    Reporter::print_text_report(&failed);
}

#[test]
fn test_print_sweep_and_alerts() {
    let now = Utc::now();
    let scan = StoredScan {
        id: 1,
        site_id: Some(1),
        created_at: now,
        report: create_test_report(vec![]),
    };
    let alert = Alert {
        id: 1,
        site_id: 1,
        scan_id: 1,
        alert_type: AlertType::ScoreDrop,
        message: "Security score dropped by 12.0 points (from 100.0 to 88.0)".to_string(),
        created_at: now,
    };

    Reporter::print_sweep_report(&SweepReport::default());
    Reporter::print_sweep_report(&SweepReport {
        scans: vec![scan],
        alerts: vec![alert.clone()],
        failures: vec![SweepFailure {
            config_id: 2,
            error: "Error processing monitoring config 2: Site 9 not found".to_string(),
        }],
        skipped: 3,
    });

    Reporter::print_alerts(&[]);
    Reporter::print_alerts(&[SiteAlerts {
        site_id: 1,
        site_domain: "example.com".to_string(),
        site_display_name: "Example".to_string(),
        alerts: vec![alert],
    }]);
}

#[test]
fn test_print_sites_and_history() {
    let now = Utc::now();
    let site = Site {
        id: 1,
        domain: "example.com".to_string(),
        display_name: "Example".to_string(),
        created_at: now,
    };

    Reporter::print_sites(&[]);
    Reporter::print_sites(&[
        SiteSummary {
            site: site.clone(),
            latest_scan_score: Some(42.5),
            latest_scan_risk_level: Some(RiskLevel::Medium),
            latest_scan_date: Some(now),
        },
        SiteSummary {
            site: site.clone(),
            latest_scan_score: None,
            latest_scan_risk_level: None,
            latest_scan_date: None,
        },
    ]);

    Reporter::print_history(&site, &[]);
    Reporter::print_history(
        &site,
        &[ScanHistoryEntry {
            id: 3,
            url: "https://example.com".to_string(),
            overall_score: 88.0,
            risk_level: RiskLevel::Low,
            created_at: now,
        }],
    );
}

#[test]
fn test_site_summary_json_is_flat() {
    let summary = SiteSummary {
        site: Site {
            id: 7,
            domain: "example.com".to_string(),
            display_name: "Example".to_string(),
            created_at: Utc::now(),
        },
        latest_scan_score: None,
        latest_scan_risk_level: None,
        latest_scan_date: None,
    };

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["id"], 7);
    assert_eq!(json["domain"], "example.com");
    assert!(json["latest_scan_score"].is_null());
}

#[test]
fn test_save_json_report() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("report.json");
    let report = create_test_report(vec![create_test_finding(Severity::High, "Missing CSP")]);

    Reporter::save_json_report(&report, path.to_str().unwrap()).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let document: ScanDocument = serde_json::from_str(&contents).unwrap();
    assert_eq!(document.report, report);
    assert_eq!(document.summary.high, 1);
}

#[test]
fn test_save_json_report_bad_path() {
    let report = create_test_report(vec![]);
    assert!(Reporter::save_json_report(&report, "/nonexistent/dir/report.json").is_err());
}
