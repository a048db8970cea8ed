use crate::models::{
    RiskLevel, ScanHistoryEntry, ScanReport, Severity, Site, SiteAlerts, SiteSummary,
};
use crate::monitoring::SweepReport;
use anyhow::Result;
use colored::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// Finding counts per severity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingSummary {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

/// A scan report as written to stdout or disk in JSON mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanDocument {
    pub timestamp: String,
    pub summary: FindingSummary,
    #[serde(flatten)]
    pub report: ScanReport,
}

pub struct Reporter;

impl Reporter {
    pub fn generate_document(report: &ScanReport) -> ScanDocument {
        ScanDocument {
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary: Self::summarize(report),
            report: report.clone(),
        }
    }

    pub fn summarize(report: &ScanReport) -> FindingSummary {
        FindingSummary {
            total: report.findings.len(),
            critical: report.count_by_severity(Severity::Critical),
            high: report.count_by_severity(Severity::High),
            medium: report.count_by_severity(Severity::Medium),
            low: report.count_by_severity(Severity::Low),
            info: report.count_by_severity(Severity::Info),
        }
    }

    fn severity_label(severity: Severity) -> ColoredString {
        match severity {
            Severity::Critical => "CRIT".bright_red().bold(),
            Severity::High => "HIGH".bright_red(),
            Severity::Medium => "MED ".yellow(),
            Severity::Low => "LOW ".bright_cyan(),
            Severity::Info => "INFO".dimmed(),
        }
    }

    fn score_label(score: f64, risk: RiskLevel) -> ColoredString {
        let text = format!("{:.1}/100 ({} risk)", score, risk.as_str());
        match risk {
            RiskLevel::Low | RiskLevel::Info => text.bright_green(),
            RiskLevel::Medium => text.yellow(),
            RiskLevel::High | RiskLevel::Critical => text.bright_red(),
        }
    }

    pub fn print_text_report(report: &ScanReport) {
        let summary = Self::summarize(report);

        println!("\n{}", "=".repeat(80).bright_blue());
        println!("{}", "SiteCheck - Scan Report".bright_cyan().bold());
        println!("{}", "=".repeat(80).bright_blue());
        println!();

        println!("{}: {}", "Target".bright_white().bold(), report.target);
        if !report.final_url.is_empty() {
            println!("{}: {}", "Final URL".bright_white().bold(), report.final_url);
        }
        if report.redirect_chain.len() > 1 {
            println!(
                "{}: {}",
                "Redirects".bright_white().bold(),
                report.redirect_chain.join(" -> ")
            );
        }
        println!(
            "{}: {}",
            "Status".bright_white().bold(),
            report
                .response_status
                .map(|code| {
                    if code < 300 {
                        code.to_string().bright_green()
                    } else if code < 400 {
                        code.to_string().yellow()
                    } else {
                        code.to_string().bright_red()
                    }
                })
                .unwrap_or_else(|| "N/A".dimmed())
        );
        println!(
            "{}: {}",
            "Score".bright_white().bold(),
            Self::score_label(report.overall_score, report.risk_level)
        );
        println!();

        println!("{}", "Summary".bright_yellow().bold().underline());
        println!("  Findings: {}", summary.total);
        println!(
            "  Critical: {}",
            if summary.critical > 0 {
                summary.critical.to_string().bright_red()
            } else {
                summary.critical.to_string().bright_green()
            }
        );
        println!(
            "  High:     {}",
            if summary.high > 0 {
                summary.high.to_string().bright_red()
            } else {
                summary.high.to_string().bright_green()
            }
        );
        println!("  Medium:   {}", summary.medium.to_string().yellow());
        println!("  Low:      {}", summary.low.to_string().bright_cyan());
        println!("  Info:     {}", summary.info);

        if !report.findings.is_empty() {
            let mut findings: Vec<_> = report.findings.iter().collect();
            findings.sort_by(|a, b| b.severity.cmp(&a.severity));

            println!();
            println!("{}", "Findings".bright_yellow().bold().underline());
            for finding in findings {
                println!();
                println!(
                    "  [{}] {}",
                    Self::severity_label(finding.severity),
                    finding.title.bright_white().bold()
                );
                println!("    {}", finding.description);
                if let Some(recommendation) = &finding.recommendation {
                    println!("    {} {}", "Fix:".bright_green(), recommendation);
                }
            }
        }

        println!();
        println!("{}", "=".repeat(80).bright_blue());
    }

    pub fn print_sweep_report(report: &SweepReport) {
        println!("{}", "Monitoring Sweep".bright_yellow().bold().underline());
        println!(
            "  Scans run: {}  Skipped (not due): {}  Alerts: {}  Failures: {}",
            report.scans.len().to_string().bright_green(),
            report.skipped,
            if report.alerts.is_empty() {
                "0".bright_green()
            } else {
                report.alerts.len().to_string().bright_red()
            },
            if report.failures.is_empty() {
                "0".bright_green()
            } else {
                report.failures.len().to_string().bright_red()
            }
        );

        for scan in &report.scans {
            println!(
                "  {} {}",
                scan.report.target.bright_white(),
                Self::score_label(scan.report.overall_score, scan.report.risk_level)
            );
        }
        for alert in &report.alerts {
            println!("  {} {}", "ALERT".bright_red().bold(), alert.message);
        }
        for failure in &report.failures {
            println!("  {} {}", "FAILED".bright_red(), failure.error);
        }
    }

    pub fn print_alerts(groups: &[SiteAlerts]) {
        if groups.is_empty() {
            println!("{}", "No alerts recorded".bright_green());
            return;
        }

        for group in groups {
            println!();
            println!(
                "{} ({})",
                group.site_display_name.bright_white().bold(),
                group.site_domain
            );
            for alert in &group.alerts {
                println!(
                    "  {} [{}] {}",
                    alert.created_at.format("%Y-%m-%d %H:%M"),
                    alert.alert_type.as_str().yellow(),
                    alert.message
                );
            }
        }
    }

    pub fn print_sites(summaries: &[SiteSummary]) {
        if summaries.is_empty() {
            println!("{}", "No sites registered".yellow());
            return;
        }

        for summary in summaries {
            let latest = match (
                summary.latest_scan_score,
                summary.latest_scan_risk_level,
                summary.latest_scan_date,
            ) {
                (Some(score), Some(risk), Some(date)) => format!(
                    "{} on {}",
                    Self::score_label(score, risk),
                    date.format("%Y-%m-%d %H:%M")
                ),
                _ => "not scanned yet".dimmed().to_string(),
            };
            println!(
                "{} ({})  {}",
                summary.site.display_name.bright_white().bold(),
                summary.site.domain,
                latest
            );
        }
    }

    pub fn print_history(site: &Site, history: &[ScanHistoryEntry]) {
        println!(
            "{} ({})",
            site.display_name.bright_white().bold(),
            site.domain
        );
        if history.is_empty() {
            println!("  {}", "No scans recorded".yellow());
            return;
        }

        for entry in history {
            println!(
                "  #{} {}  {}  {}",
                entry.id,
                entry.created_at.format("%Y-%m-%d %H:%M"),
                Self::score_label(entry.overall_score, entry.risk_level),
                entry.url
            );
        }
    }

    pub fn save_json_report(report: &ScanReport, filename: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(&Self::generate_document(report))?;
        let mut file = File::create(filename)?;
        file.write_all(json.as_bytes())?;
        eprintln!("Report saved to: {}", filename.bright_green());
        Ok(())
    }
}
