use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Lowercased response header name to value. Later values overwrite earlier ones.
pub type HeaderTable = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingCategory {
    Security,
    Gdpr,
    Seo,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    fn rank(self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Info => 0,
        }
    }

    /// Points subtracted from the 100-point baseline for one finding.
    pub fn deduction(self) -> f64 {
        match self {
            Severity::Critical => 30.0,
            Severity::High => 15.0,
            Severity::Medium => 7.0,
            Severity::Low => 3.0,
            Severity::Info => 1.0,
        }
    }

    pub fn is_critical_or_high(self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub category: FindingCategory,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub recommendation: Option<String>,
}

impl Finding {
    pub fn new(
        category: FindingCategory,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            category,
            severity,
            title: title.into(),
            description: description.into(),
            recommendation: Some(recommendation.into()),
        }
    }
}

/// Stored risk classification. The scorer only ever yields `High`, `Medium`
/// or `Low`; `Critical` and `Info` exist for stored-record compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score <= 39.0 {
            RiskLevel::High
        } else if score <= 69.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Critical => "critical",
            RiskLevel::High => "high",
            RiskLevel::Medium => "medium",
            RiskLevel::Low => "low",
            RiskLevel::Info => "info",
        }
    }
}

/// Everything captured from the primary page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub final_url: String,
    /// Requested URL first, then every redirect hop; the last entry is `final_url`.
    pub redirect_chain: Vec<String>,
    pub status_code: Option<u16>,
    pub headers: HeaderTable,
    pub body_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub target: String,
    pub normalized_url: String,
    pub final_url: String,
    pub redirect_chain: Vec<String>,
    pub response_status: Option<u16>,
    pub findings: Vec<Finding>,
    pub overall_score: f64,
    pub risk_level: RiskLevel,
}

impl ScanReport {
    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|finding| finding.severity == severity)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredScan {
    pub id: i64,
    pub site_id: Option<i64>,
    #[serde(deserialize_with = "utc_lenient")]
    pub created_at: DateTime<Utc>,
    pub report: ScanReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: i64,
    pub domain: String,
    pub display_name: String,
    #[serde(deserialize_with = "utc_lenient")]
    pub created_at: DateTime<Utc>,
}

impl Site {
    pub fn scan_url(&self) -> String {
        format!("https://{}", self.domain)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitoringFrequency {
    /// Accepted and stored, but no due-ness interval is defined for it.
    Daily,
    #[default]
    Weekly,
    Monthly,
}

impl MonitoringFrequency {
    pub fn interval(self) -> Option<chrono::Duration> {
        match self {
            MonitoringFrequency::Daily => None,
            MonitoringFrequency::Weekly => Some(chrono::Duration::days(7)),
            MonitoringFrequency::Monthly => Some(chrono::Duration::days(30)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub id: i64,
    pub site_id: i64,
    pub frequency: MonitoringFrequency,
    pub enabled: bool,
    #[serde(default, deserialize_with = "utc_lenient_opt")]
    pub last_run_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "utc_lenient")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    ScoreDrop,
    NewCritical,
    NewHigh,
}

impl AlertType {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertType::ScoreDrop => "score_drop",
            AlertType::NewCritical => "new_critical",
            AlertType::NewHigh => "new_high",
        }
    }
}

/// An alert computed by the detector but not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertDraft {
    pub alert_type: AlertType,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub site_id: i64,
    pub scan_id: i64,
    pub alert_type: AlertType,
    pub message: String,
    #[serde(deserialize_with = "utc_lenient")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteAlerts {
    pub site_id: i64,
    pub site_domain: String,
    pub site_display_name: String,
    pub alerts: Vec<Alert>,
}

/// A site together with the outcome of its most recent scan, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteSummary {
    #[serde(flatten)]
    pub site: Site,
    pub latest_scan_score: Option<f64>,
    pub latest_scan_risk_level: Option<RiskLevel>,
    pub latest_scan_date: Option<DateTime<Utc>>,
}

/// One line of a site's scan history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanHistoryEntry {
    pub id: i64,
    pub url: String,
    pub overall_score: f64,
    pub risk_level: RiskLevel,
    pub created_at: DateTime<Utc>,
}

impl From<&StoredScan> for ScanHistoryEntry {
    fn from(scan: &StoredScan) -> Self {
        Self {
            id: scan.id,
            url: scan.report.normalized_url.clone(),
            overall_score: scan.report.overall_score,
            risk_level: scan.report.risk_level,
            created_at: scan.created_at,
        }
    }
}

/// Accepts RFC 3339 timestamps as well as timezone-naive ones, which are read as UTC.
fn parse_utc_lenient(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn utc_lenient<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_utc_lenient(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

fn utc_lenient_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_utc_lenient(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw))),
    }
}
