use crate::error::StoreError;
use crate::models::{Alert, AlertDraft, AlertType, ScanReport, Severity, SiteAlerts, StoredScan};
use crate::notifier::Notifier;
use crate::scorer::round1;
use crate::store::ScanStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Compares two scans of the same site and lists what is worth an alert.
///
/// Rules are independent: a score drop of at least `threshold` points, and
/// every critical/high finding whose title was not critical/high before.
pub fn diff_scans(previous: &ScanReport, new: &ScanReport, threshold: f64) -> Vec<AlertDraft> {
    let mut drafts = Vec::new();

    let drop = round1(previous.overall_score - new.overall_score);
    if drop >= threshold {
        drafts.push(AlertDraft {
            alert_type: AlertType::ScoreDrop,
            message: format!(
                "Security score dropped by {:.1} points (from {:.1} to {:.1})",
                drop, previous.overall_score, new.overall_score
            ),
        });
    }

    let known: HashSet<&str> = previous
        .findings
        .iter()
        .filter(|f| f.severity.is_critical_or_high())
        .map(|f| f.title.as_str())
        .collect();

    for finding in new
        .findings
        .iter()
        .filter(|f| f.severity.is_critical_or_high() && !known.contains(f.title.as_str()))
    {
        let alert_type = match finding.severity {
            Severity::Critical => AlertType::NewCritical,
            _ => AlertType::NewHigh,
        };
        drafts.push(AlertDraft {
            alert_type,
            message: format!(
                "New {} issue detected: {}",
                finding.severity.as_str(),
                finding.title
            ),
        });
    }

    drafts
}

/// Persists alerts for a freshly stored scan and dispatches notifications.
pub struct AlertDetector {
    store: Arc<dyn ScanStore>,
    notifier: Arc<dyn Notifier>,
    score_drop_threshold: f64,
}

impl AlertDetector {
    pub fn new(
        store: Arc<dyn ScanStore>,
        notifier: Arc<dyn Notifier>,
        score_drop_threshold: f64,
    ) -> Self {
        Self {
            store,
            notifier,
            score_drop_threshold,
        }
    }

    /// Diffs `scan` against the previous scan of its site. Ad hoc scans and
    /// first scans of a site produce nothing.
    pub fn detect(&self, scan: &StoredScan) -> Result<Vec<Alert>, StoreError> {
        let Some(site_id) = scan.site_id else {
            return Ok(vec![]);
        };
        let Some(previous) = self.store.previous_scan(scan)? else {
            tracing::debug!(site_id, scan_id = scan.id, "No previous scan to compare against");
            return Ok(vec![]);
        };

        let drafts = diff_scans(&previous.report, &scan.report, self.score_drop_threshold);
        if drafts.is_empty() {
            return Ok(vec![]);
        }

        let alerts = self.store.insert_alerts(site_id, scan.id, &drafts)?;
        tracing::info!(site_id, scan_id = scan.id, alerts = alerts.len(), "Alerts created");

        match self.store.site(site_id) {
            Ok(Some(site)) => {
                for alert in &alerts {
                    if let Err(e) = self.notifier.notify(alert, &site) {
                        tracing::warn!(alert_id = alert.id, error = %e, "Alert notification failed");
                    }
                }
            }
            Ok(None) => tracing::warn!(site_id, "Site missing, alerts not dispatched"),
            Err(e) => tracing::warn!(site_id, error = %e, "Could not load site, alerts not dispatched"),
        }

        Ok(alerts)
    }
}

/// Groups the `limit` most recent alerts by site. Groups are ordered by their
/// newest alert and alerts stay newest first within each group.
pub fn group_alerts_by_site(
    store: &dyn ScanStore,
    limit: usize,
) -> Result<Vec<SiteAlerts>, StoreError> {
    let mut groups: Vec<SiteAlerts> = Vec::new();
    let mut positions: HashMap<i64, Option<usize>> = HashMap::new();

    for alert in store.alerts()?.into_iter().take(limit) {
        let position = match positions.get(&alert.site_id) {
            Some(position) => *position,
            None => {
                let position = store.site(alert.site_id)?.map(|site| {
                    groups.push(SiteAlerts {
                        site_id: site.id,
                        site_domain: site.domain,
                        site_display_name: site.display_name,
                        alerts: Vec::new(),
                    });
                    groups.len() - 1
                });
                positions.insert(alert.site_id, position);
                position
            }
        };
        // alerts of a deleted site are dropped
        if let Some(index) = position {
            groups[index].alerts.push(alert);
        }
    }
    Ok(groups)
}
