use crate::error::StoreError;
use crate::models::{ScanHistoryEntry, SiteSummary};
use crate::store::ScanStore;

/// Every registered site with its latest scan, newest site first.
pub fn site_summaries(store: &dyn ScanStore) -> Result<Vec<SiteSummary>, StoreError> {
    let mut sites = store.sites()?;
    sites.sort_by_key(|s| std::cmp::Reverse((s.created_at, s.id)));

    let mut summaries = Vec::with_capacity(sites.len());
    for site in sites {
        let latest = store.scans_for_site(site.id)?.into_iter().next();
        summaries.push(SiteSummary {
            latest_scan_score: latest.as_ref().map(|s| s.report.overall_score),
            latest_scan_risk_level: latest.as_ref().map(|s| s.report.risk_level),
            latest_scan_date: latest.as_ref().map(|s| s.created_at),
            site,
        });
    }
    Ok(summaries)
}

/// The `limit` most recent scans of a site, newest first.
pub fn scan_history(
    store: &dyn ScanStore,
    site_id: i64,
    limit: usize,
) -> Result<Vec<ScanHistoryEntry>, StoreError> {
    Ok(store
        .scans_for_site(site_id)?
        .iter()
        .take(limit)
        .map(ScanHistoryEntry::from)
        .collect())
}
