use crate::error::StoreError;
use crate::models::{
    Alert, AlertDraft, MonitoringConfig, MonitoringFrequency, ScanReport, Site, StoredScan,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Persistence boundary for sites, scans, monitoring configs and alerts.
///
/// Every method is atomic: a scan is visible together with all of its
/// findings or not at all, and `record_scheduled_run` publishes the scan and
/// the config's new `last_run_at` together.
pub trait ScanStore: Send + Sync {
    fn create_site(&self, domain: &str, display_name: &str) -> Result<Site, StoreError>;
    fn site(&self, id: i64) -> Result<Option<Site>, StoreError>;
    fn site_by_domain(&self, domain: &str) -> Result<Option<Site>, StoreError>;
    fn sites(&self) -> Result<Vec<Site>, StoreError>;

    /// Creates the site's config, or updates frequency/enabled of the existing one.
    fn upsert_monitoring_config(
        &self,
        site_id: i64,
        frequency: MonitoringFrequency,
        enabled: bool,
    ) -> Result<MonitoringConfig, StoreError>;
    fn monitoring_config_for_site(&self, site_id: i64)
    -> Result<Option<MonitoringConfig>, StoreError>;
    fn enabled_monitoring_configs(&self) -> Result<Vec<MonitoringConfig>, StoreError>;

    fn insert_scan(
        &self,
        site_id: Option<i64>,
        report: ScanReport,
        created_at: DateTime<Utc>,
    ) -> Result<StoredScan, StoreError>;
    fn scan(&self, id: i64) -> Result<Option<StoredScan>, StoreError>;
    /// Newest first.
    fn scans_for_site(&self, site_id: i64) -> Result<Vec<StoredScan>, StoreError>;
    fn latest_scan_excluding(
        &self,
        site_id: i64,
        scan_id: i64,
    ) -> Result<Option<StoredScan>, StoreError>;
    fn latest_scan_before(
        &self,
        site_id: i64,
        before: DateTime<Utc>,
    ) -> Result<Option<StoredScan>, StoreError>;
    /// Most recent scan of the same site that is strictly older than `scan`.
    fn previous_scan(&self, scan: &StoredScan) -> Result<Option<StoredScan>, StoreError>;

    /// Stores the scan for the config's site and sets `last_run_at = ran_at`.
    fn record_scheduled_run(
        &self,
        config_id: i64,
        report: ScanReport,
        ran_at: DateTime<Utc>,
    ) -> Result<StoredScan, StoreError>;

    fn insert_alerts(
        &self,
        site_id: i64,
        scan_id: i64,
        drafts: &[AlertDraft],
    ) -> Result<Vec<Alert>, StoreError>;
    /// Newest first.
    fn alerts_for_site(&self, site_id: i64) -> Result<Vec<Alert>, StoreError>;
    /// Newest first.
    fn alerts(&self) -> Result<Vec<Alert>, StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    sites: Vec<Site>,
    #[serde(default)]
    monitoring_configs: Vec<MonitoringConfig>,
    #[serde(default)]
    scans: Vec<StoredScan>,
    #[serde(default)]
    alerts: Vec<Alert>,
}

impl StoreState {
    fn push_scan(
        &mut self,
        site_id: Option<i64>,
        report: ScanReport,
        created_at: DateTime<Utc>,
    ) -> StoredScan {
        let scan = StoredScan {
            id: next_id(self.scans.iter().map(|s| s.id)),
            site_id,
            created_at,
            report,
        };
        self.scans.push(scan.clone());
        scan
    }

    fn site_scans(&self, site_id: i64) -> impl Iterator<Item = &StoredScan> {
        self.scans
            .iter()
            .filter(move |scan| scan.site_id == Some(site_id))
    }
}

fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().unwrap_or(0) + 1
}

fn newest(scans: impl Iterator<Item = StoredScan>) -> Option<StoredScan> {
    scans.max_by_key(|scan| (scan.created_at, scan.id))
}

/// In-process store behind a single lock, with optional JSON snapshots on disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a snapshot. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No state file, starting empty");
            return Ok(Self::new());
        }
        let contents = fs::read_to_string(path)?;
        let state: StoreState = serde_json::from_str(&contents)?;
        Ok(Self {
            state: Mutex::new(state),
        })
    }

    /// Writes a snapshot through a temporary file so a crash never leaves a torn file.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = {
            let state = self.lock()?;
            serde_json::to_string_pretty(&*state)?
        };
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl ScanStore for MemoryStore {
    fn create_site(&self, domain: &str, display_name: &str) -> Result<Site, StoreError> {
        let mut state = self.lock()?;
        if state.sites.iter().any(|site| site.domain == domain) {
            return Err(StoreError::DuplicateSite(domain.to_string()));
        }
        let site = Site {
            id: next_id(state.sites.iter().map(|s| s.id)),
            domain: domain.to_string(),
            display_name: display_name.to_string(),
            created_at: Utc::now(),
        };
        state.sites.push(site.clone());
        Ok(site)
    }

    fn site(&self, id: i64) -> Result<Option<Site>, StoreError> {
        Ok(self.lock()?.sites.iter().find(|s| s.id == id).cloned())
    }

    fn site_by_domain(&self, domain: &str) -> Result<Option<Site>, StoreError> {
        Ok(self
            .lock()?
            .sites
            .iter()
            .find(|s| s.domain == domain)
            .cloned())
    }

    fn sites(&self) -> Result<Vec<Site>, StoreError> {
        Ok(self.lock()?.sites.clone())
    }

    fn upsert_monitoring_config(
        &self,
        site_id: i64,
        frequency: MonitoringFrequency,
        enabled: bool,
    ) -> Result<MonitoringConfig, StoreError> {
        let mut state = self.lock()?;
        if !state.sites.iter().any(|s| s.id == site_id) {
            return Err(StoreError::NotFound {
                entity: "Site",
                id: site_id,
            });
        }

        if let Some(config) = state
            .monitoring_configs
            .iter_mut()
            .find(|c| c.site_id == site_id)
        {
            config.frequency = frequency;
            config.enabled = enabled;
            return Ok(config.clone());
        }

        let config = MonitoringConfig {
            id: next_id(state.monitoring_configs.iter().map(|c| c.id)),
            site_id,
            frequency,
            enabled,
            last_run_at: None,
            created_at: Utc::now(),
        };
        state.monitoring_configs.push(config.clone());
        Ok(config)
    }

    fn monitoring_config_for_site(
        &self,
        site_id: i64,
    ) -> Result<Option<MonitoringConfig>, StoreError> {
        Ok(self
            .lock()?
            .monitoring_configs
            .iter()
            .find(|c| c.site_id == site_id)
            .cloned())
    }

    fn enabled_monitoring_configs(&self) -> Result<Vec<MonitoringConfig>, StoreError> {
        Ok(self
            .lock()?
            .monitoring_configs
            .iter()
            .filter(|c| c.enabled)
            .cloned()
            .collect())
    }

    fn insert_scan(
        &self,
        site_id: Option<i64>,
        report: ScanReport,
        created_at: DateTime<Utc>,
    ) -> Result<StoredScan, StoreError> {
        let mut state = self.lock()?;
        if let Some(id) = site_id
            && !state.sites.iter().any(|s| s.id == id)
        {
            return Err(StoreError::NotFound { entity: "Site", id });
        }
        Ok(state.push_scan(site_id, report, created_at))
    }

    fn scan(&self, id: i64) -> Result<Option<StoredScan>, StoreError> {
        Ok(self.lock()?.scans.iter().find(|s| s.id == id).cloned())
    }

    fn scans_for_site(&self, site_id: i64) -> Result<Vec<StoredScan>, StoreError> {
        let state = self.lock()?;
        let mut scans: Vec<_> = state.site_scans(site_id).cloned().collect();
        scans.sort_by_key(|scan| std::cmp::Reverse((scan.created_at, scan.id)));
        Ok(scans)
    }

    fn latest_scan_excluding(
        &self,
        site_id: i64,
        scan_id: i64,
    ) -> Result<Option<StoredScan>, StoreError> {
        let state = self.lock()?;
        Ok(newest(
            state
                .site_scans(site_id)
                .filter(|scan| scan.id != scan_id)
                .cloned(),
        ))
    }

    fn latest_scan_before(
        &self,
        site_id: i64,
        before: DateTime<Utc>,
    ) -> Result<Option<StoredScan>, StoreError> {
        let state = self.lock()?;
        Ok(newest(
            state
                .site_scans(site_id)
                .filter(|scan| scan.created_at < before)
                .cloned(),
        ))
    }

    fn previous_scan(&self, scan: &StoredScan) -> Result<Option<StoredScan>, StoreError> {
        let Some(site_id) = scan.site_id else {
            return Ok(None);
        };
        let state = self.lock()?;
        let key = (scan.created_at, scan.id);
        Ok(newest(
            state
                .site_scans(site_id)
                .filter(|other| (other.created_at, other.id) < key)
                .cloned(),
        ))
    }

    fn record_scheduled_run(
        &self,
        config_id: i64,
        report: ScanReport,
        ran_at: DateTime<Utc>,
    ) -> Result<StoredScan, StoreError> {
        let mut state = self.lock()?;
        let site_id = state
            .monitoring_configs
            .iter()
            .find(|c| c.id == config_id)
            .map(|c| c.site_id)
            .ok_or(StoreError::NotFound {
                entity: "Monitoring config",
                id: config_id,
            })?;

        let scan = state.push_scan(Some(site_id), report, ran_at);
        if let Some(config) = state
            .monitoring_configs
            .iter_mut()
            .find(|c| c.id == config_id)
        {
            config.last_run_at = Some(ran_at);
        }
        Ok(scan)
    }

    fn insert_alerts(
        &self,
        site_id: i64,
        scan_id: i64,
        drafts: &[AlertDraft],
    ) -> Result<Vec<Alert>, StoreError> {
        let mut state = self.lock()?;
        if !state.scans.iter().any(|s| s.id == scan_id) {
            return Err(StoreError::NotFound {
                entity: "Scan",
                id: scan_id,
            });
        }

        let first_id = next_id(state.alerts.iter().map(|a| a.id));
        let created_at = Utc::now();
        let alerts: Vec<Alert> = drafts
            .iter()
            .zip(first_id..)
            .map(|(draft, id)| Alert {
                id,
                site_id,
                scan_id,
                alert_type: draft.alert_type,
                message: draft.message.clone(),
                created_at,
            })
            .collect();
        state.alerts.extend(alerts.iter().cloned());
        Ok(alerts)
    }

    fn alerts_for_site(&self, site_id: i64) -> Result<Vec<Alert>, StoreError> {
        Ok(self
            .alerts()?
            .into_iter()
            .filter(|a| a.site_id == site_id)
            .collect())
    }

    fn alerts(&self) -> Result<Vec<Alert>, StoreError> {
        let mut alerts = self.lock()?.alerts.clone();
        alerts.sort_by_key(|a| std::cmp::Reverse((a.created_at, a.id)));
        Ok(alerts)
    }
}
