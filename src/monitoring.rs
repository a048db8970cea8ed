use crate::alerts::AlertDetector;
use crate::config::MonitorSettings;
use crate::error::{ConfigProcessingError, StoreError};
use crate::models::{Alert, MonitoringConfig, StoredScan};
use crate::notifier::Notifier;
use crate::scanner::Scanner;
use crate::store::ScanStore;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;

/// Whether `config` should be re-scanned at `now`.
///
/// Disabled configs are never due and configs that never ran always are.
/// Otherwise the elapsed time since `last_run_at` must reach the frequency's
/// interval; `daily` has none and so only runs once.
pub fn is_due(config: &MonitoringConfig, now: DateTime<Utc>) -> bool {
    if !config.enabled {
        return false;
    }
    let Some(last_run) = config.last_run_at else {
        return true;
    };
    match config.frequency.interval() {
        Some(interval) => now - last_run >= interval,
        None => false,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepFailure {
    pub config_id: i64,
    pub error: String,
}

/// Result of one monitoring sweep
#[derive(Debug, Default, Clone, Serialize)]
pub struct SweepReport {
    /// Scans executed, in config order
    pub scans: Vec<StoredScan>,
    pub alerts: Vec<Alert>,
    pub failures: Vec<SweepFailure>,
    /// Enabled configs that were not due
    pub skipped: usize,
}

enum ConfigOutcome {
    NotDue,
    Ran {
        scan: StoredScan,
        alerts: Vec<Alert>,
    },
    Failed {
        scan: Option<StoredScan>,
        error: ConfigProcessingError,
    },
}

pub struct Monitor {
    scanner: Scanner,
    store: Arc<dyn ScanStore>,
    detector: AlertDetector,
    concurrency: usize,
}

impl Monitor {
    pub fn new(
        scanner: Scanner,
        store: Arc<dyn ScanStore>,
        notifier: Arc<dyn Notifier>,
        settings: &MonitorSettings,
    ) -> Self {
        Self {
            scanner,
            detector: AlertDetector::new(store.clone(), notifier, settings.score_drop_threshold),
            store,
            concurrency: settings.concurrency.max(1),
        }
    }

    pub async fn sweep(&self) -> Result<SweepReport, StoreError> {
        self.sweep_at(Utc::now()).await
    }

    /// Runs every due config as of `now`. A failing config is logged and
    /// recorded; it never stops the others.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport, StoreError> {
        let configs = self.store.enabled_monitoring_configs()?;
        tracing::info!(configs = configs.len(), "Starting monitoring sweep");

        let outcomes = stream::iter(configs)
            .map(|config| async move {
                let outcome = self.run_config(&config, now).await;
                (config.id, outcome)
            })
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        let mut report = SweepReport::default();
        for (config_id, outcome) in outcomes {
            match outcome {
                ConfigOutcome::NotDue => report.skipped += 1,
                ConfigOutcome::Ran { scan, alerts } => {
                    report.scans.push(scan);
                    report.alerts.extend(alerts);
                }
                ConfigOutcome::Failed { scan, error } => {
                    tracing::error!(config_id, error = %error, "Error processing monitoring config");
                    report.scans.extend(scan);
                    report.failures.push(SweepFailure {
                        config_id,
                        error: error.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            scans = report.scans.len(),
            alerts = report.alerts.len(),
            failures = report.failures.len(),
            "Monitoring sweep completed"
        );
        Ok(report)
    }

    async fn run_config(&self, config: &MonitoringConfig, now: DateTime<Utc>) -> ConfigOutcome {
        if !is_due(config, now) {
            tracing::debug!(config_id = config.id, "Monitoring config not due");
            return ConfigOutcome::NotDue;
        }

        let failed = |scan: Option<StoredScan>, source: StoreError| ConfigOutcome::Failed {
            scan,
            error: ConfigProcessingError {
                config_id: config.id,
                source,
            },
        };

        let site = match self.store.site(config.site_id) {
            Ok(Some(site)) => site,
            Ok(None) => {
                return failed(
                    None,
                    StoreError::NotFound {
                        entity: "Site",
                        id: config.site_id,
                    },
                );
            }
            Err(e) => return failed(None, e),
        };

        let report = self.scanner.scan(&site.scan_url()).await;
        let scan = match self.store.record_scheduled_run(config.id, report, now) {
            Ok(scan) => scan,
            Err(e) => return failed(None, e),
        };

        match self.detector.detect(&scan) {
            Ok(alerts) => ConfigOutcome::Ran { scan, alerts },
            Err(e) => failed(Some(scan), e),
        }
    }
}
