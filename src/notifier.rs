use crate::models::{Alert, Site};
use anyhow::Result;

/// Best-effort delivery of alerts (e-mail, chat, ...). Errors are logged by
/// the caller and never undo the stored alert.
pub trait Notifier: Send + Sync {
    fn notify(&self, alert: &Alert, site: &Site) -> Result<()>;
}

/// Writes each alert as a structured log event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, alert: &Alert, site: &Site) -> Result<()> {
        tracing::info!(
            site = %site.domain,
            display_name = %site.display_name,
            alert_type = ?alert.alert_type,
            scan_id = alert.scan_id,
            "ALERT: {}",
            alert.message
        );
        Ok(())
    }
}
