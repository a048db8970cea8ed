pub mod alerts;
pub mod checks;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod http_client;
pub mod logging;
pub mod models;
pub mod monitoring;
pub mod normalizer;
pub mod notifier;
pub mod reporter;
pub mod robots;
pub mod scanner;
pub mod scorer;
pub mod sites;
pub mod store;

use alerts::{AlertDetector, group_alerts_by_site};
use anyhow::{Context, Result, bail};
use cli::{Cli, Command};
use colored::*;
use config::{Config, Settings, SiteEntry};
use models::Site;
use monitoring::Monitor;
use notifier::LogNotifier;
use reporter::Reporter;
use scanner::Scanner;
use sites::{scan_history, site_summaries};
use std::sync::Arc;
use store::{MemoryStore, ScanStore};

pub async fn run(args: Cli) -> Result<()> {
    let config = Config::load(&args)?;
    let settings = config.resolve(&args)?;
    logging::init(settings.verbose);

    match &args.command {
        Command::Scan {
            url, save, site, ..
        } => run_scan(&settings, url, save.as_deref(), site.as_deref()).await,
        Command::Monitor { .. } => run_monitor(&settings).await,
        Command::Alerts { limit, .. } => run_alerts(&settings, *limit),
        Command::Sites { .. } => run_sites(&settings),
        Command::History { domain, limit, .. } => run_history(&settings, domain, *limit),
    }
}

async fn run_scan(
    settings: &Settings,
    url: &str,
    save: Option<&str>,
    site_domain: Option<&str>,
) -> Result<()> {
    let json = settings.output == "json";
    if !json {
        println!("{}", "SiteCheck - Website Security Scanner".bright_cyan().bold());
        println!("{}", "=".repeat(50).bright_blue());
        println!("{} {}", "Scanning:".bright_white().bold(), url);
    }

    let scanner = Scanner::new(&settings.scanner)?;
    let report = scanner.try_scan(url).await?;

    if let Some(domain) = site_domain {
        let store = Arc::new(load_store(settings)?);
        let site = find_or_create_site(&*store, domain, None)?;
        let scan = store.insert_scan(Some(site.id), report.clone(), chrono::Utc::now())?;

        let detector = AlertDetector::new(
            store.clone(),
            Arc::new(LogNotifier),
            settings.monitor.score_drop_threshold,
        );
        let alerts = detector.detect(&scan)?;
        store
            .save(&settings.state_file)
            .with_context(|| format!("Failed to save state to {}", settings.state_file.display()))?;

        if !json {
            println!(
                "{} scan #{} recorded for {} ({} new alerts)",
                "Saved:".bright_green().bold(),
                scan.id,
                site.domain,
                alerts.len()
            );
        }
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&Reporter::generate_document(&report))?
        );
    } else {
        Reporter::print_text_report(&report);
    }

    if let Some(filename) = save {
        Reporter::save_json_report(&report, filename)?;
    }

    Ok(())
}

async fn run_monitor(settings: &Settings) -> Result<()> {
    let store = Arc::new(load_store(settings)?);
    register_sites(&*store, &settings.sites)?;

    let scanner = Scanner::new(&settings.scanner)?;
    let monitor = Monitor::new(
        scanner,
        store.clone(),
        Arc::new(LogNotifier),
        &settings.monitor,
    );
    let report = monitor.sweep().await?;

    store
        .save(&settings.state_file)
        .with_context(|| format!("Failed to save state to {}", settings.state_file.display()))?;

    if settings.output == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        Reporter::print_sweep_report(&report);
    }
    Ok(())
}

fn run_alerts(settings: &Settings, limit: usize) -> Result<()> {
    let store = load_store(settings)?;
    let groups = group_alerts_by_site(&store, limit)?;

    if settings.output == "json" {
        println!("{}", serde_json::to_string_pretty(&groups)?);
    } else {
        Reporter::print_alerts(&groups);
    }
    Ok(())
}

fn run_sites(settings: &Settings) -> Result<()> {
    let store = load_store(settings)?;
    let summaries = site_summaries(&store)?;

    if settings.output == "json" {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        Reporter::print_sites(&summaries);
    }
    Ok(())
}

fn run_history(settings: &Settings, domain: &str, limit: usize) -> Result<()> {
    let store = load_store(settings)?;
    let Some(site) = store.site_by_domain(domain)? else {
        bail!("Site not found: {}", domain);
    };
    let history = scan_history(&store, site.id, limit)?;

    if settings.output == "json" {
        println!("{}", serde_json::to_string_pretty(&history)?);
    } else {
        Reporter::print_history(&site, &history);
    }
    Ok(())
}

fn load_store(settings: &Settings) -> Result<MemoryStore> {
    MemoryStore::load(&settings.state_file)
        .with_context(|| format!("Failed to load state from {}", settings.state_file.display()))
}

fn find_or_create_site(
    store: &dyn ScanStore,
    domain: &str,
    display_name: Option<&str>,
) -> Result<Site> {
    if let Some(site) = store.site_by_domain(domain)? {
        return Ok(site);
    }
    let site = store.create_site(domain, display_name.unwrap_or(domain))?;
    tracing::info!(site_id = site.id, domain = %site.domain, "Registered site");
    Ok(site)
}

/// Makes every configured site and its monitoring config exist in the store.
pub fn register_sites(store: &dyn ScanStore, entries: &[SiteEntry]) -> Result<()> {
    for entry in entries {
        let site = find_or_create_site(store, &entry.domain, entry.display_name.as_deref())?;
        store.upsert_monitoring_config(site.id, entry.frequency, entry.enabled)?;
    }
    Ok(())
}
