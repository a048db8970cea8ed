use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "sitecheck")]
#[command(about = "A light, non-invasive website security and compliance scanner", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (JSON, TOML, or YAML)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Path to the JSON state file holding sites, scans and alerts
    #[arg(long, global = true)]
    pub state: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Page request timeout in seconds (default: 10)
    #[arg(short = 't', long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a single URL and print the report
    Scan {
        /// The URL or domain to scan
        #[arg(value_name = "URL")]
        url: String,

        /// Output format: text or json
        #[arg(short, long)]
        output: Option<String>,

        /// Save report to file
        #[arg(short, long)]
        save: Option<String>,

        /// Record the scan against this site domain in the state file and check for alerts
        #[arg(long)]
        site: Option<String>,
    },

    /// Re-scan every monitored site that is due
    Monitor {
        /// Output format: text or json
        #[arg(short, long)]
        output: Option<String>,

        /// Number of sites processed concurrently (default: 1)
        #[arg(short = 'c', long)]
        concurrency: Option<usize>,
    },

    /// List stored alerts grouped by site
    Alerts {
        /// Output format: text or json
        #[arg(short, long)]
        output: Option<String>,

        /// Maximum number of most recent alerts to list
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },

    /// List registered sites with their latest scan
    Sites {
        /// Output format: text or json
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show the recent scans of one site
    History {
        /// Domain of a registered site
        #[arg(value_name = "DOMAIN")]
        domain: String,

        /// Output format: text or json
        #[arg(short, long)]
        output: Option<String>,

        /// Maximum number of scans to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

impl Command {
    pub fn output(&self) -> Option<&str> {
        match self {
            Command::Scan { output, .. }
            | Command::Monitor { output, .. }
            | Command::Alerts { output, .. }
            | Command::Sites { output }
            | Command::History { output, .. } => output.as_deref(),
        }
    }

    pub fn concurrency(&self) -> Option<usize> {
        match self {
            Command::Monitor { concurrency, .. } => *concurrency,
            _ => None,
        }
    }
}
