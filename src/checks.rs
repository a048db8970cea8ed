use crate::models::{Finding, FindingCategory, HeaderTable, Severity};
use crate::robots::RobotsOutcome;
use once_cell::sync::Lazy;
use regex::Regex;

// Cached pattern for version numbers such as "nginx/1.18.0"
static VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.\d+").expect("version pattern should be valid"));

/// Body keywords that suggest a cookie consent mechanism
const CONSENT_KEYWORDS: [&str; 6] = ["cookie", "consent", "banner", "preferences", "gdpr", "privacy"];

/// Already-fetched data every check reads from
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub final_url: &'a str,
    pub headers: &'a HeaderTable,
    pub body: &'a str,
    pub robots: &'a RobotsOutcome,
}

/// The fixed battery. `Check::ALL` defines the order findings appear in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Https,
    SecurityHeaders,
    CookieConsent,
    RobotsTxt,
    ServerVersion,
}

impl Check {
    pub const ALL: [Check; 5] = [
        Check::Https,
        Check::SecurityHeaders,
        Check::CookieConsent,
        Check::RobotsTxt,
        Check::ServerVersion,
    ];

    pub fn run(self, ctx: &CheckContext<'_>) -> Vec<Finding> {
        match self {
            Check::Https => check_https(ctx.final_url),
            Check::SecurityHeaders => check_security_headers(ctx.headers),
            Check::CookieConsent => check_cookies(ctx.headers, ctx.body),
            Check::RobotsTxt => check_robots(ctx.robots),
            Check::ServerVersion => check_server_header(ctx.headers),
        }
    }
}

/// Runs every check in battery order and concatenates their findings.
pub fn run_all(ctx: &CheckContext<'_>) -> Vec<Finding> {
    Check::ALL
        .iter()
        .flat_map(|check| {
            let findings = check.run(ctx);
            tracing::debug!(check = ?check, findings = findings.len(), "Check finished");
            findings
        })
        .collect()
}

struct HeaderRule {
    header: &'static str,
    severity: Severity,
    title: &'static str,
    description: &'static str,
    recommendation: &'static str,
}

const SECURITY_HEADERS: [HeaderRule; 6] = [
    HeaderRule {
        header: "strict-transport-security",
        severity: Severity::High,
        title: "Missing Strict-Transport-Security (HSTS)",
        description: "The website does not set the Strict-Transport-Security header, which helps prevent man-in-the-middle attacks.",
        recommendation: "Add 'Strict-Transport-Security: max-age=31536000; includeSubDomains' header to enforce HTTPS connections.",
    },
    HeaderRule {
        header: "content-security-policy",
        severity: Severity::High,
        title: "Missing Content-Security-Policy (CSP)",
        description: "The website does not set a Content-Security-Policy header, which helps prevent XSS attacks.",
        recommendation: "Implement a Content-Security-Policy header to restrict which resources can be loaded and executed.",
    },
    HeaderRule {
        header: "x-frame-options",
        severity: Severity::Medium,
        title: "Missing X-Frame-Options",
        description: "The website does not set the X-Frame-Options header, which helps prevent clickjacking attacks.",
        recommendation: "Add 'X-Frame-Options: DENY' or 'X-Frame-Options: SAMEORIGIN' header to prevent the page from being embedded in frames.",
    },
    HeaderRule {
        header: "x-content-type-options",
        severity: Severity::Medium,
        title: "Missing X-Content-Type-Options",
        description: "The website does not set the X-Content-Type-Options header, which helps prevent MIME type sniffing.",
        recommendation: "Add 'X-Content-Type-Options: nosniff' header to prevent browsers from MIME-sniffing responses.",
    },
    HeaderRule {
        header: "referrer-policy",
        severity: Severity::Low,
        title: "Missing Referrer-Policy",
        description: "The website does not set a Referrer-Policy header, which controls how much referrer information is sent.",
        recommendation: "Add a Referrer-Policy header (e.g., 'Referrer-Policy: strict-origin-when-cross-origin') to control referrer information leakage.",
    },
    HeaderRule {
        header: "permissions-policy",
        severity: Severity::Low,
        title: "Missing Permissions-Policy",
        description: "The website does not set a Permissions-Policy header, which controls browser features and APIs.",
        recommendation: "Add a Permissions-Policy header to restrict access to browser features and APIs.",
    },
];

fn check_https(final_url: &str) -> Vec<Finding> {
    if !final_url.starts_with("http://") {
        return vec![];
    }

    vec![Finding::new(
        FindingCategory::Security,
        Severity::Critical,
        "No HTTPS",
        format!(
            "The website is accessible over HTTP only. The final URL is {}. All traffic should be encrypted with HTTPS.",
            final_url
        ),
        "Configure your web server to use HTTPS and redirect all HTTP traffic to HTTPS. Obtain an SSL/TLS certificate from a trusted Certificate Authority.",
    )]
}

fn check_security_headers(headers: &HeaderTable) -> Vec<Finding> {
    SECURITY_HEADERS
        .iter()
        .filter(|rule| !headers.contains_key(rule.header))
        .map(|rule| {
            Finding::new(
                FindingCategory::Security,
                rule.severity,
                rule.title,
                rule.description,
                rule.recommendation,
            )
        })
        .collect()
}

fn check_cookies(headers: &HeaderTable, body: &str) -> Vec<Finding> {
    if !headers.contains_key("set-cookie") {
        return vec![];
    }

    let body = body.to_lowercase();
    let has_consent_hint = CONSENT_KEYWORDS.iter().any(|keyword| body.contains(keyword));

    let finding = if has_consent_hint {
        Finding::new(
            FindingCategory::Gdpr,
            Severity::Info,
            "Cookies detected with consent mechanism",
            "The website sets cookies and appears to have a cookie consent mechanism in place.",
            "Ensure your cookie consent mechanism complies with GDPR requirements and is clearly visible to users.",
        )
    } else {
        Finding::new(
            FindingCategory::Gdpr,
            Severity::Medium,
            "Cookies detected, banner not obvious",
            "The website sets cookies but no obvious cookie consent banner or mechanism was detected on the homepage.",
            "Implement a clear, GDPR-compliant cookie consent banner that appears before cookies are set.",
        )
    };

    vec![finding]
}

fn check_robots(robots: &RobotsOutcome) -> Vec<Finding> {
    match robots {
        RobotsOutcome::Missing => vec![Finding::new(
            FindingCategory::Seo,
            Severity::Info,
            "robots.txt not found",
            "The website does not have a robots.txt file.",
            "Consider adding a robots.txt file to control search engine crawling behavior.",
        )],
        found @ RobotsOutcome::Found(_) if found.blocks_all() => vec![Finding::new(
            FindingCategory::Seo,
            Severity::Low,
            "Robots blocking indexing",
            "The robots.txt file disallows all search engines from indexing the site.",
            "Review your robots.txt file. If you want your site indexed, remove or modify the 'Disallow: /' directive.",
        )],
        _ => vec![],
    }
}

fn check_server_header(headers: &HeaderTable) -> Vec<Finding> {
    let Some(server) = headers.get("server") else {
        return vec![];
    };
    if !VERSION_PATTERN.is_match(server) {
        return vec![];
    }

    vec![Finding::new(
        FindingCategory::Security,
        Severity::Low,
        "Server reveals version",
        format!(
            "The Server header reveals version information: {}. This can help attackers identify vulnerabilities.",
            server
        ),
        "Configure your web server to hide or remove version information from the Server header.",
    )]
}
