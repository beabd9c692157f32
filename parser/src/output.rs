//! Output formatting for license reports.

use chrono::NaiveDateTime;
use license_monitor_core::{License, LicenseTable, LicenseUsage, ProductCatalog, format_elapsed};
use serde::Serialize;

use crate::dialect::{Dialect, ParseOutcome};

/// Supported output formats.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    Yaml,
    Markdown,
    Table,
}

/// One holder in a [`LicenseReport`].
#[derive(Debug, Clone, Serialize)]
pub struct UserEntry {
    pub name: String,
    pub seats_in_use: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_time: Option<NaiveDateTime>,
    pub elapsed: String,
}

/// One product in a [`LicenseReport`].
#[derive(Debug, Clone, Serialize)]
pub struct LicenseEntry {
    pub name: String,
    pub seats_available: u32,
    pub holders: usize,
    pub users: Vec<UserEntry>,
}

impl LicenseEntry {
    fn from_license(license: &License, now: NaiveDateTime) -> Self {
        Self {
            name: license.name.clone(),
            seats_available: license.seats_available,
            holders: license.holders(),
            users: license
                .users
                .values()
                .map(|user| UserEntry {
                    name: user.name.clone(),
                    seats_in_use: user.seats_in_use,
                    checkout_time: user.checkout_time,
                    elapsed: format_elapsed(user.checkout_time, now),
                })
                .collect(),
        }
    }
}

/// Serializable view of one parsed dump.
#[derive(Debug, Clone, Serialize)]
pub struct LicenseReport {
    /// Where the dump came from (file path or `stdin`).
    pub source: String,
    pub dialect: Option<Dialect>,
    pub licenses: Vec<LicenseEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl LicenseReport {
    /// Builds a report of the licenses in `outcome` matching `filters`
    /// (all licenses when `filters` is empty).
    pub fn build<S: AsRef<str>>(
        source: &str,
        outcome: &ParseOutcome,
        filters: &[S],
        now: NaiveDateTime,
    ) -> Self {
        Self {
            source: source.to_string(),
            dialect: outcome.diagnostics.dialect,
            licenses: outcome
                .table
                .featured(filters)
                .map(|license| LicenseEntry::from_license(license, now))
                .collect(),
            warnings: outcome.diagnostics.warnings(),
        }
    }
}

/// Formats a report in the requested output format.
pub fn format_report(report: &LicenseReport, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(report).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => Ok(report_to_markdown(report)),
        OutputFormat::Table => Ok(report_to_table(report)),
    }
}

/// Formats several reports as one document.
///
/// JSON and YAML wrap the reports in a list; the text formats concatenate
/// them with a blank line in between.
pub fn format_reports(reports: &[LicenseReport], format: OutputFormat) -> Result<String, String> {
    match (reports, format) {
        ([report], _) => format_report(report, format),
        (_, OutputFormat::Json) => serde_json::to_string_pretty(reports)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        (_, OutputFormat::Yaml) => {
            serde_yaml::to_string(reports).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        _ => {
            let rendered = reports
                .iter()
                .map(|report| format_report(report, format))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rendered.join("\n"))
        }
    }
}

/// Formats the product catalog as `code -> display name` pairs.
pub fn format_catalog(catalog: &ProductCatalog, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(catalog)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(catalog).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => {
            let mut out = String::from("| Code | Product |\n|------|---------|\n");
            for (code, name) in catalog.iter() {
                out.push_str(&format!("| {code} | {name} |\n"));
            }
            Ok(out)
        }
        OutputFormat::Table => {
            let width = catalog.iter().map(|(code, _)| code.len()).max().unwrap_or(4);
            let mut out = String::new();
            for (code, name) in catalog.iter() {
                out.push_str(&format!("{code:<width$}  {name}\n"));
            }
            Ok(out)
        }
    }
}

/// Holders of a single product in one parsed dump.
#[derive(Debug, Clone, Serialize)]
pub struct UsersOfReport {
    pub source: String,
    pub product: String,
    /// `None` when the dump does not list the product.
    pub usage: Option<LicenseUsage>,
    /// Rendered holder lines, or the "No licenses in use." placeholder.
    pub holders: Vec<String>,
}

impl UsersOfReport {
    pub fn build(source: &str, table: &LicenseTable, product: &str, now: NaiveDateTime) -> Self {
        Self {
            source: source.to_string(),
            product: product.to_string(),
            usage: table.usage(product),
            holders: table.users_of_at(product, now).collect(),
        }
    }

    fn headline(&self) -> String {
        match &self.usage {
            Some(usage) => format!("{}: {usage}", self.product),
            None => format!("{}: unknown product", self.product),
        }
    }
}

/// Formats users-of reports for one product.
///
/// JSON and YAML emit a single object for one report and a list otherwise.
/// The text formats prefix each report with its source when there are
/// several.
pub fn format_users_of(reports: &[UsersOfReport], format: OutputFormat) -> Result<String, String> {
    match (reports, format) {
        ([report], OutputFormat::Json) => serde_json::to_string_pretty(report)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        ([report], OutputFormat::Yaml) => {
            serde_yaml::to_string(report).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        (_, OutputFormat::Json) => serde_json::to_string_pretty(reports)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        (_, OutputFormat::Yaml) => {
            serde_yaml::to_string(reports).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        (_, OutputFormat::Markdown) => Ok(reports
            .iter()
            .map(|report| {
                let mut out = format!("## {}\n\n", report.headline());
                if reports.len() > 1 {
                    out.push_str(&format!("Source: {}\n\n", report.source));
                }
                for line in &report.holders {
                    out.push_str(&format!("- {line}\n"));
                }
                out
            })
            .collect::<Vec<_>>()
            .join("\n")),
        (_, OutputFormat::Table) => {
            let mut out = String::new();
            for report in reports {
                if reports.len() > 1 {
                    out.push_str(&format!("# {}\n", report.source));
                }
                out.push_str(&format!("{}\n", report.headline()));
                for line in &report.holders {
                    out.push_str(&format!("  {line}\n"));
                }
            }
            Ok(out)
        }
    }
}

fn report_to_markdown(report: &LicenseReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Licenses: {}\n\n", report.source));
    if let Some(dialect) = report.dialect {
        out.push_str(&format!("**Dialect:** {dialect}\n\n"));
    }

    if report.licenses.is_empty() {
        out.push_str("No licenses found.\n");
    } else {
        out.push_str("| Product | In use | Available | Users |\n");
        out.push_str("|---------|--------|-----------|-------|\n");
        for license in &report.licenses {
            let users = license
                .users
                .iter()
                .map(|user| format!("{} [{}]", user.name, user.elapsed))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!(
                "| {} | {} | {} | {users} |\n",
                license.name, license.holders, license.seats_available
            ));
        }
    }

    if !report.warnings.is_empty() {
        out.push_str("\n## Warnings\n\n");
        for w in &report.warnings {
            out.push_str(&format!("- {w}\n"));
        }
    }

    out
}

fn report_to_table(report: &LicenseReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("Source: {}", report.source));
    if let Some(dialect) = report.dialect {
        out.push_str(&format!("  Dialect: {dialect}"));
    }
    out.push('\n');

    if report.licenses.is_empty() {
        out.push_str("  No licenses found.\n");
        return out;
    }

    let max_name = report
        .licenses
        .iter()
        .map(|l| l.name.len())
        .max()
        .unwrap_or(8);

    for license in &report.licenses {
        out.push_str(&format!(
            "  {:<width$}  {} / {} licenses in use.\n",
            license.name,
            license.holders,
            license.seats_available,
            width = max_name
        ));
        for user in &license.users {
            let seats = if user.seats_in_use > 1 {
                format!(" x{}", user.seats_in_use)
            } else {
                String::new()
            };
            out.push_str(&format!("      {} [{}]{seats}\n", user.name, user.elapsed));
        }
    }

    for w in &report.warnings {
        out.push_str(&format!("  warning: {w}\n"));
    }

    out
}
