//! Publish-on-success holder for the latest license table.
//!
//! A refresh parses into a private table and only swaps it in once the pass
//! completes. Readers holding an earlier [`snapshot`](LicenseMonitor::snapshot)
//! keep a consistent view, and a failed query leaves the last good table in
//! place.

use std::sync::Arc;

use chrono::{Duration, Local, NaiveDateTime};
use license_monitor_core::LicenseTable;

use crate::diagnostics::ParseDiagnostics;
use crate::dialect::LicenseParser;
use crate::error::Result;

/// Keeps the most recent successfully parsed [`LicenseTable`].
///
/// # Examples
///
/// ```
/// use license_monitor_core::ProductCatalog;
/// use license_monitor_parser::{Dialect, LicenseMonitor, LicenseParser};
///
/// let parser = LicenseParser::new(Some(Dialect::Simple), ProductCatalog::builtin().clone());
/// let mut monitor = LicenseMonitor::new(parser);
///
/// monitor
///     .refresh("Users of 12345RVT_2024_0F:  (Total of 10 licenses issued;  Total of 0 licenses in use)")
///     .unwrap();
/// assert!(monitor.snapshot().contains("Revit"));
///
/// let failed = monitor.refresh("Error getting status: Cannot connect to license server system.");
/// assert!(failed.is_err());
/// assert!(monitor.refresh_failed());
/// assert!(monitor.snapshot().contains("Revit"));
/// ```
#[derive(Debug)]
pub struct LicenseMonitor {
    parser: LicenseParser,
    current: Arc<LicenseTable>,
    last_refreshed: Option<NaiveDateTime>,
    refresh_failed: bool,
}

impl LicenseMonitor {
    /// Creates a monitor with an empty table.
    pub fn new(parser: LicenseParser) -> Self {
        Self {
            parser,
            current: Arc::new(LicenseTable::new()),
            last_refreshed: None,
            refresh_failed: false,
        }
    }

    /// Returns the last published table.
    pub fn snapshot(&self) -> Arc<LicenseTable> {
        Arc::clone(&self.current)
    }

    /// When the last successful refresh happened.
    pub fn last_refreshed(&self) -> Option<NaiveDateTime> {
        self.last_refreshed
    }

    /// Whether the most recent refresh failed.
    pub fn refresh_failed(&self) -> bool {
        self.refresh_failed
    }

    /// Parses `raw` against the local clock and publishes the result.
    pub fn refresh(&mut self, raw: &str) -> Result<ParseDiagnostics> {
        self.refresh_at(raw, Local::now().naive_local())
    }

    /// Parses `raw` and, if the pass succeeds, replaces the published table.
    ///
    /// # Errors
    ///
    /// Returns the parse error unchanged; the previous table stays published.
    pub fn refresh_at(&mut self, raw: &str, now: NaiveDateTime) -> Result<ParseDiagnostics> {
        match self.parser.parse_at(raw, now) {
            Ok(outcome) => {
                self.current = Arc::new(outcome.table);
                self.last_refreshed = Some(now);
                self.refresh_failed = false;
                Ok(outcome.diagnostics)
            }
            Err(err) => {
                self.refresh_failed = true;
                Err(err)
            }
        }
    }

    /// Whether a new refresh is due: never refreshed, the last attempt
    /// failed, or at least `interval` has passed since the last success.
    pub fn is_stale_at(&self, now: NaiveDateTime, interval: Duration) -> bool {
        match self.last_refreshed {
            None => true,
            Some(_) if self.refresh_failed => true,
            Some(last) => now - last >= interval,
        }
    }
}
