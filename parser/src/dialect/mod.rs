//! Dialect parsers for license server status dumps.
//!
//! Two back ends produce incompatible text:
//!
//! - **simple**: FlexLM `lmutil lmstat -a`: one `Users of` header per
//!   product and one indented line per checkout.
//! - **verbose**: Sentinel RMS `lsmon`: `|-` prefixed key/value fields
//!   grouped under feature, license and client sections.
//!
//! Both implement [`DialectParser`] and feed the same [`Pass`], so the
//! resulting [`LicenseTable`] looks the same whichever back end produced it.
//! Their duplicate-user rules differ: the simple dialect keeps
//! the first checkout line, the verbose dialect counts every one.

mod simple;
mod verbose;

use chrono::{Local, NaiveDateTime};
use license_monitor_core::{LicenseTable, ProductCatalog};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::classify::detect_dialect;
use crate::diagnostics::ParseDiagnostics;
use crate::error::{ParseError, Result};

pub use simple::SimpleDialect;
pub use verbose::VerboseDialect;

/// Text dialect of a status dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// FlexLM `lmstat` output.
    Simple,
    /// Sentinel RMS `lsmon` output.
    Verbose,
}

impl Dialect {
    pub fn label(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Verbose => "verbose",
        }
    }

    /// Returns the parser implementing this dialect.
    pub fn parser(self) -> &'static dyn DialectParser {
        match self {
            Self::Simple => &SimpleDialect,
            Self::Verbose => &VerboseDialect,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Mutable state shared by a dialect parser for the length of one pass.
pub struct Pass<'a> {
    pub catalog: &'a ProductCatalog,
    /// Reference clock for year inference and expiry checks.
    pub now: NaiveDateTime,
    pub table: LicenseTable,
    pub diagnostics: ParseDiagnostics,
}

impl<'a> Pass<'a> {
    pub fn new(catalog: &'a ProductCatalog, now: NaiveDateTime, dialect: Option<Dialect>) -> Self {
        Self {
            catalog,
            now,
            table: LicenseTable::new(),
            diagnostics: ParseDiagnostics::for_dialect(dialect),
        }
    }

    pub(crate) fn connectivity_error(
        &self,
        reason: crate::error::ConnectivityFailure,
        line: usize,
        text: &str,
    ) -> ParseError {
        warn!(%reason, line, "License server reported a connectivity failure");
        ParseError::Connectivity {
            reason,
            line,
            text: text.trim().to_string(),
        }
    }
}

/// A single-pass, line-oriented parser for one dump dialect.
pub trait DialectParser: Sync {
    fn dialect(&self) -> Dialect;

    /// Scans `text` and records everything it recognizes into `pass`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Connectivity`] as soon as a line reports that
    /// the server could not be reached. `pass` must then be discarded.
    fn parse_into(&self, text: &str, pass: &mut Pass<'_>) -> Result<()>;
}

/// Result of a successful pass.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub table: LicenseTable,
    pub diagnostics: ParseDiagnostics,
}

/// Dialect-selecting front end that owns the product catalog.
///
/// # Examples
///
/// ```
/// use license_monitor_core::ProductCatalog;
/// use license_monitor_parser::{Dialect, LicenseParser};
///
/// let parser = LicenseParser::new(Some(Dialect::Simple), ProductCatalog::builtin().clone());
/// let outcome = parser
///     .parse("Users of 12345RVT_2024_0F:  (Total of 10 licenses issued;  Total of 0 licenses in use)")
///     .unwrap();
/// assert_eq!(outcome.table.get("Revit").unwrap().seats_available, 10);
/// ```
#[derive(Debug, Clone)]
pub struct LicenseParser {
    dialect: Option<Dialect>,
    catalog: ProductCatalog,
}

impl LicenseParser {
    /// Creates a parser. `None` detects the dialect from each dump.
    pub fn new(dialect: Option<Dialect>, catalog: ProductCatalog) -> Self {
        Self { dialect, catalog }
    }

    pub fn dialect(&self) -> Option<Dialect> {
        self.dialect
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    /// Parses `text` against the local clock.
    pub fn parse(&self, text: &str) -> Result<ParseOutcome> {
        self.parse_at(text, Local::now().naive_local())
    }

    /// Parses `text` into a brand-new table, using `now` as the reference
    /// clock.
    ///
    /// Nothing is carried over from earlier passes. An input without any
    /// recognizable content yields an empty table, not an error.
    pub fn parse_at(&self, text: &str, now: NaiveDateTime) -> Result<ParseOutcome> {
        let dialect = self.dialect.or_else(|| detect_dialect(text));
        let mut pass = Pass::new(&self.catalog, now, dialect);

        match dialect {
            Some(dialect) => dialect.parser().parse_into(text, &mut pass)?,
            None => scan_for_failures(text, &mut pass)?,
        }

        info!(
            dialect = ?pass.diagnostics.dialect,
            licenses = pass.table.len(),
            malformed = pass.diagnostics.malformed.len(),
            "Parsed license dump"
        );

        Ok(ParseOutcome {
            table: pass.table,
            diagnostics: pass.diagnostics,
        })
    }
}

/// Checks undetectable input for connectivity markers only.
fn scan_for_failures(text: &str, pass: &mut Pass<'_>) -> Result<()> {
    for (index, line) in text.lines().enumerate() {
        pass.diagnostics.total_lines += 1;
        if let Some(reason) = crate::classify::connectivity_failure(line) {
            return Err(pass.connectivity_error(reason, index + 1, line));
        }
    }
    Ok(())
}

/// Parses `text` with a fixed dialect against the local clock.
///
/// # Examples
///
/// ```
/// use license_monitor_core::ProductCatalog;
/// use license_monitor_parser::{Dialect, parse_dump};
///
/// let dump = "\
///  |- Feature Information
///    |- Feature name                   : \"SAP\"
///    |- Feature version                : \"2023\"
///    |- License Information
///      |- Maximum concurrent user(s)     : 5
///      |- Expiration date                : License has no expiration
/// ";
///
/// let outcome = parse_dump(Dialect::Verbose, dump, ProductCatalog::builtin()).unwrap();
/// let sap = outcome.table.get("SAP 2023").unwrap();
/// assert_eq!(sap.seats_available, 5);
/// assert!(sap.users.is_empty());
/// ```
pub fn parse_dump(dialect: Dialect, text: &str, catalog: &ProductCatalog) -> Result<ParseOutcome> {
    let mut pass = Pass::new(catalog, Local::now().naive_local(), Some(dialect));
    dialect.parser().parse_into(text, &mut pass)?;
    Ok(ParseOutcome {
        table: pass.table,
        diagnostics: pass.diagnostics,
    })
}
