//! Parsers for license server status dumps.
//!
//! This crate turns the raw text printed by a license server query tool into
//! a [`LicenseTable`](license_monitor_core::LicenseTable): one entry per
//! product with its seat count and current holders. Two dialects are
//! supported (FlexLM `lmstat` and Sentinel RMS `lsmon`), and the dialect can
//! be detected automatically from the text.
//!
//! # Main entry points
//!
//! - [`LicenseParser`]: owns a product catalog and parses one dump per call.
//! - [`parse_dump`]: one-shot parse with a fixed dialect.
//! - [`LicenseMonitor`]: keeps the last good table across refreshes.
//! - [`output::format_report`]: renders a parsed dump as JSON, YAML,
//!   Markdown or a plain table.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use license_monitor_core::ProductCatalog;
//! use license_monitor_parser::LicenseParser;
//!
//! let dump = "\
//! Users of 12345RVT_2024_0F:  (Total of 10 licenses issued;  Total of 1 license in use)
//!
//!     jdoe PC01 PC01 (v1.0) (lic01/27000 4101), start Mon 3/4 8:15
//! ";
//!
//! let now = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap().and_hms_opt(10, 0, 0).unwrap();
//! let parser = LicenseParser::new(None, ProductCatalog::builtin().clone());
//! let outcome = parser.parse_at(dump, now).unwrap();
//!
//! let users: Vec<String> = outcome.table.users_of_at("Revit", now).collect();
//! assert_eq!(users, vec!["jdoe [1h 45m]"]);
//! ```
//!
//! A dump that reports an unreachable server is an error, not an empty
//! table:
//!
//! ```
//! use license_monitor_core::ProductCatalog;
//! use license_monitor_parser::{ConnectivityFailure, LicenseParser};
//!
//! let parser = LicenseParser::new(None, ProductCatalog::builtin().clone());
//! let err = parser
//!     .parse("Error[5]: Timed out waiting for the server to respond.")
//!     .unwrap_err();
//! assert_eq!(err.connectivity(), Some(ConnectivityFailure::TimedOut));
//! ```

pub mod classify;
mod diagnostics;
mod dialect;
mod error;
mod monitor;
pub mod output;
pub mod timestamp;

pub use classify::detect_dialect;
pub use diagnostics::{MalformedLine, ParseDiagnostics};
pub use dialect::{
    Dialect, DialectParser, LicenseParser, ParseOutcome, Pass, SimpleDialect, VerboseDialect,
    parse_dump,
};
pub use error::{ConnectivityFailure, ParseError, Result};
pub use monitor::LicenseMonitor;
