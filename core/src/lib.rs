//! Core license model shared by every status-dump dialect.
//!
//! This crate defines the records a license-server status dump is parsed
//! into:
//!
//! - [`License`]: seat capacity and current holders for one product.
//! - [`LicenseUser`]: a user holding one or more seats, with the time the
//!   session started.
//! - [`LicenseTable`]: the aggregate rebuilt on every parse pass, with the
//!   [`users_of`](LicenseTable::users_of) "currently checked out" report.
//! - [`ProductCatalog`]: immutable vendor-code to display-name mapping.
//!
//! # Example
//!
//! ```
//! use license_monitor_core::*;
//!
//! let catalog = ProductCatalog::builtin();
//! let mut table = LicenseTable::new();
//! let revit = table.insert_if_absent(catalog.resolve("RVT"), 10);
//! revit.insert_user(LicenseUser::new("jdoe"));
//!
//! assert_eq!(table.usage("Revit").unwrap().to_string(), "1 / 10 licenses in use.");
//! assert_eq!(table.users_of("AutoCAD").count(), 1);
//! ```

mod catalog;
mod table;
mod types;

pub use catalog::ProductCatalog;
pub use table::{LicenseTable, NO_LICENSES_IN_USE, UsersOf, format_elapsed};
pub use types::{License, LicenseUsage, LicenseUser};
