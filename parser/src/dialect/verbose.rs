//! Sentinel RMS `lsmon` dialect.
//!
//! ```text
//!  |- Feature Information
//!    |- Feature name                   : "SAP"
//!    |- Feature version                : "2023"
//!    |- License Information
//!      |- Maximum concurrent user(s)     : 5
//!      |- Expiration date                : Thu Dec 31 23:59:59 2026
//!    |- Client Information
//!      |- User name                      : jdoe
//!      |- Status                         : Running since Mon Mar 02 08:15:20 2026
//! ```
//!
//! Seats are only counted inside `License Information` sections and only
//! once their expiration date has been checked. A feature that ends up with
//! no unexpired seats is dropped from the table.

use tracing::debug;

use super::{Dialect, DialectParser, Pass};
use crate::classify::{LineKind, classify_line};
use crate::error::Result;
use crate::timestamp::{parse_full_date, parse_running_since};

const FEATURE_NAME: &str = "Feature name";
const FEATURE_VERSION: &str = "Feature version";
const MAX_CONCURRENT_USERS: &str = "Maximum concurrent user(s)";
const EXPIRATION_DATE: &str = "Expiration date";
const USER_NAME: &str = "User name";
const STATUS: &str = "Status";
const NO_EXPIRATION: &str = "License has no expiration";

/// Parser for Sentinel RMS `lsmon` output.
pub struct VerboseDialect;

impl DialectParser for VerboseDialect {
    fn dialect(&self) -> Dialect {
        Dialect::Verbose
    }

    fn parse_into(&self, text: &str, pass: &mut Pass<'_>) -> Result<()> {
        let mut state = FeatureState::default();

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            pass.diagnostics.total_lines += 1;

            let classified = classify_line(self.dialect(), line);
            match classified.kind {
                LineKind::Error(reason) => {
                    return Err(pass.connectivity_error(reason, line_no, line));
                }
                LineKind::FeatureBoundary => {
                    pass.diagnostics.recognized_lines += 1;
                    state.finish_feature(pass);
                }
                LineKind::LicenseBoundary => {
                    pass.diagnostics.recognized_lines += 1;
                    state.license_lines = true;
                }
                LineKind::KeyValue { key, value } => {
                    state.read_field(&key, value.as_deref(), classified.level, line_no, line, pass);
                }
                _ => {}
            }
        }

        state.finish_feature(pass);
        Ok(())
    }
}

/// Running state for the feature block being read.
#[derive(Debug, Default)]
struct FeatureState {
    /// Product name; gains the version suffix once registered.
    product: Option<String>,
    /// Seats read in the current license section, not yet committed.
    pending_seats: u32,
    /// Inside a `License Information` section.
    license_lines: bool,
    /// Holder named by the most recent `User name` field.
    user: Option<String>,
}

impl FeatureState {
    /// Closes the current feature, dropping it if it has no live seats.
    fn finish_feature(&mut self, pass: &mut Pass<'_>) {
        self.pending_seats = 0;
        self.license_lines = false;
        self.user = None;

        if let Some(product) = self.product.as_deref() {
            if pass.table.remove_if_seatless(product) {
                debug!(product, "Dropping feature without unexpired seats");
                pass.diagnostics.expired_features.push(product.to_string());
            }
        }
    }

    fn close_license_lines(&mut self) {
        self.license_lines = false;
        self.pending_seats = 0;
    }

    fn read_field(
        &mut self,
        key: &str,
        value: Option<&str>,
        level: usize,
        line_no: usize,
        line: &str,
        pass: &mut Pass<'_>,
    ) {
        if key == FEATURE_NAME {
            self.product = value.filter(|name| !name.is_empty()).map(str::to_string);
        }

        // Any other level-1 field means the license section is over.
        if self.license_lines && level == 1 {
            self.close_license_lines();
        }

        let Some(product) = self.product.clone() else {
            return;
        };
        let registered = pass.table.contains(&product);

        match (key, value) {
            (FEATURE_NAME, _) => {}
            (FEATURE_VERSION, Some(version)) if !registered => {
                let versioned = if version.is_empty() {
                    product
                } else {
                    format!("{product} {version}")
                };
                pass.table.insert_if_absent(&versioned, 0);
                self.product = Some(versioned);
            }
            (MAX_CONCURRENT_USERS, Some(seats)) if self.license_lines => {
                match seats.parse::<u32>() {
                    Ok(seats) => self.pending_seats = self.pending_seats.saturating_add(seats),
                    Err(_) => {
                        pass.diagnostics
                            .malformed(line_no, line, "non-numeric concurrent user count");
                        return;
                    }
                }
            }
            (EXPIRATION_DATE, Some(expiry)) if registered && self.license_lines => {
                if expiry != NO_EXPIRATION {
                    let Some(expires) = parse_full_date(expiry) else {
                        pass.diagnostics
                            .malformed(line_no, line, "unparsable expiration date");
                        return;
                    };
                    if expires.date() < pass.now.date() {
                        debug!(product = %product, %expires, seats = self.pending_seats, "Discarding expired license");
                        self.close_license_lines();
                        pass.diagnostics.recognized_lines += 1;
                        return;
                    }
                }
                if let Some(license) = pass.table.get_mut(&product) {
                    license.seats_available =
                        license.seats_available.saturating_add(self.pending_seats);
                }
                self.pending_seats = 0;
            }
            (USER_NAME, Some(user)) if registered && !user.is_empty() => {
                if let Some(license) = pass.table.get_mut(&product) {
                    license.checkout(user);
                }
                self.user = Some(user.to_string());
            }
            (STATUS, Some(status)) if registered => {
                let Some(user) = self.user.as_deref() else {
                    return;
                };
                let Some(license) = pass.table.get_mut(&product) else {
                    return;
                };
                let Some(holder) = license.user_mut(user) else {
                    return;
                };
                match parse_running_since(status) {
                    Some(started) => holder.checkout_time = Some(started),
                    None => {
                        pass.diagnostics
                            .malformed(line_no, line, "unparsable checkout start time");
                        return;
                    }
                }
            }
            _ => return,
        }

        pass.diagnostics.recognized_lines += 1;
    }
}
