//! FlexLM `lmstat` dialect.
//!
//! ```text
//! Users of 87545ACD_2024_0F:  (Total of 10 licenses issued;  Total of 1 license in use)
//!
//!   "87545ACD_2024_0F" v1.000, vendor: adskflex, expiry: permanent(no expiration date)
//!   floating license
//!
//!     jdoe PC01 PC01 (v1.0) (lic01/27000 4101), start Mon 3/2 8:15
//! ```

use std::sync::LazyLock;

use license_monitor_core::LicenseUser;
use regex::Regex;
use tracing::debug;

use super::{Dialect, DialectParser, Pass};
use crate::classify::{LineKind, classify_line};
use crate::error::Result;
use crate::timestamp::parse_yearless_start;

static PATTERNS: LazyLock<SimplePatterns> = LazyLock::new(SimplePatterns::new);

struct SimplePatterns {
    // Users of 12345RVT_2024_0F:
    product_header: Regex,
    // (Total of 10 licenses issued;
    seats_issued: Regex,
    // jdoe PC01 PC01 (v1.0) (srv/27000 101), start Mon 3/2 8:15
    checkout: Regex,
}

impl SimplePatterns {
    fn new() -> Self {
        Self {
            // Leading digits are a vendor id of no fixed width; the code itself
            // starts with a letter and may carry a `_<version>_0F` suffix.
            product_header: Regex::new(r"^Users of \d*([A-Za-z][\w.\-]*?)(?:_\d+_0F)*:")
                .expect("static regex must compile"),
            seats_issued: Regex::new(r"(\d+) licenses? issued").expect("static regex must compile"),
            // Host and display are any token not opening the version group.
            checkout: Regex::new(r"^\s+([\w.\- ]+) ([^\s(]\S*) ([^\s(]\S*) \(.*\), start (.+)$")
                .expect("static regex must compile"),
        }
    }
}

/// Parser for FlexLM `lmstat -a` output.
pub struct SimpleDialect;

impl DialectParser for SimpleDialect {
    fn dialect(&self) -> Dialect {
        Dialect::Simple
    }

    fn parse_into(&self, text: &str, pass: &mut Pass<'_>) -> Result<()> {
        let mut current: Option<String> = None;

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            pass.diagnostics.total_lines += 1;

            match classify_line(self.dialect(), line).kind {
                LineKind::Error(reason) => {
                    return Err(pass.connectivity_error(reason, line_no, line));
                }
                LineKind::ProductHeader => {
                    current = read_product_header(line, line_no, pass);
                }
                LineKind::UserDetail => {
                    if let Some(product) = current.as_deref() {
                        read_checkout(product, line, line_no, pass);
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// Registers the product named by a `Users of` header and returns its name.
fn read_product_header(line: &str, line_no: usize, pass: &mut Pass<'_>) -> Option<String> {
    let Some(code) = PATTERNS
        .product_header
        .captures(line)
        .map(|caps| caps[1].to_string())
    else {
        pass.diagnostics
            .malformed(line_no, line, "product header without a product code");
        return None;
    };
    let Some(seats) = PATTERNS
        .seats_issued
        .captures(line)
        .and_then(|caps| caps[1].parse::<u32>().ok())
    else {
        pass.diagnostics
            .malformed(line_no, line, "product header without an issued seat count");
        return None;
    };

    let name = pass.catalog.resolve(&code).to_string();
    if pass.table.contains(&name) {
        debug!(product = %name, seats, "Ignoring repeated product header");
    } else {
        pass.table.insert_if_absent(&name, seats);
    }
    pass.diagnostics.recognized_lines += 1;
    Some(name)
}

/// Records the holder described by a checkout line under `product`.
fn read_checkout(product: &str, line: &str, line_no: usize, pass: &mut Pass<'_>) {
    let Some(caps) = PATTERNS.checkout.captures(line) else {
        pass.diagnostics
            .malformed(line_no, line, "unrecognized checkout line");
        return;
    };

    let user = caps[1].trim();
    if user.is_empty() {
        return;
    }
    let Some(started) = parse_yearless_start(&caps[4], pass.now) else {
        pass.diagnostics
            .malformed(line_no, line, "unparsable checkout start time");
        return;
    };

    pass.diagnostics.recognized_lines += 1;
    if let Some(license) = pass.table.get_mut(product) {
        if !license.insert_user(LicenseUser::new(user).with_checkout_time(started)) {
            debug!(product, user, "Ignoring repeated checkout line");
        }
    }
}
