//! Parses a captured license dump and prints usage per product.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p license-monitor-parser --example parse_dump
//! ```

use license_monitor_core::ProductCatalog;
use license_monitor_parser::LicenseParser;

fn main() {
    let dump = r#"
 |- Feature Information
   |- Feature name                   : "SAP"
   |- Feature version                : "2023"
   |- License Information
     |- Maximum concurrent user(s)     : 5
     |- Expiration date              : License has no expiration
   |- Client Information
     |- User name                    : jdoe
     |- Status                       : Running since Mon Mar 04 08:15:20 2024
"#;

    let parser = LicenseParser::new(None, ProductCatalog::builtin().clone());
    let outcome = match parser.parse(dump) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };

    println!("Detected dialect: {:?}", outcome.diagnostics.dialect);
    for warning in outcome.diagnostics.warnings() {
        println!("  - {warning}");
    }

    for usage in outcome.table.summary() {
        println!("\n{}: {usage}", usage.name);
        for line in outcome.table.users_of(&usage.name) {
            println!("  {line}");
        }
    }
}
