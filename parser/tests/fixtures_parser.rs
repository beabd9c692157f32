use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use license_monitor_core::ProductCatalog;
use license_monitor_parser::{
    ConnectivityFailure, Dialect, LicenseMonitor, LicenseParser, ParseError, detect_dialect,
};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 15)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn auto_parser() -> LicenseParser {
    LicenseParser::new(None, ProductCatalog::builtin().clone())
}

#[test]
fn test_detects_dialect_of_both_samples() {
    assert_eq!(
        detect_dialect(&fixture("lmstat-sample.txt")),
        Some(Dialect::Simple)
    );
    assert_eq!(
        detect_dialect(&fixture("lsmon-sample.txt")),
        Some(Dialect::Verbose)
    );
}

#[test]
fn test_parse_lmstat_fixture() {
    let outcome = auto_parser()
        .parse_at(&fixture("lmstat-sample.txt"), now())
        .expect("fixture should parse");

    assert_eq!(outcome.diagnostics.dialect, Some(Dialect::Simple));
    assert_eq!(
        outcome.table.names().collect::<Vec<_>>(),
        vec!["AutoCAD", "Civil 3D", "Revit", "XYZ"]
    );

    let autocad = outcome.table.get("AutoCAD").unwrap();
    assert_eq!(autocad.seats_available, 10);
    assert_eq!(autocad.holders(), 2);
    assert_eq!(outcome.table.get("Civil 3D").unwrap().seats_available, 3);

    let users: Vec<String> = outcome.table.users_of_at("AutoCAD", now()).collect();
    assert_eq!(users, vec!["asmith [19h 20m]", "jdoe [3h 45m]"]);

    // Repeated checkout lines keep the first one, which started last year.
    let revit = outcome.table.get("Revit").unwrap();
    assert_eq!(revit.users.len(), 1);
    assert_eq!(revit.user("bjones").unwrap().seats_in_use, 1);
    let users: Vec<String> = outcome.table.users_of_at("Revit", now()).collect();
    assert_eq!(users, vec!["bjones [4002h 55m]"]);

    // The uncounted MAYA header is skipped.
    assert_eq!(outcome.diagnostics.malformed.len(), 1);
    assert_eq!(outcome.diagnostics.malformed[0].line, 37);
    assert!(!outcome.table.contains("Maya"));
}

#[test]
fn test_parse_lmstat_fixture_is_repeatable() {
    let parser = auto_parser();
    let text = fixture("lmstat-sample.txt");
    let first = parser.parse_at(&text, now()).unwrap();
    let second = parser.parse_at(&text, now()).unwrap();
    assert_eq!(first.table, second.table);
}

#[test]
fn test_parse_lsmon_fixture() {
    let outcome = auto_parser()
        .parse_at(&fixture("lsmon-sample.txt"), now())
        .expect("fixture should parse");

    assert_eq!(outcome.diagnostics.dialect, Some(Dialect::Verbose));
    assert_eq!(
        outcome.table.names().collect::<Vec<_>>(),
        vec!["EtabPL 21.0", "PERFORM3D 9", "SAP 2023"]
    );

    let sap = outcome.table.get("SAP 2023").unwrap();
    assert_eq!(sap.seats_available, 7);
    assert_eq!(sap.user("jdoe").unwrap().seats_in_use, 2);
    assert_eq!(sap.user("asmith").unwrap().seats_in_use, 1);
    assert_eq!(sap.usage().to_string(), "2 / 7 licenses in use.");

    // The expired second license does not add to the live one.
    let etabs = outcome.table.get("EtabPL 21.0").unwrap();
    assert_eq!(etabs.seats_available, 3);
    let users: Vec<String> = outcome.table.users_of_at("EtabPL 21.0", now()).collect();
    assert_eq!(users, vec!["bjones [74h 30m]"]);

    assert!(!outcome.table.contains("Safe 2022"));
    assert_eq!(outcome.diagnostics.expired_features, vec!["Safe 2022"]);
    assert!(outcome.diagnostics.malformed.is_empty());
}

#[test]
fn test_featured_filter_on_lsmon_fixture() {
    let outcome = auto_parser()
        .parse_at(&fixture("lsmon-sample.txt"), now())
        .unwrap();
    let featured: Vec<&str> = outcome
        .table
        .featured(&["Safe", "EtabPL", "SAP"])
        .map(|license| license.name.as_str())
        .collect();
    assert_eq!(featured, vec!["EtabPL 21.0", "SAP 2023"]);
}

#[test]
fn test_forced_dialect_mismatch_yields_empty_table() {
    let parser = LicenseParser::new(Some(Dialect::Verbose), ProductCatalog::builtin().clone());
    let outcome = parser
        .parse_at(&fixture("lmstat-sample.txt"), now())
        .unwrap();
    assert!(outcome.table.is_empty());
}

#[test]
fn test_connectivity_failure_fixtures() {
    let cases = [
        ("lmstat-server-down.txt", ConnectivityFailure::Unreachable, 5),
        ("lsmon-timeout.txt", ConnectivityFailure::TimedOut, 6),
        ("lsmon-unknown-host.txt", ConnectivityFailure::HostUnresolved, 4),
    ];

    for (name, expected, expected_line) in cases {
        let err = auto_parser()
            .parse_at(&fixture(name), now())
            .expect_err("connectivity failure should abort the pass");
        let ParseError::Connectivity { reason, line, .. } = err;
        assert_eq!(reason, expected, "{name}");
        assert_eq!(line, expected_line, "{name}");
    }
}

#[test]
fn test_monitor_keeps_snapshot_across_outage() {
    let mut monitor = LicenseMonitor::new(auto_parser());
    monitor
        .refresh_at(&fixture("lsmon-sample.txt"), now())
        .unwrap();
    assert_eq!(monitor.snapshot().len(), 3);

    assert!(
        monitor
            .refresh_at(&fixture("lsmon-timeout.txt"), now())
            .is_err()
    );
    assert!(monitor.refresh_failed());
    assert!(monitor.snapshot().contains("SAP 2023"));

    monitor
        .refresh_at(&fixture("lmstat-sample.txt"), now())
        .unwrap();
    assert!(!monitor.refresh_failed());
    assert!(!monitor.snapshot().contains("SAP 2023"));
    assert!(monitor.snapshot().contains("Revit"));
}

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {err}", path.display()))
}
