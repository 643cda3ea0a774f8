//! End-to-end ingest: jsonl file to enriched records table.

use bleak_loader::catalog::Catalog;
use bleak_loader::jlog;
use bleak_loader::lookup::{CharName, OuiRecord};
use std::fs::File;
use std::io::Write;

const DOC_A: &str = r#"{"mac":"node-a","logs":{"aa:bb:cc:00:00:01":{"name":"746167","rssi":-51,"man":"4c00","connectable":true,"addr_type":0,"tree":[{"svc":"180f","chr":"2a19","val":"5f","prop":2}]}}}"#;
const DOC_B: &str = r#"{"mac":"node-b","logs":{"dd:ee:ff:00:00:02":{"name":"","rssi":-70,"man":"","connectable":false,"addr_type":1}}}"#;

#[test]
fn jsonl_ingest_builds_an_enriched_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("log.jsonl");
    let mut f = File::create(&log_path).unwrap();
    writeln!(f, "{DOC_A}").unwrap();
    writeln!(f, "{DOC_B}").unwrap();
    // A later pull that saw the same device again: duplicates collapse.
    writeln!(f, "{DOC_A}").unwrap();
    writeln!(f, "garbage line").unwrap();
    drop(f);

    let ingest = jlog::read_log(&log_path).unwrap();
    assert_eq!(ingest.skipped_lines, 1);
    // Two rows per DOC_A (advertisement + one branch), one for DOC_B.
    assert_eq!(ingest.rows.len(), 5);

    let db_path = dir.path().join("catalog.sqlite");
    let mut catalog = Catalog::create(&db_path).unwrap();
    catalog
        .insert_oui(&[OuiRecord {
            oui: "AA:BB:CC".into(),
            company_name: "Tagcorp".into(),
            address1: String::new(),
            address2: String::new(),
            country: "US".into(),
        }])
        .unwrap();
    catalog
        .insert_char_names(&[CharName {
            characteristic_uuid: "2a19".into(),
            characteristic_name: "Battery Level".into(),
        }])
        .unwrap();
    catalog.insert_log_rows(&ingest.rows).unwrap();
    catalog.generate_records().unwrap();

    // The duplicated document deduplicated away: 2 rows for device one,
    // 1 for device two.
    assert_eq!(catalog.record_count().unwrap(), 3);
    assert_eq!(
        catalog.company_for("aa:bb:cc:00:00:01").unwrap().as_deref(),
        Some("Tagcorp")
    );
    assert_eq!(catalog.company_for("dd:ee:ff:00:00:02").unwrap(), None);
    assert_eq!(
        catalog
            .characteristic_name_for("aa:bb:cc:00:00:01", "2a19")
            .unwrap()
            .as_deref(),
        Some("Battery Level")
    );
    assert!(!catalog.has_table("oui_lookup").unwrap());
}

#[test]
fn create_replaces_an_existing_database() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("catalog.sqlite");

    let mut first = Catalog::create(&db_path).unwrap();
    first.insert_log_rows(&[]).unwrap();
    first.generate_records().unwrap();
    assert_eq!(first.record_count().unwrap(), 0);
    drop(first);

    // A second run starts from an empty schema, not the old records table.
    let catalog = Catalog::create(&db_path).unwrap();
    assert!(!catalog.has_table("records").unwrap());
    assert!(catalog.has_table("logs").unwrap());
}
