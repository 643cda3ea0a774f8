//! CSV-backed enrichment tables: OUI manufacturer prefixes and
//! characteristic names.

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

/// One manufacturer-prefix row, headers as published in the OUI registry
/// export (`oui,company_name,address1,address2,country`).
#[derive(Debug, Clone, Deserialize)]
pub struct OuiRecord {
    pub oui: String,
    pub company_name: String,
    pub address1: String,
    pub address2: String,
    pub country: String,
}

/// One characteristic-name row (`characteristic_uuid,characteristic_name`).
#[derive(Debug, Clone, Deserialize)]
pub struct CharName {
    pub characteristic_uuid: String,
    pub characteristic_name: String,
}

pub fn load_oui<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<OuiRecord>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    reader
        .deserialize()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("invalid OUI csv {}", path.display()))
}

pub fn load_char_names<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<CharName>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    reader
        .deserialize()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("invalid characteristic csv {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn oui_rows_parse_with_quoted_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oui.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "oui,company_name,address1,address2,country").unwrap();
        writeln!(f, "AA:BB:CC,\"Tagcorp, Inc.\",1 Main St,,US").unwrap();

        let rows = load_oui(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].oui, "AA:BB:CC");
        assert_eq!(rows[0].company_name, "Tagcorp, Inc.");
        assert_eq!(rows[0].country, "US");
    }

    #[test]
    fn char_names_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gattchars.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "characteristic_uuid,characteristic_name").unwrap();
        writeln!(f, "2a19,Battery Level").unwrap();

        let rows = load_char_names(&path).unwrap();
        assert_eq!(rows[0].characteristic_uuid, "2a19");
        assert_eq!(rows[0].characteristic_name, "Battery Level");
    }
}
