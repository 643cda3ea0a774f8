//! The sqlite catalog: staging tables, bulk inserts, and the final
//! deduplicated `records` table.
//!
//! The database is rebuilt from scratch on every run. Lookup tables exist
//! only to enrich the `records` join and are dropped once it is generated;
//! an empty lookup table simply leaves the enrichment columns NULL.

use crate::jlog::LogRow;
use crate::lookup::{CharName, OuiRecord};
use anyhow::Context;
use rusqlite::{params, Connection};
use std::path::Path;

const SCHEMA: &str = r#"
CREATE TABLE "oui_lookup" (
    "oui"           TEXT,
    "company_name"  TEXT,
    "address1"      TEXT,
    "address2"      TEXT,
    "country"       TEXT
);
CREATE TABLE "char_lookup" (
    "characteristic_uuid"  TEXT,
    "characteristic_name"  TEXT
);
CREATE TABLE "logs" (
    id INTEGER not null primary key,
    "mac"    TEXT,
    "name"   TEXT,
    "man"    BLOB,
    "svc"    TEXT,
    "chr"    TEXT,
    "props"  INTEGER,
    "val"    BLOB
);
"#;

pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Creates the catalog file, replacing any previous one at the path.
    pub fn create<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            std::fs::remove_file(path)
                .with_context(|| format!("failed to replace {}", path.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        Self::prepare(conn)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> anyhow::Result<Self> {
        // Bulk-ingest settings; the file is disposable until the run finishes.
        conn.pragma_update(None, "journal_mode", "OFF")?;
        conn.pragma_update(None, "synchronous", 0)?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Loads the manufacturer-prefix table. Prefixes are stored lowercased so
    /// they join against device addresses as the collectors format them.
    pub fn insert_oui(&mut self, rows: &[OuiRecord]) -> anyhow::Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO oui_lookup (oui, company_name, address1, address2, country) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for r in rows {
                stmt.execute(params![
                    r.oui.to_lowercase(),
                    r.company_name,
                    r.address1,
                    r.address2,
                    r.country
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn insert_char_names(&mut self, rows: &[CharName]) -> anyhow::Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO char_lookup (characteristic_uuid, characteristic_name) \
                 VALUES (?1, ?2)",
            )?;
            for r in rows {
                stmt.execute(params![r.characteristic_uuid, r.characteristic_name])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn insert_log_rows(&mut self, rows: &[LogRow]) -> anyhow::Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO logs (mac, name, man, svc, chr, props, val) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for r in rows {
                stmt.execute(params![r.mac, r.name, r.man, r.svc, r.chr, r.props, r.val])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Collapses repeated observations and joins the enrichment tables into
    /// the final `records` table, then drops everything intermediate.
    pub fn generate_records(&mut self) -> anyhow::Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS logs_dedupe AS
            select mac, name, man, svc, chr, props, val
            from logs
            group by mac, name, man, svc, chr, props, val;

            CREATE TABLE IF NOT EXISTS records AS
            select ld.mac              as mac,
                   name,
                   ol.company_name     as company_name,
                   ld.man              as manufacturer_data,
                   ld.svc              as service_uuid,
                   ld.chr              as characteristic_uuid,
                   characteristic_name,
                   ld.val              as val
            from logs_dedupe ld
                     left join char_lookup cl on ld.chr = cl.characteristic_uuid
                     left join oui_lookup ol on ol.oui = SUBSTR(ld.mac, 1, 8)
            order by ld.mac, ol.company_name, ld.svc, ld.chr, cl.characteristic_name asc;

            DROP TABLE logs_dedupe;
            DROP TABLE oui_lookup;
            DROP TABLE char_lookup;
            "#,
        )?;
        Ok(())
    }

    pub fn record_count(&self) -> anyhow::Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |r| r.get(0))?)
    }

    /// Manufacturer name joined for a device, if its prefix was known.
    pub fn company_for(&self, mac: &str) -> anyhow::Result<Option<String>> {
        Ok(self.conn.query_row(
            "SELECT company_name FROM records WHERE mac = ?1 LIMIT 1",
            params![mac],
            |r| r.get(0),
        )?)
    }

    pub fn characteristic_name_for(
        &self,
        mac: &str,
        chr: &str,
    ) -> anyhow::Result<Option<String>> {
        Ok(self.conn.query_row(
            "SELECT characteristic_name FROM records WHERE mac = ?1 AND characteristic_uuid = ?2",
            params![mac, chr],
            |r| r.get(0),
        )?)
    }

    pub fn has_table(&self, name: &str) -> anyhow::Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }
}
