//! Bulk load of `dbgen` `.tbl` files into hash records.

use crate::error::{Result, TpkvError};
use crate::schema::{
    parse_tbl_line, Customer, Entity, LineItem, Nation, Order, Part, PartSupp, Region, Supplier,
};
use crate::store::KvStore;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Rows written per table, in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub tables: Vec<(&'static str, usize)>,
}

impl LoadReport {
    pub fn count(&self, table: &str) -> Option<usize> {
        self.tables
            .iter()
            .find(|(name, _)| *name == table)
            .map(|(_, n)| *n)
    }

    pub fn total(&self) -> usize {
        self.tables.iter().map(|(_, n)| n).sum()
    }
}

/// Load one table from `{dir}/{TABLE}.tbl`. A missing file loads nothing.
pub fn load_table<E: Entity, S: KvStore + ?Sized>(store: &S, dir: &Path) -> Result<usize> {
    let path = dir.join(format!("{}.tbl", E::TABLE));
    if !path.exists() {
        tracing::warn!(path = %path.display(), "table file not found, skipping");
        return Ok(0);
    }
    let reader = BufReader::new(File::open(&path)?);
    let mut rows = 0usize;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row: E = parse_tbl_line(&line).map_err(|reason| TpkvError::MalformedRow {
            file: path.display().to_string(),
            line: idx + 1,
            reason,
        })?;
        store.hset(&row.key(), row.to_record())?;
        rows += 1;
    }
    tracing::info!(table = E::TABLE, rows, "table loaded");
    Ok(rows)
}

/// Load all eight tables, parents before children.
pub fn load_dir<S: KvStore + ?Sized>(store: &S, dir: &Path) -> Result<LoadReport> {
    let mut report = LoadReport::default();
    report.tables.push((Region::TABLE, load_table::<Region, S>(store, dir)?));
    report.tables.push((Nation::TABLE, load_table::<Nation, S>(store, dir)?));
    report.tables.push((Supplier::TABLE, load_table::<Supplier, S>(store, dir)?));
    report.tables.push((Customer::TABLE, load_table::<Customer, S>(store, dir)?));
    report.tables.push((Part::TABLE, load_table::<Part, S>(store, dir)?));
    report.tables.push((PartSupp::TABLE, load_table::<PartSupp, S>(store, dir)?));
    report.tables.push((Order::TABLE, load_table::<Order, S>(store, dir)?));
    report.tables.push((LineItem::TABLE, load_table::<LineItem, S>(store, dir)?));
    tracing::info!(rows = report.total(), "load finished");
    Ok(report)
}
