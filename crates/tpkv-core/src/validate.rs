//! Post-load sanity checks: record counts per table and presence of the
//! indexes the queries read.

use crate::error::Result;
use crate::index;
use crate::keys;
use crate::store::{KeyKind, KvStore};

pub const TABLES: [&str; 8] = [
    "region", "nation", "supplier", "customer", "part", "partsupp", "orders", "lineitem",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub counts: Vec<(&'static str, usize)>,
    pub problems: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }

    fn problem(&mut self, message: String) {
        tracing::warn!(problem = %message, "validation");
        self.problems.push(message);
    }
}

fn expected_count(table: &str) -> Option<usize> {
    match table {
        "region" => Some(5),
        "nation" => Some(25),
        _ => None,
    }
}

pub fn validate<S: KvStore + ?Sized>(store: &S) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();

    for table in TABLES {
        let count = store.scan(&format!("{table}:*"), Some(KeyKind::Hash))?.len();
        report.counts.push((table, count));
        match expected_count(table) {
            Some(expected) if count != expected => {
                report.problem(format!("{table}: expected {expected} records, found {count}"))
            }
            None if count == 0 => report.problem(format!("{table}: no records")),
            _ => {}
        }
    }

    if store.zcard(keys::LINEITEM_BY_SHIPDATE)? == 0 {
        report.problem(format!("index {} is empty", keys::LINEITEM_BY_SHIPDATE));
    }
    if store.zcard(keys::ORDERS_BY_DATE)? == 0 {
        report.problem(format!("index {} is empty", keys::ORDERS_BY_DATE));
    }
    for key in [
        keys::part_by_size(15),
        keys::part_by_type_suffix(index::TYPE_SUFFIXES[0]),
        keys::customer_by_segment("BUILDING"),
    ] {
        if store.scard(&key)? == 0 {
            report.problem(format!("index {key} is empty"));
        }
    }
    let by_customer = format!("{}:*", keys::ORDERS_BY_CUSTOMER);
    if store.scan(&by_customer, Some(KeyKind::Set))?.is_empty() {
        report.problem(format!("index {by_customer} is empty"));
    }

    tracing::info!(problems = report.problems.len(), "validation finished");
    Ok(report)
}
