//! TPC-H Q1, pricing summary report.
//!
//! ```sql
//! SELECT l_returnflag, l_linestatus, SUM(l_quantity), SUM(l_extendedprice),
//!        SUM(l_extendedprice * (1 - l_discount)),
//!        SUM(l_extendedprice * (1 - l_discount) * (1 + l_tax)),
//!        AVG(l_quantity), AVG(l_extendedprice), AVG(l_discount), COUNT(*)
//! FROM lineitem
//! WHERE l_shipdate <= DATE '1998-12-01' - INTERVAL '90' DAY
//! GROUP BY l_returnflag, l_linestatus
//! ORDER BY l_returnflag, l_linestatus;
//! ```

use crate::date;
use crate::error::Result;
use crate::join;
use crate::keys;
use crate::schema::LineItem;
use crate::sort::{Direction, OrderBy};
use crate::store::KvStore;
use serde::Serialize;
use std::collections::BTreeMap;

pub const BASE_DATE: &str = "1998-12-01";
pub const DELTA_DAYS: i64 = 90;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingSummaryRow {
    pub l_returnflag: String,
    pub l_linestatus: String,
    pub sum_qty: f64,
    pub sum_base_price: f64,
    pub sum_disc_price: f64,
    pub sum_charge: f64,
    pub avg_qty: f64,
    pub avg_price: f64,
    pub avg_disc: f64,
    pub count_order: u64,
}

#[derive(Debug, Default)]
struct Accumulator {
    sum_qty: f64,
    sum_base_price: f64,
    sum_disc_price: f64,
    sum_charge: f64,
    sum_disc: f64,
    count: u64,
}

impl Accumulator {
    fn add(&mut self, item: &LineItem) {
        let disc_price = item.disc_price();
        self.sum_qty += item.quantity;
        self.sum_base_price += item.extendedprice;
        self.sum_disc_price += disc_price;
        self.sum_charge += disc_price * (1.0 + item.tax);
        self.sum_disc += item.discount;
        self.count += 1;
    }

    // Groups are only created by `add`, so `count` is never zero here.
    fn finish(self, l_returnflag: String, l_linestatus: String) -> PricingSummaryRow {
        let n = self.count as f64;
        PricingSummaryRow {
            l_returnflag,
            l_linestatus,
            sum_qty: self.sum_qty,
            sum_base_price: self.sum_base_price,
            sum_disc_price: self.sum_disc_price,
            sum_charge: self.sum_charge,
            avg_qty: self.sum_qty / n,
            avg_price: self.sum_base_price / n,
            avg_disc: self.sum_disc / n,
            count_order: self.count,
        }
    }
}

/// Last ship date that still qualifies, `YYYY-MM-DD`.
pub fn cutoff() -> Result<String> {
    date::shift_days(BASE_DATE, -DELTA_DAYS)
}

pub fn run<S: KvStore + ?Sized>(store: &S) -> Result<Vec<PricingSummaryRow>> {
    let cutoff = date::encode(&cutoff()?)?;
    let members = store.zrangebyscore(keys::LINEITEM_BY_SHIPDATE, i64::MIN, cutoff)?;

    let mut groups: BTreeMap<(String, String), Accumulator> = BTreeMap::new();
    let mut skipped = 0usize;
    for key in &members {
        let Some(item) = join::lineitem(store, key)? else {
            skipped += 1;
            continue;
        };
        groups
            .entry((item.returnflag.clone(), item.linestatus.clone()))
            .or_default()
            .add(&item);
    }

    let mut rows: Vec<PricingSummaryRow> = groups
        .into_iter()
        .map(|((flag, status), acc)| acc.finish(flag, status))
        .collect();
    OrderBy::new()
        .then(Direction::Asc, |r: &PricingSummaryRow| r.l_returnflag.clone())
        .then(Direction::Asc, |r| r.l_linestatus.clone())
        .sort(&mut rows);

    tracing::debug!(scanned = members.len(), skipped, groups = rows.len(), "q1 finished");
    Ok(rows)
}
