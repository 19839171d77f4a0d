//! TPC-H Q3, shipping priority.
//!
//! ```sql
//! SELECT l_orderkey, SUM(l_extendedprice * (1 - l_discount)) AS revenue,
//!        o_orderdate, o_shippriority
//! FROM customer, orders, lineitem
//! WHERE c_mktsegment = 'BUILDING' AND c_custkey = o_custkey
//!   AND l_orderkey = o_orderkey
//!   AND o_orderdate < DATE '1995-03-15' AND l_shipdate > DATE '1995-03-15'
//! GROUP BY l_orderkey, o_orderdate, o_shippriority
//! ORDER BY revenue DESC, o_orderdate;
//! ```

use crate::date;
use crate::error::Result;
use crate::join;
use crate::sort::{Direction, OrderBy};
use crate::store::KvStore;
use serde::Serialize;
use std::collections::BTreeMap;

pub const SEGMENT: &str = "BUILDING";
pub const DATE: &str = "1995-03-15";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShippingPriorityRow {
    pub l_orderkey: i64,
    pub revenue: f64,
    pub o_orderdate: String,
    pub o_shippriority: i64,
}

pub fn run<S: KvStore + ?Sized>(store: &S) -> Result<Vec<ShippingPriorityRow>> {
    let cutoff = date::encode(DATE)?;
    let mut groups: BTreeMap<(i64, String, i64), f64> = BTreeMap::new();
    let mut scanned = 0usize;

    for custkey in join::customers_in_segment(store, SEGMENT)? {
        for orderkey in join::orders_of_customer(store, custkey)? {
            let Some(order) = join::order(store, orderkey)? else {
                continue;
            };
            if date::encode(&order.orderdate)? >= cutoff {
                continue;
            }
            for key in join::lineitems_of_order(store, orderkey)? {
                scanned += 1;
                let Some(item) = join::lineitem(store, &key)? else {
                    continue;
                };
                if date::encode(&item.shipdate)? <= cutoff {
                    continue;
                }
                *groups
                    .entry((orderkey, order.orderdate.clone(), order.shippriority))
                    .or_insert(0.0) += item.disc_price();
            }
        }
    }

    let mut rows: Vec<ShippingPriorityRow> = groups
        .into_iter()
        .map(|((l_orderkey, o_orderdate, o_shippriority), revenue)| ShippingPriorityRow {
            l_orderkey,
            revenue,
            o_orderdate,
            o_shippriority,
        })
        .collect();
    OrderBy::new()
        .then_f64(Direction::Desc, |r: &ShippingPriorityRow| r.revenue)
        .then(Direction::Asc, |r| r.o_orderdate.clone())
        .sort(&mut rows);

    tracing::debug!(lineitems = scanned, rows = rows.len(), "q3 finished");
    Ok(rows)
}
