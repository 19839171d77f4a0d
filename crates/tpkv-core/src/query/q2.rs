//! TPC-H Q2, minimum cost supplier.
//!
//! ```sql
//! SELECT s_acctbal, s_name, n_name, p_partkey, p_mfgr, s_address, s_phone, s_comment
//! FROM part, supplier, partsupp, nation, region
//! WHERE p_partkey = ps_partkey AND s_suppkey = ps_suppkey
//!   AND p_size = 15 AND p_type LIKE '%BRASS'
//!   AND s_nationkey = n_nationkey AND n_regionkey = r_regionkey
//!   AND r_name = 'EUROPE'
//!   AND ps_supplycost = (SELECT MIN(ps_supplycost) ... same joins ... )
//! ORDER BY s_acctbal DESC, n_name, s_name, p_partkey;
//! ```
//!
//! The join is a chain of point lookups per candidate pair:
//! partsupp -> supplier -> nation -> region. A pair with any missing link is
//! dropped. The correlated minimum is computed in two passes per part so that
//! every supplier tied at the minimum survives.

use crate::error::Result;
use crate::join;
use crate::schema::Part;
use crate::sort::{Direction, OrderBy};
use crate::store::KvStore;
use serde::Serialize;
use std::collections::BTreeMap;

pub const SIZE: i64 = 15;
pub const TYPE_SUFFIX: &str = "BRASS";
pub const REGION: &str = "EUROPE";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinCostSupplierRow {
    pub s_acctbal: f64,
    pub s_name: String,
    pub n_name: String,
    pub p_partkey: i64,
    pub p_mfgr: String,
    pub s_address: String,
    pub s_phone: String,
    pub s_comment: String,
    pub ps_supplycost: f64,
}

/// Every supplier of `part` located in [`REGION`], with its supply cost.
pub fn region_candidates<S: KvStore + ?Sized>(
    store: &S,
    part: &Part,
) -> Result<Vec<MinCostSupplierRow>> {
    let mut out = Vec::new();
    for (partkey, suppkey) in join::partsupps_of_part(store, part.partkey)? {
        let Some(ps) = join::partsupp(store, partkey, suppkey)? else {
            continue;
        };
        let Some(supplier) = join::supplier(store, suppkey)? else {
            continue;
        };
        let Some((nation, region)) = join::supplier_location(store, &supplier)? else {
            continue;
        };
        if region.name != REGION {
            continue;
        }
        out.push(MinCostSupplierRow {
            s_acctbal: supplier.acctbal,
            s_name: supplier.name,
            n_name: nation.name,
            p_partkey: part.partkey,
            p_mfgr: part.mfgr.clone(),
            s_address: supplier.address,
            s_phone: supplier.phone,
            s_comment: supplier.comment,
            ps_supplycost: ps.supplycost,
        });
    }
    Ok(out)
}

/// Keep every candidate whose cost equals the group minimum.
pub fn keep_minimum(candidates: Vec<MinCostSupplierRow>) -> Vec<MinCostSupplierRow> {
    let min = candidates
        .iter()
        .map(|c| c.ps_supplycost)
        .fold(f64::INFINITY, f64::min);
    candidates
        .into_iter()
        .filter(|c| c.ps_supplycost == min)
        .collect()
}

pub fn run<S: KvStore + ?Sized>(store: &S) -> Result<Vec<MinCostSupplierRow>> {
    let partkeys = join::parts_by_size_and_type(store, SIZE, TYPE_SUFFIX)?;

    let mut groups: BTreeMap<i64, Vec<MinCostSupplierRow>> = BTreeMap::new();
    for partkey in &partkeys {
        let Some(part) = join::part(store, *partkey)? else {
            continue;
        };
        let candidates = region_candidates(store, &part)?;
        if !candidates.is_empty() {
            groups.insert(*partkey, candidates);
        }
    }

    let mut rows: Vec<MinCostSupplierRow> = groups.into_values().flat_map(keep_minimum).collect();
    OrderBy::new()
        .then_f64(Direction::Desc, |r: &MinCostSupplierRow| r.s_acctbal)
        .then(Direction::Asc, |r| r.n_name.clone())
        .then(Direction::Asc, |r| r.s_name.clone())
        .then(Direction::Asc, |r| r.p_partkey)
        .sort(&mut rows);

    tracing::debug!(parts = partkeys.len(), rows = rows.len(), "q2 finished");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::keys;

    fn summary(rows: &[MinCostSupplierRow]) -> Vec<(i64, &str, f64)> {
        rows.iter()
            .map(|r| (r.p_partkey, r.s_name.as_str(), r.ps_supplycost))
            .collect()
    }

    #[test]
    fn ties_at_the_minimum_all_survive_in_order() -> Result<()> {
        let store = fixtures::tiny()?;
        let rows = run(&store)?;
        assert_eq!(
            summary(&rows),
            vec![
                (10, "Supplier#000000002", 20.0),
                (10, "Supplier#000000004", 20.0),
                (11, "Supplier#000000005", 30.0),
            ]
        );
        // equal balances fall back to nation name
        assert_eq!(rows[0].n_name, "GERMANY");
        assert_eq!(rows[1].n_name, "ROMANIA");
        assert_eq!(rows[0].p_mfgr, fixtures::part(10, "", 0).mfgr);
        Ok(())
    }

    #[test]
    fn every_row_is_the_region_minimum() -> Result<()> {
        let store = fixtures::tiny()?;
        for row in run(&store)? {
            let part = join::part(&store, row.p_partkey)?.unwrap();
            let min = region_candidates(&store, &part)?
                .iter()
                .map(|c| c.ps_supplycost)
                .fold(f64::INFINITY, f64::min);
            assert_eq!(row.ps_supplycost, min);
            assert!(["FRANCE", "GERMANY", "ROMANIA"].contains(&row.n_name.as_str()));
        }
        Ok(())
    }

    #[test]
    fn cheaper_supplier_outside_region_is_ignored() -> Result<()> {
        let store = fixtures::tiny()?;
        let rows = run(&store)?;
        assert!(rows.iter().all(|r| r.s_name != "Supplier#000000003"));
        // part 14 is only offered from AMERICA
        assert!(rows.iter().all(|r| r.p_partkey != 14));
        Ok(())
    }

    #[test]
    fn missing_supplier_drops_only_its_pairs() -> Result<()> {
        let store = fixtures::tiny()?;
        store.del(&keys::supplier(2))?;
        let rows = run(&store)?;
        assert_eq!(
            summary(&rows),
            vec![
                (10, "Supplier#000000004", 20.0),
                (11, "Supplier#000000005", 30.0),
            ]
        );
        Ok(())
    }

    #[test]
    fn missing_nation_drops_the_candidate() -> Result<()> {
        let store = fixtures::tiny()?;
        store.del(&keys::nation(19))?;
        let rows = run(&store)?;
        assert_eq!(
            summary(&rows),
            vec![
                (10, "Supplier#000000002", 20.0),
                (11, "Supplier#000000005", 30.0),
            ]
        );
        Ok(())
    }

    #[test]
    fn new_minimum_replaces_the_tie() -> Result<()> {
        let store = fixtures::tiny()?;
        fixtures::put(&store, &fixtures::partsupp(10, 1, 19.5))?;
        let rows = run(&store)?;
        assert_eq!(summary(&rows)[0], (10, "Supplier#000000001", 19.5));
        assert_eq!(rows.iter().filter(|r| r.p_partkey == 10).count(), 1);
        Ok(())
    }

    #[test]
    fn keep_minimum_handles_empty_group() {
        assert!(keep_minimum(Vec::new()).is_empty());
    }

    #[test]
    fn repeated_runs_match() -> Result<()> {
        let store = fixtures::tiny()?;
        assert_eq!(run(&store)?, run(&store)?);
        Ok(())
    }
}
