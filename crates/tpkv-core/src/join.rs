//! One function per join hop.
//!
//! Record hops return `Ok(None)` when the referenced key has no record; the
//! executors drop that candidate and carry on. Fan-out hops return keys in a
//! fixed order so a query run is reproducible.

use crate::error::Result;
use crate::keys;
use crate::schema::{Entity, LineItem, Nation, Order, Part, PartSupp, Region, Supplier};
use crate::store::{KeyKind, KvStore};

/// Point lookup of one typed record.
pub fn fetch<E: Entity, S: KvStore + ?Sized>(store: &S, key: &str) -> Result<Option<E>> {
    match store.hgetall(key)? {
        Some(record) => E::from_record(key, &record).map(Some),
        None => {
            tracing::debug!(key, "missing record");
            Ok(None)
        }
    }
}

pub fn part<S: KvStore + ?Sized>(store: &S, partkey: i64) -> Result<Option<Part>> {
    fetch(store, &keys::part(partkey))
}

pub fn partsupp<S: KvStore + ?Sized>(
    store: &S,
    partkey: i64,
    suppkey: i64,
) -> Result<Option<PartSupp>> {
    fetch(store, &keys::partsupp(partkey, suppkey))
}

pub fn supplier<S: KvStore + ?Sized>(store: &S, suppkey: i64) -> Result<Option<Supplier>> {
    fetch(store, &keys::supplier(suppkey))
}

pub fn nation<S: KvStore + ?Sized>(store: &S, nationkey: i64) -> Result<Option<Nation>> {
    fetch(store, &keys::nation(nationkey))
}

pub fn region<S: KvStore + ?Sized>(store: &S, regionkey: i64) -> Result<Option<Region>> {
    fetch(store, &keys::region(regionkey))
}

pub fn order<S: KvStore + ?Sized>(store: &S, orderkey: i64) -> Result<Option<Order>> {
    fetch(store, &keys::orders(orderkey))
}

pub fn lineitem<S: KvStore + ?Sized>(store: &S, key: &str) -> Result<Option<LineItem>> {
    fetch(store, key)
}

/// supplier -> nation -> region. `None` if either link is missing.
pub fn supplier_location<S: KvStore + ?Sized>(
    store: &S,
    supplier: &Supplier,
) -> Result<Option<(Nation, Region)>> {
    let Some(nation) = nation(store, supplier.nationkey)? else {
        return Ok(None);
    };
    let Some(region) = region(store, nation.regionkey)? else {
        return Ok(None);
    };
    Ok(Some((nation, region)))
}

fn int_members(key: &str, members: impl IntoIterator<Item = String>) -> Vec<i64> {
    let mut out: Vec<i64> = members
        .into_iter()
        .filter_map(|m| match m.parse() {
            Ok(k) => Some(k),
            Err(_) => {
                tracing::debug!(key, member = %m, "skipping non-integer index member");
                None
            }
        })
        .collect();
    out.sort_unstable();
    out
}

/// Part keys in both the size bucket and the type-suffix bucket.
pub fn parts_by_size_and_type<S: KvStore + ?Sized>(
    store: &S,
    size: i64,
    type_suffix: &str,
) -> Result<Vec<i64>> {
    let size_key = keys::part_by_size(size);
    let type_key = keys::part_by_type_suffix(type_suffix);
    let both = store.sinter(&[size_key.as_str(), type_key.as_str()])?;
    Ok(int_members(&size_key, both))
}

/// part -> every (part key, supplier key) pair offering it.
pub fn partsupps_of_part<S: KvStore + ?Sized>(store: &S, partkey: i64) -> Result<Vec<(i64, i64)>> {
    let key = keys::partsupp_by_part(partkey);
    let mut pairs: Vec<(i64, i64)> = store
        .smembers(&key)?
        .into_iter()
        .filter_map(|m| {
            let pair = keys::split_partsupp_member(&m);
            if pair.is_none() {
                tracing::debug!(key = %key, member = %m, "skipping malformed partsupp member");
            }
            pair
        })
        .collect();
    pairs.sort_unstable();
    Ok(pairs)
}

pub fn customers_in_segment<S: KvStore + ?Sized>(store: &S, segment: &str) -> Result<Vec<i64>> {
    let key = keys::customer_by_segment(segment);
    let members = store.smembers(&key)?;
    Ok(int_members(&key, members))
}

/// customer -> order keys, through the association index.
pub fn orders_of_customer<S: KvStore + ?Sized>(store: &S, custkey: i64) -> Result<Vec<i64>> {
    let key = keys::orders_by_customer(custkey);
    let members = store.smembers(&key)?;
    Ok(int_members(&key, members))
}

/// order -> line-item record keys, by pattern scan over the keyspace.
///
/// There is no association index for this hop, so this walks keys instead
/// of reading one set and is the slow path of Q3.
pub fn lineitems_of_order<S: KvStore + ?Sized>(store: &S, orderkey: i64) -> Result<Vec<String>> {
    store.scan(&keys::lineitems_of_order(orderkey), Some(KeyKind::Hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::store::MemoryStore;

    #[test]
    fn supplier_location_walks_two_hops() -> Result<()> {
        let store = fixtures::tiny()?;
        let s = supplier(&store, 1)?.unwrap();
        let (n, r) = supplier_location(&store, &s)?.unwrap();
        assert_eq!(n.nationkey, s.nationkey);
        assert_eq!(r.regionkey, n.regionkey);
        Ok(())
    }

    #[test]
    fn missing_links_are_none() -> Result<()> {
        let store = fixtures::tiny()?;
        assert!(supplier(&store, 999)?.is_none());
        let mut s = supplier(&store, 1)?.unwrap();
        s.nationkey = 77;
        assert!(supplier_location(&store, &s)?.is_none());
        Ok(())
    }

    #[test]
    fn lineitem_scan_stays_within_the_order() -> Result<()> {
        let store = MemoryStore::new();
        for (o, l) in [(1, 1), (1, 2), (10, 1), (11, 3), (100, 1)] {
            fixtures::put(&store, &fixtures::lineitem(o, l, "R", "F", 1.0, 10.0, 0.0, 0.0, "1994-01-01"))?;
        }
        assert_eq!(lineitems_of_order(&store, 1)?, vec!["lineitem:1:1", "lineitem:1:2"]);
        assert_eq!(lineitems_of_order(&store, 10)?, vec!["lineitem:10:1"]);
        assert!(lineitems_of_order(&store, 2)?.is_empty());
        Ok(())
    }

    #[test]
    fn fan_out_ignores_garbage_members() -> Result<()> {
        let store = MemoryStore::new();
        store.sadd(&keys::partsupp_by_part(5), "5:2")?;
        store.sadd(&keys::partsupp_by_part(5), "5:1")?;
        store.sadd(&keys::partsupp_by_part(5), "garbage")?;
        assert_eq!(partsupps_of_part(&store, 5)?, vec![(5, 1), (5, 2)]);

        store.sadd(&keys::orders_by_customer(3), "10")?;
        store.sadd(&keys::orders_by_customer(3), "9")?;
        store.sadd(&keys::orders_by_customer(3), "x")?;
        assert_eq!(orders_of_customer(&store, 3)?, vec![9, 10]);
        Ok(())
    }
}
