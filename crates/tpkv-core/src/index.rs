//! Secondary indexes derived from the hash records.
//!
//! Every builder is a pure function of the records currently in the store:
//! it returns an owned index value, and `write_to` materializes that value as
//! sets or sorted sets. Set and sorted-set inserts are idempotent, so running
//! the builders again over an unchanged store converges to the same layout.

use crate::date;
use crate::error::Result;
use crate::keys;
use crate::schema::Fields;
use crate::store::{KeyKind, KvStore, Record};
use std::collections::{BTreeMap, BTreeSet};

/// Part type suffixes that get their own equality bucket.
pub const TYPE_SUFFIXES: &[&str] = &["BRASS"];

/// Bucket label -> member set, stored under `{prefix}:{label}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetIndex {
    prefix: String,
    buckets: BTreeMap<String, BTreeSet<String>>,
}

pub type EqualityIndex = SetIndex;
pub type AssociationIndex = SetIndex;

impl SetIndex {
    fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            buckets: BTreeMap::new(),
        }
    }

    fn insert(&mut self, label: String, member: String) {
        self.buckets.entry(label).or_default().insert(member);
    }

    pub fn store_key(&self, label: &str) -> String {
        format!("{}:{label}", self.prefix)
    }

    pub fn bucket(&self, label: &str) -> Option<&BTreeSet<String>> {
        self.buckets.get(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn member_count(&self) -> usize {
        self.buckets.values().map(BTreeSet::len).sum()
    }

    pub fn write_to<S: KvStore + ?Sized>(&self, store: &S) -> Result<usize> {
        let mut written = 0;
        for (label, members) in &self.buckets {
            let key = self.store_key(label);
            for member in members {
                store.sadd(&key, member)?;
                written += 1;
            }
        }
        Ok(written)
    }
}

/// Member -> integer score, stored as one sorted set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedIndex {
    key: String,
    scores: BTreeMap<String, i64>,
}

impl OrderedIndex {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn score(&self, member: &str) -> Option<i64> {
        self.scores.get(member).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Members scored within `[min, max]`, ascending by score then member.
    pub fn range(&self, min: i64, max: i64) -> Vec<&str> {
        let mut hits: Vec<(i64, &str)> = self
            .scores
            .iter()
            .filter(|(_, s)| (min..=max).contains(*s))
            .map(|(m, s)| (*s, m.as_str()))
            .collect();
        hits.sort_unstable();
        hits.into_iter().map(|(_, m)| m).collect()
    }

    pub fn write_to<S: KvStore + ?Sized>(&self, store: &S) -> Result<usize> {
        for (member, score) in &self.scores {
            store.zadd(&self.key, member, *score)?;
        }
        Ok(self.scores.len())
    }
}

/// What an index stores for each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    /// Record key without the `{table}:` prefix: `7` for `part:7`,
    /// `7:3` for `partsupp:7:3`.
    PrimaryKey,
    /// The full record key.
    RecordKey,
}

impl Member {
    fn of(self, table: &str, key: &str) -> String {
        match self {
            Member::RecordKey => key.to_string(),
            Member::PrimaryKey => key
                .strip_prefix(table)
                .and_then(|rest| rest.strip_prefix(':'))
                .unwrap_or(key)
                .to_string(),
        }
    }
}

/// Snapshot of every hash record of `table`, in key order.
pub fn records<S: KvStore + ?Sized>(store: &S, table: &str) -> Result<Vec<(String, Record)>> {
    let mut out = Vec::new();
    for key in store.scan(&format!("{table}:*"), Some(KeyKind::Hash))? {
        if let Some(record) = store.hgetall(&key)? {
            out.push((key, record));
        }
    }
    Ok(out)
}

/// Bucket each record's primary key under the label `predicate` derives from
/// `field`; records for which it yields `None` are left out.
pub fn build_equality_index<S, P>(
    store: &S,
    table: &str,
    field: &str,
    prefix: &str,
    predicate: P,
) -> Result<EqualityIndex>
where
    S: KvStore + ?Sized,
    P: Fn(&str) -> Option<String>,
{
    let mut index = SetIndex::new(prefix);
    for (key, record) in records(store, table)? {
        let value = Fields::new(&key, &record).str(field)?;
        if let Some(label) = predicate(value) {
            index.insert(label, Member::PrimaryKey.of(table, &key));
        }
    }
    Ok(index)
}

/// One-to-many fan-out: foreign key value -> child primary keys.
pub fn build_association_index<S: KvStore + ?Sized>(
    store: &S,
    child_table: &str,
    foreign_key: &str,
    prefix: &str,
) -> Result<AssociationIndex> {
    let mut index = SetIndex::new(prefix);
    for (key, record) in records(store, child_table)? {
        let parent = Fields::new(&key, &record).str(foreign_key)?.trim().to_string();
        index.insert(parent, Member::PrimaryKey.of(child_table, &key));
    }
    Ok(index)
}

pub fn build_ordered_index<S: KvStore + ?Sized>(
    store: &S,
    table: &str,
    date_field: &str,
    index_key: &str,
    member: Member,
) -> Result<OrderedIndex> {
    let mut scores = BTreeMap::new();
    for (key, record) in records(store, table)? {
        let score = date::encode(Fields::new(&key, &record).str(date_field)?)?;
        scores.insert(member.of(table, &key), score);
    }
    Ok(OrderedIndex {
        key: index_key.to_string(),
        scores,
    })
}

pub fn size_label(value: &str) -> Option<String> {
    Some(value.trim().to_string())
}

pub fn segment_label(value: &str) -> Option<String> {
    Some(value.trim().to_string())
}

pub fn type_suffix_label(value: &str) -> Option<String> {
    let value = value.trim();
    TYPE_SUFFIXES
        .iter()
        .find(|suffix| value.ends_with(*suffix))
        .map(|suffix| (*suffix).to_string())
}

#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    /// (index name, members written)
    pub written: Vec<(String, usize)>,
}

impl IndexReport {
    fn record(&mut self, name: &str, count: usize) {
        tracing::info!(index = name, members = count, "index written");
        self.written.push((name.to_string(), count));
    }
}

/// Build and write the whole secondary-index layout the queries rely on.
///
/// Must not run concurrently with a load into the same store.
pub fn build_all<S: KvStore + ?Sized>(store: &S) -> Result<IndexReport> {
    let mut report = IndexReport::default();

    let by_size = build_equality_index(store, "part", "p_size", keys::PART_BY_SIZE, size_label)?;
    report.record(keys::PART_BY_SIZE, by_size.write_to(store)?);

    let by_type = build_equality_index(
        store,
        "part",
        "p_type",
        keys::PART_BY_TYPE,
        type_suffix_label,
    )?;
    report.record(keys::PART_BY_TYPE, by_type.write_to(store)?);

    let by_segment = build_equality_index(
        store,
        "customer",
        "c_mktsegment",
        keys::CUSTOMER_BY_SEGMENT,
        segment_label,
    )?;
    report.record(keys::CUSTOMER_BY_SEGMENT, by_segment.write_to(store)?);

    let by_customer =
        build_association_index(store, "orders", "o_custkey", keys::ORDERS_BY_CUSTOMER)?;
    report.record(keys::ORDERS_BY_CUSTOMER, by_customer.write_to(store)?);

    let by_part = build_association_index(store, "partsupp", "ps_partkey", keys::PARTSUPP_BY_PART)?;
    report.record(keys::PARTSUPP_BY_PART, by_part.write_to(store)?);

    let by_date = build_ordered_index(
        store,
        "orders",
        "o_orderdate",
        keys::ORDERS_BY_DATE,
        Member::PrimaryKey,
    )?;
    report.record(keys::ORDERS_BY_DATE, by_date.write_to(store)?);

    let by_shipdate = build_ordered_index(
        store,
        "lineitem",
        "l_shipdate",
        keys::LINEITEM_BY_SHIPDATE,
        Member::RecordKey,
    )?;
    report.record(keys::LINEITEM_BY_SHIPDATE, by_shipdate.write_to(store)?);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::store::MemoryStore;

    #[test]
    fn equality_buckets_are_exact() -> Result<()> {
        let store = fixtures::tiny()?;
        let by_size = build_equality_index(&store, "part", "p_size", keys::PART_BY_SIZE, size_label)?;
        for label in by_size.labels() {
            for member in by_size.bucket(label).unwrap() {
                let rec = store.hgetall(&keys::part(member.parse().unwrap()))?.unwrap();
                assert_eq!(rec["p_size"], label);
            }
        }
        let parts = records(&store, "part")?;
        assert_eq!(by_size.member_count(), parts.len());

        let by_type = build_equality_index(&store, "part", "p_type", keys::PART_BY_TYPE, type_suffix_label)?;
        let brass: Vec<String> = parts
            .iter()
            .filter(|(_, r)| r["p_type"].ends_with("BRASS"))
            .map(|(k, _)| k.trim_start_matches("part:").to_string())
            .collect();
        assert_eq!(
            by_type.bucket("BRASS").cloned().unwrap_or_default(),
            brass.into_iter().collect::<BTreeSet<_>>()
        );
        assert_eq!(by_type.labels().count(), 1);
        Ok(())
    }

    #[test]
    fn brass_must_be_a_suffix() {
        assert_eq!(type_suffix_label("LARGE POLISHED BRASS"), Some("BRASS".into()));
        assert_eq!(type_suffix_label("BRASS PLATED TIN"), None);
    }

    #[test]
    fn association_lists_every_child_once() -> Result<()> {
        let store = fixtures::tiny()?;
        let idx = build_association_index(&store, "partsupp", "ps_partkey", keys::PARTSUPP_BY_PART)?;
        let pairs = idx.bucket("10").unwrap();
        assert!(pairs.iter().all(|m| m.starts_with("10:")));
        let expected = store.scan("partsupp:10:*", Some(KeyKind::Hash))?.len();
        assert_eq!(pairs.len(), expected);
        assert_eq!(expected, 4);
        assert_eq!(idx.store_key("10"), keys::partsupp_by_part(10));
        Ok(())
    }

    #[test]
    fn ordered_range_is_closed_and_sorted() -> Result<()> {
        let store = MemoryStore::new();
        for (o, d) in [(1, "1995-03-15"), (2, "1994-01-01"), (3, "1996-06-30")] {
            let mut rec = Record::new();
            rec.insert("o_orderdate".into(), d.into());
            store.hset(&keys::orders(o), rec)?;
        }
        let idx = build_ordered_index(&store, "orders", "o_orderdate", keys::ORDERS_BY_DATE, Member::PrimaryKey)?;
        assert_eq!(idx.range(i64::MIN, date::encode("1995-03-15")?), vec!["2", "1"]);
        assert_eq!(idx.score("3"), Some(date::encode("1996-06-30")?));
        idx.write_to(&store)?;
        assert_eq!(
            store.zrangebyscore(keys::ORDERS_BY_DATE, date::encode("1995-01-01")?, i64::MAX)?,
            vec!["1", "3"]
        );
        Ok(())
    }

    #[test]
    fn malformed_date_fails_the_build() -> Result<()> {
        let store = MemoryStore::new();
        let mut rec = Record::new();
        rec.insert("l_shipdate".into(), "1995-02-31".into());
        store.hset("lineitem:1:1", rec)?;
        let res = build_ordered_index(&store, "lineitem", "l_shipdate", keys::LINEITEM_BY_SHIPDATE, Member::RecordKey);
        assert!(matches!(res, Err(crate::TpkvError::MalformedDate(_))));
        Ok(())
    }

    #[test]
    fn rebuild_converges() -> Result<()> {
        let store = fixtures::tiny()?;
        let first = store.stats()?;
        build_all(&store)?;
        let second = store.stats()?;
        assert_eq!(first.keys, second.keys);
        assert_eq!(
            store.smembers(&keys::part_by_size(15))?,
            build_equality_index(&store, "part", "p_size", keys::PART_BY_SIZE, size_label)?
                .bucket("15")
                .cloned()
                .unwrap_or_default()
        );
        Ok(())
    }

    #[test]
    fn segments_partition_the_customers() -> Result<()> {
        let store = fixtures::tiny()?;
        let idx = build_equality_index(
            &store,
            "customer",
            "c_mktsegment",
            keys::CUSTOMER_BY_SEGMENT,
            segment_label,
        )?;
        let customers: BTreeSet<String> = records(&store, "customer")?
            .into_iter()
            .map(|(key, _)| Member::PrimaryKey.of("customer", &key))
            .collect();

        let mut seen = BTreeSet::new();
        for label in idx.labels() {
            for member in idx.bucket(label).unwrap() {
                assert!(seen.insert(member.clone()), "{member} in two segments");
                let rec = store.hgetall(&keys::customer(member.parse().unwrap()))?.unwrap();
                assert_eq!(rec["c_mktsegment"].trim(), label);
            }
        }
        assert_eq!(seen, customers);
        assert_eq!(idx.member_count(), customers.len());
        Ok(())
    }

    #[test]
    fn orders_by_customer_matches_the_foreign_key() -> Result<()> {
        let store = fixtures::tiny()?;
        let idx = build_association_index(&store, "orders", "o_custkey", keys::ORDERS_BY_CUSTOMER)?;

        let mut expected: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (key, rec) in records(&store, "orders")? {
            expected
                .entry(rec["o_custkey"].clone())
                .or_default()
                .insert(Member::PrimaryKey.of("orders", &key));
        }
        assert_eq!(idx.labels().collect::<Vec<_>>(), expected.keys().map(String::as_str).collect::<Vec<_>>());
        for (custkey, orders) in &expected {
            assert_eq!(idx.bucket(custkey), Some(orders));
            let stored = store.smembers(&keys::orders_by_customer(custkey.parse().unwrap()))?;
            assert_eq!(&stored, orders);
        }
        assert_eq!(idx.member_count(), records(&store, "orders")?.len());
        Ok(())
    }

    #[test]
    fn labels_ignore_surrounding_whitespace() {
        assert_eq!(segment_label(" BUILDING "), Some("BUILDING".into()));
        assert_eq!(type_suffix_label("SMALL PLATED BRASS "), Some("BRASS".into()));
    }
}
