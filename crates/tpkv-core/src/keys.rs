//! Names of every record and index key in the store.

pub fn region(regionkey: i64) -> String {
    format!("region:{regionkey}")
}

pub fn nation(nationkey: i64) -> String {
    format!("nation:{nationkey}")
}

pub fn supplier(suppkey: i64) -> String {
    format!("supplier:{suppkey}")
}

pub fn customer(custkey: i64) -> String {
    format!("customer:{custkey}")
}

pub fn part(partkey: i64) -> String {
    format!("part:{partkey}")
}

pub fn partsupp(partkey: i64, suppkey: i64) -> String {
    format!("partsupp:{partkey}:{suppkey}")
}

pub fn orders(orderkey: i64) -> String {
    format!("orders:{orderkey}")
}

pub fn lineitem(orderkey: i64, linenumber: i64) -> String {
    format!("lineitem:{orderkey}:{linenumber}")
}

/// Scan pattern for every line item of one order.
pub fn lineitems_of_order(orderkey: i64) -> String {
    format!("lineitem:{orderkey}:*")
}

pub const PART_BY_SIZE: &str = "part:size";
pub const PART_BY_TYPE: &str = "part:type";
pub const CUSTOMER_BY_SEGMENT: &str = "customer:segment";
pub const PARTSUPP_BY_PART: &str = "partsupp:by_part";

pub fn part_by_size(size: i64) -> String {
    format!("{PART_BY_SIZE}:{size}")
}

pub fn part_by_type_suffix(suffix: &str) -> String {
    format!("{PART_BY_TYPE}:{suffix}")
}

pub fn customer_by_segment(segment: &str) -> String {
    format!("{CUSTOMER_BY_SEGMENT}:{segment}")
}

pub const ORDERS_BY_CUSTOMER: &str = "orders:by_customer";

pub fn orders_by_customer(custkey: i64) -> String {
    format!("{ORDERS_BY_CUSTOMER}:{custkey}")
}

pub fn partsupp_by_part(partkey: i64) -> String {
    format!("{PARTSUPP_BY_PART}:{partkey}")
}

pub const ORDERS_BY_DATE: &str = "orders:by_date";
pub const LINEITEM_BY_SHIPDATE: &str = "lineitem:by_shipdate";

/// Member stored in `partsupp:by_part:{p}`.
pub fn partsupp_member(partkey: i64, suppkey: i64) -> String {
    format!("{partkey}:{suppkey}")
}

/// Inverse of [`partsupp_member`]; `None` for anything else.
pub fn split_partsupp_member(member: &str) -> Option<(i64, i64)> {
    let (p, s) = member.split_once(':')?;
    Some((p.parse().ok()?, s.parse().ok()?))
}
