//! Small hand-made TPC-H dataset shared by the unit tests.

use crate::error::Result;
use crate::index;
use crate::schema::{Customer, Entity, LineItem, Nation, Order, Part, PartSupp, Region, Supplier};
use crate::store::{KvStore, MemoryStore};

pub fn put<E: Entity, S: KvStore + ?Sized>(store: &S, row: &E) -> Result<()> {
    store.hset(&row.key(), row.to_record())
}

pub fn region(regionkey: i64, name: &str) -> Region {
    Region {
        regionkey,
        name: name.into(),
        comment: String::new(),
    }
}

pub fn nation(nationkey: i64, name: &str, regionkey: i64) -> Nation {
    Nation {
        nationkey,
        name: name.into(),
        regionkey,
        comment: String::new(),
    }
}

pub fn supplier(suppkey: i64, nationkey: i64, acctbal: f64) -> Supplier {
    Supplier {
        suppkey,
        name: format!("Supplier#{suppkey:09}"),
        address: format!("addr {suppkey}"),
        nationkey,
        phone: format!("10-000-000-{suppkey:04}"),
        acctbal,
        comment: format!("supplier {suppkey}"),
    }
}

pub fn part(partkey: i64, type_: &str, size: i64) -> Part {
    Part {
        partkey,
        name: format!("part {partkey}"),
        mfgr: format!("Manufacturer#{}", partkey % 5 + 1),
        brand: "Brand#13".into(),
        type_: type_.into(),
        size,
        container: "JUMBO PKG".into(),
        retailprice: 901.0,
        comment: String::new(),
    }
}

pub fn partsupp(partkey: i64, suppkey: i64, supplycost: f64) -> PartSupp {
    PartSupp {
        partkey,
        suppkey,
        availqty: 100,
        supplycost,
        comment: String::new(),
    }
}

pub fn customer(custkey: i64, mktsegment: &str) -> Customer {
    Customer {
        custkey,
        name: format!("Customer#{custkey:09}"),
        address: String::new(),
        nationkey: 7,
        phone: String::new(),
        acctbal: 0.0,
        mktsegment: mktsegment.into(),
        comment: String::new(),
    }
}

pub fn order(orderkey: i64, custkey: i64, orderdate: &str, shippriority: i64) -> Order {
    Order {
        orderkey,
        custkey,
        orderstatus: "O".into(),
        totalprice: 0.0,
        orderdate: orderdate.into(),
        orderpriority: "1-URGENT".into(),
        clerk: "Clerk#000000001".into(),
        shippriority,
        comment: String::new(),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn lineitem(
    orderkey: i64,
    linenumber: i64,
    returnflag: &str,
    linestatus: &str,
    quantity: f64,
    extendedprice: f64,
    discount: f64,
    tax: f64,
    shipdate: &str,
) -> LineItem {
    LineItem {
        orderkey,
        linenumber,
        quantity,
        extendedprice,
        discount,
        tax,
        returnflag: returnflag.into(),
        linestatus: linestatus.into(),
        shipdate: shipdate.into(),
    }
}

/// A few rows of every table with the indexes already built.
///
/// Q2 winners: part 10 has suppliers 2 (GERMANY) and 4 (ROMANIA) tied at the
/// minimum EUROPE cost, part 11 has supplier 5. Supplier 3 is in AMERICA and
/// undercuts everyone. Q3 groups: order 1000 (2000.0), then orders 103 and
/// 100 tied at 1000.0.
pub fn tiny() -> Result<MemoryStore> {
    let store = MemoryStore::new();
    for (k, name) in [(0, "AFRICA"), (1, "AMERICA"), (2, "ASIA"), (3, "EUROPE"), (4, "MIDDLE EAST")] {
        put(&store, &region(k, name))?;
    }
    for (k, name, r) in [(1, "ARGENTINA", 1), (6, "FRANCE", 3), (7, "GERMANY", 3), (19, "ROMANIA", 3)] {
        put(&store, &nation(k, name, r))?;
    }
    for (k, n, bal) in [(1, 6, 500.0), (2, 7, 900.0), (3, 1, 9000.0), (4, 19, 900.0), (5, 7, 100.0)] {
        put(&store, &supplier(k, n, bal))?;
    }
    for (k, t, size) in [
        (10, "LARGE BRUSHED BRASS", 15),
        (11, "SMALL PLATED BRASS", 15),
        (12, "STANDARD POLISHED TIN", 15),
        (13, "ECONOMY ANODIZED BRASS", 20),
        (14, "PROMO BURNISHED BRASS", 15),
    ] {
        put(&store, &part(k, t, size))?;
    }
    for (p, s, cost) in [
        (10, 1, 50.0),
        (10, 2, 20.0),
        (10, 3, 5.0),
        (10, 4, 20.0),
        (11, 5, 30.0),
        (11, 1, 31.0),
        (12, 1, 1.0),
        (13, 2, 1.0),
        (14, 3, 2.0),
    ] {
        put(&store, &partsupp(p, s, cost))?;
    }
    for (k, seg) in [(1, "BUILDING"), (2, "AUTOMOBILE"), (3, "BUILDING")] {
        put(&store, &customer(k, seg))?;
    }
    for (o, c, date, prio) in [
        (100, 1, "1995-03-10", 0),
        (101, 1, "1995-03-15", 0),
        (102, 2, "1995-01-01", 0),
        (103, 3, "1995-02-01", 1),
        (104, 3, "1995-03-01", 0),
        (105, 2, "1998-08-01", 0),
        (1000, 1, "1995-01-05", 0),
    ] {
        put(&store, &order(o, c, date, prio))?;
    }
    for item in [
        lineitem(100, 1, "N", "O", 10.0, 1000.0, 0.5, 0.1, "1995-03-20"),
        lineitem(100, 2, "R", "F", 5.0, 500.0, 0.0, 0.0, "1995-03-14"),
        lineitem(100, 3, "N", "O", 7.0, 500.0, 0.0, 0.05, "1995-04-01"),
        lineitem(101, 1, "N", "O", 3.0, 999.0, 0.0, 0.0, "1995-04-01"),
        lineitem(102, 1, "A", "F", 4.0, 400.0, 0.1, 0.0, "1995-05-01"),
        lineitem(103, 1, "N", "O", 8.0, 1000.0, 0.0, 0.0, "1995-03-16"),
        lineitem(104, 1, "R", "F", 2.0, 200.0, 0.0, 0.0, "1995-03-15"),
        lineitem(105, 1, "N", "O", 9.0, 900.0, 0.0, 0.0, "1998-09-03"),
        lineitem(105, 2, "N", "F", 6.0, 600.0, 0.02, 0.04, "1998-09-02"),
        lineitem(1000, 1, "A", "F", 20.0, 2000.0, 0.0, 0.0, "1995-06-01"),
    ] {
        put(&store, &item)?;
    }
    index::build_all(&store)?;
    Ok(store)
}
