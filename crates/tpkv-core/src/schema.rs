//! Typed TPC-H rows and their hash-record form.
//!
//! Field names in the stored records are the TPC-H column names. Every value
//! is stored as a string, the way a Redis hash holds it.

use crate::error::{Result, TpkvError};
use crate::keys;
use crate::store::Record;
use std::str::FromStr;

pub trait Entity: Sized {
    /// Table name; also the `.tbl` file stem and the record key prefix.
    const TABLE: &'static str;
    /// Number of `|`-separated columns in a `.tbl` line.
    const COLUMNS: usize;

    fn key(&self) -> String;
    fn to_record(&self) -> Record;
    fn from_record(key: &str, record: &Record) -> Result<Self>;
    fn from_columns(cols: &mut Columns<'_>) -> std::result::Result<Self, String>;
}

/// Typed access to a stored record.
pub struct Fields<'a> {
    key: &'a str,
    record: &'a Record,
}

impl<'a> Fields<'a> {
    pub fn new(key: &'a str, record: &'a Record) -> Self {
        Self { key, record }
    }

    pub fn str(&self, field: &str) -> Result<&'a str> {
        self.record
            .get(field)
            .map(String::as_str)
            .ok_or_else(|| TpkvError::MissingField {
                key: self.key.to_string(),
                field: field.to_string(),
            })
    }

    pub fn string(&self, field: &str) -> Result<String> {
        self.str(field).map(str::to_string)
    }

    pub fn parse<T: FromStr>(&self, field: &str) -> Result<T> {
        let raw = self.str(field)?;
        raw.trim().parse().map_err(|_| TpkvError::MalformedField {
            key: self.key.to_string(),
            field: field.to_string(),
            value: raw.to_string(),
        })
    }

    /// Columns no query reads may be left out of a record; they read as empty.
    pub fn string_or_default(&self, field: &str) -> String {
        self.record.get(field).cloned().unwrap_or_default()
    }

    /// An absent field reads as `T::default()`; a present one must still parse.
    pub fn parse_or_default<T: FromStr + Default>(&self, field: &str) -> Result<T> {
        if self.record.contains_key(field) {
            self.parse(field)
        } else {
            Ok(T::default())
        }
    }

    /// A key column, falling back to segment `pos` of the record key
    /// (`partsupp:7:3` holds 7 at 1 and 3 at 2).
    pub fn key_column<T: FromStr>(&self, field: &str, pos: usize) -> Result<T> {
        if self.record.contains_key(field) {
            return self.parse(field);
        }
        self.key
            .split(':')
            .nth(pos)
            .and_then(|segment| segment.parse().ok())
            .ok_or_else(|| TpkvError::MissingField {
                key: self.key.to_string(),
                field: field.to_string(),
            })
    }
}

/// Cursor over the columns of one `.tbl` line.
pub struct Columns<'a> {
    values: &'a [&'a str],
    pos: usize,
}

impl<'a> Columns<'a> {
    pub fn new(values: &'a [&'a str]) -> Self {
        Self { values, pos: 0 }
    }

    pub fn text(&mut self, name: &str) -> std::result::Result<String, String> {
        let value = self
            .values
            .get(self.pos)
            .ok_or_else(|| format!("missing column {name}"))?;
        self.pos += 1;
        Ok((*value).to_string())
    }

    pub fn num<T: FromStr>(&mut self, name: &str) -> std::result::Result<T, String> {
        let raw = self.text(name)?;
        raw.trim()
            .parse()
            .map_err(|_| format!("column {name}: cannot parse '{raw}'"))
    }

    pub fn skip(&mut self, n: usize) {
        self.pos += n;
    }
}

fn record<const N: usize>(pairs: [(&str, String); N]) -> Record {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub regionkey: i64,
    pub name: String,
    pub comment: String,
}

impl Entity for Region {
    const TABLE: &'static str = "region";
    const COLUMNS: usize = 3;

    fn key(&self) -> String {
        keys::region(self.regionkey)
    }

    fn to_record(&self) -> Record {
        record([
            ("r_regionkey", self.regionkey.to_string()),
            ("r_name", self.name.clone()),
            ("r_comment", self.comment.clone()),
        ])
    }

    fn from_record(key: &str, record: &Record) -> Result<Self> {
        let f = Fields::new(key, record);
        Ok(Self {
            regionkey: f.key_column("r_regionkey", 1)?,
            name: f.string("r_name")?,
            comment: f.string_or_default("r_comment"),
        })
    }

    fn from_columns(cols: &mut Columns<'_>) -> std::result::Result<Self, String> {
        Ok(Self {
            regionkey: cols.num("r_regionkey")?,
            name: cols.text("r_name")?,
            comment: cols.text("r_comment")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Nation {
    pub nationkey: i64,
    pub name: String,
    pub regionkey: i64,
    pub comment: String,
}

impl Entity for Nation {
    const TABLE: &'static str = "nation";
    const COLUMNS: usize = 4;

    fn key(&self) -> String {
        keys::nation(self.nationkey)
    }

    fn to_record(&self) -> Record {
        record([
            ("n_nationkey", self.nationkey.to_string()),
            ("n_name", self.name.clone()),
            ("n_regionkey", self.regionkey.to_string()),
            ("n_comment", self.comment.clone()),
        ])
    }

    fn from_record(key: &str, record: &Record) -> Result<Self> {
        let f = Fields::new(key, record);
        Ok(Self {
            nationkey: f.key_column("n_nationkey", 1)?,
            name: f.string("n_name")?,
            regionkey: f.parse("n_regionkey")?,
            comment: f.string_or_default("n_comment"),
        })
    }

    fn from_columns(cols: &mut Columns<'_>) -> std::result::Result<Self, String> {
        Ok(Self {
            nationkey: cols.num("n_nationkey")?,
            name: cols.text("n_name")?,
            regionkey: cols.num("n_regionkey")?,
            comment: cols.text("n_comment")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Supplier {
    pub suppkey: i64,
    pub name: String,
    pub address: String,
    pub nationkey: i64,
    pub phone: String,
    pub acctbal: f64,
    pub comment: String,
}

impl Entity for Supplier {
    const TABLE: &'static str = "supplier";
    const COLUMNS: usize = 7;

    fn key(&self) -> String {
        keys::supplier(self.suppkey)
    }

    fn to_record(&self) -> Record {
        record([
            ("s_suppkey", self.suppkey.to_string()),
            ("s_name", self.name.clone()),
            ("s_address", self.address.clone()),
            ("s_nationkey", self.nationkey.to_string()),
            ("s_phone", self.phone.clone()),
            ("s_acctbal", self.acctbal.to_string()),
            ("s_comment", self.comment.clone()),
        ])
    }

    fn from_record(key: &str, record: &Record) -> Result<Self> {
        let f = Fields::new(key, record);
        Ok(Self {
            suppkey: f.key_column("s_suppkey", 1)?,
            name: f.string("s_name")?,
            address: f.string("s_address")?,
            nationkey: f.parse("s_nationkey")?,
            phone: f.string("s_phone")?,
            acctbal: f.parse("s_acctbal")?,
            comment: f.string("s_comment")?,
        })
    }

    fn from_columns(cols: &mut Columns<'_>) -> std::result::Result<Self, String> {
        Ok(Self {
            suppkey: cols.num("s_suppkey")?,
            name: cols.text("s_name")?,
            address: cols.text("s_address")?,
            nationkey: cols.num("s_nationkey")?,
            phone: cols.text("s_phone")?,
            acctbal: cols.num("s_acctbal")?,
            comment: cols.text("s_comment")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub custkey: i64,
    pub name: String,
    pub address: String,
    pub nationkey: i64,
    pub phone: String,
    pub acctbal: f64,
    pub mktsegment: String,
    pub comment: String,
}

impl Entity for Customer {
    const TABLE: &'static str = "customer";
    const COLUMNS: usize = 8;

    fn key(&self) -> String {
        keys::customer(self.custkey)
    }

    fn to_record(&self) -> Record {
        record([
            ("c_custkey", self.custkey.to_string()),
            ("c_name", self.name.clone()),
            ("c_address", self.address.clone()),
            ("c_nationkey", self.nationkey.to_string()),
            ("c_phone", self.phone.clone()),
            ("c_acctbal", self.acctbal.to_string()),
            ("c_mktsegment", self.mktsegment.clone()),
            ("c_comment", self.comment.clone()),
        ])
    }

    fn from_record(key: &str, record: &Record) -> Result<Self> {
        let f = Fields::new(key, record);
        Ok(Self {
            custkey: f.key_column("c_custkey", 1)?,
            name: f.string_or_default("c_name"),
            address: f.string_or_default("c_address"),
            nationkey: f.parse_or_default("c_nationkey")?,
            phone: f.string_or_default("c_phone"),
            acctbal: f.parse_or_default("c_acctbal")?,
            mktsegment: f.string("c_mktsegment")?,
            comment: f.string_or_default("c_comment"),
        })
    }

    fn from_columns(cols: &mut Columns<'_>) -> std::result::Result<Self, String> {
        Ok(Self {
            custkey: cols.num("c_custkey")?,
            name: cols.text("c_name")?,
            address: cols.text("c_address")?,
            nationkey: cols.num("c_nationkey")?,
            phone: cols.text("c_phone")?,
            acctbal: cols.num("c_acctbal")?,
            mktsegment: cols.text("c_mktsegment")?,
            comment: cols.text("c_comment")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub partkey: i64,
    pub name: String,
    pub mfgr: String,
    pub brand: String,
    pub type_: String,
    pub size: i64,
    pub container: String,
    pub retailprice: f64,
    pub comment: String,
}

impl Entity for Part {
    const TABLE: &'static str = "part";
    const COLUMNS: usize = 9;

    fn key(&self) -> String {
        keys::part(self.partkey)
    }

    fn to_record(&self) -> Record {
        record([
            ("p_partkey", self.partkey.to_string()),
            ("p_name", self.name.clone()),
            ("p_mfgr", self.mfgr.clone()),
            ("p_brand", self.brand.clone()),
            ("p_type", self.type_.clone()),
            ("p_size", self.size.to_string()),
            ("p_container", self.container.clone()),
            ("p_retailprice", self.retailprice.to_string()),
            ("p_comment", self.comment.clone()),
        ])
    }

    fn from_record(key: &str, record: &Record) -> Result<Self> {
        let f = Fields::new(key, record);
        Ok(Self {
            partkey: f.key_column("p_partkey", 1)?,
            name: f.string_or_default("p_name"),
            mfgr: f.string("p_mfgr")?,
            brand: f.string_or_default("p_brand"),
            type_: f.string("p_type")?,
            size: f.parse("p_size")?,
            container: f.string_or_default("p_container"),
            retailprice: f.parse_or_default("p_retailprice")?,
            comment: f.string_or_default("p_comment"),
        })
    }

    fn from_columns(cols: &mut Columns<'_>) -> std::result::Result<Self, String> {
        Ok(Self {
            partkey: cols.num("p_partkey")?,
            name: cols.text("p_name")?,
            mfgr: cols.text("p_mfgr")?,
            brand: cols.text("p_brand")?,
            type_: cols.text("p_type")?,
            size: cols.num("p_size")?,
            container: cols.text("p_container")?,
            retailprice: cols.num("p_retailprice")?,
            comment: cols.text("p_comment")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartSupp {
    pub partkey: i64,
    pub suppkey: i64,
    pub availqty: i64,
    pub supplycost: f64,
    pub comment: String,
}

impl Entity for PartSupp {
    const TABLE: &'static str = "partsupp";
    const COLUMNS: usize = 5;

    fn key(&self) -> String {
        keys::partsupp(self.partkey, self.suppkey)
    }

    fn to_record(&self) -> Record {
        record([
            ("ps_partkey", self.partkey.to_string()),
            ("ps_suppkey", self.suppkey.to_string()),
            ("ps_availqty", self.availqty.to_string()),
            ("ps_supplycost", self.supplycost.to_string()),
            ("ps_comment", self.comment.clone()),
        ])
    }

    fn from_record(key: &str, record: &Record) -> Result<Self> {
        let f = Fields::new(key, record);
        Ok(Self {
            partkey: f.key_column("ps_partkey", 1)?,
            suppkey: f.key_column("ps_suppkey", 2)?,
            availqty: f.parse_or_default("ps_availqty")?,
            supplycost: f.parse("ps_supplycost")?,
            comment: f.string_or_default("ps_comment"),
        })
    }

    fn from_columns(cols: &mut Columns<'_>) -> std::result::Result<Self, String> {
        Ok(Self {
            partkey: cols.num("ps_partkey")?,
            suppkey: cols.num("ps_suppkey")?,
            availqty: cols.num("ps_availqty")?,
            supplycost: cols.num("ps_supplycost")?,
            comment: cols.text("ps_comment")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub orderkey: i64,
    pub custkey: i64,
    pub orderstatus: String,
    pub totalprice: f64,
    pub orderdate: String,
    pub orderpriority: String,
    pub clerk: String,
    pub shippriority: i64,
    pub comment: String,
}

impl Entity for Order {
    const TABLE: &'static str = "orders";
    const COLUMNS: usize = 9;

    fn key(&self) -> String {
        keys::orders(self.orderkey)
    }

    fn to_record(&self) -> Record {
        record([
            ("o_orderkey", self.orderkey.to_string()),
            ("o_custkey", self.custkey.to_string()),
            ("o_orderstatus", self.orderstatus.clone()),
            ("o_totalprice", self.totalprice.to_string()),
            ("o_orderdate", self.orderdate.clone()),
            ("o_orderpriority", self.orderpriority.clone()),
            ("o_clerk", self.clerk.clone()),
            ("o_shippriority", self.shippriority.to_string()),
            ("o_comment", self.comment.clone()),
        ])
    }

    fn from_record(key: &str, record: &Record) -> Result<Self> {
        let f = Fields::new(key, record);
        Ok(Self {
            orderkey: f.key_column("o_orderkey", 1)?,
            custkey: f.parse("o_custkey")?,
            orderstatus: f.string_or_default("o_orderstatus"),
            totalprice: f.parse_or_default("o_totalprice")?,
            orderdate: f.string("o_orderdate")?,
            orderpriority: f.string_or_default("o_orderpriority"),
            clerk: f.string_or_default("o_clerk"),
            shippriority: f.parse("o_shippriority")?,
            comment: f.string_or_default("o_comment"),
        })
    }

    fn from_columns(cols: &mut Columns<'_>) -> std::result::Result<Self, String> {
        Ok(Self {
            orderkey: cols.num("o_orderkey")?,
            custkey: cols.num("o_custkey")?,
            orderstatus: cols.text("o_orderstatus")?,
            totalprice: cols.num("o_totalprice")?,
            orderdate: cols.text("o_orderdate")?,
            orderpriority: cols.text("o_orderpriority")?,
            clerk: cols.text("o_clerk")?,
            shippriority: cols.num("o_shippriority")?,
            comment: cols.text("o_comment")?,
        })
    }
}

/// Only the columns the queries read are kept; the rest of a lineitem line
/// is skipped at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub orderkey: i64,
    pub linenumber: i64,
    pub quantity: f64,
    pub extendedprice: f64,
    pub discount: f64,
    pub tax: f64,
    pub returnflag: String,
    pub linestatus: String,
    pub shipdate: String,
}

impl LineItem {
    pub fn disc_price(&self) -> f64 {
        self.extendedprice * (1.0 - self.discount)
    }
}

impl Entity for LineItem {
    const TABLE: &'static str = "lineitem";
    const COLUMNS: usize = 16;

    fn key(&self) -> String {
        keys::lineitem(self.orderkey, self.linenumber)
    }

    fn to_record(&self) -> Record {
        record([
            ("l_orderkey", self.orderkey.to_string()),
            ("l_linenumber", self.linenumber.to_string()),
            ("l_quantity", self.quantity.to_string()),
            ("l_extendedprice", self.extendedprice.to_string()),
            ("l_discount", self.discount.to_string()),
            ("l_tax", self.tax.to_string()),
            ("l_returnflag", self.returnflag.clone()),
            ("l_linestatus", self.linestatus.clone()),
            ("l_shipdate", self.shipdate.clone()),
        ])
    }

    fn from_record(key: &str, record: &Record) -> Result<Self> {
        let f = Fields::new(key, record);
        Ok(Self {
            orderkey: f.key_column("l_orderkey", 1)?,
            linenumber: f.key_column("l_linenumber", 2)?,
            quantity: f.parse("l_quantity")?,
            extendedprice: f.parse("l_extendedprice")?,
            discount: f.parse("l_discount")?,
            tax: f.parse("l_tax")?,
            returnflag: f.string("l_returnflag")?,
            linestatus: f.string("l_linestatus")?,
            shipdate: f.string("l_shipdate")?,
        })
    }

    fn from_columns(cols: &mut Columns<'_>) -> std::result::Result<Self, String> {
        let orderkey = cols.num("l_orderkey")?;
        // l_partkey, l_suppkey
        cols.skip(2);
        Ok(Self {
            orderkey,
            linenumber: cols.num("l_linenumber")?,
            quantity: cols.num("l_quantity")?,
            extendedprice: cols.num("l_extendedprice")?,
            discount: cols.num("l_discount")?,
            tax: cols.num("l_tax")?,
            returnflag: cols.text("l_returnflag")?,
            linestatus: cols.text("l_linestatus")?,
            shipdate: cols.text("l_shipdate")?,
        })
    }
}

/// Split one `.tbl` line into columns, dropping the trailing empty field
/// left by the terminating `|`.
pub fn split_tbl_line(line: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('|').collect();
    if parts.last() == Some(&"") {
        parts.pop();
    }
    parts
}

pub fn parse_tbl_line<E: Entity>(line: &str) -> std::result::Result<E, String> {
    let parts = split_tbl_line(line);
    if parts.len() != E::COLUMNS {
        return Err(format!(
            "expected {} columns for {}, found {}",
            E::COLUMNS,
            E::TABLE,
            parts.len()
        ));
    }
    E::from_columns(&mut Columns::new(&parts))
}
