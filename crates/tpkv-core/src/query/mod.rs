//! Hand-written executors for TPC-H Q1, Q2 and Q3.
//!
//! Each executor composes store primitives and the hops in [`crate::join`];
//! none of them takes parameters, the TPC-H substitution values are
//! constants of the module.

pub mod q1;
pub mod q2;
pub mod q3;

use crate::error::Result;
use crate::store::KvStore;
use serde::Serialize;

pub use q1::PricingSummaryRow;
pub use q2::MinCostSupplierRow;
pub use q3::ShippingPriorityRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Q1,
    Q2,
    Q3,
}

impl Query {
    pub const ALL: [Query; 3] = [Query::Q1, Query::Q2, Query::Q3];

    pub fn name(self) -> &'static str {
        match self {
            Query::Q1 => "q1",
            Query::Q2 => "q2",
            Query::Q3 => "q3",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Query::Q1 => "pricing summary report",
            Query::Q2 => "minimum cost supplier",
            Query::Q3 => "shipping priority",
        }
    }

    pub fn run<S: KvStore + ?Sized>(self, store: &S) -> Result<QueryOutput> {
        Ok(match self {
            Query::Q1 => QueryOutput::Q1(q1::run(store)?),
            Query::Q2 => QueryOutput::Q2(q2::run(store)?),
            Query::Q3 => QueryOutput::Q3(q3::run(store)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutput {
    Q1(Vec<PricingSummaryRow>),
    Q2(Vec<MinCostSupplierRow>),
    Q3(Vec<ShippingPriorityRow>),
}

impl QueryOutput {
    pub fn len(&self) -> usize {
        match self {
            QueryOutput::Q1(rows) => rows.len(),
            QueryOutput::Q2(rows) => rows.len(),
            QueryOutput::Q3(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep only the first `n` rows.
    pub fn truncate(&mut self, n: usize) {
        match self {
            QueryOutput::Q1(rows) => rows.truncate(n),
            QueryOutput::Q2(rows) => rows.truncate(n),
            QueryOutput::Q3(rows) => rows.truncate(n),
        }
    }
}
