//! Schema catalogue shared by all backends: property types, relationship
//! endpoints and the canonical index set.

use serde::Serialize;

use crate::model::{Label, RelType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PropertyType {
    Int,
    Float,
    Text,
}

use PropertyType::{Float, Int, Text};

/// Properties carried by nodes of `label`, in the order the mapping
/// emits them
pub fn node_properties(label: Label) -> &'static [(&'static str, PropertyType)] {
    match label {
        Label::Region => &[("regionkey", Int), ("name", Text), ("comment", Text)],
        Label::Nation => &[("nationkey", Int), ("name", Text), ("comment", Text)],
        Label::Supplier => &[
            ("suppkey", Int),
            ("name", Text),
            ("address", Text),
            ("phone", Text),
            ("acctbal", Float),
            ("comment", Text),
        ],
        Label::Customer => &[
            ("custkey", Int),
            ("name", Text),
            ("address", Text),
            ("phone", Text),
            ("acctbal", Float),
            ("mktsegment", Text),
            ("comment", Text),
        ],
        Label::Part => &[
            ("partkey", Int),
            ("name", Text),
            ("mfgr", Text),
            ("brand", Text),
            ("type", Text),
            ("size", Int),
            ("container", Text),
            ("retailprice", Float),
            ("comment", Text),
        ],
        Label::Order => &[
            ("orderkey", Int),
            ("orderstatus", Text),
            ("totalprice", Float),
            ("orderdate", Text),
            ("orderpriority", Text),
            ("clerk", Text),
            ("shippriority", Int),
            ("comment", Text),
        ],
        Label::LineItem => &[
            ("orderkey", Int),
            ("partkey", Int),
            ("suppkey", Int),
            ("linenumber", Int),
            ("quantity", Float),
            ("extendedprice", Float),
            ("discount", Float),
            ("tax", Float),
            ("returnflag", Text),
            ("linestatus", Text),
            ("shipdate", Text),
            ("commitdate", Text),
            ("receiptdate", Text),
            ("shipinstruct", Text),
            ("shipmode", Text),
            ("comment", Text),
        ],
    }
}

/// Properties carried by relationships of `rel`
pub fn edge_properties(rel: RelType) -> &'static [(&'static str, PropertyType)] {
    match rel {
        RelType::Supplies => &[
            ("availqty", Int),
            ("supplycost", Float),
            ("comment", Text),
        ],
        _ => &[],
    }
}

pub fn property_type(label: Label, name: &str) -> Option<PropertyType> {
    node_properties(label)
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, t)| *t)
}

/// Labels a relationship type connects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEndpoints {
    pub from: &'static [Label],
    pub to: Label,
}

pub fn edge_endpoints(rel: RelType) -> EdgeEndpoints {
    let (from, to): (&'static [Label], Label) = match rel {
        RelType::BelongsTo => (&[Label::Nation], Label::Region),
        RelType::LocatedIn => (&[Label::Supplier, Label::Customer], Label::Nation),
        RelType::Placed => (&[Label::Customer], Label::Order),
        RelType::Supplies => (&[Label::Supplier], Label::Part),
        RelType::Contains => (&[Label::Order], Label::LineItem),
        RelType::OfPart => (&[Label::LineItem], Label::Part),
        RelType::SuppliedBy => (&[Label::LineItem], Label::Supplier),
    };
    EdgeEndpoints { from, to }
}

/// A secondary index on node properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexSpec {
    pub name: &'static str,
    pub label: Label,
    pub properties: &'static [&'static str],
    pub unique: bool,
}

impl IndexSpec {
    pub const fn new(name: &'static str, label: Label, properties: &'static [&'static str]) -> Self {
        Self {
            name,
            label,
            properties,
            unique: false,
        }
    }

    pub const fn unique(self) -> Self {
        Self {
            unique: true,
            ..self
        }
    }
}

pub const REGION_KEY: IndexSpec = IndexSpec::new("region_key", Label::Region, &["regionkey"]).unique();
pub const NATION_KEY: IndexSpec = IndexSpec::new("nation_key", Label::Nation, &["nationkey"]).unique();
pub const SUPPLIER_KEY: IndexSpec =
    IndexSpec::new("supplier_key", Label::Supplier, &["suppkey"]).unique();
pub const CUSTOMER_KEY: IndexSpec =
    IndexSpec::new("customer_key", Label::Customer, &["custkey"]).unique();
pub const PART_KEY: IndexSpec = IndexSpec::new("part_key", Label::Part, &["partkey"]).unique();
pub const ORDER_KEY: IndexSpec = IndexSpec::new("order_key", Label::Order, &["orderkey"]).unique();
pub const LINEITEM_KEY: IndexSpec =
    IndexSpec::new("lineitem_key", Label::LineItem, &["orderkey", "linenumber"]).unique();
pub const LINEITEM_PART: IndexSpec =
    IndexSpec::new("lineitem_part", Label::LineItem, &["partkey"]);
pub const LINEITEM_SUPPLIER: IndexSpec =
    IndexSpec::new("lineitem_supplier", Label::LineItem, &["suppkey"]);
pub const ORDER_DATE: IndexSpec = IndexSpec::new("order_date", Label::Order, &["orderdate"]);

/// Indexes created before loading so that MERGE/MATCH on keys during the
/// load does not scan
pub fn key_indexes() -> &'static [IndexSpec] {
    &[
        REGION_KEY,
        NATION_KEY,
        SUPPLIER_KEY,
        CUSTOMER_KEY,
        PART_KEY,
        ORDER_KEY,
        LINEITEM_KEY,
        LINEITEM_PART,
        LINEITEM_SUPPLIER,
    ]
}
