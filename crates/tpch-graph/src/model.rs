//! Canonical property-graph form of TPC-H
//!
//! Every backend writes the same graph: the row types in
//! [`crate::dataset`] map themselves onto [`Node`]s and [`Edge`]s here,
//! and each backend only decides how a label, a key and a property value
//! are spelled in its own API.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dataset::{Customer, LineItem, Nation, Order, Part, PartSupp, Region, Supplier};

/// Node labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    Region,
    Nation,
    Supplier,
    Customer,
    Part,
    Order,
    LineItem,
}

impl Label {
    pub const ALL: [Label; 7] = [
        Label::Region,
        Label::Nation,
        Label::Supplier,
        Label::Customer,
        Label::Part,
        Label::Order,
        Label::LineItem,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Label::Region => "Region",
            Label::Nation => "Nation",
            Label::Supplier => "Supplier",
            Label::Customer => "Customer",
            Label::Part => "Part",
            Label::Order => "Order",
            Label::LineItem => "LineItem",
        }
    }

    /// Document collection name (ArangoDB)
    pub fn collection(self) -> &'static str {
        match self {
            Label::Region => "region",
            Label::Nation => "nation",
            Label::Supplier => "supplier",
            Label::Customer => "customer",
            Label::Part => "part",
            Label::Order => "orders",
            Label::LineItem => "lineitem",
        }
    }

    /// Properties that identify a node of this label
    pub fn key_properties(self) -> &'static [&'static str] {
        match self {
            Label::Region => &["regionkey"],
            Label::Nation => &["nationkey"],
            Label::Supplier => &["suppkey"],
            Label::Customer => &["custkey"],
            Label::Part => &["partkey"],
            Label::Order => &["orderkey"],
            Label::LineItem => &["orderkey", "linenumber"],
        }
    }

    pub fn from_collection(name: &str) -> Option<Label> {
        Label::ALL.into_iter().find(|l| l.collection() == name)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Relationship types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelType {
    BelongsTo,
    LocatedIn,
    Placed,
    Supplies,
    Contains,
    OfPart,
    SuppliedBy,
}

impl RelType {
    pub const ALL: [RelType; 7] = [
        RelType::BelongsTo,
        RelType::LocatedIn,
        RelType::Placed,
        RelType::Supplies,
        RelType::Contains,
        RelType::OfPart,
        RelType::SuppliedBy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RelType::BelongsTo => "BELONGS_TO",
            RelType::LocatedIn => "LOCATED_IN",
            RelType::Placed => "PLACED",
            RelType::Supplies => "SUPPLIES",
            RelType::Contains => "CONTAINS",
            RelType::OfPart => "OF_PART",
            RelType::SuppliedBy => "SUPPLIED_BY",
        }
    }

    /// Edge collection name (ArangoDB)
    pub fn collection(self) -> &'static str {
        match self {
            RelType::BelongsTo => "belongs_to",
            RelType::LocatedIn => "located_in",
            RelType::Placed => "placed",
            RelType::Supplies => "supplies",
            RelType::Contains => "contains",
            RelType::OfPart => "of_part",
            RelType::SuppliedBy => "supplied_by",
        }
    }

    pub fn from_collection(name: &str) -> Option<RelType> {
        RelType::ALL.into_iter().find(|r| r.collection() == name)
    }
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Primary key of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Int(i64),
    /// `(orderkey, linenumber)` for line items
    Composite(i64, i64),
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Int(k) => write!(f, "{k}"),
            NodeKey::Composite(a, b) => write!(f, "{a}_{b}"),
        }
    }
}

/// Reference to a node by label and key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub label: Label,
    pub key: NodeKey,
}

impl NodeRef {
    pub fn new(label: Label, key: NodeKey) -> Self {
        Self { label, key }
    }

    pub fn int(label: Label, key: i64) -> Self {
        Self::new(label, NodeKey::Int(key))
    }

    /// `{label}/{key}`, the string vertex id used by NebulaGraph
    pub fn vid(&self) -> String {
        format!("{}/{}", self.label, self.key)
    }

    /// `{collection}/{key}`, the document handle used by ArangoDB
    pub fn document_id(&self) -> String {
        format!("{}/{}", self.label.collection(), self.key)
    }
}

/// Scalar property value
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<chrono::NaiveDate> for PropertyValue {
    fn from(v: chrono::NaiveDate) -> Self {
        PropertyValue::Text(v.format("%Y-%m-%d").to_string())
    }
}

impl From<&PropertyValue> for serde_json::Value {
    fn from(v: &PropertyValue) -> Self {
        match v {
            PropertyValue::Int(i) => serde_json::Value::from(*i),
            PropertyValue::Float(f) => serde_json::Value::from(*f),
            PropertyValue::Text(s) => serde_json::Value::from(s.as_str()),
        }
    }
}

/// Ordered property list. Every node of a label lists the same names in
/// the same order.
pub type Properties = Vec<(&'static str, PropertyValue)>;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub label: Label,
    pub key: NodeKey,
    pub properties: Properties,
}

impl Node {
    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(self.label, self.key)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub rel: RelType,
    pub from: NodeRef,
    pub to: NodeRef,
    pub properties: Properties,
}

impl Edge {
    pub fn new(rel: RelType, from: NodeRef, to: NodeRef) -> Self {
        Self {
            rel,
            from,
            to,
            properties: Vec::new(),
        }
    }
}

/// Nodes and edges produced from a run of rows
#[derive(Debug, Default, Clone)]
pub struct GraphRecords {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphRecords {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Row → graph mapping
pub trait ToGraph {
    fn to_graph(&self, out: &mut GraphRecords);
}

impl ToGraph for Region {
    fn to_graph(&self, out: &mut GraphRecords) {
        out.nodes.push(Node {
            label: Label::Region,
            key: NodeKey::Int(self.regionkey),
            properties: vec![
                ("regionkey", self.regionkey.into()),
                ("name", self.name.as_str().into()),
                ("comment", self.comment.as_str().into()),
            ],
        });
    }
}

impl ToGraph for Nation {
    fn to_graph(&self, out: &mut GraphRecords) {
        let nation = NodeRef::int(Label::Nation, self.nationkey);
        out.nodes.push(Node {
            label: Label::Nation,
            key: nation.key,
            properties: vec![
                ("nationkey", self.nationkey.into()),
                ("name", self.name.as_str().into()),
                ("comment", self.comment.as_str().into()),
            ],
        });
        out.edges.push(Edge::new(
            RelType::BelongsTo,
            nation,
            NodeRef::int(Label::Region, self.regionkey),
        ));
    }
}

impl ToGraph for Supplier {
    fn to_graph(&self, out: &mut GraphRecords) {
        let supplier = NodeRef::int(Label::Supplier, self.suppkey);
        out.nodes.push(Node {
            label: Label::Supplier,
            key: supplier.key,
            properties: vec![
                ("suppkey", self.suppkey.into()),
                ("name", self.name.as_str().into()),
                ("address", self.address.as_str().into()),
                ("phone", self.phone.as_str().into()),
                ("acctbal", self.acctbal.into()),
                ("comment", self.comment.as_str().into()),
            ],
        });
        out.edges.push(Edge::new(
            RelType::LocatedIn,
            supplier,
            NodeRef::int(Label::Nation, self.nationkey),
        ));
    }
}

impl ToGraph for Customer {
    fn to_graph(&self, out: &mut GraphRecords) {
        let customer = NodeRef::int(Label::Customer, self.custkey);
        out.nodes.push(Node {
            label: Label::Customer,
            key: customer.key,
            properties: vec![
                ("custkey", self.custkey.into()),
                ("name", self.name.as_str().into()),
                ("address", self.address.as_str().into()),
                ("phone", self.phone.as_str().into()),
                ("acctbal", self.acctbal.into()),
                ("mktsegment", self.mktsegment.as_str().into()),
                ("comment", self.comment.as_str().into()),
            ],
        });
        out.edges.push(Edge::new(
            RelType::LocatedIn,
            customer,
            NodeRef::int(Label::Nation, self.nationkey),
        ));
    }
}

impl ToGraph for Part {
    fn to_graph(&self, out: &mut GraphRecords) {
        out.nodes.push(Node {
            label: Label::Part,
            key: NodeKey::Int(self.partkey),
            properties: vec![
                ("partkey", self.partkey.into()),
                ("name", self.name.as_str().into()),
                ("mfgr", self.mfgr.as_str().into()),
                ("brand", self.brand.as_str().into()),
                ("type", self.kind.as_str().into()),
                ("size", self.size.into()),
                ("container", self.container.as_str().into()),
                ("retailprice", self.retailprice.into()),
                ("comment", self.comment.as_str().into()),
            ],
        });
    }
}

impl ToGraph for PartSupp {
    fn to_graph(&self, out: &mut GraphRecords) {
        out.edges.push(Edge {
            rel: RelType::Supplies,
            from: NodeRef::int(Label::Supplier, self.suppkey),
            to: NodeRef::int(Label::Part, self.partkey),
            properties: vec![
                ("availqty", self.availqty.into()),
                ("supplycost", self.supplycost.into()),
                ("comment", self.comment.as_str().into()),
            ],
        });
    }
}

impl ToGraph for Order {
    fn to_graph(&self, out: &mut GraphRecords) {
        let order = NodeRef::int(Label::Order, self.orderkey);
        out.nodes.push(Node {
            label: Label::Order,
            key: order.key,
            properties: vec![
                ("orderkey", self.orderkey.into()),
                ("orderstatus", self.orderstatus.as_str().into()),
                ("totalprice", self.totalprice.into()),
                ("orderdate", self.orderdate.into()),
                ("orderpriority", self.orderpriority.as_str().into()),
                ("clerk", self.clerk.as_str().into()),
                ("shippriority", self.shippriority.into()),
                ("comment", self.comment.as_str().into()),
            ],
        });
        out.edges.push(Edge::new(
            RelType::Placed,
            NodeRef::int(Label::Customer, self.custkey),
            order,
        ));
    }
}

impl ToGraph for LineItem {
    fn to_graph(&self, out: &mut GraphRecords) {
        let item = NodeRef::new(
            Label::LineItem,
            NodeKey::Composite(self.orderkey, self.linenumber),
        );
        out.nodes.push(Node {
            label: Label::LineItem,
            key: item.key,
            properties: vec![
                ("orderkey", self.orderkey.into()),
                ("partkey", self.partkey.into()),
                ("suppkey", self.suppkey.into()),
                ("linenumber", self.linenumber.into()),
                ("quantity", self.quantity.into()),
                ("extendedprice", self.extendedprice.into()),
                ("discount", self.discount.into()),
                ("tax", self.tax.into()),
                ("returnflag", self.returnflag.as_str().into()),
                ("linestatus", self.linestatus.as_str().into()),
                ("shipdate", self.shipdate.into()),
                ("commitdate", self.commitdate.into()),
                ("receiptdate", self.receiptdate.into()),
                ("shipinstruct", self.shipinstruct.as_str().into()),
                ("shipmode", self.shipmode.as_str().into()),
                ("comment", self.comment.as_str().into()),
            ],
        });
        out.edges.push(Edge::new(
            RelType::Contains,
            NodeRef::int(Label::Order, self.orderkey),
            item,
        ));
        out.edges.push(Edge::new(
            RelType::OfPart,
            item,
            NodeRef::int(Label::Part, self.partkey),
        ));
        out.edges.push(Edge::new(
            RelType::SuppliedBy,
            item,
            NodeRef::int(Label::Supplier, self.suppkey),
        ));
    }
}
