use chrono::NaiveDate;

use super::{Fields, Table, TpchRow};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub regionkey: i64,
    pub name: String,
    pub comment: String,
}

impl TpchRow for Region {
    const TABLE: Table = Table::Region;

    fn from_fields(f: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            regionkey: f.int()?,
            name: f.text(),
            comment: f.text(),
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

impl TpchRow for Nation {
    const TABLE: Table = Table::Nation;

    fn from_fields(f: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            nationkey: f.int()?,
            name: f.text(),
            regionkey: f.int()?,
            comment: f.text(),
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

impl TpchRow for Supplier {
    const TABLE: Table = Table::Supplier;

    fn from_fields(f: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            suppkey: f.int()?,
            name: f.text(),
            address: f.text(),
            nationkey: f.int()?,
            phone: f.text(),
            acctbal: f.float()?,
            comment: f.text(),
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

impl TpchRow for Customer {
    const TABLE: Table = Table::Customer;

    fn from_fields(f: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            custkey: f.int()?,
            name: f.text(),
            address: f.text(),
            nationkey: f.int()?,
            phone: f.text(),
            acctbal: f.float()?,
            mktsegment: f.text(),
            comment: f.text(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub partkey: i64,
    pub name: String,
    pub mfgr: String,
    pub brand: String,
    /// `p_type`
    pub kind: String,
    pub size: i64,
    pub container: String,
    pub retailprice: f64,
    pub comment: String,
}

impl TpchRow for Part {
    const TABLE: Table = Table::Part;

    fn from_fields(f: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            partkey: f.int()?,
            name: f.text(),
            mfgr: f.text(),
            brand: f.text(),
            kind: f.text(),
            size: f.int()?,
            container: f.text(),
            retailprice: f.float()?,
            comment: f.text(),
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

impl TpchRow for PartSupp {
    const TABLE: Table = Table::PartSupp;

    fn from_fields(f: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            partkey: f.int()?,
            suppkey: f.int()?,
            availqty: f.int()?,
            supplycost: f.float()?,
            comment: f.text(),
        })
    }
}

/// One row of `orders.tbl`
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub orderkey: i64,
    pub custkey: i64,
    pub orderstatus: String,
    pub totalprice: f64,
    pub orderdate: NaiveDate,
    pub orderpriority: String,
    pub clerk: String,
    pub shippriority: i64,
    pub comment: String,
}

impl TpchRow for Order {
    const TABLE: Table = Table::Orders;

    fn from_fields(f: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            orderkey: f.int()?,
            custkey: f.int()?,
            orderstatus: f.text(),
            totalprice: f.float()?,
            orderdate: f.date()?,
            orderpriority: f.text(),
            clerk: f.text(),
            shippriority: f.int()?,
            comment: f.text(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub orderkey: i64,
    pub partkey: i64,
    pub suppkey: i64,
    pub linenumber: i64,
    pub quantity: f64,
    pub extendedprice: f64,
    pub discount: f64,
    pub tax: f64,
    pub returnflag: String,
    pub linestatus: String,
    pub shipdate: NaiveDate,
    pub commitdate: NaiveDate,
    pub receiptdate: NaiveDate,
    pub shipinstruct: String,
    pub shipmode: String,
    pub comment: String,
}

impl TpchRow for LineItem {
    const TABLE: Table = Table::LineItem;

    fn from_fields(f: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            orderkey: f.int()?,
            partkey: f.int()?,
            suppkey: f.int()?,
            linenumber: f.int()?,
            quantity: f.float()?,
            extendedprice: f.float()?,
            discount: f.float()?,
            tax: f.float()?,
            returnflag: f.text(),
            linestatus: f.text(),
            shipdate: f.date()?,
            commitdate: f.date()?,
            receiptdate: f.date()?,
            shipinstruct: f.text(),
            shipmode: f.text(),
            comment: f.text(),
        })
    }
}
