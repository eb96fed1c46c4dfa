//! Benchmark query suites
//!
//! Each query is written once per dialect. Memgraph speaks Cypher but has
//! its own path syntax, so a query may carry a Memgraph override.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::backend::{BackendKind, Dialect};
use crate::error::{BenchError, Result};
use crate::schema::{IndexSpec, CUSTOMER_KEY, ORDER_DATE, SUPPLIER_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suite {
    /// Selection and aggregation (A1–A4, B1–B2)
    Core,
    /// Joins, traversals, set operations and result modifiers (C1–C5, D1–D3, E1–E3)
    Extended,
    All,
}

impl Suite {
    pub fn name(self) -> &'static str {
        match self {
            Suite::Core => "core",
            Suite::Extended => "extended",
            Suite::All => "all",
        }
    }

    pub fn queries(self) -> Vec<&'static BenchQuery> {
        match self {
            Suite::Core => CORE.iter().collect(),
            Suite::Extended => EXTENDED.iter().collect(),
            Suite::All => CORE.iter().chain(EXTENDED.iter()).collect(),
        }
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Suite {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "core" => Ok(Suite::Core),
            "extended" => Ok(Suite::Extended),
            "all" => Ok(Suite::All),
            other => Err(BenchError::Config(format!(
                "unknown suite '{other}' (expected core, extended or all)"
            ))),
        }
    }
}

/// One benchmark query
#[derive(Debug)]
pub struct BenchQuery {
    pub id: &'static str,
    pub title: &'static str,
    /// Indexes created before the query is timed
    pub needs: &'static [IndexSpec],
    cypher: &'static str,
    memgraph: Option<&'static str>,
    aql: &'static str,
    ngql: &'static str,
}

impl BenchQuery {
    pub fn dialect_text(&self, dialect: Dialect) -> &'static str {
        match dialect {
            Dialect::Cypher => self.cypher,
            Dialect::Aql => self.aql,
            Dialect::Ngql => self.ngql,
        }
    }

    /// Query text as sent to `backend`
    pub fn text(&self, backend: BackendKind) -> &'static str {
        match (backend, self.memgraph) {
            (BackendKind::Memgraph, Some(text)) => text,
            _ => self.dialect_text(backend.dialect()),
        }
    }

    pub fn is_indexed(&self) -> bool {
        !self.needs.is_empty()
    }
}

/// Look up queries by id across every suite
pub fn find(ids: &[String]) -> Result<Vec<&'static BenchQuery>> {
    ids.iter()
        .map(|id| {
            CORE.iter()
                .chain(EXTENDED.iter())
                .find(|q| q.id.eq_ignore_ascii_case(id.trim()))
                .ok_or_else(|| BenchError::Config(format!("unknown query '{id}'")))
        })
        .collect()
}

pub static CORE: [BenchQuery; 6] = [
    BenchQuery {
        id: "A1",
        title: "Non-indexed point lookup: supplier named Supplier#000000666",
        needs: &[],
        cypher: "MATCH (s:Supplier) WHERE s.name = 'Supplier#000000666' \
                 RETURN s.suppkey AS suppkey, s.name AS name, s.address AS address, s.phone AS phone",
        memgraph: None,
        aql: "FOR s IN supplier FILTER s.name == 'Supplier#000000666' \
              RETURN {suppkey: s.suppkey, name: s.name, address: s.address, phone: s.phone}",
        ngql: "MATCH (s:Supplier) WHERE s.Supplier.name == 'Supplier#000000666' \
               RETURN s.Supplier.suppkey AS suppkey, s.Supplier.name AS name, \
               s.Supplier.address AS address, s.Supplier.phone AS phone",
    },
    BenchQuery {
        id: "A2",
        title: "Non-indexed range: orders placed between 1990-01-01 and 1995-12-31",
        needs: &[],
        cypher: "MATCH (o:`Order`) WHERE o.orderdate >= '1990-01-01' AND o.orderdate <= '1995-12-31' \
                 RETURN o.orderkey AS orderkey, o.orderdate AS orderdate, o.totalprice AS totalprice",
        memgraph: None,
        aql: "FOR o IN orders FILTER o.orderdate >= '1990-01-01' AND o.orderdate <= '1995-12-31' \
              RETURN {orderkey: o.orderkey, orderdate: o.orderdate, totalprice: o.totalprice}",
        ngql: "MATCH (o:`Order`) WHERE o.`Order`.orderdate >= '1990-01-01' AND o.`Order`.orderdate <= '1995-12-31' \
               RETURN o.`Order`.orderkey AS orderkey, o.`Order`.orderdate AS orderdate, \
               o.`Order`.totalprice AS totalprice",
    },
    BenchQuery {
        id: "A3",
        title: "Indexed point lookup: supplier with key 1337",
        needs: &[SUPPLIER_KEY],
        cypher: "MATCH (s:Supplier {suppkey: 1337}) \
                 RETURN s.suppkey AS suppkey, s.name AS name, s.address AS address, s.phone AS phone",
        memgraph: None,
        aql: "FOR s IN supplier FILTER s.suppkey == 1337 \
              RETURN {suppkey: s.suppkey, name: s.name, address: s.address, phone: s.phone}",
        ngql: "LOOKUP ON Supplier WHERE Supplier.suppkey == 1337 \
               YIELD Supplier.suppkey AS suppkey, Supplier.name AS name, \
               Supplier.address AS address, Supplier.phone AS phone",
    },
    BenchQuery {
        id: "A4",
        title: "Indexed range: orders placed between 1990-01-01 and 1995-12-31",
        needs: &[ORDER_DATE],
        cypher: "MATCH (o:`Order`) WHERE o.orderdate >= '1990-01-01' AND o.orderdate <= '1995-12-31' \
                 RETURN o.orderkey AS orderkey, o.orderdate AS orderdate, o.totalprice AS totalprice",
        memgraph: None,
        aql: "FOR o IN orders FILTER o.orderdate >= '1990-01-01' AND o.orderdate <= '1995-12-31' \
              RETURN {orderkey: o.orderkey, orderdate: o.orderdate, totalprice: o.totalprice}",
        ngql: "LOOKUP ON `Order` WHERE `Order`.orderdate >= '1990-01-01' AND `Order`.orderdate <= '1995-12-31' \
               YIELD `Order`.orderkey AS orderkey, `Order`.orderdate AS orderdate, \
               `Order`.totalprice AS totalprice",
    },
    BenchQuery {
        id: "B1",
        title: "COUNT: parts per brand",
        needs: &[],
        cypher: "MATCH (p:Part) RETURN p.brand AS brand, count(p) AS product_count \
                 ORDER BY product_count DESC",
        memgraph: None,
        aql: "FOR p IN part COLLECT brand = p.brand AGGREGATE product_count = COUNT(1) \
              SORT product_count DESC RETURN {brand: brand, product_count: product_count}",
        ngql: "MATCH (p:Part) RETURN p.Part.brand AS brand, count(p) AS product_count \
               ORDER BY product_count DESC",
    },
    BenchQuery {
        id: "B2",
        title: "MAX: most expensive part per brand",
        needs: &[],
        cypher: "MATCH (p:Part) RETURN p.brand AS brand, max(p.retailprice) AS max_price \
                 ORDER BY max_price DESC",
        memgraph: None,
        aql: "FOR p IN part COLLECT brand = p.brand AGGREGATE max_price = MAX(p.retailprice) \
              SORT max_price DESC RETURN {brand: brand, max_price: max_price}",
        ngql: "MATCH (p:Part) RETURN p.Part.brand AS brand, max(p.Part.retailprice) AS max_price \
               ORDER BY max_price DESC",
    },
];

pub static EXTENDED: [BenchQuery; 11] = [
    BenchQuery {
        id: "C1",
        title: "Indexed join: every customer with their orders",
        needs: &[CUSTOMER_KEY],
        cypher: "MATCH (c:Customer)-[:PLACED]->(o:`Order`) \
                 RETURN c.name AS customer, o.orderkey AS orderkey",
        memgraph: None,
        aql: "FOR c IN customer FOR o IN 1..1 OUTBOUND c placed \
              RETURN {customer: c.name, orderkey: o.orderkey}",
        ngql: "MATCH (c:Customer)-[:PLACED]->(o:`Order`) \
               RETURN c.Customer.name AS customer, o.`Order`.orderkey AS orderkey",
    },
    BenchQuery {
        id: "C2",
        title: "Filtered join: AUTOMOBILE customers with their orders",
        needs: &[],
        cypher: "MATCH (c:Customer)-[:PLACED]->(o:`Order`) WHERE c.mktsegment = 'AUTOMOBILE' \
                 RETURN c.name AS customer, c.mktsegment AS segment, o.orderkey AS orderkey",
        memgraph: None,
        aql: "FOR c IN customer FILTER c.mktsegment == 'AUTOMOBILE' \
              FOR o IN 1..1 OUTBOUND c placed \
              RETURN {customer: c.name, segment: c.mktsegment, orderkey: o.orderkey}",
        ngql: "MATCH (c:Customer)-[:PLACED]->(o:`Order`) WHERE c.Customer.mktsegment == 'AUTOMOBILE' \
               RETURN c.Customer.name AS customer, c.Customer.mktsegment AS segment, \
               o.`Order`.orderkey AS orderkey",
    },
    BenchQuery {
        id: "C3",
        title: "Two-hop join: customers, their orders and the orders' line items",
        needs: &[],
        cypher: "MATCH (c:Customer)-[:PLACED]->(o:`Order`)-[:CONTAINS]->(l:LineItem) \
                 RETURN c.name AS customer, o.orderkey AS orderkey, l.linenumber AS linenumber",
        memgraph: None,
        aql: "FOR c IN customer FOR o IN 1..1 OUTBOUND c placed FOR l IN 1..1 OUTBOUND o contains \
              RETURN {customer: c.name, orderkey: o.orderkey, linenumber: l.linenumber}",
        ngql: "MATCH (c:Customer)-[:PLACED]->(o:`Order`)-[:CONTAINS]->(l:LineItem) \
               RETURN c.Customer.name AS customer, o.`Order`.orderkey AS orderkey, \
               l.LineItem.linenumber AS linenumber",
    },
    BenchQuery {
        id: "C4",
        title: "Neighbourhood: one hop out of customer 1",
        needs: &[],
        cypher: "MATCH (c:Customer {custkey: 1})-[r]->(n) \
                 RETURN type(r) AS relationship, labels(n)[0] AS label, properties(n) AS node",
        memgraph: None,
        aql: "FOR v, e IN 1..1 OUTBOUND 'customer/1' located_in, placed \
              RETURN {relationship: PARSE_IDENTIFIER(e._id).collection, \
              label: PARSE_IDENTIFIER(v._id).collection, node: UNSET(v, '_id', '_rev')}",
        ngql: "GO FROM 'Customer/1' OVER * \
               YIELD type(edge) AS relationship, id($$) AS node, properties($$) AS properties",
    },
    BenchQuery {
        id: "C5",
        title: "Shortest path: customer 1 to customer 5",
        needs: &[],
        cypher: "MATCH p = shortestPath((a:Customer {custkey: 1})-[*..6]-(b:Customer {custkey: 5})) \
                 RETURN [n IN nodes(p) | labels(n)[0]] AS path, length(p) AS hops",
        memgraph: Some(
            "MATCH p = (a:Customer {custkey: 1})-[*BFS ..6]-(b:Customer {custkey: 5}) \
             RETURN [n IN nodes(p) | labels(n)[0]] AS path, size(relationships(p)) AS hops",
        ),
        aql: "FOR v IN ANY SHORTEST_PATH 'customer/1' TO 'customer/5' \
              belongs_to, located_in, placed, supplies, contains, of_part, supplied_by \
              RETURN v._id",
        ngql: "FIND SHORTEST PATH FROM 'Customer/1' TO 'Customer/5' OVER * BIDIRECT UPTO 6 STEPS \
               YIELD path AS p",
    },
    BenchQuery {
        id: "D1",
        title: "Union: keys of AUTOMOBILE or BUILDING customers",
        needs: &[],
        cypher: "MATCH (c:Customer) WHERE c.mktsegment = 'AUTOMOBILE' RETURN c.custkey AS custkey \
                 UNION \
                 MATCH (c:Customer) WHERE c.mktsegment = 'BUILDING' RETURN c.custkey AS custkey",
        memgraph: None,
        aql: "LET automobile = (FOR c IN customer FILTER c.mktsegment == 'AUTOMOBILE' RETURN c.custkey) \
              LET building = (FOR c IN customer FILTER c.mktsegment == 'BUILDING' RETURN c.custkey) \
              FOR custkey IN UNION_DISTINCT(automobile, building) RETURN custkey",
        ngql: "MATCH (c:Customer) WHERE c.Customer.mktsegment == 'AUTOMOBILE' \
               RETURN c.Customer.custkey AS custkey \
               UNION \
               MATCH (c:Customer) WHERE c.Customer.mktsegment == 'BUILDING' \
               RETURN c.Customer.custkey AS custkey",
    },
    BenchQuery {
        id: "D2",
        title: "Intersection: customers with orders and customers with line items",
        needs: &[],
        cypher: "MATCH (c:Customer)-[:PLACED]->(:`Order`) \
                 WITH collect(DISTINCT c.custkey) AS with_orders \
                 MATCH (c:Customer)-[:PLACED]->(:`Order`)-[:CONTAINS]->(:LineItem) \
                 WITH with_orders, collect(DISTINCT c.custkey) AS with_items \
                 UNWIND with_orders AS custkey \
                 WITH custkey, with_items WHERE custkey IN with_items \
                 RETURN custkey",
        memgraph: None,
        aql: "LET with_orders = (FOR p IN placed RETURN DOCUMENT(p._from).custkey) \
              LET with_items = (FOR l IN lineitem \
              FOR c IN 1..1 INBOUND CONCAT('orders/', l.orderkey) placed RETURN c.custkey) \
              FOR custkey IN INTERSECTION(with_orders, with_items) RETURN custkey",
        ngql: "MATCH (c:Customer)-[:PLACED]->(:`Order`) \
               RETURN DISTINCT c.Customer.custkey AS custkey \
               INTERSECT \
               MATCH (c:Customer)-[:PLACED]->(:`Order`)-[:CONTAINS]->(:LineItem) \
               RETURN DISTINCT c.Customer.custkey AS custkey",
    },
    BenchQuery {
        id: "D3",
        title: "Difference: customers with orders but no line items",
        needs: &[],
        cypher: "MATCH (c:Customer)-[:PLACED]->(:`Order`) \
                 WITH collect(DISTINCT c.custkey) AS with_orders \
                 OPTIONAL MATCH (c:Customer)-[:PLACED]->(:`Order`)-[:CONTAINS]->(:LineItem) \
                 WITH with_orders, collect(DISTINCT c.custkey) AS with_items \
                 UNWIND with_orders AS custkey \
                 WITH custkey, with_items WHERE NOT custkey IN with_items \
                 RETURN custkey",
        memgraph: None,
        aql: "LET with_orders = (FOR p IN placed RETURN DOCUMENT(p._from).custkey) \
              LET with_items = (FOR l IN lineitem \
              FOR c IN 1..1 INBOUND CONCAT('orders/', l.orderkey) placed RETURN c.custkey) \
              FOR custkey IN MINUS(with_orders, with_items) RETURN custkey",
        ngql: "MATCH (c:Customer)-[:PLACED]->(:`Order`) \
               RETURN DISTINCT c.Customer.custkey AS custkey \
               MINUS \
               MATCH (c:Customer)-[:PLACED]->(:`Order`)-[:CONTAINS]->(:LineItem) \
               RETURN DISTINCT c.Customer.custkey AS custkey",
    },
    BenchQuery {
        id: "E1",
        title: "Non-indexed sort: first 10 customers by name",
        needs: &[],
        cypher: "MATCH (c:Customer) RETURN c.custkey AS custkey, c.name AS name \
                 ORDER BY name ASC LIMIT 10",
        memgraph: None,
        aql: "FOR c IN customer SORT c.name ASC LIMIT 10 RETURN {custkey: c.custkey, name: c.name}",
        ngql: "MATCH (c:Customer) RETURN c.Customer.custkey AS custkey, c.Customer.name AS name \
               ORDER BY name ASC LIMIT 10",
    },
    BenchQuery {
        id: "E2",
        title: "Indexed sort: last 10 customers by key",
        needs: &[CUSTOMER_KEY],
        cypher: "MATCH (c:Customer) RETURN c.custkey AS custkey, c.name AS name \
                 ORDER BY custkey DESC LIMIT 10",
        memgraph: None,
        aql: "FOR c IN customer SORT c.custkey DESC LIMIT 10 RETURN {custkey: c.custkey, name: c.name}",
        ngql: "LOOKUP ON Customer YIELD Customer.custkey AS custkey, Customer.name AS name \
               | ORDER BY $-.custkey DESC | LIMIT 10",
    },
    BenchQuery {
        id: "E3",
        title: "Distinct: market segments",
        needs: &[],
        cypher: "MATCH (c:Customer) RETURN DISTINCT c.mktsegment AS segment ORDER BY segment",
        memgraph: None,
        aql: "FOR c IN customer COLLECT segment = c.mktsegment RETURN segment",
        ngql: "MATCH (c:Customer) RETURN DISTINCT c.Customer.mktsegment AS segment ORDER BY segment",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suites() {
        assert_eq!(Suite::Core.queries().len(), 6);
        assert_eq!(Suite::Extended.queries().len(), 11);
        let ids: Vec<_> = Suite::All.queries().iter().map(|q| q.id).collect();
        assert_eq!(
            ids,
            [
                "A1", "A2", "A3", "A4", "B1", "B2", "C1", "C2", "C3", "C4", "C5", "D1", "D2",
                "D3", "E1", "E2", "E3"
            ]
        );
    }

    #[test]
    fn test_every_query_has_every_dialect() {
        for query in Suite::All.queries() {
            for kind in BackendKind::ALL {
                assert!(!query.text(kind).trim().is_empty(), "{} for {}", query.id, kind);
            }
            for dialect in [Dialect::Cypher, Dialect::Aql, Dialect::Ngql] {
                assert!(
                    !query.dialect_text(dialect).trim().is_empty(),
                    "{} in {:?}",
                    query.id,
                    dialect
                );
            }
        }
    }

    #[test]
    fn test_set_operations_use_native_operators() {
        let find_one = |id: &str| find(&[id.to_string()]).unwrap()[0];

        let union = find_one("D1");
        assert!(union.text(BackendKind::Neo4j).contains(" UNION "));
        assert!(union.text(BackendKind::ArangoDb).contains("UNION_DISTINCT("));
        assert!(union.text(BackendKind::Nebula).contains(" UNION "));

        let intersection = find_one("D2");
        assert!(intersection.text(BackendKind::Memgraph).contains("custkey IN with_items"));
        assert!(intersection.text(BackendKind::ArangoDb).contains("INTERSECTION("));
        assert!(intersection.text(BackendKind::Nebula).contains(" INTERSECT "));

        let difference = find_one("D3");
        assert!(difference.text(BackendKind::Neo4j).contains("NOT custkey IN with_items"));
        assert!(difference.text(BackendKind::ArangoDb).contains("MINUS("));
        assert!(difference.text(BackendKind::Nebula).contains(" MINUS "));
    }

    #[test]
    fn test_two_hop_join_reaches_line_items() {
        let c3 = find(&["C3".to_string()]).unwrap()[0];
        assert!(
            c3.text(BackendKind::Neo4j)
                .contains("-[:PLACED]->(o:`Order`)-[:CONTAINS]->(l:LineItem)")
        );
        assert!(c3.text(BackendKind::ArangoDb).contains("OUTBOUND o contains"));
        assert!(c3.text(BackendKind::Nebula).contains("l.LineItem.linenumber"));
    }

    #[test]
    fn test_indexed_queries_declare_needs() {
        let indexed: Vec<_> = Suite::All
            .queries()
            .into_iter()
            .filter(|q| q.is_indexed())
            .map(|q| (q.id, q.needs[0].name))
            .collect();
        assert_eq!(
            indexed,
            [
                ("A3", "supplier_key"),
                ("A4", "order_date"),
                ("C1", "customer_key"),
                ("E2", "customer_key")
            ]
        );
    }

    #[test]
    fn test_indexed_ranges_match_unindexed_text() {
        let all = Suite::All.queries();
        let a2 = all.iter().find(|q| q.id == "A2").unwrap();
        let a4 = all.iter().find(|q| q.id == "A4").unwrap();
        assert_eq!(a2.dialect_text(Dialect::Cypher), a4.dialect_text(Dialect::Cypher));
        assert_eq!(a2.dialect_text(Dialect::Aql), a4.dialect_text(Dialect::Aql));
    }

    #[test]
    fn test_memgraph_override() {
        let c5 = &EXTENDED[4];
        assert_eq!(c5.id, "C5");
        assert!(c5.text(BackendKind::Neo4j).contains("shortestPath"));
        assert!(c5.text(BackendKind::Memgraph).contains("*BFS"));
        assert_eq!(EXTENDED[0].text(BackendKind::Memgraph), EXTENDED[0].text(BackendKind::Neo4j));
    }

    #[test]
    fn test_find_by_id() {
        let found = find(&["b2".to_string(), " A1".to_string()]).unwrap();
        assert_eq!(found.iter().map(|q| q.id).collect::<Vec<_>>(), ["B2", "A1"]);
        assert!(find(&["Z9".to_string()]).is_err());
    }

    #[test]
    fn test_suite_from_str() {
        assert_eq!("Extended".parse::<Suite>().unwrap(), Suite::Extended);
        assert!("full".parse::<Suite>().is_err());
    }
}
