//! ArangoDB backend against a mocked HTTP API

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use tpch_graph::backend::{ArangoBackend, ArangoConfig, GraphBackend};
use tpch_graph::error::BenchError;
use tpch_graph::model::{Label, Node, NodeKey, RelType};

const AUTH: &str = "Basic cm9vdDpwYXNzd29yZA==";

fn config(server: &ServerGuard) -> ArangoConfig {
    ArangoConfig {
        url: server.url(),
        timeout_secs: 5,
        ..Default::default()
    }
}

async fn connect(server: &mut ServerGuard) -> ArangoBackend {
    server
        .mock("GET", "/_db/_system/_api/database")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":false,"code":200,"result":["_system","tpch"]}"#)
        .create_async()
        .await;
    ArangoBackend::connect(&config(server)).await.unwrap()
}

fn region(key: i64, name: &str) -> Node {
    Node {
        label: Label::Region,
        key: NodeKey::Int(key),
        properties: vec![("regionkey", key.into()), ("name", name.into())],
    }
}

#[tokio::test]
async fn test_connect_creates_missing_database() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/_db/_system/_api/database")
        .match_header("authorization", AUTH)
        .with_status(200)
        .with_body(r#"{"error":false,"code":200,"result":["_system"]}"#)
        .create_async()
        .await;
    let create = server
        .mock("POST", "/_db/_system/_api/database")
        .match_header("authorization", AUTH)
        .match_body(Matcher::PartialJson(json!({"name": "tpch"})))
        .with_status(201)
        .with_body(r#"{"error":false,"code":201,"result":true}"#)
        .create_async()
        .await;

    ArangoBackend::connect(&config(&server)).await.unwrap();

    list.assert_async().await;
    create.assert_async().await;
}

#[tokio::test]
async fn test_connect_surfaces_auth_failure() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/_db/_system/_api/database")
        .with_status(401)
        .with_body(r#"{"error":true,"code":401,"errorNum":11,"errorMessage":"not authorized to execute this request"}"#)
        .create_async()
        .await;

    let err = ArangoBackend::connect(&config(&server)).await.err().unwrap();
    match err {
        BenchError::Backend { backend, message } => {
            assert_eq!(backend, "ArangoDB");
            assert_eq!(message, "not authorized to execute this request (status 401)");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_execute_follows_cursor() {
    let mut server = Server::new_async().await;
    let mut db = connect(&mut server).await;
    let first = server
        .mock("POST", "/_db/tpch/_api/cursor")
        .match_body(Matcher::PartialJson(
            json!({"query": "FOR r IN region RETURN {name: r.name}"}),
        ))
        .with_status(201)
        .with_body(r#"{"result":[{"name":"AFRICA"},{"name":"AMERICA"}],"hasMore":true,"id":"4711"}"#)
        .create_async()
        .await;
    let next = server
        .mock("PUT", "/_db/tpch/_api/cursor/4711")
        .with_status(200)
        .with_body(r#"{"result":[{"name":"ASIA"}],"hasMore":false}"#)
        .create_async()
        .await;

    let output = db
        .execute("FOR r IN region RETURN {name: r.name}")
        .await
        .unwrap();

    first.assert_async().await;
    next.assert_async().await;
    assert_eq!(output.columns, ["name"]);
    assert_eq!(output.len(), 3);
    assert_eq!(output.rows[2]["name"], "ASIA");
}

#[tokio::test]
async fn test_execute_reports_aql_error() {
    let mut server = Server::new_async().await;
    let mut db = connect(&mut server).await;
    server
        .mock("POST", "/_db/tpch/_api/cursor")
        .with_status(400)
        .with_body(r#"{"error":true,"code":400,"errorNum":1501,"errorMessage":"syntax error, unexpected identifier"}"#)
        .create_async()
        .await;

    let err = db.execute("FOR x IN").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "ArangoDB error: syntax error, unexpected identifier (status 400)"
    );
}

#[tokio::test]
async fn test_write_nodes_posts_documents() {
    let mut server = Server::new_async().await;
    let mut db = connect(&mut server).await;
    let insert = server
        .mock("POST", "/_db/tpch/_api/document/region")
        .match_body(Matcher::Json(json!([
            {"_key": "0", "regionkey": 0, "name": "AFRICA"},
            {"_key": "1", "regionkey": 1, "name": "AMERICA"},
        ])))
        .with_status(202)
        .with_body(r#"[{"_key":"0"},{"_key":"1"}]"#)
        .create_async()
        .await;

    db.write_nodes(Label::Region, &[region(0, "AFRICA"), region(1, "AMERICA")])
        .await
        .unwrap();
    insert.assert_async().await;
}

#[tokio::test]
async fn test_rejected_documents_fail_the_batch() {
    let mut server = Server::new_async().await;
    let mut db = connect(&mut server).await;
    server
        .mock("POST", "/_db/tpch/_api/document/region")
        .with_status(202)
        .with_body(
            r#"[{"_key":"0"},{"error":true,"errorNum":1210,"errorMessage":"unique constraint violated"}]"#,
        )
        .create_async()
        .await;

    let err = db
        .write_nodes(Label::Region, &[region(0, "AFRICA"), region(0, "AFRICA")])
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "ArangoDB error: 1 of 2 documents rejected by region: unique constraint violated"
    );
}

#[tokio::test]
async fn test_clear_drops_graph_and_collections() {
    let mut server = Server::new_async().await;
    let mut db = connect(&mut server).await;
    server
        .mock("GET", "/_db/tpch/_api/gharial/tpchgraph")
        .with_status(200)
        .with_body(r#"{"graph":{"name":"tpchgraph"}}"#)
        .create_async()
        .await;
    let drop_graph = server
        .mock("DELETE", "/_db/tpch/_api/gharial/tpchgraph")
        .match_query(Matcher::UrlEncoded("dropCollections".into(), "true".into()))
        .with_status(202)
        .with_body(r#"{"error":false,"removed":true}"#)
        .create_async()
        .await;
    // Everything went with the graph except one orphaned collection
    server
        .mock("GET", Matcher::Regex(r"^/_db/tpch/_api/collection/[a-z_]+$".into()))
        .with_status(404)
        .with_body(r#"{"error":true,"errorNum":1203,"errorMessage":"collection or view not found"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/_db/tpch/_api/collection/lineitem")
        .with_status(200)
        .with_body(r#"{"name":"lineitem","type":2}"#)
        .create_async()
        .await;
    let drop_lineitem = server
        .mock("DELETE", "/_db/tpch/_api/collection/lineitem")
        .with_status(200)
        .with_body(r#"{"error":false,"id":"42"}"#)
        .create_async()
        .await;

    db.clear().await.unwrap();

    drop_graph.assert_async().await;
    drop_lineitem.assert_async().await;
}

#[tokio::test]
async fn test_storage_info_sums_figures() {
    let mut server = Server::new_async().await;
    let mut db = connect(&mut server).await;
    server
        .mock("GET", Matcher::Regex(r"^/_db/tpch/_api/collection/[a-z_]+/figures".into()))
        .with_status(200)
        .with_body(
            r#"{"count":5,"figures":{"documentsSize":1000,"indexes":{"count":2,"size":24}}}"#,
        )
        .create_async()
        .await;

    let info = db.storage_info().await.unwrap();

    let collections = (Label::ALL.len() + RelType::ALL.len()) as u64;
    assert_eq!(info.nodes.len(), Label::ALL.len());
    assert_eq!(info.nodes["orders"], 5);
    assert_eq!(info.edges.len(), RelType::ALL.len());
    assert_eq!(info.total_nodes() + info.total_edges(), 5 * collections);
    assert_eq!(info.bytes, Some(1024 * collections));
    assert_eq!(info.details["region.indexes"], "2");
}
