mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn item_ids_are_stored_as_strings() -> Result<()> {
    let server = common::TestServer::start().await?;
    let token = common::token();
    let url = server.url("/item/1001");

    let res = server
        .client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({"itemId": 1001, "name": "Rusty Sword", "type": "sword"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let stored = server.store.snapshot("items").await;
    assert_eq!(stored[0].get("itemId"), Some(&json!("1001")));

    let res = server.client.get(&url).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["itemId"], "1001");

    let res = server
        .client
        .put(&url)
        .bearer_auth(&token)
        .json(&json!({"name": "Sharp Sword"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // Query filters are passed through untouched
    let res = server
        .client
        .get(server.url("/item/"))
        .bearer_auth(&token)
        .json(&json!({"query": {"itemId": "1001"}, "project": {"name": 1}}))
        .send()
        .await?;
    let found = res.json::<Vec<Value>>().await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], "Sharp Sword");

    let res = server.client.delete(&url).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(server.store.snapshot("items").await.is_empty());

    server.stop().await
}

#[tokio::test]
async fn second_item_create_conflicts() -> Result<()> {
    let server = common::TestServer::start_without_auth().await?;
    let url = server.url("/item/5");

    let res = server.client.post(&url).json(&json!({"itemId": "5"})).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = server.client.post(&url).json(&json!({"itemId": 5})).send().await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    server.stop().await
}

#[tokio::test]
async fn numeric_item_id_in_update_keeps_record_reachable() -> Result<()> {
    let server = common::TestServer::start_without_auth().await?;
    let url = server.url("/item/1001");

    let res = server.client.post(&url).json(&json!({"itemId": 1001})).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .client
        .put(&url)
        .json(&json!({"itemId": 1001, "name": "Axe"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.client.get(&url).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["itemId"], "1001");
    assert_eq!(body["name"], "Axe");

    let res = server.client.post(&url).json(&json!({"itemId": 1001})).send().await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(server.store.snapshot("items").await.len(), 1);

    server.stop().await
}
