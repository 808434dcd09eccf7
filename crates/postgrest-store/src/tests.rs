//! REST Store Tests
//!
//! Runs `RestStore` against a local listener that answers each connection
//! with one canned response and records what it was sent.

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use cinelist::domain::{WatchlistEntry, WatchlistPatch};
use cinelist::{RemoteId, RemoteStore, Scope, StoreError};

use crate::{RestClient, RestConfig, RestStore};

struct Request {
    method: String,
    target: String,
    /// Request line and headers, lowercased
    head: String,
    body: String,
}

impl Request {
    fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body is not JSON")
    }
}

async fn read_request(stream: &mut TcpStream) -> Request {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let head_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before the headers ended");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .map(|(_, value)| value.trim().parse::<usize>().unwrap())
        .unwrap_or(0);
    while buf.len() < head_end + length {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before the body ended");
        buf.extend_from_slice(&chunk[..n]);
    }

    let mut request_line = head.lines().next().unwrap().split_whitespace();
    Request {
        method: request_line.next().unwrap().to_string(),
        target: request_line.next().unwrap().to_string(),
        head: head.to_lowercase(),
        body: String::from_utf8_lossy(&buf[head_end..head_end + length]).to_string(),
    }
}

/// Serve `responses` in order, one per connection
async fn serve(responses: Vec<(u16, String)>) -> (RestStore<WatchlistEntry>, JoinHandle<Vec<Request>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            seen.push(read_request(&mut stream).await);
            let response = format!(
                "HTTP/1.1 {} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
        }
        seen
    });

    let client = RestClient::new(&RestConfig::new(format!("http://{}", addr), "anon-key")).unwrap();
    (client.store(), handle)
}

fn row(id: u64, title: &str) -> Value {
    json!({
        "id": id,
        "user_id": "u1",
        "movie_id": title.to_lowercase(),
        "title": title,
        "priority": "medium",
        "watched": false,
        "rating": null,
        "genre": null,
        "added_at": "2024-03-01T10:00:00Z"
    })
}

#[tokio::test]
async fn test_list_sends_filters_and_parses_rows() {
    let body = json!([row(1, "Eega"), row(2, "Pushpa")]).to_string();
    let (store, server) = serve(vec![(200, body)]).await;

    let items = store.list(&Scope::user("u1")).await.expect("List failed");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, RemoteId::new("1"));
    assert_eq!(items[1].payload.title, "Pushpa");

    let requests = server.await.unwrap();
    let req = &requests[0];
    assert_eq!(req.method, "GET");
    assert!(req.target.starts_with("/rest/v1/watchlist?"), "{}", req.target);
    for part in ["select=*", "order=id.asc", "user_id=eq.u1"] {
        assert!(req.target.contains(part), "{} missing {}", req.target, part);
    }
    assert!(req.head.contains("apikey: anon-key"));
    assert!(req.head.contains("authorization: bearer anon-key"));
    assert!(req.head.contains("accept-profile: public"));
}

#[tokio::test]
async fn test_insert_asks_for_the_stored_row() {
    let body = json!([row(7, "Eega")]).to_string();
    let (store, server) = serve(vec![(201, body)]).await;

    let invalid = store.insert(&WatchlistEntry::new("u1", "m1", " ")).await;
    assert!(matches!(invalid, Err(StoreError::Validation(_))));

    let item = store.insert(&WatchlistEntry::new("u1", "eega", "Eega")).await.expect("Insert failed");
    assert_eq!(item.id, RemoteId::new("7"));
    assert_eq!(item.payload.title, "Eega");

    let requests = server.await.unwrap();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.method, "POST");
    assert_eq!(req.target, "/rest/v1/watchlist");
    assert!(req.head.contains("prefer: return=representation"));
    assert!(req.head.contains("content-profile: public"));
    let sent = req.json();
    assert_eq!(sent["title"], "Eega");
    assert!(sent.get("id").is_none());
}

#[tokio::test]
async fn test_update_with_no_matching_row_is_not_found() {
    let (store, server) = serve(vec![
        (200, "[]".to_string()),
        (200, json!([row(7, "Eega")]).to_string()),
    ])
    .await;
    let id = RemoteId::new("7");
    let patch = WatchlistPatch::watched(true);

    let err = store.update(&id, &patch).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    store.update(&id, &patch).await.expect("Update failed");

    let requests = server.await.unwrap();
    for req in &requests {
        assert_eq!(req.method, "PATCH");
        assert_eq!(req.target, "/rest/v1/watchlist?id=eq.7");
        assert!(req.head.contains("prefer: return=representation"));
        assert_eq!(req.json(), json!({ "watched": true }));
    }
}

#[tokio::test]
async fn test_delete_maps_results_and_statuses() {
    let (store, server) = serve(vec![
        (200, "[]".to_string()),
        (409, json!({ "message": "still referenced" }).to_string()),
        (200, json!([row(7, "Eega")]).to_string()),
    ])
    .await;
    let id = RemoteId::new("7");

    assert!(matches!(store.delete(&id).await, Err(StoreError::NotFound(_))));
    match store.delete(&id).await {
        Err(StoreError::Validation(msg)) => assert!(msg.contains("still referenced")),
        other => panic!("expected a validation error, got {:?}", other),
    }
    store.delete(&id).await.expect("Delete failed");

    let requests = server.await.unwrap();
    assert_eq!(requests.len(), 3);
    for req in &requests {
        assert_eq!(req.method, "DELETE");
        assert_eq!(req.target, "/rest/v1/watchlist?id=eq.7");
        assert!(req.body.is_empty());
    }
}
