//! REST Record Store
//!
//! Talks to `{base}/rest/v1/{table}` with PostgREST filter syntax. Rows
//! carry their `id` column next to the record fields.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{Map, Value};
use std::marker::PhantomData;
use thiserror::Error;

use cinelist::{Record, RemoteId, RemoteStore, Scope, StoreError, StoreResult, StoredItem};

use crate::config::RestConfig;

/// Failures building a client; request failures are [`StoreError`]s
#[derive(Debug, Error)]
pub enum RestError {
    #[error("Invalid header value: {0}")]
    Header(#[from] InvalidHeaderValue),
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Shared HTTP client for every collection on one backend
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
}

impl RestClient {
    pub fn new(config: &RestConfig) -> Result<Self, RestError> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(&config.api_key)?);
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", config.api_key))?);
        headers.insert("accept-profile", HeaderValue::from_str(&config.schema)?);
        headers.insert("content-profile", HeaderValue::from_str(&config.schema)?);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Store for one collection; the table must already exist remotely
    pub fn store<R: Record>(&self) -> RestStore<R> {
        RestStore {
            client: self.clone(),
            _record: PhantomData,
        }
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

/// PostgREST implementation of [`RemoteStore`]
pub struct RestStore<R> {
    client: RestClient,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> RestStore<R> {
    fn request(&self, builder: impl FnOnce(&Client, String) -> RequestBuilder) -> RequestBuilder {
        builder(&self.client.http, self.client.table_url(R::COLLECTION))
    }

    fn by_id(id: &RemoteId) -> [(&'static str, String); 1] {
        [("id", format!("eq.{}", id))]
    }
}

/// Map a non-success status to the store taxonomy
pub fn status_error(status: StatusCode, body: &str) -> StoreError {
    let detail = if body.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, body)
    };
    match status {
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            StoreError::Validation(detail)
        }
        StatusCode::NOT_FOUND => StoreError::NotFound(detail),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Fetch(detail),
        s if s.is_server_error() => StoreError::Fetch(detail),
        _ => StoreError::Unknown(detail),
    }
}

fn transport_error(err: reqwest::Error) -> StoreError {
    StoreError::Fetch(err.to_string())
}

/// Send and collect the returned rows
async fn send(request: RequestBuilder) -> StoreResult<Vec<Map<String, Value>>> {
    let response: Response = request.send().await.map_err(transport_error)?;
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    if !status.is_success() {
        log::warn!("REST request failed with {}", status);
        return Err(status_error(status, &body));
    }
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&body).map_err(|e| StoreError::Unknown(format!("unexpected response: {}", e)))
}

/// Split a row into its id column and the record fields
pub(crate) fn split_row<R: Record>(mut row: Map<String, Value>) -> StoreResult<StoredItem<R>> {
    let id = match row.remove("id") {
        Some(Value::String(id)) => RemoteId::new(id),
        Some(Value::Number(id)) => RemoteId::new(id.to_string()),
        _ => return Err(StoreError::Unknown("row has no id".to_string())),
    };
    let payload = serde_json::from_value(Value::Object(row))
        .map_err(|e| StoreError::Unknown(format!("row {} does not parse: {}", id, e)))?;
    Ok(StoredItem::new(id, payload))
}

#[async_trait]
impl<R: Record> RemoteStore<R> for RestStore<R> {
    async fn list(&self, scope: &Scope) -> StoreResult<Vec<StoredItem<R>>> {
        let mut query = vec![("select".to_string(), "*".to_string()), ("order".to_string(), "id.asc".to_string())];
        if let Some((field, value)) = scope.filter() {
            if !Scope::is_valid_field(field) {
                return Err(StoreError::Validation(format!("invalid scope field '{}'", field)));
            }
            query.push((field.to_string(), format!("eq.{}", value)));
        }

        let rows = send(self.request(|http, url| http.get(url).query(&query))).await?;
        rows.into_iter().map(split_row).collect()
    }

    async fn insert(&self, payload: &R) -> StoreResult<StoredItem<R>> {
        payload.validate().map_err(StoreError::Validation)?;

        let rows = send(self.request(|http, url| {
            http.post(url).header("Prefer", "return=representation").json(payload)
        }))
        .await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Unknown("insert returned no row".to_string()))?;
        split_row(row)
    }

    async fn update(&self, id: &RemoteId, patch: &R::Patch) -> StoreResult<()> {
        let rows = send(self.request(|http, url| {
            http.patch(url)
                .query(&Self::by_id(id))
                .header("Prefer", "return=representation")
                .json(patch)
        }))
        .await?;

        if rows.is_empty() {
            return Err(StoreError::NotFound(format!("no {} with id '{}'", R::LABEL, id)));
        }
        Ok(())
    }

    async fn delete(&self, id: &RemoteId) -> StoreResult<()> {
        let rows = send(self.request(|http, url| {
            http.delete(url)
                .query(&Self::by_id(id))
                .header("Prefer", "return=representation")
        }))
        .await?;

        if rows.is_empty() {
            return Err(StoreError::NotFound(format!("no {} with id '{}'", R::LABEL, id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinelist::domain::{Priority, WatchlistEntry};
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_table_url() {
        let client = RestClient::new(&RestConfig::new("https://demo.example.co/", "anon")).unwrap();
        assert_eq!(client.table_url("watchlist"), "https://demo.example.co/rest/v1/watchlist");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(status_error(StatusCode::BAD_REQUEST, ""), StoreError::Validation(_)));
        assert!(matches!(status_error(StatusCode::CONFLICT, "dup"), StoreError::Validation(_)));
        assert!(matches!(status_error(StatusCode::UNPROCESSABLE_ENTITY, ""), StoreError::Validation(_)));
        assert!(matches!(status_error(StatusCode::NOT_FOUND, ""), StoreError::NotFound(_)));
        assert!(matches!(status_error(StatusCode::UNAUTHORIZED, ""), StoreError::Fetch(_)));
        assert!(matches!(status_error(StatusCode::FORBIDDEN, ""), StoreError::Fetch(_)));
        assert!(matches!(status_error(StatusCode::BAD_GATEWAY, ""), StoreError::Fetch(_)));
        assert!(matches!(status_error(StatusCode::IM_A_TEAPOT, ""), StoreError::Unknown(_)));

        let err = status_error(StatusCode::CONFLICT, "duplicate key");
        assert_eq!(err, StoreError::Validation("409 Conflict: duplicate key".to_string()));
    }

    #[test]
    fn test_split_row() {
        let item: StoredItem<WatchlistEntry> = split_row(row(json!({
            "id": 42,
            "user_id": "u1",
            "movie_id": "tt8178634",
            "title": "RRR",
            "priority": "high",
            "watched": false,
            "added_at": "2024-03-01T10:00:00Z",
            "inserted_by": "trigger"
        })))
        .unwrap();
        assert_eq!(item.id, RemoteId::new("42"));
        assert_eq!(item.payload.title, "RRR");
        assert_eq!(item.payload.priority, Priority::High);

        let uuid: StoredItem<WatchlistEntry> = split_row(row(json!({
            "id": "5f1c",
            "user_id": "u1",
            "movie_id": "m",
            "title": "Eega",
            "added_at": "2024-03-01T10:00:00Z"
        })))
        .unwrap();
        assert_eq!(uuid.id.as_str(), "5f1c");
    }

    #[test]
    fn test_split_row_errors() {
        let missing = split_row::<WatchlistEntry>(row(json!({ "title": "RRR" })));
        assert!(matches!(missing, Err(StoreError::Unknown(_))));

        let bad = split_row::<WatchlistEntry>(row(json!({ "id": 1, "title": 7 })));
        assert!(matches!(bad, Err(StoreError::Unknown(_))));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_fetch_error() {
        let client = RestClient::new(&RestConfig::new("http://127.0.0.1:1", "anon")).unwrap();
        let store = client.store::<WatchlistEntry>();
        let err = store.list(&Scope::user("u1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Fetch(_)));
    }
}
