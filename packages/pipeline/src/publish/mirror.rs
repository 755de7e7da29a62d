//! Blob store and KV index mirror for the hosted site.
//!
//! The static site reads `reports/<slug>.html` from the blob store and the
//! listing from the KV index: `report:<slug>` holds the entry JSON and the
//! `reports` list holds slugs, newest first.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::publish::index::IndexEntry;
use research::SecretString;

pub const DEFAULT_BLOB_API: &str = "https://blob.vercel-storage.com";
pub const REPORTS_LIST_KEY: &str = "reports";

pub fn blob_path(slug: &str) -> String {
    format!("reports/{}.html", slug)
}

pub fn entry_key(slug: &str) -> String {
    format!("report:{}", slug)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobEntry {
    pub pathname: String,
    pub url: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store publicly. Returns the public URL.
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>>;

    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>>;
}

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Push to the head of a list. Returns the new length.
    async fn lpush(&self, key: &str, value: &str) -> Result<usize>;

    /// Remove occurrences of `value` (all of them when `count` is 0).
    /// Returns how many were removed.
    async fn lrem(&self, key: &str, count: usize, value: &str) -> Result<usize>;

    async fn del(&self, key: &str) -> Result<()>;
}

fn http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
}

async fn api_error(service: &str, response: reqwest::Response) -> PipelineError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    PipelineError::Publish(format!("{} API error {}: {}", service, status, body))
}

/// Blob store over its HTTP API.
#[derive(Clone)]
pub struct HttpBlobStore {
    client: Client,
    base_url: String,
    token: SecretString,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    blobs: Vec<BlobEntry>,
}

impl HttpBlobStore {
    pub fn new(token: SecretString) -> Self {
        Self {
            client: http_client(),
            base_url: DEFAULT_BLOB_API.to_string(),
            token,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose())
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let response = self
            .client
            .put(format!("{}/{}", self.base_url, path))
            .header("Authorization", self.bearer())
            .header("x-content-type", content_type)
            .header("x-add-random-suffix", "0")
            .header("access", "public")
            .body(bytes)
            .send()
            .await
            .map_err(|e| PipelineError::Publish(e.to_string()))?;
        if !response.status().is_success() {
            return Err(api_error("Blob", response).await);
        }
        let put: PutResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Publish(e.to_string()))?;
        Ok(put.url)
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let Some(entry) = self.list(path).await?.into_iter().find(|b| b.pathname == path) else {
            return Ok(None);
        };
        let response = self
            .client
            .get(&entry.url)
            .send()
            .await
            .map_err(|e| PipelineError::Publish(e.to_string()))?;
        if !response.status().is_success() {
            return Err(api_error("Blob", response).await);
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Publish(e.to_string()))?;
        Ok(Some(bytes.to_vec()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("prefix", prefix)])
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(|e| PipelineError::Publish(e.to_string()))?;
        if !response.status().is_success() {
            return Err(api_error("Blob", response).await);
        }
        let list: ListResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Publish(e.to_string()))?;
        Ok(list.blobs)
    }
}

/// Redis-compatible KV over the REST command protocol: each command is a
/// JSON array POSTed to the base URL, answered with `{"result": ...}`.
#[derive(Clone)]
pub struct RestKvStore {
    client: Client,
    url: String,
    token: SecretString,
}

#[derive(Debug, Deserialize)]
struct KvReply {
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

impl RestKvStore {
    pub fn new(url: impl Into<String>, token: SecretString) -> Self {
        Self {
            client: http_client(),
            url: url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    async fn command(&self, args: &[&str]) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.token.expose()))
            .json(&args)
            .send()
            .await
            .map_err(|e| PipelineError::Publish(e.to_string()))?;
        if !response.status().is_success() {
            return Err(api_error("KV", response).await);
        }
        let reply: KvReply = response
            .json()
            .await
            .map_err(|e| PipelineError::Publish(e.to_string()))?;
        match reply.error {
            Some(error) => Err(PipelineError::Publish(format!("KV {}: {}", args[0], error))),
            None => Ok(reply.result),
        }
    }
}

fn as_count(value: &serde_json::Value) -> usize {
    value.as_u64().unwrap_or(0) as usize
}

#[async_trait]
impl KvStore for RestKvStore {
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.command(&["SET", key, value]).await.map(|_| ())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self.command(&["GET", key]).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn lpush(&self, key: &str, value: &str) -> Result<usize> {
        Ok(as_count(&self.command(&["LPUSH", key, value]).await?))
    }

    async fn lrem(&self, key: &str, count: usize, value: &str) -> Result<usize> {
        let count = count.to_string();
        Ok(as_count(&self.command(&["LREM", key, &count, value]).await?))
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.command(&["DEL", key]).await.map(|_| ())
    }
}

/// In-process blob store.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn url(path: &str) -> String {
        format!("memory://blobs/{}", path)
    }
}

fn poisoned() -> PipelineError {
    PipelineError::Publish("in-memory store lock poisoned".into())
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String> {
        self.blobs
            .write()
            .map_err(|_| poisoned())?
            .insert(path.to_string(), bytes);
        Ok(Self::url(path))
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().map_err(|_| poisoned())?.get(path).cloned())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>> {
        Ok(self
            .blobs
            .read()
            .map_err(|_| poisoned())?
            .keys()
            .filter(|path| path.starts_with(prefix))
            .map(|path| BlobEntry {
                pathname: path.clone(),
                url: Self::url(path),
            })
            .collect())
    }
}

/// In-process KV store.
#[derive(Clone, Default)]
pub struct MemoryKvStore {
    values: Arc<RwLock<HashMap<String, String>>>,
    lists: Arc<RwLock<HashMap<String, VecDeque<String>>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a list, head first.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.lists
            .read()
            .ok()
            .and_then(|lists| lists.get(key).map(|l| l.iter().cloned().collect()))
            .unwrap_or_default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .map_err(|_| poisoned())?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().map_err(|_| poisoned())?.get(key).cloned())
    }

    async fn lpush(&self, key: &str, value: &str) -> Result<usize> {
        let mut lists = self.lists.write().map_err(|_| poisoned())?;
        let list = lists.entry(key.to_string()).or_default();
        list.push_front(value.to_string());
        Ok(list.len())
    }

    async fn lrem(&self, key: &str, count: usize, value: &str) -> Result<usize> {
        let mut lists = self.lists.write().map_err(|_| poisoned())?;
        let Some(list) = lists.get_mut(key) else {
            return Ok(0);
        };
        let limit = if count == 0 { usize::MAX } else { count };
        let mut removed = 0;
        list.retain(|item| {
            if removed < limit && item == value {
                removed += 1;
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.values.write().map_err(|_| poisoned())?.remove(key);
        self.lists.write().map_err(|_| poisoned())?.remove(key);
        Ok(())
    }
}

/// Pushes a published report to the blob store and KV index.
#[derive(Clone)]
pub struct Mirror {
    blobs: Arc<dyn BlobStore>,
    kv: Arc<dyn KvStore>,
}

impl Mirror {
    pub fn new(blobs: Arc<dyn BlobStore>, kv: Arc<dyn KvStore>) -> Self {
        Self { blobs, kv }
    }

    /// Upload the page, record its entry, and move its slug to the head of
    /// the listing. Returns the page's public URL.
    pub async fn publish(&self, entry: &IndexEntry, html: &str) -> Result<String> {
        let url = self
            .blobs
            .put(&blob_path(&entry.slug), html.as_bytes().to_vec(), "text/html; charset=utf-8")
            .await?;

        let mut record = serde_json::to_value(entry)?;
        record["url"] = serde_json::Value::String(url.clone());
        self.kv.set(&entry_key(&entry.slug), &record.to_string()).await?;
        self.kv.lrem(REPORTS_LIST_KEY, 0, &entry.slug).await?;
        self.kv.lpush(REPORTS_LIST_KEY, &entry.slug).await?;

        info!(slug = %entry.slug, url = %url, "Report mirrored");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use report::testing::sample_report;

    #[tokio::test]
    async fn memory_lrem_honours_count() {
        let kv = MemoryKvStore::new();
        for v in ["a", "b", "a", "a"] {
            kv.lpush("l", v).await.unwrap();
        }
        assert_eq!(kv.lrem("l", 2, "a").await.unwrap(), 2);
        assert_eq!(kv.list("l"), vec!["b", "a"]);
        assert_eq!(kv.lrem("missing", 0, "a").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn republishing_moves_the_slug_to_the_head_once() {
        let blobs = MemoryBlobStore::new();
        let kv = MemoryKvStore::new();
        let mirror = Mirror::new(Arc::new(blobs.clone()), Arc::new(kv.clone()));
        let entry = IndexEntry::from_report(&sample_report());
        let other = IndexEntry {
            slug: "other-20260101".into(),
            ..entry.clone()
        };

        mirror.publish(&entry, "<html>1</html>").await.unwrap();
        mirror.publish(&other, "<html>2</html>").await.unwrap();
        let url = mirror.publish(&entry, "<html>3</html>").await.unwrap();

        assert_eq!(kv.list(REPORTS_LIST_KEY), vec![entry.slug.clone(), other.slug.clone()]);
        assert_eq!(
            blobs.get(&blob_path(&entry.slug)).await.unwrap().unwrap(),
            b"<html>3</html>".to_vec()
        );
        let stored: serde_json::Value =
            serde_json::from_str(&kv.get(&entry_key(&entry.slug)).await.unwrap().unwrap()).unwrap();
        assert_eq!(stored["url"], url);
        assert_eq!(stored["slug"], entry.slug);
        assert_eq!(blobs.list("reports/").await.unwrap().len(), 2);
    }
}
