use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub use futures_util::future::BoxFuture;

const DEFAULT_BASE_URL: &str = "https://mygene.info";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MAX_CITATIONS: usize = 5;
const CACHE_TTL: Duration = Duration::from_secs(60 * 60);
const PUBMED_BASE_URL: &str = "https://pubmed.ncbi.nlm.nih.gov";
const NO_TITLE: &str = "No title available";

/// One literature reference for a gene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub url: String,
}

impl Citation {
    pub fn pubmed(pubmed_id: &str, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: format!("{PUBMED_BASE_URL}/{pubmed_id}/"),
        }
    }
}

/// Symbol -> citations. Implementations never fail: any upstream problem
/// yields an empty list.
pub trait CitationSource: Send + Sync {
    fn citations<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, Vec<Citation>>;
}

#[derive(Debug, Clone)]
pub struct MyGeneConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_citations: usize,
    pub cache_ttl: Duration,
}

impl MyGeneConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_citations(mut self, max_citations: usize) -> Self {
        self.max_citations = max_citations;
        self
    }

    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }
}

impl Default for MyGeneConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_citations: DEFAULT_MAX_CITATIONS,
            cache_ttl: CACHE_TTL,
        }
    }
}

#[derive(Debug, Error)]
pub enum MyGeneError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("mygene returned status {0}")]
    Status(StatusCode),
    #[error("malformed mygene response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}

#[derive(Clone)]
pub struct MyGeneClient {
    config: MyGeneConfig,
    http: reqwest::Client,
    cache: Arc<Mutex<CitationCache>>,
}

impl MyGeneClient {
    pub fn new(config: MyGeneConfig) -> Result<Self, MyGeneError> {
        // Reject a malformed base URL up front.
        endpoint(&config.base_url, &[])?;
        let http = reqwest::Client::builder()
            .user_agent("proteome-dashboard/0.1")
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            config,
            http,
            cache: Arc::new(Mutex::new(CitationCache::default())),
        })
    }

    pub fn config(&self) -> &MyGeneConfig {
        &self.config
    }

    /// Citations for `symbol`, capped at `max_citations`. Unknown symbols give an empty list.
    pub async fn lookup(&self, symbol: &str) -> Result<Vec<Citation>, MyGeneError> {
        if let Some(hit) = self.cache.lock().await.get(symbol, self.config.cache_ttl) {
            return Ok(hit);
        }
        let citations = match self.find_gene_id(symbol).await? {
            Some(gene_id) => self.gene_citations(&gene_id).await?,
            None => {
                debug!(symbol, "no mygene hit");
                Vec::new()
            }
        };
        self.cache
            .lock()
            .await
            .insert(symbol.to_string(), citations.clone(), self.config.cache_ttl);
        Ok(citations)
    }

    /// `_id` of the first hit for `symbol:<symbol>`.
    pub async fn find_gene_id(&self, symbol: &str) -> Result<Option<String>, MyGeneError> {
        let query = format!("symbol:{symbol}");
        let json = self
            .get_json(&["v3", "query"], &[("q", query.as_str()), ("size", "1")])
            .await?;
        Ok(first_hit_id(&json))
    }

    pub async fn gene_citations(&self, gene_id: &str) -> Result<Vec<Citation>, MyGeneError> {
        let json = self
            .get_json(&["v3", "gene", gene_id], &[("fields", "generif")])
            .await?;
        Ok(parse_generifs(&json, self.config.max_citations))
    }

    async fn get_json(&self, path: &[&str], params: &[(&str, &str)]) -> Result<Value, MyGeneError> {
        let url = endpoint(&self.config.base_url, path)?;
        let resp = self.http.get(url).query(params).send().await?;
        if !resp.status().is_success() {
            return Err(MyGeneError::Status(resp.status()));
        }
        decode_body(&resp.bytes().await?)
    }
}

impl CitationSource for MyGeneClient {
    fn citations<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, Vec<Citation>> {
        Box::pin(async move {
            match self.lookup(symbol).await {
                Ok(citations) => citations,
                Err(err) => {
                    warn!(symbol, error = %err, "gene annotation lookup failed");
                    Vec::new()
                }
            }
        })
    }
}

fn endpoint(base_url: &str, path: &[&str]) -> Result<Url, MyGeneError> {
    let mut url = Url::parse(base_url).map_err(|e| MyGeneError::InvalidBaseUrl(e.to_string()))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| MyGeneError::InvalidBaseUrl(base_url.to_string()))?;
        segments.pop_if_empty().extend(path);
    }
    Ok(url)
}

fn decode_body(body: &[u8]) -> Result<Value, MyGeneError> {
    Ok(serde_json::from_slice(body)?)
}

fn first_hit_id(json: &Value) -> Option<String> {
    let id = json.get("hits")?.as_array()?.first()?.get("_id")?;
    match id {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `generif` is an array, or a bare object when the gene has a single entry.
fn parse_generifs(json: &Value, max: usize) -> Vec<Citation> {
    let entries: Vec<&Value> = match json.get("generif") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(obj @ Value::Object(_)) => vec![obj],
        _ => Vec::new(),
    };
    entries
        .into_iter()
        .filter_map(citation_from_rif)
        .take(max)
        .collect()
}

fn citation_from_rif(rif: &Value) -> Option<Citation> {
    let pubmed = match rif.get("pubmed")? {
        Value::Number(n) => n.to_string(),
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => return None,
    };
    let title = rif
        .get("text")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(NO_TITLE);
    Some(Citation::pubmed(&pubmed, title))
}

#[derive(Default)]
struct CitationCache {
    entries: HashMap<String, CachedCitations>,
}

impl CitationCache {
    fn get(&self, key: &str, ttl: Duration) -> Option<Vec<Citation>> {
        let hit = self.entries.get(key)?;
        (hit.stored_at.elapsed() <= ttl).then(|| hit.citations.clone())
    }

    /// Expired entries are dropped on every insert, so the map only holds
    /// symbols looked up within the last `ttl`.
    fn insert(&mut self, key: String, citations: Vec<Citation>, ttl: Duration) {
        self.entries.retain(|_, hit| hit.stored_at.elapsed() <= ttl);
        self.entries.insert(
            key,
            CachedCitations {
                stored_at: Instant::now(),
                citations,
            },
        );
    }
}

struct CachedCitations {
    stored_at: Instant,
    citations: Vec<Citation>,
}
