#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use review_core::error::Result;
use review_core::traits::{ChunkIndex, GenerationGateway};
use review_core::types::{Chunk, GenerationRequest, PageChunk, SearchHit};
use review_embed::HashEmbedder;
use review_pipeline::CorpusManager;
use review_vector::MemoryChunkIndex;

type Respond = Box<dyn Fn(&GenerationRequest) -> Result<String> + Send + Sync>;
type Delay = Box<dyn Fn(&GenerationRequest) -> Duration + Send + Sync>;

/// Gateway answering from a closure and recording every request.
pub struct ScriptedGateway {
    respond: Respond,
    delay: Option<Delay>,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGateway {
    pub fn new(respond: impl Fn(&GenerationRequest) -> Result<String> + Send + Sync + 'static) -> Self {
        Self { respond: Box::new(respond), delay: None, requests: Mutex::new(Vec::new()) }
    }

    pub fn with_delay(mut self, delay: impl Fn(&GenerationRequest) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    pub fn calls(&self) -> usize { self.requests.lock().len() }
}

#[async_trait]
impl GenerationGateway for ScriptedGateway {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.lock().push(request.clone());
        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(request)).await;
        }
        (self.respond)(request)
    }
}

/// Gateway that holds every call for `hold` and records the most calls it
/// saw in flight at once. Answers each chunk with one question.
pub struct PeakGateway {
    hold: Duration,
    in_flight: AtomicUsize,
    pub peak: AtomicUsize,
}

impl PeakGateway {
    pub fn new(hold: Duration) -> Self { Self { hold, in_flight: AtomicUsize::new(0), peak: AtomicUsize::new(0) } }
}

#[async_trait]
impl GenerationGateway for PeakGateway {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.hold).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match refinement_pool(&request.prompt) {
            Some(pool) => Ok(pool.to_string()),
            None => Ok(format!("['Is {} covered?']", chunk_text(&request.prompt).unwrap_or_default())),
        }
    }
}

/// In-memory index that can be told to reject inserts and reports which
/// collections currently exist.
pub struct FlakyIndex {
    inner: MemoryChunkIndex,
    pub fail_inserts: AtomicBool,
    live: Mutex<BTreeSet<String>>,
}

impl FlakyIndex {
    pub fn new() -> Self {
        Self { inner: MemoryChunkIndex::new(Arc::new(HashEmbedder::new(64))), fail_inserts: AtomicBool::new(false), live: Mutex::new(BTreeSet::new()) }
    }

    pub fn live_collections(&self) -> Vec<String> { self.live.lock().iter().cloned().collect() }
}

#[async_trait]
impl ChunkIndex for FlakyIndex {
    async fn insert(&self, collection: &str, chunks: &[Chunk]) -> anyhow::Result<()> {
        self.live.lock().insert(collection.to_string());
        if self.fail_inserts.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        self.inner.insert(collection, chunks).await
    }

    async fn search(&self, collection: &str, query: &str, k: usize) -> anyhow::Result<Vec<SearchHit>> {
        self.inner.search(collection, query, k).await
    }

    async fn delete(&self, collection: &str) -> anyhow::Result<()> {
        self.live.lock().remove(collection);
        self.inner.delete(collection).await
    }
}

pub fn memory_manager() -> CorpusManager {
    CorpusManager::new(Arc::new(MemoryChunkIndex::new(Arc::new(HashEmbedder::new(128)))))
}

pub fn pages(texts: &[(u32, &str)]) -> Vec<PageChunk> {
    texts.iter().map(|(p, t)| PageChunk::new(*p, *t)).collect()
}

/// The `{pool}` part of a refinement prompt.
pub fn refinement_pool(prompt: &str) -> Option<&str> {
    let rest = prompt.strip_prefix("Using this list of questions: ")?;
    rest.split(". Perform this task:").next()
}

/// The `{chunk}` part of a per-chunk question prompt.
pub fn chunk_text(prompt: &str) -> Option<&str> {
    let rest = prompt.strip_prefix("Using this text: ")?;
    rest.split("\n\n\n\n. ").next()
}
