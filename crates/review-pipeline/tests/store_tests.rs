mod common;

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use review_core::error::Error;
use review_core::traits::{ChunkIndex, DocumentSplitter};
use review_core::types::{Chunk, CorpusId, PageChunk};
use review_embed::HashEmbedder;
use review_pipeline::CorpusManager;
use review_vector::MemoryChunkIndex;

use common::{memory_manager, pages, FlakyIndex};

#[tokio::test]
async fn replace_assigns_positional_ids_in_order() {
    let corpora = memory_manager();
    let n = corpora.replace(CorpusId::Reviewer, pages(&[(1, "intro"), (1, "scope"), (2, "criteria")])).await.unwrap();
    assert_eq!(n, 3);

    let all = corpora.get_all(CorpusId::Reviewer).await.unwrap();
    let ids: Vec<_> = all.iter().map(|c| c.sequence_id.as_str()).collect();
    assert_eq!(ids, vec!["0", "1", "2"]);
    assert_eq!(all[2].page_number, 2);
    assert!(all.iter().all(|c| c.corpus == CorpusId::Reviewer));
    assert_eq!(corpora.len(CorpusId::Reviewee).await, 0);
}

#[tokio::test]
async fn second_replace_shows_only_the_new_document() {
    let corpora = memory_manager();
    corpora.replace(CorpusId::Reviewee, pages(&[(1, "alpha budget"), (2, "alpha team")])).await.unwrap();
    corpora.replace(CorpusId::Reviewee, pages(&[(1, "beta budget")])).await.unwrap();

    let all = corpora.get_all(CorpusId::Reviewee).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].text, "beta budget");

    let hits = corpora.query(CorpusId::Reviewee, "budget", 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "beta budget");
}

#[tokio::test]
async fn query_returns_at_most_k_in_similarity_order() {
    let corpora = memory_manager();
    corpora.replace(CorpusId::Reviewee, pages(&[(1, "weather report"), (2, "solar energy budget"), (3, "solar panels")])).await.unwrap();
    let hits = corpora.query(CorpusId::Reviewee, "solar energy", 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].page_number, 2);
    assert!(hits[0].score >= hits[1].score);

    let all = corpora.query(CorpusId::Reviewee, "solar", 10).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn empty_corpus_and_bad_arguments_are_typed_errors() {
    let corpora = memory_manager();
    assert!(matches!(corpora.query(CorpusId::Reviewee, "anything", 3).await, Err(Error::EmptyCorpus(CorpusId::Reviewee))));
    assert!(matches!(corpora.get_all(CorpusId::Reviewer).await, Err(Error::EmptyCorpus(CorpusId::Reviewer))));

    corpora.replace(CorpusId::Reviewee, pages(&[(1, "text")])).await.unwrap();
    assert!(matches!(corpora.query(CorpusId::Reviewee, "text", 0).await, Err(Error::InputValidation { .. })));

    let err = corpora.replace(CorpusId::Reviewee, Vec::new()).await.unwrap_err();
    assert!(matches!(err, Error::InputValidation { .. }));
    assert_eq!(corpora.len(CorpusId::Reviewee).await, 1);
}

#[tokio::test]
async fn failed_insert_keeps_the_old_document() {
    let index = Arc::new(FlakyIndex::new());
    let corpora = CorpusManager::new(index.clone());
    corpora.replace(CorpusId::Reviewer, pages(&[(1, "rubric version one")])).await.unwrap();
    assert_eq!(index.live_collections(), vec!["reviewer-g1".to_string()]);

    index.fail_inserts.store(true, Ordering::SeqCst);
    let err = corpora.replace(CorpusId::Reviewer, pages(&[(1, "rubric version two"), (2, "more")])).await.unwrap_err();
    assert!(matches!(err, Error::CorpusWrite { corpus: CorpusId::Reviewer, .. }), "got {err:?}");

    let all = corpora.get_all(CorpusId::Reviewer).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].text, "rubric version one");
    let hits = corpora.query(CorpusId::Reviewer, "rubric", 5).await.unwrap();
    assert_eq!(hits[0].text, "rubric version one");
    assert_eq!(index.live_collections(), vec!["reviewer-g1".to_string()]);
}

#[tokio::test]
async fn replaced_generations_are_removed_from_the_index() {
    let index = Arc::new(FlakyIndex::new());
    let corpora = CorpusManager::new(index.clone());
    corpora.replace(CorpusId::Reviewer, pages(&[(1, "a")])).await.unwrap();
    corpora.replace(CorpusId::Reviewee, pages(&[(1, "b")])).await.unwrap();
    corpora.replace(CorpusId::Reviewer, pages(&[(1, "c")])).await.unwrap();

    let snapshot = corpora.store(CorpusId::Reviewer).snapshot().await.unwrap();
    assert_eq!(snapshot.generation, 2);
    assert_eq!(index.live_collections(), vec!["reviewee-g1".to_string(), "reviewer-g2".to_string()]);
}

#[tokio::test]
async fn leftover_collection_from_a_previous_run_is_cleared() {
    let index = Arc::new(MemoryChunkIndex::new(Arc::new(HashEmbedder::new(128))));
    let stale = Chunk { corpus: CorpusId::Reviewer, sequence_id: "0".to_string(), page_number: 9, text: "stale rubric".to_string() };
    index.insert("reviewer-g1", &[stale]).await.unwrap();

    let corpora = CorpusManager::new(index.clone());
    corpora.replace(CorpusId::Reviewer, pages(&[(1, "fresh rubric")])).await.unwrap();
    let hits = corpora.query(CorpusId::Reviewer, "rubric", 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "fresh rubric");
    assert_eq!(hits[0].page_number, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_queries_never_see_mixed_or_empty_state() {
    let corpora = Arc::new(memory_manager());
    let doc_a = pages(&[(1, "A shared words one"), (2, "A shared words two"), (3, "A shared words three")]);
    let doc_b = pages(&[(1, "B shared words one"), (2, "B shared words two")]);
    corpora.replace(CorpusId::Reviewee, doc_a.clone()).await.unwrap();

    let mut readers = Vec::new();
    for _ in 0..4 {
        let corpora = corpora.clone();
        readers.push(tokio::spawn(async move {
            for _ in 0..50 {
                let hits = corpora.query(CorpusId::Reviewee, "shared words", 10).await.unwrap();
                assert!(!hits.is_empty(), "query observed an empty corpus");
                let prefix = &hits[0].text[..1];
                assert!(hits.iter().all(|h| h.text.starts_with(prefix)), "query observed mixed documents");
                let expected = if prefix == "A" { 3 } else { 2 };
                assert_eq!(hits.len(), expected);
                tokio::task::yield_now().await;
            }
        }));
    }
    for i in 0..20 {
        let doc = if i % 2 == 0 { doc_b.clone() } else { doc_a.clone() };
        corpora.replace(CorpusId::Reviewee, doc).await.unwrap();
    }
    for reader in readers {
        reader.await.unwrap();
    }
}

struct FixedSplitter(Option<Vec<PageChunk>>);

impl DocumentSplitter for FixedSplitter {
    fn split(&self, _path: &Path) -> anyhow::Result<Vec<PageChunk>> {
        self.0.clone().ok_or_else(|| anyhow::anyhow!("not a PDF"))
    }
}

#[tokio::test]
async fn ingest_splits_and_replaces() {
    let corpora = memory_manager();
    let splitter = Arc::new(FixedSplitter(Some(pages(&[(1, "one"), (2, "two")]))));
    let n = corpora.ingest(CorpusId::Reviewer, splitter, PathBuf::from("rubric.pdf")).await.unwrap();
    assert_eq!(n, 2);

    let broken = Arc::new(FixedSplitter(None));
    let err = corpora.ingest(CorpusId::Reviewer, broken, PathBuf::from("notes.pdf")).await.unwrap_err();
    match err {
        Error::InputValidation { field, message } => {
            assert_eq!(field.as_deref(), Some("file"));
            assert!(message.contains("not a PDF"));
        }
        other => panic!("expected input validation error, got {other:?}"),
    }
    assert_eq!(corpora.len(CorpusId::Reviewer).await, 2);
}
