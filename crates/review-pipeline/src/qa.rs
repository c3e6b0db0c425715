use serde::Serialize;

use review_core::error::{Error, Result};
use review_core::types::{CorpusId, PageNumber};

use crate::store::CorpusManager;

/// Prompt marker that directs a document query at the reviewee corpus.
pub const REVIEWEE_MARKER: &str = "@doc2";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentMatches {
    pub documents: Vec<String>,
    pub page_numbers: Vec<PageNumber>,
}

/// Raw retrieval over one corpus, no generation. The reviewer corpus is the
/// default; a prompt containing [`REVIEWEE_MARKER`] searches the reviewee.
pub async fn document_qa(corpora: &CorpusManager, prompt: &str, k: usize) -> Result<DocumentMatches> {
    let (corpus, query) = if prompt.contains(REVIEWEE_MARKER) {
        (CorpusId::Reviewee, prompt.replace(REVIEWEE_MARKER, " "))
    } else {
        (CorpusId::Reviewer, prompt.to_string())
    };
    let query = query.split_whitespace().collect::<Vec<_>>().join(" ");
    if query.is_empty() { return Err(Error::invalid_field("prompt", "prompt is required")); }
    let retrieved = corpora.query(corpus, &query, k).await?;
    tracing::debug!(%corpus, hits = retrieved.len(), "document query");
    let (documents, page_numbers) = retrieved.into_iter().map(|c| (c.text, c.page_number)).unzip();
    Ok(DocumentMatches { documents, page_numbers })
}
