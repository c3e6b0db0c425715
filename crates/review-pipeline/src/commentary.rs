use std::sync::Arc;

use futures::{StreamExt, TryStreamExt};
use serde::Serialize;

use review_core::error::Result;
use review_core::traits::GenerationGateway;
use review_core::types::{Chunk, CorpusId, GenerationOptions, GenerationRequest, PageNumber, SequenceId};

use crate::store::CorpusManager;

pub const NO_COMMENT: &str = "No comment";

const COMMENT_TEMPERATURE: f32 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewComment {
    pub sequence_id: SequenceId,
    pub page_number: PageNumber,
    pub original_text: String,
    pub comment: String,
}

/// Peer-review comments for every reviewee chunk, in chunk order.
pub struct ReviewCommentator {
    gateway: Arc<dyn GenerationGateway>,
    model: String,
    concurrency: usize,
}

impl ReviewCommentator {
    pub fn new(gateway: Arc<dyn GenerationGateway>, model: impl Into<String>, concurrency: usize) -> Self {
        Self { gateway, model: model.into(), concurrency: concurrency.max(1) }
    }

    pub async fn write_comments(&self, corpora: &CorpusManager) -> Result<Vec<ReviewComment>> {
        let chunks = corpora.get_all(CorpusId::Reviewee).await?;
        let comments: Vec<ReviewComment> = futures::stream::iter(chunks)
            .map(|chunk| self.comment_on(chunk))
            .buffered(self.concurrency)
            .try_collect()
            .await?;
        let silent = comments.iter().filter(|c| c.comment.trim() == NO_COMMENT).count();
        tracing::info!(chunks = comments.len(), silent, "review comments written");
        Ok(comments)
    }

    async fn comment_on(&self, chunk: Chunk) -> Result<ReviewComment> {
        let prompt = format!(
            "You are a PEER REVIEWER who generates comments ONLY IF THE PROVIDED TEXT HAS STUFF TO COMMENT ON. IF THERE ARE NO COMMENTS, SIMPLY RETURN '{NO_COMMENT}'\n\n\n\n Generate comments using this text:\n{}.",
            chunk.text
        );
        let request = GenerationRequest::new(self.model.clone(), prompt, GenerationOptions::conversational(COMMENT_TEMPERATURE));
        let comment = self.gateway.generate(&request).await?;
        Ok(ReviewComment { sequence_id: chunk.sequence_id, page_number: chunk.page_number, original_text: chunk.text, comment })
    }
}
