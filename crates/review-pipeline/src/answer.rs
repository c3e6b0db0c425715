use std::sync::Arc;

use review_core::error::{Error, Result};
use review_core::traits::GenerationGateway;
use review_core::types::{AnswerRecord, CorpusId, GenerationOptions, GenerationRequest};

use crate::store::CorpusManager;

pub const DEFAULT_ANSWER_INSTRUCTION: &str = "Answer the following question by analyzing the content of the text";

#[derive(Debug, Clone)]
pub struct AnswerParams {
    pub model: String,
    pub temperature: f32,
    /// Reviewee chunks retrieved per question.
    pub num_sources: usize,
    pub instruction: Option<String>,
}

/// Answers questions from the reviewee corpus, one retrieval and one
/// generation per question. Records come back in input order and any failure
/// discards the whole batch.
pub struct AnswerPipeline {
    gateway: Arc<dyn GenerationGateway>,
}

impl AnswerPipeline {
    pub fn new(gateway: Arc<dyn GenerationGateway>) -> Self { Self { gateway } }

    pub async fn answer(&self, corpora: &CorpusManager, questions: &[String], params: &AnswerParams) -> Result<Vec<AnswerRecord>> {
        if questions.is_empty() { return Err(Error::invalid_field("questions", "at least one question is required")); }
        if params.num_sources == 0 { return Err(Error::invalid_field("num_sources", "must be at least 1")); }
        if params.model.trim().is_empty() { return Err(Error::invalid_field("model", "must not be empty")); }
        let instruction = params.instruction.as_deref().filter(|s| !s.trim().is_empty()).unwrap_or(DEFAULT_ANSWER_INSTRUCTION);

        let mut records = Vec::with_capacity(questions.len());
        for question in questions {
            let question = normalize_question(question);
            let retrieved = corpora.query(CorpusId::Reviewee, &question, params.num_sources).await?;
            let contexts: Vec<&str> = retrieved.iter().map(|c| c.text.as_str()).collect();
            let prompt = format!("Using this text: {contexts:?}. \n\n\n {instruction}: {question}.");
            let request = GenerationRequest::new(params.model.clone(), prompt, GenerationOptions::conversational(params.temperature));
            let answer_text = self.gateway.generate(&request).await?;
            let citations = retrieved.iter().map(|c| c.page_number).collect();
            tracing::debug!(question = %question, sources = retrieved.len(), "answered");
            records.push(AnswerRecord { question, answer_text, citations });
        }
        Ok(records)
    }
}

/// Keep the text up to the first `?` and end it with one.
pub fn normalize_question(question: &str) -> String {
    let head = question.split('?').next().unwrap_or_default();
    format!("{head}?")
}
