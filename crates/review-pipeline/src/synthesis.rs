//! Two-stage question synthesis over the reviewer corpus.
//!
//! Stage one asks the model for candidate questions per reviewer chunk and
//! tags each with ` (Page N)`. Stage two sends the whole pool back once for
//! deduplication. The refined list is numbered and its page annotations are
//! checked against the reviewer document.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::{StreamExt, TryStreamExt};

use review_core::error::{Error, Result};
use review_core::list_literal::{encode_list, parse_items};
use review_core::traits::GenerationGateway;
use review_core::types::{Chunk, CorpusId, GenerationOptions, GenerationRequest, PageNumber, Question};

use crate::store::CorpusManager;

pub const DEFAULT_QUESTION_TASK: &str = "Generate me specific questions to grade any document responding to that given text. To get a good grade, all the answers to the questions should be yes.";

pub const REFINE_TASK: &str = "Return the list without duplicate questions and any questions that are too similar to each other ENSURE THE QUESTION STILL HAS ITS ASSOCIATED CITATION. Ensure all questions are evaluation questions, that seek to evaluate another document. If they are not, remove it. Ensure the questions can be parsed as a list literal.";

pub const LIST_SYSTEM_PROMPT: &str = "You are a robot that processes documents and only returns in the format ['question 1', 'question 2', 'question 3']. You will not return any natural language other than this format. Ensure none of the questions themselves have the characters ' or \", only they are encapsulated by '. If the question has one of those characters, rewrite it so it does not, or just write it in incorrect grammar. You will not return any natural language other than within the list asked to do so.";

pub struct QuestionSynthesizer {
    gateway: Arc<dyn GenerationGateway>,
    model: String,
    concurrency: usize,
}

impl QuestionSynthesizer {
    pub fn new(gateway: Arc<dyn GenerationGateway>, model: impl Into<String>, concurrency: usize) -> Self {
        Self { gateway, model: model.into(), concurrency: concurrency.max(1) }
    }

    /// Synthesize numbered evaluation questions from the reviewer corpus.
    /// `task` overrides [`DEFAULT_QUESTION_TASK`].
    pub async fn synthesize(&self, corpora: &CorpusManager, task: Option<&str>) -> Result<Vec<Question>> {
        let chunks = corpora.get_all(CorpusId::Reviewer).await?;
        let question_prompt = question_prompt(task.filter(|t| !t.trim().is_empty()).unwrap_or(DEFAULT_QUESTION_TASK));

        let per_chunk: Vec<Vec<String>> = futures::stream::iter(chunks.iter())
            .map(|chunk| self.questions_for_chunk(chunk, &question_prompt))
            .buffered(self.concurrency)
            .try_collect()
            .await?;
        let pool: Vec<String> = per_chunk.into_iter().flatten().collect();
        tracing::info!(chunks = chunks.len(), candidates = pool.len(), "per-chunk questions generated");
        if pool.is_empty() {
            return Ok(Vec::new());
        }

        let refined = self.refine(&pool).await?;
        let pages: BTreeSet<PageNumber> = chunks.iter().map(|c| c.page_number).collect();
        let questions = finalize(refined, &pages)?;
        tracing::info!(questions = questions.len(), "questions refined");
        Ok(questions)
    }

    async fn questions_for_chunk(&self, chunk: &Chunk, question_prompt: &str) -> Result<Vec<String>> {
        let prompt = format!("Using this text: {}\n\n\n\n. {}", chunk.text, question_prompt);
        let output = self.gateway.generate(&self.list_request(prompt)).await?;
        let items = parse_items(&output).map_err(|e| Error::QuestionGeneration { page: chunk.page_number, source: Box::new(e) })?;
        tracing::debug!(sequence_id = %chunk.sequence_id, page = chunk.page_number, questions = items.len(), "chunk questions");
        Ok(items.into_iter().map(|q| format!("{} (Page {})", q.trim(), chunk.page_number)).collect())
    }

    async fn refine(&self, pool: &[String]) -> Result<Vec<String>> {
        // Chunks may quote with either character; the encoded pool uses `"` only as a delimiter.
        let pool: Vec<String> = pool.iter().map(|q| q.replace('"', "'")).collect();
        let encoded = encode_list(&pool).map_err(|e| Error::QuestionRefinement { message: format!("candidate questions cannot be encoded: {e}") })?;
        let prompt = format!("Using this list of questions: {encoded}. Perform this task: {REFINE_TASK}");
        let output = self.gateway.generate(&self.list_request(prompt)).await?;
        parse_items(&output).map_err(|e| Error::QuestionRefinement { message: e.to_string() })
    }

    fn list_request(&self, prompt: String) -> GenerationRequest {
        GenerationRequest::new(self.model.clone(), prompt, GenerationOptions::deterministic()).with_system(LIST_SYSTEM_PROMPT)
    }
}

fn question_prompt(task: &str) -> String {
    format!(
        "The given text was a rubric to evaluate other documents. {task} If there are no questions that the given text illicits, return \"placeholder\" as a question in the given format.\n\
         Return ONLY the questions in the following format: [\"question1\", \"question2\", \"question3\"] with NO ' or \" INSIDE OF EACH QUESTION EVEN IF IT IS INCORRECT GRAMMAR.\n\
         Ensure the questions can be parsed as a list literal."
    )
}

fn finalize(refined: Vec<String>, pages: &BTreeSet<PageNumber>) -> Result<Vec<Question>> {
    let mut questions = Vec::with_capacity(refined.len());
    for (i, text) in refined.into_iter().enumerate() {
        let number = i + 1;
        let citations = page_citations(&text);
        if citations.is_empty() {
            tracing::warn!(number, question = %text, "refined question lost its page annotation");
        }
        if let Some(page) = citations.iter().find(|p| !pages.contains(p)) {
            return Err(Error::QuestionRefinement { message: format!("question {number} cites page {page}, which is not in the reviewer document") });
        }
        questions.push(Question { number, text, citations });
    }
    Ok(questions)
}

/// Pages named by `(Page N)` annotations, in order of first appearance.
pub fn page_citations(text: &str) -> Vec<PageNumber> {
    const OPEN: &str = "(Page ";
    let mut pages = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(OPEN) {
        rest = &rest[start + OPEN.len()..];
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 && rest[digits..].starts_with(')') {
            if let Ok(page) = rest[..digits].parse::<PageNumber>() {
                if !pages.contains(&page) { pages.push(page); }
            }
        }
    }
    pages
}
