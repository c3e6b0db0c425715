//! Domain types shared by the stores, the index engines and the pipelines.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type SequenceId = String;
pub type PageNumber = u32;

/// The two document slots of a review session.
///
/// Each corpus holds exactly one live document at a time; uploading a new
/// document replaces the previous one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CorpusId {
    Reviewer,
    Reviewee,
}

impl CorpusId {
    pub fn as_str(self) -> &'static str {
        match self {
            CorpusId::Reviewer => "reviewer",
            CorpusId::Reviewee => "reviewee",
        }
    }
}

impl fmt::Display for CorpusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page-tagged chunk as produced by a document splitter, before it is
/// owned by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageChunk {
    pub page_number: PageNumber,
    pub text: String,
}

impl PageChunk {
    pub fn new(page_number: PageNumber, text: impl Into<String>) -> Self {
        Self { page_number, text: text.into() }
    }
}

/// A chunk owned by a corpus.
///
/// - `sequence_id`: positional index within the replacement batch that
///   inserted it; unique per corpus, not across replacements
/// - `page_number`: 1-based page the text was extracted from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub corpus: CorpusId,
    pub sequence_id: SequenceId,
    pub page_number: PageNumber,
    pub text: String,
}

/// The minimal surface returned by every index engine.
///
/// `sequence_id` matches `Chunk::sequence_id`. `score` is engine-specific but
/// higher is always better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub sequence_id: SequenceId,
    pub score: f32,
}

/// A chunk returned by a similarity query, in ranking order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub sequence_id: SequenceId,
    pub page_number: PageNumber,
    pub text: String,
    pub score: f32,
}

/// A finalized evaluation question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub number: usize,
    /// Question text including its trailing `(Page N)` annotation.
    pub text: String,
    /// Pages cited by the annotation, in order of first appearance.
    pub citations: Vec<PageNumber>,
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number, self.text)
    }
}

/// One answered question. Records are kept in input order, so duplicate
/// questions each keep their own answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: String,
    pub answer_text: String,
    /// Retrieved pages in similarity order (not page order).
    pub citations: Vec<PageNumber>,
}

impl AnswerRecord {
    /// The answer with its retrieved pages appended, e.g. `"Yes.\nPages: [3, 1]"`.
    pub fn rendered(&self) -> String {
        let pages: Vec<String> = self.citations.iter().map(ToString::to_string).collect();
        format!("{}\nPages: [{}]", self.answer_text, pages.join(", "))
    }
}

/// Decoding options forwarded verbatim to the generation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub num_ctx: u32,
    pub top_k: u32,
    pub top_p: f32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
}

impl GenerationOptions {
    /// Greedy decoding, used whenever output must follow the list format.
    pub fn deterministic() -> Self {
        Self { num_ctx: 4096, top_k: 1, top_p: 0.1, temperature: 0.0, frequency_penalty: None, presence_penalty: None }
    }

    /// Free-text answers.
    pub fn conversational(temperature: f32) -> Self {
        Self { num_ctx: 4096, top_k: 40, top_p: 0.9, temperature, frequency_penalty: Some(0.0), presence_penalty: Some(0.0) }
    }
}

impl Default for GenerationOptions {
    fn default() -> Self { Self::deterministic() }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub options: GenerationOptions,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, options: GenerationOptions) -> Self {
        Self { model: model.into(), prompt: prompt.into(), system: None, options }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}
