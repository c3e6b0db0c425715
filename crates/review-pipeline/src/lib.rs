//! review-pipeline
//!
//! Corpus storage and the review workflows built on it: question synthesis
//! from the reviewer document, retrieval-augmented answering and commentary
//! over the reviewee document, and raw document queries.

pub mod answer;
pub mod commentary;
pub mod qa;
pub mod store;
pub mod synthesis;

pub use answer::{normalize_question, AnswerParams, AnswerPipeline, DEFAULT_ANSWER_INSTRUCTION};
pub use commentary::{ReviewComment, ReviewCommentator, NO_COMMENT};
pub use qa::{document_qa, DocumentMatches, REVIEWEE_MARKER};
pub use store::{ChunkStore, CorpusManager, CorpusSnapshot};
pub use synthesis::{page_citations, QuestionSynthesizer, DEFAULT_QUESTION_TASK};
