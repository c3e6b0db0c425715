use std::time::Duration;

use thiserror::Error;

use crate::types::{CorpusId, PageNumber};

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed caller input. `field` names the offending
    /// parameter when there is one.
    #[error("{message}")]
    InputValidation { field: Option<String>, message: String },

    #[error("malformed list at byte {offset}: {message}")]
    MalformedList { offset: usize, message: String },

    #[error("question generation failed for chunk on page {page}: {source}")]
    QuestionGeneration {
        page: PageNumber,
        #[source]
        source: Box<Error>,
    },

    #[error("question refinement failed: {message}")]
    QuestionRefinement { message: String },

    #[error("the {0} corpus has not been populated")]
    EmptyCorpus(CorpusId),

    #[error("generation request timed out after {}s", .after.as_secs())]
    GenerationTimeout { after: Duration },

    #[error("generation gateway error: {0}")]
    Gateway(String),

    #[error("failed to write {corpus} corpus: {message}")]
    CorpusWrite { corpus: CorpusId, message: String },

    #[error("index operation failed: {0}")]
    Index(String),
}

impl Error {
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        Self::InputValidation { field: Some(field.to_string()), message: message.into() }
    }

    pub fn malformed(offset: usize, message: impl Into<String>) -> Self {
        Self::MalformedList { offset, message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
