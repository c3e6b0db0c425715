use std::path::{Path, PathBuf};
use std::sync::Arc;

use review_core::config::{resolve_with_base, Settings};
use review_core::splitter::PdfSplitter;
use review_core::traits::{ChunkIndex, DocumentSplitter, GenerationGateway};
use review_core::types::CorpusId;
use review_llm::OllamaGateway;
use review_pipeline::{AnswerPipeline, CorpusManager, QuestionSynthesizer, ReviewCommentator};

/// Everything a request handler needs. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub corpora: Arc<CorpusManager>,
    pub synthesizer: Arc<QuestionSynthesizer>,
    pub answers: Arc<AnswerPipeline>,
    pub commentator: Arc<ReviewCommentator>,
    pub reviewer_splitter: Arc<dyn DocumentSplitter>,
    pub reviewee_splitter: Arc<dyn DocumentSplitter>,
    pub upload_dir: PathBuf,
}

impl AppState {
    /// Wire the pipelines around an existing index and gateway.
    pub fn new(settings: &Settings, base: &Path, index: Arc<dyn ChunkIndex>, gateway: Arc<dyn GenerationGateway>) -> Self {
        let concurrency = settings.pipeline.synthesis_concurrency;
        Self {
            corpora: Arc::new(CorpusManager::new(index)),
            synthesizer: Arc::new(QuestionSynthesizer::new(gateway.clone(), settings.generation.question_model.clone(), concurrency)),
            answers: Arc::new(AnswerPipeline::new(gateway.clone())),
            commentator: Arc::new(ReviewCommentator::new(gateway, settings.generation.comment_model.clone(), concurrency)),
            reviewer_splitter: Arc::new(PdfSplitter::new(settings.splitter.reviewer_max_chars)),
            reviewee_splitter: Arc::new(PdfSplitter::new(settings.splitter.reviewee_max_chars)),
            upload_dir: resolve_with_base(base, &settings.server.upload_dir),
        }
    }

    /// Build the embedder, index and Ollama gateway named by `settings`.
    pub async fn from_settings(settings: &Settings, base: &Path) -> anyhow::Result<Self> {
        let embedder = review_embed::build_embedder(&settings.embedding)?;
        let index = review_hybrid::build_index(&settings.index, base, embedder).await?;
        let gateway: Arc<dyn GenerationGateway> = Arc::new(OllamaGateway::new(&settings.generation)?);
        Ok(Self::new(settings, base, index, gateway))
    }

    pub fn splitter(&self, corpus: CorpusId) -> Arc<dyn DocumentSplitter> {
        match corpus {
            CorpusId::Reviewer => self.reviewer_splitter.clone(),
            CorpusId::Reviewee => self.reviewee_splitter.clone(),
        }
    }
}
