use std::collections::HashMap;
use std::future::Future;
use std::io::Write;
use std::str::FromStr;

use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use review_core::config::ServerSettings;
use review_core::error::Error;
use review_core::list_literal::parse_list;
use review_core::types::{AnswerRecord, CorpusId};
use review_pipeline::{document_qa, AnswerParams, DocumentMatches, ReviewComment};

use crate::error::ApiError;
use crate::state::AppState;

type ApiResult<T> = Result<T, ApiError>;

const UPLOAD_FAILED: &str = "Processing the uploaded PDF failed";

pub fn router(state: AppState, server: &ServerSettings) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/add_reviewer", post(add_reviewer))
        .route("/add_reviewee", post(add_reviewee))
        .route("/questions", get(questions))
        .route("/answer_questions", get(answer_questions))
        .route("/document_qa", get(document_qa_route))
        .route("/write_comments", get(write_comments))
        .layer(DefaultBodyLimit::max(server.max_upload_mb * 1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run `work` on its own task so a client hanging up does not cancel it.
async fn detached<T, F>(work: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T, Error>> + Send + 'static,
{
    tokio::spawn(work)
        .await
        .map_err(|e| ApiError::internal(format!("An error occurred: request task failed: {e}")))?
        .map_err(ApiError::from)
}

async fn index() -> &'static str { "Hello, World!" }

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "reviewer_chunks": state.corpora.len(CorpusId::Reviewer).await,
        "reviewee_chunks": state.corpora.len(CorpusId::Reviewee).await,
    }))
}

async fn add_reviewer(State(state): State<AppState>, multipart: Multipart) -> ApiResult<impl IntoResponse> {
    upload(state, CorpusId::Reviewer, multipart).await
}

async fn add_reviewee(State(state): State<AppState>, multipart: Multipart) -> ApiResult<impl IntoResponse> {
    upload(state, CorpusId::Reviewee, multipart).await
}

async fn upload(state: AppState, corpus: CorpusId, mut multipart: Multipart) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("An error occurred: {e}")).with_details(UPLOAD_FAILED))?
    {
        if field.name() != Some("file") { continue; }
        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(ApiError::bad_request("No file selected for uploading"));
        }
        if !file_name.to_ascii_lowercase().ends_with(".pdf") {
            return Err(ApiError::bad_request("Allowed file type is pdf"));
        }
        upload = Some((file_name, spool_upload(&state, field).await?));
        break;
    }
    let Some((file_name, temp)) = upload else {
        return Err(ApiError::bad_request("No file part in the request"));
    };
    tracing::info!(%corpus, file = %file_name, "document uploaded");
    let corpora = state.corpora.clone();
    let splitter = state.splitter(corpus);
    let added = detached(async move {
        // The temp file lives until ingestion finishes, then is removed on drop.
        let path = temp.path().to_path_buf();
        let result = corpora.ingest(corpus, splitter, path).await;
        drop(temp);
        result
    })
    .await
    .map_err(|e| e.with_details(UPLOAD_FAILED))?;

    Ok((StatusCode::CREATED, Json(json!({
        "status": "success",
        "message": format!("Added {added} {corpus} documents to the collection"),
    }))))
}

async fn spool_upload(state: &AppState, mut file: axum::extract::multipart::Field<'_>) -> ApiResult<tempfile::NamedTempFile> {
    let io_error = |e: std::io::Error| ApiError::internal(format!("An error occurred: {e}")).with_details(UPLOAD_FAILED);
    std::fs::create_dir_all(&state.upload_dir).map_err(io_error)?;
    let mut temp = tempfile::Builder::new().prefix("upload-").suffix(".pdf").tempfile_in(&state.upload_dir).map_err(io_error)?;
    while let Some(bytes) = file
        .chunk()
        .await
        .map_err(|e| ApiError::bad_request(format!("An error occurred: {e}")).with_details(UPLOAD_FAILED))?
    {
        temp.write_all(&bytes).map_err(io_error)?;
    }
    temp.flush().map_err(io_error)?;
    Ok(temp)
}

async fn questions(State(state): State<AppState>, Query(params): Query<HashMap<String, String>>) -> ApiResult<Json<Vec<String>>> {
    let task = params.get("prompt").cloned();
    let questions = detached(async move { state.synthesizer.synthesize(&state.corpora, task.as_deref()).await }).await?;
    Ok(Json(questions.iter().map(ToString::to_string).collect()))
}

async fn answer_questions(State(state): State<AppState>, Query(params): Query<HashMap<String, String>>) -> ApiResult<Json<Map<String, Value>>> {
    let raw = required(&params, "questions")?;
    let questions = parse_list(raw).map_err(|e| match e {
        Error::MalformedList { offset, message } => Error::invalid_field("questions", format!("malformed list at byte {offset}: {message}")),
        other => other,
    })?;
    let answer_params = AnswerParams {
        temperature: parsed(&params, "temperature")?,
        num_sources: parsed(&params, "num_sources")?,
        model: required(&params, "model")?.to_string(),
        instruction: params.get("prompt").cloned(),
    };
    let records = detached(async move { state.answers.answer(&state.corpora, &questions, &answer_params).await }).await?;
    Ok(Json(answers_object(records)))
}

async fn document_qa_route(State(state): State<AppState>, Query(params): Query<HashMap<String, String>>) -> ApiResult<Json<DocumentMatches>> {
    let prompt = required(&params, "prompt")?.to_string();
    let k: usize = parsed(&params, "source_num")?;
    let matches = detached(async move { document_qa(&state.corpora, &prompt, k).await }).await?;
    Ok(Json(matches))
}

async fn write_comments(State(state): State<AppState>) -> ApiResult<Json<Vec<ReviewComment>>> {
    let comments = detached(async move { state.commentator.write_comments(&state.corpora).await }).await?;
    Ok(Json(comments))
}

fn required<'a>(params: &'a HashMap<String, String>, name: &str) -> Result<&'a str, Error> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::invalid_field(name, format!("Missing '{name}' query parameter")))
}

fn parsed<T: FromStr>(params: &HashMap<String, String>, name: &str) -> Result<T, Error> {
    let raw = required(params, name)?;
    raw.trim().parse().map_err(|_| Error::invalid_field(name, format!("cannot parse {raw:?}")))
}

/// Question → answer text with its trailing `Pages: [..]`, in input order. A
/// repeated question gets an occurrence suffix (` [2]`, ` [3]`, ...) so every
/// answer is kept.
pub fn answers_object(records: Vec<AnswerRecord>) -> Map<String, Value> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Map::new();
    for record in records {
        let occurrence = seen.entry(record.question.clone()).or_insert(0);
        *occurrence += 1;
        let key = if *occurrence == 1 { record.question.clone() } else { format!("{} [{}]", record.question, occurrence) };
        out.insert(key, Value::String(record.rendered()));
    }
    out
}
