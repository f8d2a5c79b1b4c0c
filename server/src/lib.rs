use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use lemmadex_core::{
    BuildReport, DocId, DocumentSet, EngineConfig, Evaluator, IndexBuilder, IndexHandle, InvertedIndex, Normalizer,
    Scorer, TermKind,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default)]
    pub kind: TermKind,
}
fn default_k() -> usize { 10 }

#[derive(Deserialize)]
pub struct KindParam {
    #[serde(default)]
    pub kind: TermKind,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
    pub url: Option<String>,
    pub snippet: Option<String>,
}

#[derive(Serialize)]
pub struct TermResponse {
    pub word: String,
    pub term: String,
    pub kind: TermKind,
    pub doc_freq: usize,
    pub idf: f64,
    pub postings: Vec<DocId>,
}

/// Documents and the index built from them, published together.
pub struct Corpus {
    pub documents: DocumentSet,
    pub index: InvertedIndex,
}

/// Where documents come from and how to index them.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub source: PathBuf,
    pub locators: Option<PathBuf>,
    pub engine: EngineConfig,
    /// Value expected in `X-ADMIN-TOKEN` for admin routes. Admin routes are
    /// refused when unset.
    pub admin_token: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub normalizer: Arc<Normalizer>,
    pub corpus: Arc<IndexHandle<Corpus>>,
    pub rebuilding: Arc<Mutex<()>>,
    pub admin_token: Option<String>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: impl ToString) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.to_string() })))
}

/// Read the documents and build a fresh, unpublished corpus.
pub fn load_corpus(config: &ServerConfig, normalizer: &Normalizer) -> Result<Corpus> {
    let mut documents = DocumentSet::load(&config.source)?;
    if let Some(path) = &config.locators {
        documents.load_locators(path)?;
    }
    let index = IndexBuilder::new(normalizer).threads(config.engine.threads).build(&documents.texts);
    Ok(Corpus { documents, index })
}

pub fn build_app(config: ServerConfig) -> Result<Router> {
    // Build the index at startup
    let normalizer = config.engine.normalizer()?;
    let corpus = load_corpus(&config, &normalizer)?;
    tracing::info!(num_docs = corpus.index.num_docs(), "corpus ready");
    let admin_token = config.admin_token.clone();
    let app_state = AppState {
        config: Arc::new(config),
        normalizer: Arc::new(normalizer),
        corpus: Arc::new(IndexHandle::new(corpus)),
        rebuilding: Arc::new(Mutex::new(())),
        admin_token,
    };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/term/:word", get(term_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let corpus = state.corpus.snapshot();
    let query = lemmadex_core::Query::parse(&params.q).map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    let evaluator = Evaluator::new(&corpus.index, &state.normalizer).kind(params.kind);
    let matches = evaluator.evaluate_query(&query).map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    let ranked = Scorer::new(&corpus.index).rank(&matches, &evaluator.terms(&query), params.kind);

    let total_hits = ranked.len();
    let k = params.k.clamp(1, 100);
    let words = query.positive_words();
    let results = ranked
        .into_iter()
        .take(k)
        .map(|hit| SearchHit {
            doc_id: hit.doc_id,
            score: hit.score,
            url: corpus.documents.locator(hit.doc_id).map(str::to_string),
            snippet: corpus.documents.text(hit.doc_id).and_then(|text| snippet(text, &words)),
        })
        .collect();

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits, results }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let corpus = state.corpus.snapshot();
    let Some(text) = corpus.documents.text(doc_id) else {
        return Err(api_error(StatusCode::NOT_FOUND, format!("document {doc_id} not found")));
    };
    let total_terms = corpus.index.doc_stats(doc_id).map_or(0, |s| s.total_terms);
    Ok(Json(serde_json::json!({
        "doc_id": doc_id,
        "url": corpus.documents.locator(doc_id),
        "total_terms": total_terms,
        "text": text,
    })))
}

pub async fn term_handler(
    State(state): State<AppState>,
    Path(word): Path<String>,
    Query(params): Query<KindParam>,
) -> Json<TermResponse> {
    let corpus = state.corpus.snapshot();
    let term = state.normalizer.query_term(&word, params.kind);
    let postings: Vec<DocId> = corpus.index.postings_or_empty(&term, params.kind).iter().copied().collect();
    Json(TermResponse {
        idf: Scorer::new(&corpus.index).idf(&term, params.kind),
        doc_freq: postings.len(),
        word,
        term,
        kind: params.kind,
        postings,
    })
}

/// Rebuild from the document source and swap the new corpus in. Queries in
/// flight keep the snapshot they started with.
async fn rebuild_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<BuildReport>, ApiError> {
    authorize(&state, &headers)?;
    let worker = state.clone();
    let report = tokio::task::spawn_blocking(move || -> Result<BuildReport> {
        let _guard = worker.rebuilding.lock();
        let corpus = load_corpus(&worker.config, &worker.normalizer)?;
        let report = corpus.index.report().clone();
        worker.corpus.publish(corpus);
        Ok(report)
    })
    .await
    .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?
    .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;
    tracing::info!(num_docs = report.documents, "index rebuilt and published");
    Ok(Json(report))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(api_error(StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set")),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(api_error(StatusCode::UNAUTHORIZED, "invalid admin token"))
    }
}

fn highlighter(words: &[&str]) -> Option<regex::Regex> {
    let alternatives: Vec<String> = words.iter().filter(|w| !w.trim().is_empty()).map(|w| regex::escape(w)).collect();
    if alternatives.is_empty() {
        return None;
    }
    regex::RegexBuilder::new(&alternatives.join("|")).case_insensitive(true).build().ok()
}

fn floor_boundary(text: &str, mut i: usize) -> usize {
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Window of text around the first query word, with query words wrapped in `<em>`.
fn snippet(text: &str, words: &[&str]) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let pat = highlighter(words);
    let window = match pat.as_ref().and_then(|p| p.find(text)) {
        Some(m) => {
            let start = floor_boundary(text, m.start().saturating_sub(100));
            let end = floor_boundary(text, (m.start() + 200).min(text.len()));
            &text[start..end]
        }
        None => {
            let end = text.char_indices().nth(200).map_or(text.len(), |(i, _)| i);
            &text[..end]
        }
    };
    Some(match pat {
        Some(p) => p.replace_all(window, |caps: &regex::Captures| format!("<em>{}</em>", &caps[0])).to_string(),
        None => window.to_string(),
    })
}
