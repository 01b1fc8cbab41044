use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use time::{Date, OffsetDateTime};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use unicore::answer::default_suggestions;
use unicore::assistant::{Assistant, ChatReply, ConversationLog, NoGenerator};
use unicore::catalog::{deadline_soon, filter_admissions, AdmissionsQuery};
use unicore::index::builtin_corpus;
use unicore::paginate::{page_slice, PageView, ScrollWindow, DEFAULT_PER_PAGE, DEFAULT_WINDOW, LOAD_MORE_DELAY};
use unicore::persist::{load_knowledge, IndexPaths};
use unicore::source::{load_with_fallback, DataSource, JsonFileSource, SnapshotSource};
use unicore::tokenizer::tokenize;
use unicore::{filter_records, sort_by_deadline, DataSourceStrategy, FacetOptions, FilterSpec, KnowledgeBase, SourceError, UniversityRecord};

/// Startup settings for [`build_app`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub index_dir: PathBuf,
    /// Raw JSON/JSONL dump served when the snapshot is missing or empty.
    pub fallback: Option<PathBuf>,
    pub window_size: usize,
    pub load_more_delay: Duration,
}

impl AppConfig {
    pub fn new(index_dir: impl Into<PathBuf>) -> Self {
        Self {
            index_dir: index_dir.into(),
            fallback: None,
            window_size: DEFAULT_WINDOW,
            load_more_delay: LOAD_MORE_DELAY,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub records: Arc<Vec<UniversityRecord>>,
    pub facets: Arc<FacetOptions>,
    pub strategy: DataSourceStrategy,
    pub assistant: Arc<Assistant>,
    pub conversations: Arc<ConversationLog>,
    pub window_size: usize,
    pub load_more_delay: Duration,
}

pub fn build_app(config: AppConfig) -> Result<Router> {
    let index_paths = IndexPaths::new(&config.index_dir);
    let snapshot = SnapshotSource::new(IndexPaths::new(&config.index_dir));
    let fallback = config.fallback.as_ref().map(JsonFileSource::new);
    let (records, strategy) = load_with_fallback(&snapshot, fallback.as_ref().map(|f| f as &dyn DataSource))?;

    let kb = match load_knowledge(&index_paths)? {
        Some(docs) => {
            tracing::info!(num_docs = docs.len(), "using snapshot knowledge corpus");
            KnowledgeBase::new(docs)
        }
        None => KnowledgeBase::new(builtin_corpus()),
    };

    let app_state = AppState {
        facets: Arc::new(FacetOptions::collect(&records)),
        records: Arc::new(records),
        strategy,
        assistant: Arc::new(Assistant::new(Arc::new(kb), Arc::new(NoGenerator))),
        conversations: Arc::new(ConversationLog::new()),
        window_size: config.window_size.max(1),
        load_more_delay: config.load_more_delay,
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
        .route("/universities", get(universities_handler))
        .route("/universities/more", get(load_more_handler))
        .route("/universities/:id", get(university_handler))
        .route("/admissions", get(admissions_handler))
        .route("/facets", get(facets_handler))
        .route("/kb/search", get(kb_search_handler))
        .route("/chat", post(chat_handler))
        .route("/chat/suggestions", get(suggestions_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);
    Ok(app)
}

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Facets arrive comma-separated, e.g. `sector=Public,Private`.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub program_type: String,
    #[serde(default)]
    pub admission_open: bool,
    #[serde(default)]
    pub loaded: usize,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

impl CatalogParams {
    pub fn filter_spec(&self) -> FilterSpec {
        FilterSpec {
            program_type: split_list(&self.program_type),
            location: split_list(&self.location),
            sector: split_list(&self.sector),
            province: split_list(&self.province),
            admission_open: self.admission_open,
            search_query: String::new(),
        }
    }
}

#[derive(Serialize)]
pub struct CatalogResponse {
    pub total: usize,
    pub loaded: usize,
    pub has_more: bool,
    pub source: DataSourceStrategy,
    pub results: Vec<UniversityRecord>,
}

fn catalog_view(state: &AppState, params: &CatalogParams, advance: bool) -> CatalogResponse {
    let today = today();
    let filtered = filter_records(&state.records, &params.q, &params.filter_spec(), today);
    let sorted = sort_by_deadline(filtered, today);
    let mut window = ScrollWindow::resume(state.window_size, params.loaded);
    if advance {
        window.load_more(sorted.len());
    }
    let view = window.view(&sorted);
    CatalogResponse {
        total: sorted.len(),
        loaded: view.items.len(),
        has_more: view.has_more,
        source: state.strategy,
        results: view.items.to_vec(),
    }
}

pub async fn universities_handler(State(state): State<AppState>, Query(params): Query<CatalogParams>) -> Json<CatalogResponse> {
    Json(catalog_view(&state, &params, false))
}

pub async fn load_more_handler(State(state): State<AppState>, Query(params): Query<CatalogParams>) -> Json<CatalogResponse> {
    tokio::time::sleep(state.load_more_delay).await;
    Json(catalog_view(&state, &params, true))
}

pub async fn university_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UniversityRecord>, (StatusCode, String)> {
    state
        .records
        .iter()
        .find(|r| r.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, SourceError::NotFound(id).to_string()))
}

#[derive(Debug, Default, Deserialize)]
pub struct AdmissionsParams {
    /// Only deadlines within this many days; everything when absent.
    pub days: Option<i64>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub program: String,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub show_past: bool,
}

/// Universities flagged open, filtered and paged for the admissions table.
pub async fn admissions_handler(
    State(state): State<AppState>,
    Query(params): Query<AdmissionsParams>,
) -> Json<PageView<UniversityRecord>> {
    let today = today();
    let open: Vec<UniversityRecord> = state.records.iter().filter(|r| r.admission_open).cloned().collect();
    let query = AdmissionsQuery {
        program: params.program,
        sector: params.sector,
        province: params.province,
        show_past: params.show_past,
    };
    let rows = filter_admissions(&open, &query, today);
    let rows = match params.days {
        Some(days) => deadline_soon(&rows, today, days),
        None => sort_by_deadline(rows, today),
    };
    Json(page_slice(&rows, params.page.unwrap_or(1), DEFAULT_PER_PAGE))
}

pub async fn facets_handler(State(state): State<AppState>) -> Json<FacetOptions> {
    Json(state.facets.as_ref().clone())
}

#[derive(Deserialize)]
pub struct KbParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize)]
pub struct KbResponse {
    pub query: String,
    pub results: Vec<KbHit>,
}

#[derive(Serialize)]
pub struct KbHit {
    pub title: String,
    pub snippet: String,
}

pub async fn kb_search_handler(State(state): State<AppState>, Query(params): Query<KbParams>) -> Json<KbResponse> {
    let terms = tokenize(&params.q);
    let pattern = term_pattern(&terms);
    let results = state
        .assistant
        .knowledge_base()
        .search(&params.q)
        .into_iter()
        .map(|doc| KbHit { title: doc.title.clone(), snippet: snippet(&doc.content, pattern.as_ref()) })
        .collect();
    Json(KbResponse { query: params.q, results })
}

fn term_pattern(terms: &[String]) -> Option<Regex> {
    if terms.is_empty() {
        return None;
    }
    let alternation = terms.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    RegexBuilder::new(&alternation).case_insensitive(true).build().ok()
}

/// Up to 300 bytes around the first hit with every term wrapped in `<em>`.
fn snippet(text: &str, pattern: Option<&Regex>) -> String {
    let Some(pat) = pattern else {
        return text.chars().take(200).collect();
    };
    let window = match pat.find(text) {
        Some(m) => {
            let start = char_boundary(text, m.start().saturating_sub(100));
            let end = char_boundary(text, (m.start() + 200).min(text.len()));
            &text[start..end]
        }
        None => &text[..char_boundary(text, 200.min(text.len()))],
    };
    pat.replace_all(window, |caps: &regex::Captures| format!("<em>{}</em>", &caps[0])).to_string()
}

fn char_boundary(text: &str, mut idx: usize) -> usize {
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub text: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub web_search: bool,
}

#[derive(Serialize)]
pub struct ChatResponse {
    #[serde(flatten)]
    pub reply: ChatReply,
    pub conversation_id: Option<String>,
}

pub async fn chat_handler(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    let text = req.text.trim().to_string();
    if text.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "text must not be empty".into()));
    }
    state.conversations.record(req.conversation_id.as_deref(), &text);

    let assistant = state.assistant.clone();
    let web_search = req.web_search;
    let reply = tokio::task::spawn_blocking(move || assistant.reply(&text, web_search))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    tracing::debug!(source = ?reply.source, "chat reply");
    Ok(Json(ChatResponse { reply, conversation_id: req.conversation_id }))
}

#[derive(Deserialize)]
pub struct SuggestionParams {
    #[serde(default)]
    pub context: String,
}

pub async fn suggestions_handler(Query(params): Query<SuggestionParams>) -> Json<Vec<&'static str>> {
    Json(default_suggestions(&params.context).to_vec())
}
