use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use careerpath_core::domain::quiz::QuizResponse;
use careerpath_core::domain::recommendation::{RecommendationBatch, RecommendationRecord};
use careerpath_core::llm::gemini::GeminiClient;
use careerpath_core::llm::prompt::PromptInput;
use careerpath_core::llm::TextGenerator;
use careerpath_core::recovery::Strategy;
use careerpath_core::service::RecommendationService;
use careerpath_core::storage::recommendations::{self, NewBatch, StoredBatch};

/// Free-text requests shorter than this are rejected before reaching the model.
const MIN_FREE_TEXT_CHARS: usize = 20;

/// Route-level "suitable" cut-off, separate from the 0.65 floor the parser enforces.
const SUITABLE_MATCH_THRESHOLD: f64 = 0.5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = careerpath_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match careerpath_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "DATABASE_URL missing; recommendations will not be persisted");
            None
        }
    };

    let service = match GeminiClient::from_settings(&settings) {
        Ok(client) => {
            tracing::info!(model = client.model(), "Gemini client configured");
            Some(Arc::new(RecommendationService::new(client)))
        }
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "Gemini client unavailable; generation endpoints disabled");
            None
        }
    };

    let state = AppState { pool, service };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/recommendations/quiz", post(post_quiz_recommendations))
        .route("/recommendations/text", post(post_text_recommendations))
        .route("/recommendations/:batch_id", get(get_batch))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    pool: Option<PgPool>,
    service: Option<Arc<RecommendationService<GeminiClient>>>,
}

#[derive(Debug, Deserialize)]
struct QuizSubmission {
    responses: Vec<QuizResponse>,
}

#[derive(Debug, Deserialize)]
struct TextSubmission {
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct BatchQuery {
    #[serde(default)]
    suitable_only: bool,
}

#[derive(Debug, Serialize)]
struct ApiRecommendations {
    batch_id: Option<Uuid>,
    strategy: Strategy,
    recommendations: RecommendationBatch,
}

async fn post_quiz_recommendations(
    State(state): State<AppState>,
    Json(body): Json<QuizSubmission>,
) -> Result<Json<ApiRecommendations>, StatusCode> {
    if body.responses.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let input = serde_json::to_value(&body.responses).map_err(|_| StatusCode::BAD_REQUEST)?;
    generate(&state, PromptInput::Quiz(&body.responses), input).await
}

async fn post_text_recommendations(
    State(state): State<AppState>,
    Json(body): Json<TextSubmission>,
) -> Result<Json<ApiRecommendations>, StatusCode> {
    let text = validate_free_text(&body.text).ok_or(StatusCode::BAD_REQUEST)?;
    let input = serde_json::json!({ "text": text });
    generate(&state, PromptInput::FreeText(text), input).await
}

async fn generate(
    state: &AppState,
    input: PromptInput<'_>,
    input_json: serde_json::Value,
) -> Result<Json<ApiRecommendations>, StatusCode> {
    let Some(service) = &state.service else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let report = service.generate(input).await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(error = %e, source = input.source(), "recommendation generation failed");
        StatusCode::BAD_GATEWAY
    })?;

    if report.outcome.used_fallback() {
        sentry::capture_message(
            "model output unrecoverable; default recommendations served",
            sentry::Level::Warning,
        );
    }

    let batch_id = match &state.pool {
        Some(pool) => {
            let new = NewBatch {
                source: input.source(),
                input: input_json,
                provider: service.client().provider().as_str(),
                outcome: &report.outcome,
                raw_text: Some(&report.raw_text),
            };
            match recommendations::persist_batch(pool, new).await {
                Ok(id) => Some(id),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "failed to persist recommendations");
                    None
                }
            }
        }
        None => None,
    };

    Ok(Json(ApiRecommendations {
        batch_id,
        strategy: report.outcome.strategy,
        recommendations: report.outcome.batch,
    }))
}

async fn get_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Query(query): Query<BatchQuery>,
) -> Result<Json<StoredBatch>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let mut stored = recommendations::fetch_batch(pool, batch_id)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    if query.suitable_only {
        stored.recommendations = suitable(stored.recommendations);
    }

    Ok(Json(stored))
}

fn validate_free_text(text: &str) -> Option<&str> {
    let text = text.trim();
    (text.chars().count() >= MIN_FREE_TEXT_CHARS).then_some(text)
}

fn suitable(records: Vec<RecommendationRecord>) -> Vec<RecommendationRecord> {
    records
        .into_iter()
        .filter(|r| r.match_score >= SUITABLE_MATCH_THRESHOLD)
        .collect()
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &careerpath_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
