//! HTTP API server for question answering.
//!
//! No authentication is performed; bind to a trusted interface.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::NO_QUESTION;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Plain-text body of the liveness endpoint.
pub const LIVENESS_MESSAGE: &str = "Docent RAG server is running.";

/// Shared application state.
struct AppState {
    orchestrator: Arc<Orchestrator>,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let orchestrator = Arc::new(Orchestrator::new(settings)?);
    let count = orchestrator.count().await?;

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Docent API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Chunks indexed", &count.to_string());
    println!();
    println!("Endpoints:");
    Output::kv("Liveness", "GET  /");
    Output::kv("Query (RAG)", "POST /query");
    Output::kv("Stats", "GET  /stats");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router(orchestrator)).await?;

    Ok(())
}

/// Build the API routes around a shared orchestrator.
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(liveness))
        .route("/query", post(query))
        .route("/stats", get(stats))
        .layer(cors)
        .with_state(Arc::new(AppState { orchestrator }))
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct QueryRequest {
    #[serde(default)]
    question: Option<String>,
}

#[derive(Serialize)]
struct QueryResponse {
    answer: String,
    context: Vec<String>,
}

#[derive(Serialize)]
struct StatsResponse {
    count: usize,
    collection: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn liveness() -> &'static str {
    LIVENESS_MESSAGE
}

async fn query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let question = match payload {
        Ok(Json(req)) => req.question.unwrap_or_default(),
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    if question.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, NO_QUESTION);
    }

    info!("Received query: {}", question);

    match state.orchestrator.ask(&question).await {
        Ok(response) => Json(QueryResponse {
            answer: response.answer,
            context: response.context,
        })
        .into_response(),
        Err(e) if e.is_validation() => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => {
            error!("Error processing query: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn stats(State(state): State<Arc<AppState>>) -> Response {
    match state.orchestrator.count().await {
        Ok(count) => Json(StatsResponse {
            count,
            collection: state.orchestrator.vector_store().collection().to_string(),
        })
        .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::Embedder;
    use crate::error::DocentError;
    use crate::test_support::{HashEmbedder, ScriptedChatModel};
    use crate::vector_store::{MemoryVectorStore, StoredRecord, VectorStore};
    use serde_json::{json, Value};

    async fn spawn(model: ScriptedChatModel, texts: &[&str]) -> String {
        let embedder = Arc::new(HashEmbedder::new());
        let store = Arc::new(MemoryVectorStore::default());

        if !texts.is_empty() {
            let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
            let embeddings = embedder.embed(&owned).await.unwrap();
            let records: Vec<StoredRecord> = owned
                .into_iter()
                .zip(embeddings)
                .enumerate()
                .map(|(i, (text, e))| {
                    StoredRecord::new(format!("notes.txt_chunk_{}", i), text, "notes.txt".to_string(), i, e)
                })
                .collect();
            store.upsert(&records).await.unwrap();
        }

        let orchestrator = Orchestrator::with_components(
            Settings::default(),
            embedder,
            Arc::new(model),
            store,
        )
        .unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(Arc::new(orchestrator)))
                .await
                .unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_liveness() {
        let base = spawn(ScriptedChatModel::replying("unused answer"), &[]).await;

        let response = reqwest::get(&base).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), LIVENESS_MESSAGE);
    }

    #[tokio::test]
    async fn test_query_returns_answer_and_context() {
        let base = spawn(
            ScriptedChatModel::replying("Assignment 2 is due on March 5th."),
            &["Assignment 2 is due March 5th", "Office hours are on Tuesdays"],
        )
        .await;

        let response = reqwest::Client::new()
            .post(format!("{}/query", base))
            .json(&json!({ "question": "When is Assignment 2 due?" }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert!(body["answer"].as_str().unwrap().contains("March 5th"));
        assert_eq!(body["context"][0], "Assignment 2 is due March 5th");
        assert_eq!(body["context"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_query_without_question_is_bad_request() {
        let model = ScriptedChatModel::replying("unused answer");
        let base = spawn(model, &["some text"]).await;
        let client = reqwest::Client::new();

        for body in [json!({}), json!({ "question": "" }), json!({ "question": "   " })] {
            let response = client
                .post(format!("{}/query", base))
                .json(&body)
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), 400);
            let body: Value = response.json().await.unwrap();
            assert_eq!(body["error"], NO_QUESTION);
        }

        let response = client
            .post(format!("{}/query", base))
            .header("content-type", "application/json")
            .body("not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_query_failure_is_server_error() {
        let base = spawn(
            ScriptedChatModel::new(|_| Err(DocentError::Generation("upstream down".to_string()))),
            &["Assignment 2 is due March 5th"],
        )
        .await;

        let response = reqwest::Client::new()
            .post(format!("{}/query", base))
            .json(&json!({ "question": "When is it due?" }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 500);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("upstream down"));
    }

    #[tokio::test]
    async fn test_stats() {
        let base = spawn(ScriptedChatModel::replying("unused answer"), &["a b", "c d", "e f"]).await;

        let body: Value = reqwest::get(format!("{}/stats", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!({ "count": 3, "collection": "documents" }));
    }
}
