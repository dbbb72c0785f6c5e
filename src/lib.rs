use axum::{
    Router,
    extract::State,
    response::Html,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod assistant;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod goals;
pub mod insights;
pub mod models;
pub mod notes;
pub mod planner;
pub mod sync;
pub mod transactions;
pub mod utils;

use assistant::TextSummarizer;
use database::Db;
use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub summarizer: Option<Arc<dyn TextSummarizer>>,
}

impl AppState {
    pub fn new(db: Db, summarizer: Option<Arc<dyn TextSummarizer>>) -> Self {
        Self { db, summarizer }
    }
}

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route(
            "/expenses",
            post(transactions::create_transaction_handler)
                .get(transactions::list_transactions_handler),
        )
        .route(
            "/expenses/{id}",
            get(transactions::get_transaction_handler)
                .put(transactions::update_transaction_handler)
                .delete(transactions::delete_transaction_handler),
        )
        .route("/insights", get(insights::get_insights_handler))
        .route(
            "/goals",
            get(goals::list_goals_handler).post(goals::create_goal_handler),
        )
        .route(
            "/goals/{id}",
            patch(goals::update_goal_handler)
                .put(goals::update_goal_handler)
                .delete(goals::delete_goal_handler),
        )
        .route("/goals/{id}/complete", patch(goals::complete_goal_handler))
        .route("/goals/{id}/plan", get(goals::goal_plan_handler))
        .route(
            "/notes",
            get(notes::list_notes_handler).post(notes::create_note_handler),
        )
        .route("/notes/{id}", delete(notes::delete_note_handler))
        .route("/ai-summary", post(assistant::ai_summary_handler))
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/api", api_router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let count = transactions::count_transactions(&state.db).await?;
    Ok(Html(format!(
        "<h1>Finance tracker is running</h1><p>There are {} transactions in the database.</p>",
        count
    )))
}
