use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{middleware::session::AppState, non_blank};
use crate::error::{AppError, Result};
use crate::models::news::News;

#[derive(Debug, Deserialize)]
pub struct CreateNewsRequest {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNewsRequest {
    pub title: Option<String>,
    pub body: Option<String>,
}

fn not_found() -> AppError {
    AppError::NotFound("News article not found".to_string())
}

/// Published articles (public)
async fn list_published(State(state): State<AppState>) -> Result<Json<Vec<News>>> {
    Ok(Json(News::list(&state.pool, true).await?))
}

async fn show_published(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<News>> {
    let news = News::find_by_id(&state.pool, id)
        .await?
        .filter(|n| n.is_published)
        .ok_or_else(not_found)?;

    Ok(Json(news))
}

/// All articles, drafts included
async fn list_all(State(state): State<AppState>) -> Result<Json<Vec<News>>> {
    Ok(Json(News::list(&state.pool, false).await?))
}

async fn create_news(
    State(state): State<AppState>,
    Json(req): Json<CreateNewsRequest>,
) -> Result<(StatusCode, Json<News>)> {
    let title = non_blank(Some(req.title))
        .ok_or_else(|| AppError::Validation("Title is required".to_string()))?;
    let body = non_blank(Some(req.body))
        .ok_or_else(|| AppError::Validation("Body is required".to_string()))?;

    let news = News::create(&state.pool, &title, &body).await?;

    tracing::info!(news_id = %news.id, "Created news draft");

    Ok((StatusCode::CREATED, Json(news)))
}

async fn update_news(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateNewsRequest>,
) -> Result<Json<News>> {
    let news = News::update(&state.pool, id, non_blank(req.title), non_blank(req.body))
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(news))
}

async fn publish_news(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<News>> {
    let news = News::publish(&state.pool, id).await?.ok_or_else(not_found)?;

    tracing::info!(news_id = %news.id, "Published news");

    Ok(Json(news))
}

async fn delete_news(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    if !News::delete(&state.pool, id).await? {
        return Err(not_found());
    }

    tracing::info!(news_id = %id, "Deleted news");

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/news", get(list_published))
        .route("/news/:id", get(show_published))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/news", get(list_all).post(create_news))
        .route("/news/:id", put(update_news).delete(delete_news))
        .route("/news/:id/publish", post(publish_news))
}
