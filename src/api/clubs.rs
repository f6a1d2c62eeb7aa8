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
use crate::models::club::{Club, CreateClubData};

#[derive(Debug, Deserialize)]
pub struct CreateClubRequest {
    pub name: String,
    pub short_name: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateClubRequest {
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub city: Option<String>,
}

/// List active clubs (public)
async fn list_clubs(State(state): State<AppState>) -> Result<Json<Vec<Club>>> {
    Ok(Json(Club::list(&state.pool, true).await?))
}

/// List all clubs, including inactive ones
async fn list_all_clubs(State(state): State<AppState>) -> Result<Json<Vec<Club>>> {
    Ok(Json(Club::list(&state.pool, false).await?))
}

async fn show_club(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Club>> {
    let club = Club::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Club not found".to_string()))?;

    Ok(Json(club))
}

async fn create_club(
    State(state): State<AppState>,
    Json(req): Json<CreateClubRequest>,
) -> Result<(StatusCode, Json<Club>)> {
    let name = non_blank(Some(req.name))
        .ok_or_else(|| AppError::Validation("Club name is required".to_string()))?;

    let club = Club::create(
        &state.pool,
        CreateClubData {
            name,
            short_name: non_blank(req.short_name),
            city: non_blank(req.city),
        },
    )
    .await?;

    tracing::info!(club_id = %club.id, name = %club.name, "Created club");

    Ok((StatusCode::CREATED, Json(club)))
}

async fn update_club(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateClubRequest>,
) -> Result<Json<Club>> {
    let club = Club::update(
        &state.pool,
        id,
        non_blank(req.name),
        non_blank(req.short_name),
        non_blank(req.city),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Club not found".to_string()))?;

    tracing::info!(club_id = %club.id, "Updated club");

    Ok(Json(club))
}

/// Toggle club active status
async fn toggle_club_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Club>> {
    let club = Club::toggle_active(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Club not found".to_string()))?;

    tracing::info!(club_id = %club.id, is_active = club.is_active, "Toggled club status");

    Ok(Json(club))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clubs", get(list_clubs))
        .route("/clubs/:id", get(show_club))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/clubs", get(list_all_clubs).post(create_club))
        .route("/clubs/:id", put(update_club))
        .route("/clubs/:id/toggle", post(toggle_club_status))
}
