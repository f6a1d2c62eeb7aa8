use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{middleware::session::AppState, non_blank};
use crate::error::{AppError, Result};
use crate::models::{
    club::Club,
    pass::{CreatePassData, Pass},
    person::Person,
};
use crate::services::{
    pass_workflow,
    status::{self, DisplayState},
};

#[derive(Debug, Deserialize)]
pub struct RequestPassRequest {
    pub destination_club_id: Uuid,
    pub pass_date: NaiveDate,
    pub notes: Option<String>,
}

/// A pass together with its derived display state
#[derive(Debug, Serialize)]
pub struct PassView {
    #[serde(flatten)]
    pub pass: Pass,
    pub display_state: DisplayState,
    pub badge: &'static str,
}

impl From<Pass> for PassView {
    fn from(pass: Pass) -> Self {
        let display_state = status::pass_display_state(&pass);
        Self {
            pass,
            display_state,
            badge: display_state.badge(),
        }
    }
}

async fn list_person_passes(
    State(state): State<AppState>,
    Path(person_id): Path<Uuid>,
) -> Result<Json<Vec<PassView>>> {
    let passes = Pass::list_by_person(&state.pool, person_id).await?;

    Ok(Json(passes.into_iter().map(PassView::from).collect()))
}

/// Files a pass moving the person from their current club to another one
async fn request_pass(
    State(state): State<AppState>,
    Path(person_id): Path<Uuid>,
    Json(req): Json<RequestPassRequest>,
) -> Result<(StatusCode, Json<PassView>)> {
    let person = Person::find_by_id(&state.pool, person_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Person not found".to_string()))?;

    let destination = Club::find_by_id(&state.pool, req.destination_club_id)
        .await?
        .ok_or_else(|| AppError::Validation("Destination club does not exist".to_string()))?;

    if !destination.is_active {
        return Err(AppError::Validation(
            "Destination club is not active".to_string(),
        ));
    }

    if person.club_id == Some(destination.id) {
        return Err(AppError::Validation(
            "Person already belongs to the destination club".to_string(),
        ));
    }

    let pass = Pass::create(
        &state.pool,
        CreatePassData {
            person_id,
            origin_club_id: person.club_id,
            destination_club_id: destination.id,
            pass_date: req.pass_date,
            notes: non_blank(req.notes),
        },
    )
    .await?;

    tracing::info!(
        pass_id = %pass.id,
        person_id = %person_id,
        origin_club_id = ?pass.origin_club_id,
        destination_club_id = %pass.destination_club_id,
        "Pass requested"
    );

    Ok((StatusCode::CREATED, Json(pass.into())))
}

async fn list_pending_passes(State(state): State<AppState>) -> Result<Json<Vec<PassView>>> {
    let passes = Pass::list_pending(&state.pool).await?;

    Ok(Json(passes.into_iter().map(PassView::from).collect()))
}

async fn show_pass(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<PassView>> {
    let pass = Pass::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Pass not found".to_string()))?;

    Ok(Json(pass.into()))
}

async fn authorize_pass(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PassView>> {
    let pass = pass_workflow::authorize_pass(&state.pool, id).await?;

    Ok(Json(pass.into()))
}

async fn reject_pass(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<PassView>> {
    let pass = pass_workflow::reject_pass(&state.pool, id).await?;

    Ok(Json(pass.into()))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route(
            "/persons/:id/passes",
            get(list_person_passes).post(request_pass),
        )
        .route("/passes/pending", get(list_pending_passes))
        .route("/passes/:id", get(show_pass))
        .route("/passes/:id/authorize", post(authorize_pass))
        .route("/passes/:id/reject", post(reject_pass))
}
