use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{middleware::session::AppState, non_blank};
use crate::error::{AppError, Result};
use crate::models::{
    club::Club,
    credential::{CreateCredentialData, Credential, CredentialState},
    person::Person,
};
use crate::services::{
    qr_generator::{self, CredentialCardPayload},
    status::{self, CredentialStatus},
};

/// A stored credential together with its derived status
#[derive(Debug, Serialize)]
pub struct CredentialView {
    #[serde(flatten)]
    pub credential: Credential,
    pub status: CredentialStatus,
}

impl CredentialView {
    pub fn new(credential: Credential, today: NaiveDate) -> Self {
        let status = status::evaluate(&credential, today);
        Self { credential, status }
    }
}

#[derive(Debug, Deserialize)]
pub struct IssueCredentialRequest {
    pub card_number: String,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub state: Option<CredentialState>,
}

#[derive(Debug, Deserialize)]
pub struct SuspendRequest {
    pub reason: Option<String>,
}

/// QR contents as scanned at a venue: the card payload plus its signature
#[derive(Debug, Deserialize)]
pub struct ScannedCard {
    #[serde(flatten)]
    pub card: CredentialCardPayload,
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct VerificationResponse {
    pub authentic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CredentialStatus>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn signing_key(state: &AppState) -> &[u8] {
    state.config.card_signing_key.expose_secret().as_bytes()
}

fn validate_issue(person_id: Uuid, req: IssueCredentialRequest) -> Result<CreateCredentialData> {
    let card_number = non_blank(Some(req.card_number))
        .ok_or_else(|| AppError::Validation("Card number is required".to_string()))?;

    if let Some(expiry) = req.expiry_date {
        if expiry <= req.issue_date {
            return Err(AppError::Validation(
                "Expiry date must be after the issue date".to_string(),
            ));
        }
    }

    let state = req.state.unwrap_or(CredentialState::Active);
    if !matches!(state, CredentialState::Active | CredentialState::Inactive) {
        return Err(AppError::Validation(
            "New credentials must be ACTIVE or INACTIVE".to_string(),
        ));
    }

    // ACTIVE credentials always carry an expiry date
    if state == CredentialState::Active && req.expiry_date.is_none() {
        return Err(AppError::Validation(
            "ACTIVE credentials need an expiry date".to_string(),
        ));
    }

    Ok(CreateCredentialData {
        person_id,
        card_number,
        issue_date: req.issue_date,
        expiry_date: req.expiry_date,
        state,
    })
}

async fn list_person_credentials(
    State(state): State<AppState>,
    Path(person_id): Path<Uuid>,
) -> Result<Json<Vec<CredentialView>>> {
    let today = today();
    let credentials = Credential::list_by_person(&state.pool, person_id).await?;

    Ok(Json(
        credentials
            .into_iter()
            .map(|c| CredentialView::new(c, today))
            .collect(),
    ))
}

async fn issue_credential(
    State(state): State<AppState>,
    Path(person_id): Path<Uuid>,
    Json(req): Json<IssueCredentialRequest>,
) -> Result<(StatusCode, Json<CredentialView>)> {
    Person::find_by_id(&state.pool, person_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Person not found".to_string()))?;

    let data = validate_issue(person_id, req)?;
    let credential = Credential::create(&state.pool, data).await?;

    tracing::info!(
        credential_id = %credential.id,
        person_id = %person_id,
        card_number = %credential.card_number,
        "Issued credential"
    );

    Ok((StatusCode::CREATED, Json(CredentialView::new(credential, today()))))
}

async fn show_credential(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CredentialView>> {
    let credential = find_credential(&state, id).await?;

    Ok(Json(CredentialView::new(credential, today())))
}

fn check_suspendable(credential: &Credential) -> Result<()> {
    if credential.state == CredentialState::Expired {
        return Err(AppError::Conflict(
            "An expired credential cannot be suspended".to_string(),
        ));
    }
    Ok(())
}

fn check_reactivatable(credential: &Credential) -> Result<()> {
    if credential.state != CredentialState::Suspended {
        return Err(AppError::Conflict(format!(
            "Only suspended credentials can be reactivated (current state: {})",
            credential.state.as_str()
        )));
    }
    if credential.expiry_date.is_none() {
        return Err(AppError::Conflict(
            "A credential without an expiry date cannot be reactivated".to_string(),
        ));
    }
    Ok(())
}

/// Explains why a guarded update matched no row: 404 if the credential is
/// gone, otherwise the conflict reported by `check` for its current state
async fn refused_transition(
    state: &AppState,
    id: Uuid,
    check: fn(&Credential) -> Result<()>,
) -> AppError {
    match find_credential(state, id).await {
        Ok(credential) => check(&credential).err().unwrap_or_else(|| {
            AppError::Conflict("Credential changed while it was being updated".to_string())
        }),
        Err(e) => e,
    }
}

async fn suspend_credential(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SuspendRequest>,
) -> Result<Json<CredentialView>> {
    let credential = match Credential::suspend(&state.pool, id, non_blank(req.reason)).await? {
        Some(credential) => credential,
        None => return Err(refused_transition(&state, id, check_suspendable).await),
    };

    tracing::info!(
        credential_id = %credential.id,
        reason = ?credential.suspension_reason,
        "Suspended credential"
    );

    Ok(Json(CredentialView::new(credential, today())))
}

async fn reactivate_credential(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CredentialView>> {
    let credential = match Credential::reactivate(&state.pool, id).await? {
        Some(credential) => credential,
        None => return Err(refused_transition(&state, id, check_reactivatable).await),
    };

    tracing::info!(credential_id = %credential.id, "Reactivated credential");

    Ok(Json(CredentialView::new(credential, today())))
}

async fn find_credential(state: &AppState, id: Uuid) -> Result<Credential> {
    Credential::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Credential not found".to_string()))
}

/// Builds and signs the card payload for a credential
async fn card_payload(state: &AppState, id: Uuid) -> Result<(CredentialCardPayload, String)> {
    let credential = find_credential(state, id).await?;

    let person = Person::find_by_id(&state.pool, credential.person_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Person not found".to_string()))?;

    let club = match person.club_id {
        Some(club_id) => Club::find_by_id(&state.pool, club_id).await?,
        None => None,
    };

    let payload = CredentialCardPayload::new(&credential, &person, club.as_ref(), today());
    let signature = payload.sign(signing_key(state))?;

    Ok((payload, signature))
}

async fn credential_qr_svg(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let (payload, signature) = card_payload(&state, id).await?;
    let svg = qr_generator::generate_qr_svg(&payload, &signature)?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/svg+xml")],
        svg,
    )
        .into_response())
}

async fn credential_qr_png(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let (payload, signature) = card_payload(&state, id).await?;
    let png = qr_generator::generate_qr_png(&payload, &signature)?;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], png).into_response())
}

/// Verifies a scanned card: checks the signature, then reports the
/// credential's status as of today (not as printed on the card)
async fn verify_card(
    State(state): State<AppState>,
    Json(scanned): Json<ScannedCard>,
) -> Result<Json<VerificationResponse>> {
    if !scanned.card.verify(&scanned.signature, signing_key(&state)) {
        tracing::warn!(card_number = %scanned.card.card_number, "Card signature mismatch");
        return Ok(Json(VerificationResponse {
            authentic: false,
            card_number: None,
            status: None,
        }));
    }

    let id = Uuid::parse_str(&scanned.card.credential_id)
        .map_err(|_| AppError::Validation("Malformed credential id".to_string()))?;
    let credential = find_credential(&state, id).await?;
    let status = status::evaluate(&credential, today());

    tracing::info!(
        credential_id = %credential.id,
        valid = status.valid,
        "Card verified"
    );

    Ok(Json(VerificationResponse {
        authentic: true,
        card_number: Some(credential.card_number),
        status: Some(status),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/credentials/verify", post(verify_card))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route(
            "/persons/:id/credentials",
            get(list_person_credentials).post(issue_credential),
        )
        .route("/credentials/:id", get(show_credential))
        .route("/credentials/:id/suspend", post(suspend_credential))
        .route("/credentials/:id/reactivate", post(reactivate_credential))
        .route("/credentials/:id/qr", get(credential_qr_svg))
        .route("/credentials/:id/qr.png", get(credential_qr_png))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{body_json, send_json, test_app};
    use serde_json::json;

    fn request() -> IssueCredentialRequest {
        IssueCredentialRequest {
            card_number: "FVB-000100".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2024, 12, 31),
            state: None,
        }
    }

    #[test]
    fn test_issue_defaults_to_active() {
        let data = validate_issue(Uuid::new_v4(), request()).unwrap();
        assert_eq!(data.state, CredentialState::Active);
        assert_eq!(data.card_number, "FVB-000100");
    }

    #[test]
    fn test_issue_rejects_inverted_dates() {
        let mut req = request();
        req.expiry_date = Some(req.issue_date);
        assert!(matches!(
            validate_issue(Uuid::new_v4(), req),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_issue_active_requires_expiry() {
        let mut req = request();
        req.expiry_date = None;
        assert!(matches!(
            validate_issue(Uuid::new_v4(), req),
            Err(AppError::Validation(_))
        ));

        let mut req = request();
        req.expiry_date = None;
        req.state = Some(CredentialState::Inactive);
        let data = validate_issue(Uuid::new_v4(), req).unwrap();
        assert_eq!(data.state, CredentialState::Inactive);
        assert!(data.expiry_date.is_none());
    }

    fn stored(state: CredentialState, expiry_date: Option<NaiveDate>) -> Credential {
        Credential {
            id: Uuid::new_v4(),
            person_id: Uuid::new_v4(),
            card_number: "FVB-000100".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            expiry_date,
            state,
            suspension_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_suspend_transitions() {
        let expiry = NaiveDate::from_ymd_opt(2024, 12, 31);
        for state in [
            CredentialState::Active,
            CredentialState::Inactive,
            CredentialState::Suspended,
        ] {
            assert!(check_suspendable(&stored(state, expiry)).is_ok(), "{:?}", state);
        }
        assert!(matches!(
            check_suspendable(&stored(CredentialState::Expired, expiry)),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_reactivate_transitions() {
        let expiry = NaiveDate::from_ymd_opt(2024, 12, 31);
        assert!(check_reactivatable(&stored(CredentialState::Suspended, expiry)).is_ok());
        for state in [
            CredentialState::Active,
            CredentialState::Inactive,
            CredentialState::Expired,
        ] {
            assert!(
                matches!(
                    check_reactivatable(&stored(state, expiry)),
                    Err(AppError::Conflict(_))
                ),
                "{:?}",
                state
            );
        }
    }

    #[test]
    fn test_reactivate_requires_expiry() {
        assert!(matches!(
            check_reactivatable(&stored(CredentialState::Suspended, None)),
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_transitions_require_session() {
        for uri in [
            "/admin/credentials/6a0e4c4e-8f7b-4a55-9a55-2d8f0c1b7e10/suspend",
            "/admin/credentials/6a0e4c4e-8f7b-4a55-9a55-2d8f0c1b7e10/reactivate",
        ] {
            let response = send_json(test_app(), "POST", uri, json!({})).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[test]
    fn test_issue_rejects_terminal_states() {
        for state in [CredentialState::Suspended, CredentialState::Expired] {
            let mut req = request();
            req.state = Some(state);
            assert!(validate_issue(Uuid::new_v4(), req).is_err());
        }
    }

    #[test]
    fn test_view_serializes_status() {
        let credential = Credential {
            id: Uuid::new_v4(),
            person_id: Uuid::new_v4(),
            card_number: "FVB-000100".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2024, 1, 2),
            state: CredentialState::Active,
            suspension_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let view = CredentialView::new(credential, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let value = serde_json::to_value(&view).unwrap();

        assert_eq!(value["card_number"], "FVB-000100");
        assert_eq!(value["state"], "ACTIVE");
        assert_eq!(value["status"]["label"], "1 day");
        assert_eq!(value["status"]["display_state"], "ACTIVE");
    }

    #[tokio::test]
    async fn test_verify_rejects_forged_signature() {
        let app = test_app();
        let response = send_json(
            app,
            "POST",
            "/credentials/verify",
            json!({
                "credential_id": Uuid::new_v4().to_string(),
                "card_number": "FVB-000100",
                "holder": { "name": "Ana Pereyra", "document_number": "30111222" },
                "issue_date": "2024-01-01",
                "expiry_date": "2024-12-31",
                "state": "ACTIVE",
                "status_label": "11 months",
                "signature": "00ff"
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["authentic"], false);
    }

    #[tokio::test]
    async fn test_verify_requires_card_signing_key() {
        use crate::api::test_support::test_config;
        use crate::services::qr_generator::HolderInfo;

        let card = CredentialCardPayload {
            credential_id: Uuid::new_v4().to_string(),
            card_number: "FVB-000101".to_string(),
            holder: HolderInfo {
                name: "Ana Pereyra".to_string(),
                document_number: "30111222".to_string(),
            },
            club: None,
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2024, 12, 31),
            state: "ACTIVE".to_string(),
            status_label: "11 months".to_string(),
        };
        let session_key = test_config().session_secret.expose_secret().clone();
        let signature = card.sign(session_key.as_bytes()).unwrap();

        let mut body = serde_json::to_value(&card).unwrap();
        body["signature"] = json!(signature);

        let response = send_json(test_app(), "POST", "/credentials/verify", body).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["authentic"], false);
    }
}
