use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{credentials::CredentialView, middleware::session::AppState, non_blank};
use crate::error::{AppError, Result};
use crate::models::{
    club::Club,
    credential::Credential,
    person::{CreatePersonData, Person, UpdatePersonData},
};
use crate::services::status::{self, DisplayState};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct ListPersonsQuery {
    pub club_id: Option<Uuid>,
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePersonRequest {
    pub document_number: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub club_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePersonRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A person with their credentials and the status derived from them
#[derive(Debug, Serialize)]
pub struct PersonDetail {
    #[serde(flatten)]
    pub person: Person,
    pub club: Option<Club>,
    pub display_state: DisplayState,
    pub badge: &'static str,
    pub selected_credential_id: Option<Uuid>,
    pub remaining_label: Option<String>,
    pub credentials: Vec<CredentialView>,
}

impl PersonDetail {
    pub fn build(
        person: Person,
        club: Option<Club>,
        credentials: Vec<Credential>,
        today: NaiveDate,
    ) -> Self {
        let selected = status::select_display_credential(&credentials);
        let display_state = status::affiliate_display_state(&credentials, today);
        let selected_credential_id = selected.map(|c| c.id);
        let remaining_label = selected.map(|c| status::remaining_label(c, today));

        Self {
            person,
            club,
            display_state,
            badge: display_state.badge(),
            selected_credential_id,
            remaining_label,
            credentials: credentials
                .into_iter()
                .map(|c| CredentialView::new(c, today))
                .collect(),
        }
    }
}

fn page(query: &ListPersonsQuery) -> (i64, i64) {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);
    (limit, offset)
}

async fn list_persons(
    State(state): State<AppState>,
    Query(query): Query<ListPersonsQuery>,
) -> Result<Json<Vec<Person>>> {
    let (limit, offset) = page(&query);
    let search = query.q.as_deref().filter(|q| !q.trim().is_empty());

    let persons = Person::list(&state.pool, query.club_id, search, limit, offset).await?;

    Ok(Json(persons))
}

async fn create_person(
    State(state): State<AppState>,
    Json(req): Json<CreatePersonRequest>,
) -> Result<(StatusCode, Json<Person>)> {
    let data = validate_new_person(req)?;

    if Person::find_by_document_number(&state.pool, &data.document_number)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "A person with document number {} already exists",
            data.document_number
        )));
    }

    let person = Person::create(&state.pool, data).await?;

    tracing::info!(person_id = %person.id, "Registered affiliate");

    Ok((StatusCode::CREATED, Json(person)))
}

fn validate_new_person(req: CreatePersonRequest) -> Result<CreatePersonData> {
    let document_number = non_blank(Some(req.document_number))
        .ok_or_else(|| AppError::Validation("Document number is required".to_string()))?;
    let first_name = non_blank(Some(req.first_name))
        .ok_or_else(|| AppError::Validation("First name is required".to_string()))?;
    let last_name = non_blank(Some(req.last_name))
        .ok_or_else(|| AppError::Validation("Last name is required".to_string()))?;

    if let Some(birth_date) = req.birth_date {
        if birth_date > Utc::now().date_naive() {
            return Err(AppError::Validation(
                "Birth date cannot be in the future".to_string(),
            ));
        }
    }

    let email = non_blank(req.email);
    if email.as_deref().is_some_and(|e| !e.contains('@')) {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    Ok(CreatePersonData {
        document_number,
        first_name,
        last_name,
        birth_date: req.birth_date,
        email,
        phone: non_blank(req.phone),
        club_id: req.club_id,
    })
}

async fn show_person(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PersonDetail>> {
    let person = Person::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Person not found".to_string()))?;

    let club = match person.club_id {
        Some(club_id) => Club::find_by_id(&state.pool, club_id).await?,
        None => None,
    };

    let credentials = Credential::list_by_person(&state.pool, id).await?;

    Ok(Json(PersonDetail::build(
        person,
        club,
        credentials,
        Utc::now().date_naive(),
    )))
}

async fn update_person(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePersonRequest>,
) -> Result<Json<Person>> {
    let email = non_blank(req.email);
    if email.as_deref().is_some_and(|e| !e.contains('@')) {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    let person = Person::update(
        &state.pool,
        id,
        UpdatePersonData {
            first_name: non_blank(req.first_name),
            last_name: non_blank(req.last_name),
            birth_date: req.birth_date,
            email,
            phone: non_blank(req.phone),
        },
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Person not found".to_string()))?;

    tracing::info!(person_id = %person.id, "Updated affiliate");

    Ok(Json(person))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/persons", get(list_persons).post(create_person))
        .route("/persons/:id", get(show_person).put(update_person))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::credential::CredentialState;

    fn request() -> CreatePersonRequest {
        CreatePersonRequest {
            document_number: " 30111222 ".to_string(),
            first_name: "Lucía".to_string(),
            last_name: "Gómez".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2001, 5, 4),
            email: Some("lucia@example.org".to_string()),
            phone: Some("".to_string()),
            club_id: None,
        }
    }

    fn person() -> Person {
        Person {
            id: Uuid::new_v4(),
            document_number: "30111222".to_string(),
            first_name: "Lucía".to_string(),
            last_name: "Gómez".to_string(),
            birth_date: None,
            email: None,
            phone: None,
            club_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn credential(person_id: Uuid, state: CredentialState, expiry: NaiveDate) -> Credential {
        Credential {
            id: Uuid::new_v4(),
            person_id,
            card_number: format!("FVB-{}", Uuid::new_v4().simple()),
            issue_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            expiry_date: Some(expiry),
            state,
            suspension_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_validate_trims_and_drops_blanks() {
        let data = validate_new_person(request()).unwrap();

        assert_eq!(data.document_number, "30111222");
        assert!(data.phone.is_none());
        assert_eq!(data.email.as_deref(), Some("lucia@example.org"));
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let mut req = request();
        req.last_name = "   ".to_string();
        assert!(matches!(validate_new_person(req), Err(AppError::Validation(_))));

        let mut req = request();
        req.email = Some("not-an-email".to_string());
        assert!(matches!(validate_new_person(req), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_future_birth_date() {
        let mut req = request();
        req.birth_date = Some(Utc::now().date_naive() + chrono::Duration::days(2));
        assert!(matches!(validate_new_person(req), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_detail_uses_selected_credential() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let person = person();
        let expired = credential(
            person.id,
            CredentialState::Expired,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        let active = credential(
            person.id,
            CredentialState::Active,
            NaiveDate::from_ymd_opt(2024, 6, 11).unwrap(),
        );
        let active_id = active.id;

        let detail = PersonDetail::build(person, None, vec![expired, active], today);

        assert_eq!(detail.selected_credential_id, Some(active_id));
        assert_eq!(detail.display_state, DisplayState::Active);
        assert_eq!(detail.remaining_label.as_deref(), Some("10 days"));
        assert_eq!(detail.credentials.len(), 2);
    }

    #[test]
    fn test_detail_without_credentials_is_pending() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let detail = PersonDetail::build(person(), None, vec![], today);

        assert_eq!(detail.display_state, DisplayState::Pending);
        assert!(detail.selected_credential_id.is_none());
        assert!(detail.remaining_label.is_none());
    }

    #[test]
    fn test_page_bounds() {
        let query = ListPersonsQuery {
            club_id: None,
            q: None,
            limit: Some(10_000),
            offset: Some(-5),
        };
        assert_eq!(page(&query), (MAX_PAGE_SIZE, 0));
    }
}
