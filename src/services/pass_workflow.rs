use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    club::Club,
    pass::{Pass, PassAuthorization},
    person::Person,
};

#[derive(thiserror::Error, Debug)]
pub enum PassWorkflowError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Pass not found")]
    PassNotFound,

    #[error("Pass already resolved as {0:?}")]
    AlreadyResolved(PassAuthorization),

    #[error("Person no longer belongs to the pass origin club")]
    OriginChanged,

    #[error("Destination club is missing or inactive")]
    DestinationUnavailable,
}

/// Only PENDING passes accept a decision
pub fn check_resolvable(pass: &Pass) -> Result<(), PassWorkflowError> {
    match pass.authorization {
        PassAuthorization::Pending => Ok(()),
        resolved => Err(PassWorkflowError::AlreadyResolved(resolved)),
    }
}

/// An authorized pass must still start from the person's current club and
/// land in an active one
pub fn check_transfer(
    pass: &Pass,
    current_club_id: Option<Uuid>,
    destination: Option<&Club>,
) -> Result<(), PassWorkflowError> {
    if current_club_id != pass.origin_club_id {
        return Err(PassWorkflowError::OriginChanged);
    }

    match destination {
        Some(club) if club.is_active => Ok(()),
        _ => Err(PassWorkflowError::DestinationUnavailable),
    }
}

/// Authorizes a pending pass and moves the person to the destination club.
///
/// The pass and person rows are locked for the whole transaction, so two
/// concurrent decisions involving the same person serialize.
#[tracing::instrument(skip(pool))]
pub async fn authorize_pass(pool: &PgPool, pass_id: Uuid) -> Result<Pass, PassWorkflowError> {
    resolve(pool, pass_id, PassAuthorization::Authorized).await
}

/// Rejects a pending pass; the person's club is left unchanged
#[tracing::instrument(skip(pool))]
pub async fn reject_pass(pool: &PgPool, pass_id: Uuid) -> Result<Pass, PassWorkflowError> {
    resolve(pool, pass_id, PassAuthorization::Rejected).await
}

async fn resolve(
    pool: &PgPool,
    pass_id: Uuid,
    decision: PassAuthorization,
) -> Result<Pass, PassWorkflowError> {
    let mut tx = pool.begin().await?;

    let pass = Pass::find_for_update(&mut tx, pass_id)
        .await?
        .ok_or(PassWorkflowError::PassNotFound)?;

    if let Err(e) = check_resolvable(&pass) {
        tracing::warn!(
            pass_id = %pass.id,
            current = ?pass.authorization,
            "Attempt to resolve an already resolved pass"
        );
        return Err(e);
    }

    if decision == PassAuthorization::Authorized {
        let person = Person::find_for_update(&mut tx, pass.person_id)
            .await?
            .ok_or(PassWorkflowError::PassNotFound)?;
        let destination = Club::find_for_share(&mut tx, pass.destination_club_id).await?;

        if let Err(e) = check_transfer(&pass, person.club_id, destination.as_ref()) {
            tracing::warn!(
                pass_id = %pass.id,
                person_id = %person.id,
                current_club_id = ?person.club_id,
                origin_club_id = ?pass.origin_club_id,
                error = %e,
                "Pass can no longer be authorized"
            );
            return Err(e);
        }

        Person::set_club(&mut tx, pass.person_id, pass.destination_club_id).await?;
    }

    let updated = Pass::set_authorization(&mut tx, pass.id, decision).await?;

    tx.commit().await?;

    tracing::info!(
        pass_id = %updated.id,
        person_id = %updated.person_id,
        decision = ?decision,
        "Pass resolved"
    );

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn pass(authorization: PassAuthorization, origin: Option<Uuid>) -> Pass {
        Pass {
            id: Uuid::new_v4(),
            person_id: Uuid::new_v4(),
            origin_club_id: origin,
            destination_club_id: Uuid::new_v4(),
            pass_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            authorization,
            notes: None,
            resolved_at: None,
            created_at: Utc::now(),
        }
    }

    fn club(id: Uuid, is_active: bool) -> Club {
        Club {
            id,
            name: "Club Náutico".to_string(),
            short_name: None,
            city: Some("Rosario".to_string()),
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_only_pending_is_resolvable() {
        assert!(check_resolvable(&pass(PassAuthorization::Pending, None)).is_ok());

        for resolved in [PassAuthorization::Authorized, PassAuthorization::Rejected] {
            assert!(matches!(
                check_resolvable(&pass(resolved, None)),
                Err(PassWorkflowError::AlreadyResolved(state)) if state == resolved
            ));
        }
    }

    #[test]
    fn test_transfer_requires_unchanged_origin() {
        let origin = Uuid::new_v4();
        let p = pass(PassAuthorization::Pending, Some(origin));
        let destination = club(p.destination_club_id, true);

        assert!(check_transfer(&p, Some(origin), Some(&destination)).is_ok());
        assert!(matches!(
            check_transfer(&p, Some(Uuid::new_v4()), Some(&destination)),
            Err(PassWorkflowError::OriginChanged)
        ));
        assert!(matches!(
            check_transfer(&p, None, Some(&destination)),
            Err(PassWorkflowError::OriginChanged)
        ));
    }

    #[test]
    fn test_first_registration_has_no_origin() {
        let p = pass(PassAuthorization::Pending, None);
        let destination = club(p.destination_club_id, true);

        assert!(check_transfer(&p, None, Some(&destination)).is_ok());
    }

    #[test]
    fn test_transfer_requires_active_destination() {
        let p = pass(PassAuthorization::Pending, None);

        assert!(matches!(
            check_transfer(&p, None, Some(&club(p.destination_club_id, false))),
            Err(PassWorkflowError::DestinationUnavailable)
        ));
        assert!(matches!(
            check_transfer(&p, None, None),
            Err(PassWorkflowError::DestinationUnavailable)
        ));
    }
}
