//! Status derivation for credentials, passes and affiliates.
//!
//! Everything here is a pure function of a record and the caller's notion of
//! "today". Dates are compared as calendar dates only.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{
    credential::{Credential, CredentialState},
    pass::{Pass, PassAuthorization},
};

pub const NO_DATE_LABEL: &str = "No date available";
pub const INVALID_DATE_LABEL: &str = "Invalid date";

const DAYS_PER_MONTH: i64 = 30;
const DAYS_PER_YEAR: i64 = 365;

/// State shown to users for a credential, pass or affiliate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisplayState {
    Active,
    Expired,
    Suspended,
    Pending,
    Rejected,
}

impl DisplayState {
    /// Badge key consumed by the front end
    pub fn badge(&self) -> &'static str {
        match self {
            DisplayState::Active => "active",
            DisplayState::Expired => "expired",
            DisplayState::Suspended => "suspended",
            DisplayState::Pending => "pending",
            DisplayState::Rejected => "rejected",
        }
    }
}

/// Human-readable time left on a credential.
///
/// Suspension and expiry recorded in the state win over the dates. Otherwise
/// the remaining whole days are bucketed into days, months (30 days) or
/// years (365 days), rounding down.
pub fn remaining_label(credential: &Credential, today: NaiveDate) -> String {
    label_for(
        credential.state,
        credential.suspension_reason.as_deref(),
        credential.expiry_date,
        today,
    )
}

/// Same as [`remaining_label`] but for un-parsed input, e.g. a form field.
///
/// A missing or blank date yields [`NO_DATE_LABEL`]; a date that does not
/// parse as `YYYY-MM-DD` yields [`INVALID_DATE_LABEL`].
pub fn remaining_label_from_raw(
    state: CredentialState,
    suspension_reason: Option<&str>,
    raw_expiry: Option<&str>,
    today: NaiveDate,
) -> String {
    if matches!(state, CredentialState::Suspended | CredentialState::Expired) {
        return label_for(state, suspension_reason, None, today);
    }

    match parse_date(raw_expiry) {
        Ok(expiry) => label_for(state, suspension_reason, expiry, today),
        Err(()) => INVALID_DATE_LABEL.to_string(),
    }
}

/// True iff the credential is ACTIVE and has not passed its expiry date.
pub fn is_currently_valid(credential: &Credential, today: NaiveDate) -> bool {
    valid_for(credential.state, credential.expiry_date, today)
}

pub fn credential_display_state(credential: &Credential, today: NaiveDate) -> DisplayState {
    display_state_for(credential.state, credential.expiry_date, today)
}

/// Everything the UI shows about a credential at once
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialStatus {
    pub label: String,
    pub display_state: DisplayState,
    pub badge: &'static str,
    pub valid: bool,
}

impl CredentialStatus {
    fn new(label: String, display_state: DisplayState, valid: bool) -> Self {
        Self {
            label,
            display_state,
            badge: display_state.badge(),
            valid,
        }
    }
}

pub fn evaluate(credential: &Credential, today: NaiveDate) -> CredentialStatus {
    CredentialStatus::new(
        remaining_label(credential, today),
        credential_display_state(credential, today),
        is_currently_valid(credential, today),
    )
}

/// Evaluates un-parsed input. An unreadable date is never valid and is
/// shown as pending unless the state alone decides the outcome.
pub fn evaluate_raw(
    state: CredentialState,
    suspension_reason: Option<&str>,
    raw_expiry: Option<&str>,
    today: NaiveDate,
) -> CredentialStatus {
    let label = remaining_label_from_raw(state, suspension_reason, raw_expiry, today);
    let expiry = parse_date(raw_expiry).ok().flatten();

    CredentialStatus::new(
        label,
        display_state_for(state, expiry, today),
        valid_for(state, expiry, today),
    )
}

pub fn pass_display_state(pass: &Pass) -> DisplayState {
    match pass.authorization {
        PassAuthorization::Authorized => DisplayState::Active,
        PassAuthorization::Pending => DisplayState::Pending,
        PassAuthorization::Rejected => DisplayState::Rejected,
    }
}

/// Picks the credential shown for a person: the first ACTIVE one, else the first.
pub fn select_display_credential(credentials: &[Credential]) -> Option<&Credential> {
    credentials
        .iter()
        .find(|c| c.state == CredentialState::Active)
        .or_else(|| credentials.first())
}

/// Display state of a person, taken from their selected credential
pub fn affiliate_display_state(credentials: &[Credential], today: NaiveDate) -> DisplayState {
    select_display_credential(credentials)
        .map(|c| credential_display_state(c, today))
        .unwrap_or(DisplayState::Pending)
}

fn valid_for(state: CredentialState, expiry: Option<NaiveDate>, today: NaiveDate) -> bool {
    state == CredentialState::Active && expiry.is_some_and(|expiry| expiry >= today)
}

fn display_state_for(
    state: CredentialState,
    expiry: Option<NaiveDate>,
    today: NaiveDate,
) -> DisplayState {
    match state {
        CredentialState::Suspended => DisplayState::Suspended,
        CredentialState::Expired => DisplayState::Expired,
        CredentialState::Inactive => DisplayState::Pending,
        CredentialState::Active => match expiry {
            Some(expiry) if expiry >= today => DisplayState::Active,
            Some(_) => DisplayState::Expired,
            None => DisplayState::Pending,
        },
    }
}

fn label_for(
    state: CredentialState,
    suspension_reason: Option<&str>,
    expiry: Option<NaiveDate>,
    today: NaiveDate,
) -> String {
    match state {
        CredentialState::Suspended => match suspension_reason.map(str::trim) {
            Some(reason) if !reason.is_empty() => format!("Suspended: {}", reason),
            _ => "Suspended".to_string(),
        },
        CredentialState::Expired => "Expired".to_string(),
        CredentialState::Active | CredentialState::Inactive => match expiry {
            Some(expiry) => duration_label((expiry - today).num_days()),
            None => NO_DATE_LABEL.to_string(),
        },
    }
}

fn duration_label(days: i64) -> String {
    if days <= 0 {
        "Expired".to_string()
    } else if days < DAYS_PER_MONTH {
        plural(days, "day")
    } else if days < DAYS_PER_YEAR {
        plural(days / DAYS_PER_MONTH, "month")
    } else {
        plural(days / DAYS_PER_YEAR, "year")
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, ()> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ()),
    }
}
