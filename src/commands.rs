//! Entry points for the UI layer. Every command returns either its result or
//! the [`Alert`] the UI should block on.

use log::info;
use serde::Serialize;

use crate::{
    airports::sorted_destinations,
    auth::{self, LoginOutcome, RegistrationForm, RegistrationLocation},
    error::{format_remaining, Alert, SurveyError},
    feedback::{self, FeedbackSummary},
    geofence::GeofenceStatus,
    models::{
        survey::{RATING_LABELS, RETURN_TRIP_BUCKETS, SURVEY_QUESTIONS, TRAVEL_CLASSES, TRIP_REASONS},
        SurveyPayload,
    },
    navigation::Route,
    sync::{DeliveryMode, DrainOutcome, SubmitOutcome},
    AppState,
};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub route: Route,
    pub submitted_at: String,
    pub outcome: SubmitOutcome,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CooldownView {
    pub remaining_secs: u64,
    /// `m:ss`, empty once the window has passed.
    pub label: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub synced: u64,
    pub unsynced: u64,
    pub online: bool,
    pub delivery_mode: DeliveryMode,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyFormOptions {
    pub airport_code: Option<String>,
    pub airport_name: Option<String>,
    pub destinations: Vec<(&'static str, &'static str)>,
    pub trip_reasons: &'static [&'static str],
    pub travel_classes: &'static [&'static str],
    pub return_trips: &'static [&'static str],
    pub questions: &'static [&'static str],
    pub rating_labels: &'static [&'static str],
}

/// Accepts a filled-in survey: cooldown check, timestamp, hand-off to the
/// queue. Field validation is the form's job.
pub async fn submit_survey(
    state: &AppState,
    mut payload: SurveyPayload,
) -> Result<SubmitReceipt, Alert> {
    let accepted_at = state.cooldown.try_accept()?;

    if payload.airport_code.is_empty() {
        let (code, name) = state.session.airport();
        payload.airport_code = code.unwrap_or_default();
        payload.airport_name = name.unwrap_or_default();
    }
    payload.stamp(accepted_at);

    let body = payload.to_json().map_err(SurveyError::Storage)?;
    let outcome = state
        .queue
        .submit(&body)
        .await
        .map_err(SurveyError::Storage)?;
    info!("Survey accepted at {} ({outcome:?})", payload.submitted_at);

    Ok(SubmitReceipt {
        route: Route::ThankYou,
        submitted_at: payload.submitted_at,
        outcome,
    })
}

pub fn cooldown_remaining(state: &AppState) -> CooldownView {
    let remaining = state.cooldown.remaining();
    let remaining_secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
    CooldownView {
        remaining_secs,
        label: if remaining.is_zero() {
            String::new()
        } else {
            format_remaining(&remaining)
        },
    }
}

pub async fn queue_status(state: &AppState) -> Result<QueueStatus, Alert> {
    let counts = state
        .db
        .submission_counts()
        .await
        .map_err(SurveyError::Storage)?;
    Ok(QueueStatus {
        synced: counts.synced,
        unsynced: counts.unsynced,
        online: state.connectivity.is_reachable().await,
        delivery_mode: state.queue.mode(),
    })
}

/// Manual retry; the sync loop already does this on every reconnect.
pub async fn sync_now(state: &AppState) -> Result<DrainOutcome, Alert> {
    if !state.connectivity.is_reachable().await {
        return Err(Alert::new("Offline", "Queued surveys will be sent once back online."));
    }
    Ok(state.queue.drain().await.map_err(SurveyError::Storage)?)
}

pub fn survey_form_options(state: &AppState) -> SurveyFormOptions {
    let (airport_code, airport_name) = state.session.airport();
    SurveyFormOptions {
        airport_code,
        airport_name,
        destinations: sorted_destinations(),
        trip_reasons: &TRIP_REASONS,
        travel_classes: &TRAVEL_CLASSES,
        return_trips: &RETURN_TRIP_BUCKETS,
        questions: &SURVEY_QUESTIONS,
        rating_labels: &RATING_LABELS,
    }
}

pub async fn login(state: &AppState, email: &str, password: &str) -> Result<LoginOutcome, Alert> {
    Ok(state.auth.login(email, password).await?)
}

pub fn verify_phone(phone: &str) -> Result<(), Alert> {
    Ok(auth::verify_phone(phone)?)
}

pub async fn locate_for_registration(state: &AppState) -> Result<RegistrationLocation, Alert> {
    Ok(state.auth.locate_for_registration().await?)
}

pub async fn register(
    state: &AppState,
    form: &RegistrationForm,
    location: Option<RegistrationLocation>,
) -> Result<Route, Alert> {
    Ok(state.auth.register(form, location).await?)
}

pub async fn logout(state: &AppState) -> Result<Route, Alert> {
    Ok(state.auth.logout().await?)
}

/// A dashboard became visible. Unauthenticated visitors are sent to login.
pub async fn enter_dashboard(state: &AppState) -> Result<GeofenceStatus, Route> {
    if !state.session.is_authenticated() {
        return Err(Route::Login);
    }
    Ok(state.geofence.enter_dashboard().await)
}

pub async fn exit_dashboard(state: &AppState) -> GeofenceStatus {
    state.geofence.exit_dashboard().await
}

pub fn acknowledge_session_end(state: &AppState) -> Route {
    state.geofence.acknowledge_session_end()
}

/// Aggregated feedback for the admin dashboard.
pub async fn admin_summary(state: &AppState) -> Result<FeedbackSummary, Alert> {
    let is_admin = state
        .session
        .auth()
        .is_some_and(|auth| auth.user.is_admin());
    if !is_admin {
        return Err(SurveyError::Permission("Administrator access required".into()).into());
    }
    let records = state
        .db
        .list_submissions()
        .await
        .map_err(SurveyError::Storage)?;
    Ok(feedback::summarize(&records))
}
