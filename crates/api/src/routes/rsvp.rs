//! RSVP routes. Every handler acts on the session's own invitation only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::guest::{AttendanceRequest, CreateGuestRequest, Guest, UpdateGuestRequest};
use domain::models::roster::{RosterSubmission, RosterView};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentSession;
use crate::middleware::metrics::record_roster_change;

/// Current roster with capacity and meal options.
///
/// GET /api/v1/rsvp
pub async fn get_roster(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<RosterView>, ApiError> {
    let view = state.roster_service().view(session.invitation_key()).await?;
    Ok(Json(view))
}

/// Submit the whole RSVP form. The stored roster is made to match it.
///
/// PUT /api/v1/rsvp
pub async fn submit_roster(
    State(state): State<AppState>,
    session: CurrentSession,
    Json(submission): Json<RosterSubmission>,
) -> Result<Json<RosterView>, ApiError> {
    submission.validate()?;

    let view = state
        .roster_service()
        .reconcile(session.invitation_key(), &submission, Utc::now())
        .await?;
    record_roster_change("reconcile");

    Ok(Json(view))
}

/// Record the party decision without changing guests.
///
/// POST /api/v1/rsvp/attendance
pub async fn record_attendance(
    State(state): State<AppState>,
    session: CurrentSession,
    Json(request): Json<AttendanceRequest>,
) -> Result<Json<RosterView>, ApiError> {
    let roster = state.roster_service();
    let key = session.invitation_key();

    roster.record_attendance(key, request.attending).await?;
    record_roster_change("attendance");

    Ok(Json(roster.view(key).await?))
}

/// POST /api/v1/rsvp/guests
pub async fn add_guest(
    State(state): State<AppState>,
    session: CurrentSession,
    Json(request): Json<CreateGuestRequest>,
) -> Result<(StatusCode, Json<Guest>), ApiError> {
    request.validate()?;

    let guest = state
        .roster_service()
        .create_guest(session.invitation_key(), &request.name, Utc::now())
        .await?;
    record_roster_change("create");

    Ok((StatusCode::CREATED, Json(guest)))
}

/// PATCH /api/v1/rsvp/guests/:guest_id
pub async fn update_guest(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(guest_id): Path<i64>,
    Json(request): Json<UpdateGuestRequest>,
) -> Result<Json<Guest>, ApiError> {
    request.validate()?;

    let guest = state
        .roster_service()
        .update_guest(session.invitation_key(), guest_id, &request, Utc::now())
        .await?;
    record_roster_change("update");

    Ok(Json(guest))
}

/// DELETE /api/v1/rsvp/guests/:guest_id
pub async fn delete_guest(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(guest_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .roster_service()
        .delete_guest(session.invitation_key(), guest_id)
        .await?;
    record_roster_change("delete");

    Ok(StatusCode::NO_CONTENT)
}
