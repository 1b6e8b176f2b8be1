//! Handlers for the groomsmen portal and measurement review.
//!
//! Invitation endpoints are public (the code is the credential). Roster and
//! measurement submission need a signed-in user; review is admin only.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use kct_core::contact::{validate_email, validate_name};
use kct_core::error::CoreError;
use kct_core::notifications::{Severity, KIND_INVITATION_ACCEPTED, KIND_MEASUREMENTS_SUBMITTED};
use kct_core::types::DbId;
use kct_core::wedding::{
    invitation_blocker, normalize_invite_code, review_outcome, validate_can_submit,
    validate_measurements, MeasurementStatus, MEASUREMENT_RECORD_SUBMITTED,
};
use kct_db::models::admin_notification::CreateAdminNotification;
use kct_db::models::wedding::{AcceptInvitation, Measurement, PartyMember, Wedding, WeddingInvitation};
use kct_db::repositories::{InvitationRepo, MeasurementRepo, PartyMemberRepo, WeddingRepo};
use kct_integrations::mailer::Email;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::jwt::{ROLE_ADMIN, ROLE_SERVICE};
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::notify::{notify_admin, send_email};
use crate::response::{ok, DataResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ValidateInvitation {
    pub invite_code: String,
}

#[derive(Debug, Serialize)]
pub struct InvitationView {
    pub wedding: Wedding,
    pub invitation: WeddingInvitation,
}

#[derive(Debug, Serialize)]
pub struct AcceptedInvitation {
    pub invitation: WeddingInvitation,
    pub member: PartyMember,
}

#[derive(Debug, Deserialize)]
pub struct SubmitMeasurements {
    pub measurements: serde_json::Value,
}

/// Body of `PATCH /admin/measurements/{id}/review`.
#[derive(Debug, Deserialize)]
pub struct ReviewMeasurements {
    pub approved: bool,
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewedMeasurements {
    pub measurement: Measurement,
    pub member_status: &'static str,
}

// ---------------------------------------------------------------------------
// Invitations
// ---------------------------------------------------------------------------

/// POST /api/v1/groomsmen-invitation/validate
///
/// Read-only: look the code up and report whether it can be accepted.
pub async fn validate_invitation(
    State(state): State<AppState>,
    AppJson(input): AppJson<ValidateInvitation>,
) -> AppResult<Json<DataResponse<InvitationView>>> {
    let invitation = usable_invitation(&state, &input.invite_code).await?;
    let wedding = WeddingRepo::find_by_id(&state.pool, invitation.wedding_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Wedding",
            id: invitation.wedding_id,
        })?;
    Ok(ok(InvitationView {
        wedding,
        invitation,
    }))
}

/// POST /api/v1/groomsmen-invitation/accept
///
/// Create the party member and mark the invitation accepted, atomically.
pub async fn accept_invitation(
    State(state): State<AppState>,
    AppJson(input): AppJson<AcceptInvitation>,
) -> AppResult<(StatusCode, Json<DataResponse<AcceptedInvitation>>)> {
    let input = AcceptInvitation {
        first_name: validate_name("first_name", &input.first_name)?,
        last_name: validate_name("last_name", &input.last_name)?,
        email: validate_email("email", &input.email)?,
        phone: input
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
        ..input
    };
    let invitation = usable_invitation(&state, &input.invite_code).await?;

    let (invitation, member) = InvitationRepo::accept(&state.pool, invitation.id, &input)
        .await?
        .ok_or_else(|| CoreError::Conflict("Invitation is no longer available".into()))?;

    tracing::info!(
        invitation_id = invitation.id,
        wedding_id = invitation.wedding_id,
        member_id = member.id,
        "Invitation accepted"
    );

    notify_admin(
        &state,
        CreateAdminNotification {
            kind: KIND_INVITATION_ACCEPTED,
            severity: Severity::Info,
            title: format!("{} {} joined a wedding party", member.first_name, member.last_name),
            message: format!(
                "{} accepted invitation {} as {}",
                member.email, invitation.invite_code, member.role
            ),
            data: json!({
                "wedding_id": invitation.wedding_id,
                "invitation_id": invitation.id,
                "member_id": member.id,
            }),
        },
    )
    .await;

    Ok((
        StatusCode::CREATED,
        ok(AcceptedInvitation { invitation, member }),
    ))
}

/// Find an invitation by code and make sure it is pending and unexpired.
async fn usable_invitation(state: &AppState, raw_code: &str) -> AppResult<WeddingInvitation> {
    let code = normalize_invite_code(raw_code)?;
    let invitation = InvitationRepo::find_by_code(&state.pool, &code)
        .await?
        .ok_or(CoreError::NotFoundByKey {
            entity: "Invitation",
            key: code,
        })?;

    let expired = invitation.expires_at.is_some_and(|at| at <= Utc::now());
    if let Some(reason) = invitation_blocker(&invitation.status, expired) {
        return Err(AppError::Core(CoreError::Conflict(reason)));
    }
    Ok(invitation)
}

// ---------------------------------------------------------------------------
// Members and measurements
// ---------------------------------------------------------------------------

/// GET /api/v1/weddings/{id}/members
pub async fn list_members(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(wedding_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<PartyMember>>>> {
    WeddingRepo::find_by_id(&state.pool, wedding_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Wedding",
            id: wedding_id,
        })?;
    let members = PartyMemberRepo::list_for_wedding(&state.pool, wedding_id).await?;
    Ok(ok(members))
}

/// POST /api/v1/wedding-members/{id}/measurements
///
/// A member submits their own measurements (matched by email); admins may
/// submit on anyone's behalf. Allowed until the measurements are approved.
pub async fn submit_measurements(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(member_id): Path<DbId>,
    AppJson(input): AppJson<SubmitMeasurements>,
) -> AppResult<(StatusCode, Json<DataResponse<Measurement>>)> {
    validate_measurements(&input.measurements)?;
    let member = PartyMemberRepo::find_by_id(&state.pool, member_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Wedding member",
            id: member_id,
        })?;

    let is_staff = auth.role == ROLE_ADMIN || auth.role == ROLE_SERVICE;
    let is_self = auth
        .email
        .as_deref()
        .is_some_and(|email| email.eq_ignore_ascii_case(&member.email));
    if !is_staff && !is_self {
        return Err(AppError::Core(CoreError::Forbidden(
            "You can only submit your own measurements".into(),
        )));
    }

    validate_can_submit(&member.measurement_status)?;
    let measurement = MeasurementRepo::submit(
        &state.pool,
        member_id,
        &member.measurement_status,
        &input.measurements,
    )
    .await?
    .ok_or_else(|| CoreError::Conflict("Member changed concurrently, reload and retry".into()))?;

    tracing::info!(member_id, measurement_id = measurement.id, "Measurements submitted");

    notify_admin(
        &state,
        CreateAdminNotification {
            kind: KIND_MEASUREMENTS_SUBMITTED,
            severity: Severity::Info,
            title: format!("Measurements from {} {}", member.first_name, member.last_name),
            message: "New measurements are waiting for review".to_string(),
            data: json!({
                "wedding_id": member.wedding_id,
                "member_id": member_id,
                "measurement_id": measurement.id,
            }),
        },
    )
    .await;

    Ok((StatusCode::CREATED, ok(measurement)))
}

/// PATCH /api/v1/admin/measurements/{id}/review
///
/// Approve (member becomes `approved`) or reject (member goes back to
/// `pending` and is asked to resubmit).
pub async fn review_measurements(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(measurement_id): Path<DbId>,
    AppJson(input): AppJson<ReviewMeasurements>,
) -> AppResult<Json<DataResponse<ReviewedMeasurements>>> {
    let measurement = MeasurementRepo::find_by_id(&state.pool, measurement_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Measurement",
            id: measurement_id,
        })?;
    if measurement.status != MEASUREMENT_RECORD_SUBMITTED {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Measurement {measurement_id} was already reviewed ({})",
            measurement.status
        ))));
    }
    let member = PartyMemberRepo::find_by_id(&state.pool, measurement.member_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Wedding member",
            id: measurement.member_id,
        })?;
    let next = review_outcome(&member.measurement_status, input.approved)?;

    let note = input.note.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let reviewed = MeasurementRepo::review(&state.pool, measurement_id, next, note)
        .await?
        .ok_or_else(|| {
            CoreError::Conflict("Measurement changed concurrently, reload and retry".into())
        })?;

    tracing::info!(
        measurement_id,
        member_id = member.id,
        approved = input.approved,
        member_status = %next,
        "Measurements reviewed"
    );

    send_email(&state, review_email(&member, next, note)).await;

    Ok(ok(ReviewedMeasurements {
        measurement: reviewed,
        member_status: next.as_str(),
    }))
}

fn review_email(member: &PartyMember, next: MeasurementStatus, note: Option<&str>) -> Email {
    let (subject, body) = if next == MeasurementStatus::Approved {
        (
            "Your measurements are approved",
            "Your measurements have been approved. We will start preparing your outfit.",
        )
    } else {
        (
            "Please update your measurements",
            "We need a few changes to your measurements. Please submit them again in the portal.",
        )
    };
    let mut text = format!("Hi {},\n\n{body}", member.first_name);
    if let Some(note) = note {
        text.push_str(&format!("\n\nNote from our tailor: {note}"));
    }
    Email {
        to: member.email.clone(),
        subject: subject.to_string(),
        text,
    }
}
