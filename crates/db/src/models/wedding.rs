//! Wedding, invitation, party member, measurement and outfit models.

use chrono::NaiveDate;
use kct_core::types::{Cents, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `weddings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Wedding {
    pub id: DbId,
    pub wedding_code: String,
    pub couple_names: String,
    pub wedding_date: Option<NaiveDate>,
    pub venue: Option<String>,
    pub coordinator_email: Option<String>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWedding {
    pub wedding_code: String,
    pub couple_names: String,
    pub wedding_date: Option<NaiveDate>,
    pub venue: Option<String>,
    pub coordinator_email: Option<String>,
}

/// A row from the `wedding_invitations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WeddingInvitation {
    pub id: DbId,
    pub wedding_id: DbId,
    pub invite_code: String,
    pub email: Option<String>,
    pub role: String,
    pub status: String,
    pub expires_at: Option<Timestamp>,
    pub accepted_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateInvitation {
    pub wedding_id: DbId,
    pub invite_code: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub expires_at: Option<Timestamp>,
}

/// A row from the `wedding_party_members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PartyMember {
    pub id: DbId,
    pub wedding_id: DbId,
    pub invitation_id: Option<DbId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub measurement_status: String,
    pub payment_status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Body of `POST /groomsmen-invitation/accept`.
#[derive(Debug, Clone, Deserialize)]
pub struct AcceptInvitation {
    pub invite_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// A row from the `wedding_measurements` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Measurement {
    pub id: DbId,
    pub member_id: DbId,
    pub measurements: serde_json::Value,
    pub status: String,
    pub review_note: Option<String>,
    pub reviewed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// A row from the `wedding_outfits` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Outfit {
    pub id: DbId,
    pub member_id: DbId,
    pub variant_id: Option<DbId>,
    pub description: Option<String>,
    pub price_cents: Cents,
    pub created_at: Timestamp,
}

/// Member id with the price of their outfit, for payment totals.
#[derive(Debug, Clone, FromRow)]
pub struct MemberCharge {
    pub member_id: DbId,
    pub payment_status: String,
    pub price_cents: Option<Cents>,
}
