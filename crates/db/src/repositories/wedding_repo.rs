//! Repositories for the wedding tables: `weddings`, `wedding_invitations`,
//! `wedding_party_members`, `wedding_measurements` and `wedding_outfits`.

use kct_core::types::{Cents, DbId};
use kct_core::wedding::{
    MeasurementStatus, INVITATION_ACCEPTED, INVITATION_PENDING, MEASUREMENT_RECORD_APPROVED,
    MEASUREMENT_RECORD_REJECTED, MEASUREMENT_RECORD_SUBMITTED, MEMBER_PAID, MEMBER_UNPAID,
};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::wedding::{
    AcceptInvitation, CreateInvitation, CreateWedding, Measurement, MemberCharge, Outfit,
    PartyMember, Wedding, WeddingInvitation,
};

const WEDDING_COLUMNS: &str = "id, wedding_code, couple_names, wedding_date, venue, \
    coordinator_email, status, created_at, updated_at";

const INVITATION_COLUMNS: &str =
    "id, wedding_id, invite_code, email, role, status, expires_at, accepted_at, created_at";

const MEMBER_COLUMNS: &str = "id, wedding_id, invitation_id, first_name, last_name, email, \
    phone, role, measurement_status, payment_status, created_at, updated_at";

const MEASUREMENT_COLUMNS: &str =
    "id, member_id, measurements, status, review_note, reviewed_at, created_at";

const OUTFIT_COLUMNS: &str = "id, member_id, variant_id, description, price_cents, created_at";

// ---------------------------------------------------------------------------
// Weddings
// ---------------------------------------------------------------------------

pub struct WeddingRepo;

impl WeddingRepo {
    pub async fn create(pool: &PgPool, input: &CreateWedding) -> Result<Wedding, sqlx::Error> {
        let query = format!(
            "INSERT INTO weddings (wedding_code, couple_names, wedding_date, venue, coordinator_email) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {WEDDING_COLUMNS}"
        );
        sqlx::query_as::<_, Wedding>(&query)
            .bind(&input.wedding_code)
            .bind(&input.couple_names)
            .bind(input.wedding_date)
            .bind(&input.venue)
            .bind(&input.coordinator_email)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Wedding>, sqlx::Error> {
        let query = format!("SELECT {WEDDING_COLUMNS} FROM weddings WHERE id = $1");
        sqlx::query_as::<_, Wedding>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

// ---------------------------------------------------------------------------
// Invitations
// ---------------------------------------------------------------------------

pub struct InvitationRepo;

impl InvitationRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateInvitation,
    ) -> Result<WeddingInvitation, sqlx::Error> {
        let query = format!(
            "INSERT INTO wedding_invitations (wedding_id, invite_code, email, role, expires_at) \
             VALUES ($1, $2, $3, COALESCE($4, 'groomsman'), $5) \
             RETURNING {INVITATION_COLUMNS}"
        );
        sqlx::query_as::<_, WeddingInvitation>(&query)
            .bind(input.wedding_id)
            .bind(&input.invite_code)
            .bind(&input.email)
            .bind(&input.role)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Look up an invitation by its normalized code.
    pub async fn find_by_code(
        pool: &PgPool,
        invite_code: &str,
    ) -> Result<Option<WeddingInvitation>, sqlx::Error> {
        let query =
            format!("SELECT {INVITATION_COLUMNS} FROM wedding_invitations WHERE invite_code = $1");
        sqlx::query_as::<_, WeddingInvitation>(&query)
            .bind(invite_code)
            .fetch_optional(pool)
            .await
    }

    /// Accept a pending, unexpired invitation and create its party member in
    /// one transaction.
    ///
    /// Returns `None` if the invitation is no longer acceptable (accepted,
    /// revoked or expired concurrently).
    pub async fn accept(
        pool: &PgPool,
        invitation_id: DbId,
        input: &AcceptInvitation,
    ) -> Result<Option<(WeddingInvitation, PartyMember)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE wedding_invitations SET status = $2, accepted_at = NOW() \
             WHERE id = $1 AND status = $3 \
               AND (expires_at IS NULL OR expires_at > NOW()) \
             RETURNING {INVITATION_COLUMNS}"
        );
        let Some(invitation) = sqlx::query_as::<_, WeddingInvitation>(&query)
            .bind(invitation_id)
            .bind(INVITATION_ACCEPTED)
            .bind(INVITATION_PENDING)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Ok(None);
        };

        let insert = format!(
            "INSERT INTO wedding_party_members \
                (wedding_id, invitation_id, first_name, last_name, email, phone, role) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {MEMBER_COLUMNS}"
        );
        let member = sqlx::query_as::<_, PartyMember>(&insert)
            .bind(invitation.wedding_id)
            .bind(invitation.id)
            .bind(input.first_name.trim())
            .bind(input.last_name.trim())
            .bind(input.email.trim())
            .bind(&input.phone)
            .bind(&invitation.role)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some((invitation, member)))
    }
}

// ---------------------------------------------------------------------------
// Party members
// ---------------------------------------------------------------------------

pub struct PartyMemberRepo;

impl PartyMemberRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PartyMember>, sqlx::Error> {
        let query = format!("SELECT {MEMBER_COLUMNS} FROM wedding_party_members WHERE id = $1");
        sqlx::query_as::<_, PartyMember>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_wedding(
        pool: &PgPool,
        wedding_id: DbId,
    ) -> Result<Vec<PartyMember>, sqlx::Error> {
        let query = format!(
            "SELECT {MEMBER_COLUMNS} FROM wedding_party_members \
             WHERE wedding_id = $1 ORDER BY last_name, first_name, id"
        );
        sqlx::query_as::<_, PartyMember>(&query)
            .bind(wedding_id)
            .fetch_all(pool)
            .await
    }

    /// Payment status and outfit price for the given members of a wedding.
    ///
    /// Members of other weddings are not returned; the caller compares counts.
    pub async fn charges_for(
        pool: &PgPool,
        wedding_id: DbId,
        member_ids: &[DbId],
    ) -> Result<Vec<MemberCharge>, sqlx::Error> {
        sqlx::query_as::<_, MemberCharge>(
            "SELECT m.id AS member_id, m.payment_status, o.price_cents \
             FROM wedding_party_members m \
             LEFT JOIN wedding_outfits o ON o.member_id = m.id \
             WHERE m.wedding_id = $1 AND m.id = ANY($2) \
             ORDER BY m.id",
        )
        .bind(wedding_id)
        .bind(member_ids)
        .fetch_all(pool)
        .await
    }

    /// Mark members paid. Returns the number of rows that changed.
    pub async fn mark_paid(
        tx: &mut Transaction<'_, Postgres>,
        member_ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE wedding_party_members SET payment_status = $2 \
             WHERE id = ANY($1) AND payment_status = $3",
        )
        .bind(member_ids)
        .bind(MEMBER_PAID)
        .bind(MEMBER_UNPAID)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }
}

// ---------------------------------------------------------------------------
// Measurements
// ---------------------------------------------------------------------------

pub struct MeasurementRepo;

impl MeasurementRepo {
    /// Store a submission and move the member to `submitted`.
    ///
    /// `current_status` is the member status the caller validated against;
    /// returns `None` if the member changed in between.
    pub async fn submit(
        pool: &PgPool,
        member_id: DbId,
        current_status: &str,
        measurements: &serde_json::Value,
    ) -> Result<Option<Measurement>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE wedding_party_members SET measurement_status = $3 \
             WHERE id = $1 AND measurement_status = $2",
        )
        .bind(member_id)
        .bind(current_status)
        .bind(MeasurementStatus::Submitted.as_str())
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        // Only the newest submission is reviewable.
        sqlx::query(
            "UPDATE wedding_measurements \
             SET status = $3, review_note = 'Superseded by a newer submission', reviewed_at = NOW() \
             WHERE member_id = $1 AND status = $2",
        )
        .bind(member_id)
        .bind(MEASUREMENT_RECORD_SUBMITTED)
        .bind(MEASUREMENT_RECORD_REJECTED)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO wedding_measurements (member_id, measurements, status) \
             VALUES ($1, $2, $3) \
             RETURNING {MEASUREMENT_COLUMNS}"
        );
        let measurement = sqlx::query_as::<_, Measurement>(&query)
            .bind(member_id)
            .bind(measurements)
            .bind(MEASUREMENT_RECORD_SUBMITTED)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(measurement))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Measurement>, sqlx::Error> {
        let query = format!("SELECT {MEASUREMENT_COLUMNS} FROM wedding_measurements WHERE id = $1");
        sqlx::query_as::<_, Measurement>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Record a review on a submitted measurement and set the member's next
    /// status.
    ///
    /// Returns `None` if the record or its member is no longer `submitted`.
    pub async fn review(
        pool: &PgPool,
        measurement_id: DbId,
        next: MeasurementStatus,
        note: Option<&str>,
    ) -> Result<Option<Measurement>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let record_status = if next == MeasurementStatus::Approved {
            MEASUREMENT_RECORD_APPROVED
        } else {
            MEASUREMENT_RECORD_REJECTED
        };
        let query = format!(
            "UPDATE wedding_measurements SET status = $2, review_note = $3, reviewed_at = NOW() \
             WHERE id = $1 AND status = $4 \
             RETURNING {MEASUREMENT_COLUMNS}"
        );
        let Some(measurement) = sqlx::query_as::<_, Measurement>(&query)
            .bind(measurement_id)
            .bind(record_status)
            .bind(note)
            .bind(MEASUREMENT_RECORD_SUBMITTED)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Ok(None);
        };

        let updated = sqlx::query(
            "UPDATE wedding_party_members SET measurement_status = $2 \
             WHERE id = $1 AND measurement_status = $3",
        )
        .bind(measurement.member_id)
        .bind(next.as_str())
        .bind(MeasurementStatus::Submitted.as_str())
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(measurement))
    }
}

// ---------------------------------------------------------------------------
// Outfits
// ---------------------------------------------------------------------------

pub struct OutfitRepo;

impl OutfitRepo {
    /// Assign (or replace) a member's outfit.
    pub async fn upsert(
        pool: &PgPool,
        member_id: DbId,
        variant_id: Option<DbId>,
        description: Option<&str>,
        price_cents: Cents,
    ) -> Result<Outfit, sqlx::Error> {
        let query = format!(
            "INSERT INTO wedding_outfits (member_id, variant_id, description, price_cents) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (member_id) DO UPDATE SET \
                variant_id = EXCLUDED.variant_id, \
                description = EXCLUDED.description, \
                price_cents = EXCLUDED.price_cents \
             RETURNING {OUTFIT_COLUMNS}"
        );
        sqlx::query_as::<_, Outfit>(&query)
            .bind(member_id)
            .bind(variant_id)
            .bind(description)
            .bind(price_cents)
            .fetch_one(pool)
            .await
    }
}
