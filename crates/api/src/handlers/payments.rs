//! Handler for creating Stripe payment intents.
//!
//! An `individual` payment covers one order, or one member's outfit. A
//! `group_payment` covers the outfits of several unpaid members of one
//! wedding with a single charge. The amount is always computed here from
//! stored prices, never taken from the client.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use kct_core::contact::validate_email;
use kct_core::error::CoreError;
use kct_core::order_status::PAYMENT_UNPAID;
use kct_core::payments::{
    group_total, validate_amount, validate_member_ids, IntentContext, PaymentType,
    DEFAULT_CURRENCY,
};
use kct_core::types::{Cents, DbId};
use kct_core::wedding::MEMBER_PAID;
use kct_db::models::payment::CreatePayment;
use kct_db::repositories::{OrderRepo, PartyMemberRepo, PaymentRepo, WeddingRepo};
use kct_integrations::payments::PaymentIntentRequest;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::response::{ok, DataResponse};
use crate::state::AppState;

/// Body of `POST /payments/intents`.
#[derive(Debug, Deserialize)]
pub struct CreateIntent {
    pub payment_type: String,
    pub wedding_id: Option<DbId>,
    pub order_id: Option<DbId>,
    #[serde(default)]
    pub member_ids: Vec<DbId>,
    pub receipt_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IntentResponse {
    pub payment_id: DbId,
    pub payment_intent_id: String,
    pub client_secret: Option<String>,
    pub payment_type: &'static str,
    pub amount_cents: Cents,
    pub currency: String,
    pub member_ids: Vec<DbId>,
}

/// What a payment is for, resolved against the database.
struct Charge {
    amount_cents: Cents,
    description: String,
    receipt_email: Option<String>,
}

/// POST /api/v1/payments/intents
pub async fn create_intent(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateIntent>,
) -> AppResult<(StatusCode, Json<DataResponse<IntentResponse>>)> {
    let payment_type = PaymentType::parse(&input.payment_type)?;
    validate_member_ids(payment_type, &input.member_ids)?;
    let receipt_email = input
        .receipt_email
        .as_deref()
        .map(|e| validate_email("receipt_email", e))
        .transpose()?;

    let charge = match (payment_type, input.order_id, input.member_ids.is_empty()) {
        (PaymentType::Individual, Some(order_id), true) => order_charge(&state, order_id).await?,
        (_, None, false) => {
            let wedding_id = input.wedding_id.ok_or_else(|| {
                CoreError::Validation("wedding_id is required when paying for members".into())
            })?;
            member_charge(&state, payment_type, wedding_id, &input.member_ids).await?
        }
        (PaymentType::Individual, None, true) => {
            return Err(AppError::Core(CoreError::Validation(
                "An individual payment needs an order_id or one member id".into(),
            )))
        }
        _ => {
            return Err(AppError::Core(CoreError::Validation(
                "A payment covers either an order or wedding members, not both".into(),
            )))
        }
    };
    validate_amount(charge.amount_cents)?;

    let gateway = state.integrations.payments()?;

    let context = IntentContext {
        payment_type,
        wedding_id: input.wedding_id.filter(|_| !input.member_ids.is_empty()),
        order_id: input.order_id,
        member_ids: input.member_ids.clone(),
    };
    let metadata = context.to_metadata();

    let request = PaymentIntentRequest {
        amount_cents: charge.amount_cents,
        currency: DEFAULT_CURRENCY.to_string(),
        description: Some(charge.description),
        receipt_email: receipt_email.or(charge.receipt_email),
        metadata: metadata.clone(),
        idempotency_key: format!("kct-intent-{}", uuid::Uuid::new_v4()),
    };
    let intent = gateway.create_payment_intent(&request).await?;

    let payment = PaymentRepo::create(
        &state.pool,
        &CreatePayment {
            stripe_payment_intent_id: intent.id.clone(),
            payment_type: payment_type.as_str().to_string(),
            wedding_id: context.wedding_id,
            order_id: context.order_id,
            member_ids: context.member_ids.clone(),
            amount_cents: charge.amount_cents,
            currency: DEFAULT_CURRENCY.to_string(),
            metadata: serde_json::to_value(&metadata)
                .map_err(|e| AppError::InternalError(e.to_string()))?,
        },
    )
    .await?;

    tracing::info!(
        payment_id = payment.id,
        intent_id = %intent.id,
        payment_type = %payment_type,
        amount_cents = charge.amount_cents,
        members = context.member_ids.len(),
        "Payment intent created"
    );

    Ok((
        StatusCode::CREATED,
        ok(IntentResponse {
            payment_id: payment.id,
            payment_intent_id: intent.id,
            client_secret: intent.client_secret,
            payment_type: payment_type.as_str(),
            amount_cents: charge.amount_cents,
            currency: payment.currency,
            member_ids: context.member_ids,
        }),
    ))
}

async fn order_charge(state: &AppState, order_id: DbId) -> AppResult<Charge> {
    let order = OrderRepo::find_by_id(&state.pool, order_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Order",
            id: order_id,
        })?;
    if order.payment_status != PAYMENT_UNPAID {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Order {} is already {}",
            order.order_number, order.payment_status
        ))));
    }
    Ok(Charge {
        amount_cents: order.total_cents,
        description: format!("KCT Menswear order {}", order.order_number),
        receipt_email: Some(order.customer_email),
    })
}

/// Sum the outfit prices of unpaid members of one wedding.
async fn member_charge(
    state: &AppState,
    payment_type: PaymentType,
    wedding_id: DbId,
    member_ids: &[DbId],
) -> AppResult<Charge> {
    let wedding = WeddingRepo::find_by_id(&state.pool, wedding_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Wedding",
            id: wedding_id,
        })?;

    let charges = PartyMemberRepo::charges_for(&state.pool, wedding_id, member_ids).await?;
    if charges.len() != member_ids.len() {
        let missing: Vec<String> = member_ids
            .iter()
            .filter(|id| !charges.iter().any(|c| c.member_id == **id))
            .map(|id| id.to_string())
            .collect();
        return Err(AppError::Core(CoreError::Validation(format!(
            "Members not in wedding {wedding_id}: {}",
            missing.join(", ")
        ))));
    }

    let mut amounts = Vec::with_capacity(charges.len());
    for charge in &charges {
        if charge.payment_status == MEMBER_PAID {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Member {} has already paid",
                charge.member_id
            ))));
        }
        let price = charge.price_cents.ok_or_else(|| {
            CoreError::Validation(format!(
                "Member {} has no outfit assigned yet",
                charge.member_id
            ))
        })?;
        amounts.push(price);
    }
    let amount_cents = group_total(&amounts)?;

    let description = match payment_type {
        PaymentType::GroupPayment => format!(
            "Group outfit payment for {} members, {}",
            member_ids.len(),
            wedding.couple_names
        ),
        PaymentType::Individual => format!("Outfit payment, {}", wedding.couple_names),
    };

    Ok(Charge {
        amount_cents,
        description,
        receipt_email: None,
    })
}
