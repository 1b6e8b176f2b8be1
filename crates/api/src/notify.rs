//! Best-effort side effects: admin notifications and customer emails.
//!
//! A failure here is logged with `tracing::warn!` and never reaches the
//! caller; the primary write has already happened.

use kct_core::order_status::OrderStatus;
use kct_db::models::admin_notification::CreateAdminNotification;
use kct_db::models::order::Order;
use kct_db::repositories::AdminNotificationRepo;
use kct_integrations::mailer::Email;

use crate::state::AppState;

/// Write an admin notification, logging instead of failing.
pub async fn notify_admin(state: &AppState, input: CreateAdminNotification) {
    if let Err(e) = AdminNotificationRepo::create(&state.pool, &input).await {
        tracing::warn!(kind = input.kind, error = %e, "Failed to write admin notification");
    }
}

/// Send an email if a mailer is configured, logging instead of failing.
pub async fn send_email(state: &AppState, email: Email) {
    let Some(mailer) = state.integrations.mailer.as_ref() else {
        tracing::debug!(to = %email.to, subject = %email.subject, "Mailer not configured, email skipped");
        return;
    };
    match mailer.send(&email).await {
        Ok(()) => tracing::info!(to = %email.to, subject = %email.subject, "Email sent"),
        Err(e) => {
            tracing::warn!(to = %email.to, subject = %email.subject, error = %e, "Failed to send email")
        }
    }
}

/// Customer email for an order status change.
pub fn order_status_email(order: &Order, status: OrderStatus) -> Email {
    let greeting = match order.customer_name.as_deref() {
        Some(name) if !name.trim().is_empty() => format!("Hi {},", name.trim()),
        _ => "Hello,".to_string(),
    };
    let mut text = format!(
        "{greeting}\n\nYour KCT Menswear order {} is now {}.",
        order.order_number, status
    );
    if status == OrderStatus::Shipped {
        if let (Some(carrier), Some(tracking)) = (&order.carrier, &order.tracking_number) {
            text.push_str(&format!("\n\nCarrier: {carrier}\nTracking number: {tracking}"));
        }
    }
    text.push_str("\n\nThank you for shopping with KCT Menswear.");

    Email {
        to: order.customer_email.clone(),
        subject: format!("{} ({})", status.email_subject(), order.order_number),
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn order() -> Order {
        Order {
            id: 1,
            order_number: "KCT-20261016-AB12".into(),
            session_id: Some("sess".into()),
            customer_email: "sam@example.com".into(),
            customer_name: Some("Sam".into()),
            status: "shipped".into(),
            payment_status: "paid".into(),
            subtotal_cents: 29_900,
            shipping_cents: 0,
            total_cents: 29_900,
            shipping_address: None,
            easypost_shipment_id: Some("shp_1".into()),
            tracking_number: Some("9400111".into()),
            carrier: Some("USPS".into()),
            label_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn shipped_email_includes_tracking() {
        let email = order_status_email(&order(), OrderStatus::Shipped);
        assert_eq!(email.to, "sam@example.com");
        assert!(email.subject.starts_with("Your order has shipped"));
        assert!(email.text.contains("Tracking number: 9400111"));
        assert!(email.text.starts_with("Hi Sam,"));
    }

    #[test]
    fn other_statuses_omit_tracking() {
        let email = order_status_email(&order(), OrderStatus::Delivered);
        assert!(!email.text.contains("Tracking"));
    }
}
