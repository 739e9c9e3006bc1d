//! Stripe REST client and webhook verification
//!
//! Talks to the Stripe API with form-encoded requests. The base URL comes
//! from configuration so tests can point it at a mock server.
//!
//! Event kinds and session payment states use the typed enums of the
//! `stripe` crate. Signatures are checked by hand over the raw body so
//! deliveries from newer API versions, whose objects the typed `Event`
//! does not fully model, still verify.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;
use ::stripe::{CheckoutSessionPaymentStatus, EventType};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::StripeConfig;
use crate::utils::errors::{Result, StripeError, WaddleError};

type HmacSha256 = Hmac<Sha256>;

/// Parameters of a one-line-item checkout session
#[derive(Debug, Clone)]
pub struct CheckoutRequest<'a> {
    pub booking_id: Uuid,
    pub product_name: &'a str,
    pub unit_amount_cents: i64,
    pub quantity: i32,
    pub currency: &'a str,
    pub customer_email: Option<&'a str>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub payment_status: Option<CheckoutSessionPaymentStatus>,
    #[serde(default)]
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    /// Booking this session was created for
    pub fn booking_id(&self) -> Option<Uuid> {
        self.metadata
            .get("booking_id")
            .or(self.client_reference_id.as_ref())
            .and_then(|id| Uuid::parse_str(id).ok())
    }

    pub fn is_paid(&self) -> bool {
        matches!(
            self.payment_status,
            Some(CheckoutSessionPaymentStatus::Paid) | Some(CheckoutSessionPaymentStatus::NoPaymentRequired)
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Refund {
    pub id: String,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Transfer {
    pub id: String,
}

/// Charge object as delivered by `charge.refunded`
#[derive(Debug, Clone, Deserialize)]
pub struct Charge {
    pub id: String,
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub refunded: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    pub object: serde_json::Value,
}

impl WebhookEvent {
    /// Typed event kind, `None` for types this client does not know
    pub fn kind(&self) -> Option<EventType> {
        serde_json::from_value(serde_json::Value::String(self.event_type.clone())).ok()
    }

    /// Decode the event payload object
    pub fn object<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.data.object.clone())
            .map_err(|e| StripeError::InvalidResponse(format!("{}: {}", self.event_type, e)).into())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StripeClient {
    http: Client,
    api_base: String,
    secret_key: String,
    success_url: String,
    cancel_url: String,
}

impl StripeClient {
    pub fn new(config: &StripeConfig) -> Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(20)).build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
            success_url: config.success_url.clone(),
            cancel_url: config.cancel_url.clone(),
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(format!("{}{}", self.api_base, path))
            .basic_auth(&self.secret_key, None::<&str>)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| format!("HTTP {}", status));
            warn!(status = status.as_u16(), message = %message, "Stripe request failed");
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        serde_json::from_str(&body).map_err(|e| StripeError::InvalidResponse(e.to_string()).into())
    }

    pub async fn create_checkout_session(&self, request: &CheckoutRequest<'_>) -> Result<CheckoutSession> {
        let booking_id = request.booking_id.to_string();
        let mut form: Vec<(&str, String)> = vec![
            ("mode", "payment".to_string()),
            ("success_url", self.success_url.clone()),
            ("cancel_url", self.cancel_url.clone()),
            ("client_reference_id", booking_id.clone()),
            ("metadata[booking_id]", booking_id.clone()),
            ("payment_intent_data[metadata][booking_id]", booking_id),
            ("expires_at", request.expires_at.timestamp().to_string()),
            ("line_items[0][quantity]", request.quantity.to_string()),
            ("line_items[0][price_data][currency]", request.currency.to_lowercase()),
            (
                "line_items[0][price_data][unit_amount]",
                request.unit_amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                request.product_name.to_string(),
            ),
        ];
        if let Some(email) = request.customer_email {
            form.push(("customer_email", email.to_string()));
        }

        let session: CheckoutSession = self
            .send(
                self.post("/v1/checkout/sessions")
                    .header("Idempotency-Key", format!("checkout-{}", request.booking_id))
                    .form(&form),
            )
            .await?;

        debug!(session_id = %session.id, booking_id = %request.booking_id, "Checkout session created");
        Ok(session)
    }

    /// Expire an open checkout session so it can no longer be paid
    pub async fn expire_checkout_session(&self, session_id: &str) -> Result<CheckoutSession> {
        self.send(self.post(&format!("/v1/checkout/sessions/{}/expire", session_id)))
            .await
    }

    /// Refund a payment intent in full or in part
    pub async fn create_refund(
        &self,
        payment_intent_id: &str,
        amount_cents: Option<i64>,
        idempotency_key: &str,
    ) -> Result<Refund> {
        let mut form = vec![("payment_intent", payment_intent_id.to_string())];
        if let Some(amount) = amount_cents {
            form.push(("amount", amount.to_string()));
        }

        self.send(
            self.post("/v1/refunds")
                .header("Idempotency-Key", idempotency_key)
                .form(&form),
        )
        .await
    }

    /// Move funds to a connected account
    pub async fn create_transfer(
        &self,
        amount_cents: i64,
        currency: &str,
        destination: &str,
        idempotency_key: &str,
    ) -> Result<Transfer> {
        let form = [
            ("amount", amount_cents.to_string()),
            ("currency", currency.to_lowercase()),
            ("destination", destination.to_string()),
        ];

        self.send(
            self.post("/v1/transfers")
                .header("Idempotency-Key", idempotency_key)
                .form(&form),
        )
        .await
    }
}

/// Verify a `Stripe-Signature` header against the raw request body
///
/// The header carries `t=<unix>` and one or more `v1=<hex>` entries; the
/// signature is HMAC-SHA256 over `"{t}.{payload}"` keyed by the endpoint secret.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> std::result::Result<(), StripeError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<Vec<u8>> = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| StripeError::InvalidSignature("missing timestamp".to_string()))?;
    if signatures.is_empty() {
        return Err(StripeError::InvalidSignature("missing v1 signature".to_string()));
    }
    if (now - timestamp).abs() > tolerance_secs {
        return Err(StripeError::InvalidSignature(
            "timestamp outside the tolerance window".to_string(),
        ));
    }

    let matches = signatures.iter().any(|signature| {
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(signature).is_ok()
    });

    if matches {
        Ok(())
    } else {
        Err(StripeError::InvalidSignature("signature mismatch".to_string()))
    }
}

/// Verify and decode a webhook delivery
pub fn parse_webhook(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
) -> Result<WebhookEvent> {
    verify_signature(payload, header, secret, tolerance_secs, Utc::now().timestamp())?;
    serde_json::from_slice(payload).map_err(|e| {
        WaddleError::BadRequest(format!("malformed webhook payload: {}", e))
    })
}

/// Build a signature header the way Stripe does
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SECRET: &str = "whsec_test_secret";

    #[test]
    fn test_valid_signature() {
        let payload = br#"{"id":"evt_1","type":"checkout.session.completed"}"#;
        let now = 1_700_000_000;
        let header = sign_payload(payload, SECRET, now);
        assert!(verify_signature(payload, &header, SECRET, 300, now + 10).is_ok());
    }

    #[test]
    fn test_signature_among_several() {
        let payload = b"{}";
        let now = 1_700_000_000;
        let good = sign_payload(payload, SECRET, now);
        let v1 = good.split_once("v1=").unwrap().1;
        let header = format!("t={},v1={},v1={}", now, "00".repeat(32), v1);
        assert!(verify_signature(payload, &header, SECRET, 300, now).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let now = 1_700_000_000;
        let header = sign_payload(b"{\"amount\":100}", SECRET, now);
        assert_matches!(
            verify_signature(b"{\"amount\":999}", &header, SECRET, 300, now),
            Err(StripeError::InvalidSignature(_))
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let now = 1_700_000_000;
        let header = sign_payload(b"{}", "whsec_other", now);
        assert!(verify_signature(b"{}", &header, SECRET, 300, now).is_err());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let now = 1_700_000_000;
        let header = sign_payload(b"{}", SECRET, now - 301);
        assert!(verify_signature(b"{}", &header, SECRET, 300, now).is_err());
        let header = sign_payload(b"{}", SECRET, now + 301);
        assert!(verify_signature(b"{}", &header, SECRET, 300, now).is_err());
    }

    #[test]
    fn test_malformed_headers_rejected() {
        let now = 1_700_000_000;
        assert!(verify_signature(b"{}", "v1=abcd", SECRET, 300, now).is_err());
        assert!(verify_signature(b"{}", "t=1700000000", SECRET, 300, now).is_err());
        assert!(verify_signature(b"{}", "", SECRET, 300, now).is_err());
        assert!(verify_signature(b"{}", "t=1700000000,v1=nothex", SECRET, 300, now).is_err());
    }

    #[test]
    fn test_session_booking_id() {
        let booking_id = Uuid::new_v4();
        let session: CheckoutSession = serde_json::from_value(serde_json::json!({
            "id": "cs_test_1",
            "url": null,
            "payment_status": "paid",
            "metadata": { "booking_id": booking_id.to_string() }
        }))
        .unwrap();
        assert_eq!(session.booking_id(), Some(booking_id));
        assert!(session.is_paid());

        let session: CheckoutSession = serde_json::from_value(serde_json::json!({
            "id": "cs_test_2",
            "client_reference_id": booking_id.to_string(),
            "payment_status": "unpaid"
        }))
        .unwrap();
        assert_eq!(session.booking_id(), Some(booking_id));
        assert!(!session.is_paid());
    }

    #[test]
    fn test_event_object_decoding() {
        let event: WebhookEvent = serde_json::from_value(serde_json::json!({
            "id": "evt_1",
            "type": "charge.refunded",
            "data": { "object": { "id": "ch_1", "payment_intent": "pi_1", "refunded": true } }
        }))
        .unwrap();
        assert_eq!(event.kind(), Some(EventType::ChargeRefunded));
        let charge: Charge = event.object().unwrap();
        assert_eq!(charge.payment_intent.as_deref(), Some("pi_1"));
        assert!(charge.refunded);
    }

    #[test]
    fn test_event_kinds() {
        let event = |event_type: &str| WebhookEvent {
            id: "evt_1".to_string(),
            event_type: event_type.to_string(),
            data: WebhookData {
                object: serde_json::json!({}),
            },
        };

        assert_eq!(
            event("checkout.session.completed").kind(),
            Some(EventType::CheckoutSessionCompleted)
        );
        assert_eq!(
            event("checkout.session.async_payment_failed").kind(),
            Some(EventType::CheckoutSessionAsyncPaymentFailed)
        );
        assert_eq!(event("not.a.real.event").kind(), None);
    }
}
