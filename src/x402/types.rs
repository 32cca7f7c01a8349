//! Wire types for the x402 payment protocol.
//!
//! Everything here serializes to the exact JSON shapes the facilitator
//! expects: camelCase keys, amounts as decimal strings in the asset's
//! smallest unit, and a base64-encoded challenge header.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version spoken with the facilitator.
pub const X402_VERSION: u8 = 2;

/// Timeout embedded in every challenge; enforced by the facilitator, not us.
pub const MAX_TIMEOUT_SECONDS: u32 = 30;

/// Decimal places of the settlement stablecoin.
const ASSET_DECIMALS: u32 = 6;

/// Express a USD price in the asset's smallest atomic unit, rounded to the
/// nearest integer, as a decimal string.
pub fn atomic_amount(price_usd: f64) -> String {
    let scale = 10u64.pow(ASSET_DECIMALS) as f64;
    format!("{}", (price_usd * scale).round() as u64)
}

/// One accepted payment option inside a challenge, and the requirements
/// echoed back on verify/settle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    pub scheme: String,
    /// CAIP-2 chain identifier, e.g. "eip155:42220".
    pub network: String,
    pub max_amount_required: String,
    pub resource: String,
    pub description: String,
    pub mime_type: String,
    pub pay_to: String,
    pub max_timeout_seconds: u32,
    pub asset: String,
    pub extra: AssetExtra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetExtra {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_name: Option<String>,
}

/// The "payment required" challenge returned when no envelope accompanied a
/// payment request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentChallenge {
    pub x402_version: u8,
    pub accepts: Vec<PaymentRequirements>,
    pub default_network: String,
}

impl PaymentChallenge {
    /// Encode the challenge for the `PAYMENT-REQUIRED` response header.
    pub fn to_header(&self) -> String {
        let json = serde_json::to_vec(self).expect("challenge serializes to JSON");
        BASE64.encode(json)
    }
}

/// A client-submitted proof of payment, opaque except for its `payload`
/// member which is forwarded verbatim to the facilitator.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentEnvelope {
    raw: Value,
}

impl PaymentEnvelope {
    /// Decode a payment header value: base64-wrapped JSON first, bare JSON as
    /// a fallback. Returns `None` if neither parses — the absence of a
    /// payment attempt is a normal case, not a fault.
    pub fn decode(header: &str) -> Option<Self> {
        let decoded = BASE64
            .decode(header.trim())
            .ok()
            .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok())
            .or_else(|| serde_json::from_str::<Value>(header).ok())?;
        Some(Self { raw: decoded })
    }

    pub fn from_value(raw: Value) -> Self {
        Self { raw }
    }

    /// The signed payload forwarded to the facilitator. Envelopes without a
    /// `payload` member are treated as being the payload themselves.
    pub fn payload(&self) -> &Value {
        self.raw.get("payload").unwrap_or(&self.raw)
    }

    pub fn as_value(&self) -> &Value {
        &self.raw
    }
}

/// Request body for both the verify and settle facilitator calls.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRequest {
    pub x402_version: u8,
    pub payment_requirements: PaymentRequirements,
    pub payment_payload: PaymentPayload,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub x402_version: u8,
    pub network: String,
    pub scheme: String,
    pub payload: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub payer: Option<String>,
    #[serde(default)]
    pub invalid_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub transaction: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub error_reason: Option<String>,
}

impl SettleResponse {
    /// The settlement transaction reference, whichever field the facilitator
    /// used for it.
    pub fn transaction_ref(&self) -> Option<&str> {
        self.transaction
            .as_deref()
            .or(self.transaction_hash.as_deref())
    }
}
