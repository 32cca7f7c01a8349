use std::time::Duration;

use reqwest::Client;

use super::error::X402Error;
use super::networks;
use super::types::{
    AssetExtra, ExchangeRequest, MAX_TIMEOUT_SECONDS, PaymentChallenge, PaymentEnvelope,
    PaymentPayload, PaymentRequirements, SettleResponse, VerifyResponse, X402_VERSION,
    atomic_amount,
};

/// Successful settlement: who paid and the on-chain transaction reference.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub payer: Option<String>,
    pub transaction: String,
}

/// Encodes payment requirements and runs the verify/settle exchange against
/// the external facilitator.
pub struct FacilitatorClient {
    client: Client,
    base_url: String,
    pay_to: String,
    resource_base: String,
    default_network: String,
}

impl FacilitatorClient {
    pub fn new(
        base_url: impl Into<String>,
        pay_to: impl Into<String>,
        resource_base: impl Into<String>,
        default_network: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: base_url.into(),
            pay_to: pay_to.into(),
            resource_base: resource_base.into(),
            default_network: default_network.into(),
        }
    }

    /// Build the payment-requirements challenge for a fixed-price resource.
    /// `network` defaults to the configured network when unspecified.
    pub fn build_challenge(
        &self,
        price_usd: f64,
        resource: &str,
        network: Option<&str>,
    ) -> PaymentChallenge {
        let network = network.unwrap_or(&self.default_network);
        PaymentChallenge {
            x402_version: X402_VERSION,
            accepts: vec![self.requirements(price_usd, resource, network)],
            default_network: network.to_string(),
        }
    }

    /// Two-phase exchange: verify the envelope's payload against the
    /// recomputed requirements, then settle. Either phase failing is
    /// reported immediately; no retries.
    pub async fn verify_and_settle(
        &self,
        envelope: &PaymentEnvelope,
        price_usd: f64,
        resource: &str,
        network: Option<&str>,
    ) -> Result<Settlement, X402Error> {
        let network = network.unwrap_or(&self.default_network);
        let requirements = self.requirements(price_usd, resource, network);
        let body = ExchangeRequest {
            x402_version: X402_VERSION,
            payment_requirements: requirements.clone(),
            payment_payload: PaymentPayload {
                x402_version: X402_VERSION,
                network: requirements.network.clone(),
                scheme: "exact".into(),
                payload: envelope.payload().clone(),
            },
        };

        let response = self
            .client
            .post(format!("{}/api/v2/x402/verify", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let reason = response
                .json::<VerifyResponse>()
                .await
                .ok()
                .and_then(|r| r.invalid_reason)
                .unwrap_or_else(|| "verification failed".to_string());
            return Err(X402Error::Verification { reason });
        }

        let verified = response.json::<VerifyResponse>().await?;
        if !verified.is_valid {
            return Err(X402Error::Verification {
                reason: verified
                    .invalid_reason
                    .unwrap_or_else(|| "invalid payment".to_string()),
            });
        }

        let response = self
            .client
            .post(format!("{}/api/v2/x402/settle", self.base_url))
            .json(&body)
            .send()
            .await?;

        let settled = response
            .json::<SettleResponse>()
            .await
            .unwrap_or_default();
        if !settled.success {
            return Err(X402Error::Settlement {
                reason: settled
                    .error_reason
                    .unwrap_or_else(|| "settlement failed".to_string()),
            });
        }

        Ok(Settlement {
            payer: verified.payer,
            transaction: settled.transaction_ref().unwrap_or_default().to_string(),
        })
    }

    fn requirements(&self, price_usd: f64, resource: &str, network: &str) -> PaymentRequirements {
        PaymentRequirements {
            scheme: "exact".into(),
            network: networks::caip2(network).to_string(),
            max_amount_required: atomic_amount(price_usd),
            resource: format!("{}{}", self.resource_base, resource),
            description: format!("BountyBoard payment for {resource}"),
            mime_type: "application/json".into(),
            pay_to: self.pay_to.clone(),
            max_timeout_seconds: MAX_TIMEOUT_SECONDS,
            asset: networks::asset_address(network).to_string(),
            extra: AssetExtra {
                name: networks::asset_name(network).into(),
                version: "2".into(),
                network_name: Some(network.to_string()),
            },
        }
    }
}
