//! Ties the lifecycle engine to the payment protocol client.
//!
//! The orchestrator is the only component that moves a job into `paid`: it
//! demands payment for an approved job (a challenge, not an error), settles a
//! submitted envelope through the facilitator, finalizes the job, and applies
//! the worker's reputation credit.

use crate::error::MarketError;
use crate::marketplace::{JobStatus, LifecycleEngine, Reward, UserDirectory, UserProfile};
use crate::store::DocumentStore;
use crate::x402::{FacilitatorClient, PaymentChallenge, PaymentEnvelope};

/// Resource identifier the payment challenge is issued for.
pub const PAY_RESOURCE: &str = "/api/pay";

/// Outcome of a payment request.
#[derive(Debug)]
pub enum PaymentOutcome {
    /// No envelope accompanied the request: the expected first call in the
    /// protocol. The caller should present this challenge and retry with a
    /// signed envelope.
    Required { challenge: PaymentChallenge },
    /// Payment verified and settled; the job is paid.
    Settled {
        transaction: String,
        payer: Option<String>,
        worker: Option<String>,
        /// False when the job was paid but the reputation write failed; the
        /// paid status is authoritative and the gap is reconciled out of
        /// band.
        worker_credited: bool,
    },
}

pub struct SettlementOrchestrator<S: DocumentStore> {
    engine: LifecycleEngine<S>,
    payments: FacilitatorClient,
}

impl<S: DocumentStore> SettlementOrchestrator<S> {
    pub fn new(engine: LifecycleEngine<S>, payments: FacilitatorClient) -> Self {
        Self { engine, payments }
    }

    pub fn engine(&self) -> &LifecycleEngine<S> {
        &self.engine
    }

    /// Demand or settle payment for an approved job.
    ///
    /// Fails with `InvalidState` unless the job is exactly `approved` (which
    /// also makes re-settling an already-paid job fail cleanly). On
    /// verification or settlement failure the job is left untouched and the
    /// call is safely retryable with a fresh envelope.
    pub async fn request_payment(
        &self,
        job_id: &str,
        envelope: Option<PaymentEnvelope>,
    ) -> Result<PaymentOutcome, MarketError> {
        let job = self.engine.get(job_id).await?;

        if job.status != JobStatus::Approved {
            return Err(MarketError::InvalidState(format!(
                "job must be approved before payment, current status: {}",
                job.status
            )));
        }

        let reward = Reward::parse(&job.reward).ok_or_else(|| {
            MarketError::Validation(format!("invalid reward amount: {:?}", job.reward))
        })?;

        let Some(envelope) = envelope else {
            return Ok(PaymentOutcome::Required {
                challenge: self.payments.build_challenge(reward.amount, PAY_RESOURCE, None),
            });
        };

        let settlement = self
            .payments
            .verify_and_settle(&envelope, reward.amount, PAY_RESOURCE, None)
            .await?;

        self.engine
            .mark_paid(job_id, &settlement.transaction, settlement.payer.as_deref())
            .await?;

        // Second, non-transactional write: the reputation credit. The paid
        // status above is the durable source of truth even if this fails.
        let mut worker_credited = false;
        if let Some(worker) = &job.worker {
            match self.credit_worker(worker).await {
                Ok(_) => worker_credited = true,
                Err(e) => {
                    eprintln!("warning: reputation update failed for {worker}: {e}");
                }
            }
        }

        Ok(PaymentOutcome::Settled {
            transaction: settlement.transaction,
            payer: settlement.payer,
            worker: job.worker,
            worker_credited,
        })
    }

    async fn credit_worker(&self, handle: &str) -> Result<UserProfile, MarketError> {
        UserDirectory::new(self.engine.store())
            .credit_completion(handle)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::{JobUpdate, NewJobRequest, REPUTATION_PER_JOB, USERS_COLLECTION};
    use crate::store::{DocumentStore, MemoryStore};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn orchestrator_for(
        server: &MockServer,
        store: MemoryStore,
    ) -> SettlementOrchestrator<MemoryStore> {
        let payments =
            FacilitatorClient::new(server.uri(), "0xpayee", "https://bountyboard.xyz", "celo");
        SettlementOrchestrator::new(LifecycleEngine::new(store), payments)
    }

    async fn approved_job(
        orchestrator: &SettlementOrchestrator<MemoryStore>,
        reward: &str,
        worker: Option<&str>,
    ) -> String {
        let engine = orchestrator.engine();
        let job = engine
            .create(NewJobRequest {
                title: "Translate the docs".into(),
                reward: reward.into(),
                poster: "@poster".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let id = job.id.unwrap();
        if let Some(worker) = worker {
            engine
                .transition(
                    &id,
                    JobUpdate {
                        status: Some(JobStatus::Claimed),
                        worker: Some(worker.into()),
                        ..Default::default()
                    },
                    None,
                )
                .await
                .unwrap();
        }
        engine
            .transition(&id, JobUpdate::status(JobStatus::Approved), None)
            .await
            .unwrap();
        id
    }

    fn envelope() -> PaymentEnvelope {
        PaymentEnvelope::from_value(json!({"payload": {"signature": "0xsig"}}))
    }

    fn mock_verify_ok() -> Mock {
        Mock::given(method("POST"))
            .and(path("/api/v2/x402/verify"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"isValid": true, "payer": "0xpayer"})),
            )
    }

    fn mock_settle_ok() -> Mock {
        Mock::given(method("POST"))
            .and(path("/api/v2/x402/settle"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "transaction": "0xtx123"})),
            )
    }

    #[tokio::test]
    async fn rejects_jobs_that_are_not_approved() {
        let server = MockServer::start().await;
        let orchestrator = orchestrator_for(&server, MemoryStore::new()).await;
        let job = orchestrator
            .engine()
            .create(NewJobRequest {
                title: "t".into(),
                reward: "5 USDT".into(),
                poster: "@p".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let id = job.id.unwrap();

        let err = orchestrator.request_payment(&id, None).await.unwrap_err();
        assert!(matches!(err, MarketError::InvalidState(_)));

        // Zero writes: the job is exactly as created.
        let after = orchestrator.engine().get(&id).await.unwrap();
        assert_eq!(after.status, JobStatus::Open);
        assert_eq!(after.updated_at, job.updated_at);
    }

    #[tokio::test]
    async fn invalid_reward_fails_validation() {
        let server = MockServer::start().await;
        let orchestrator = orchestrator_for(&server, MemoryStore::new()).await;
        let id = approved_job(&orchestrator, "a warm handshake", None).await;

        let err = orchestrator.request_payment(&id, None).await.unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_envelope_yields_challenge_not_error() {
        let server = MockServer::start().await;
        let orchestrator = orchestrator_for(&server, MemoryStore::new()).await;
        let id = approved_job(&orchestrator, "25 USDT", Some("@alice")).await;

        let outcome = orchestrator.request_payment(&id, None).await.unwrap();
        let PaymentOutcome::Required { challenge } = outcome else {
            panic!("expected a payment challenge");
        };
        assert_eq!(challenge.accepts[0].max_amount_required, "25000000");
        assert_eq!(challenge.default_network, "celo");
        assert_eq!(challenge.accepts[0].network, "eip155:42220");

        // The job is still waiting for payment.
        let job = orchestrator.engine().get(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Approved);
    }

    #[tokio::test]
    async fn settles_pays_and_credits_the_worker() {
        let server = MockServer::start().await;
        mock_verify_ok().mount(&server).await;
        mock_settle_ok().mount(&server).await;

        let store = MemoryStore::new();
        let orchestrator = orchestrator_for(&server, store.clone()).await;

        // Seed @alice with an existing record: 40 reputation, 3 completions.
        let users = UserDirectory::new(&store);
        let seeded = users.get_or_create("@alice").await.unwrap();
        store
            .update(
                USERS_COLLECTION,
                seeded.id.as_ref().unwrap(),
                json!({"reputationScore": 40, "jobsCompleted": 3}),
            )
            .await
            .unwrap();

        let id = approved_job(&orchestrator, "25 USDT", Some("@alice")).await;
        let outcome = orchestrator
            .request_payment(&id, Some(envelope()))
            .await
            .unwrap();

        let PaymentOutcome::Settled {
            transaction,
            payer,
            worker,
            worker_credited,
        } = outcome
        else {
            panic!("expected settlement");
        };
        assert_eq!(transaction, "0xtx123");
        assert_eq!(payer.as_deref(), Some("0xpayer"));
        assert_eq!(worker.as_deref(), Some("@alice"));
        assert!(worker_credited);

        let job = orchestrator.engine().get(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Paid);
        assert_eq!(job.payment_tx.as_deref(), Some("0xtx123"));
        assert_eq!(job.paid_by.as_deref(), Some("0xpayer"));

        let profile = users.find_by_handle("@alice").await.unwrap().unwrap();
        assert_eq!(profile.reputation_score, 50);
        assert_eq!(profile.jobs_completed, 4);
    }

    #[tokio::test]
    async fn worker_profile_created_on_first_reference() {
        let server = MockServer::start().await;
        mock_verify_ok().mount(&server).await;
        mock_settle_ok().mount(&server).await;

        let store = MemoryStore::new();
        let orchestrator = orchestrator_for(&server, store.clone()).await;
        let id = approved_job(&orchestrator, "5 USDT", Some("@newcomer")).await;

        orchestrator
            .request_payment(&id, Some(envelope()))
            .await
            .unwrap();

        let profile = UserDirectory::new(&store)
            .find_by_handle("@newcomer")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.jobs_completed, 1);
        assert_eq!(profile.reputation_score, REPUTATION_PER_JOB);
    }

    #[tokio::test]
    async fn settle_failure_leaves_job_approved() {
        let server = MockServer::start().await;
        mock_verify_ok().mount(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/v2/x402/settle"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"success": false, "errorReason": "insufficient allowance"}),
            ))
            .mount(&server)
            .await;

        let orchestrator = orchestrator_for(&server, MemoryStore::new()).await;
        let id = approved_job(&orchestrator, "25 USDT", Some("@alice")).await;

        let err = orchestrator
            .request_payment(&id, Some(envelope()))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::PaymentSettlement(_)));

        let job = orchestrator.engine().get(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Approved);
        assert!(job.payment_tx.is_none());
    }

    #[tokio::test]
    async fn verification_failure_leaves_job_approved() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/x402/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"isValid": false, "invalidReason": "signature expired"}),
            ))
            .mount(&server)
            .await;

        let orchestrator = orchestrator_for(&server, MemoryStore::new()).await;
        let id = approved_job(&orchestrator, "25 USDT", Some("@alice")).await;

        let err = orchestrator
            .request_payment(&id, Some(envelope()))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::PaymentVerification(r) if r == "signature expired"));

        let job = orchestrator.engine().get(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Approved);
    }

    #[tokio::test]
    async fn already_paid_job_is_not_resettled() {
        let server = MockServer::start().await;
        mock_verify_ok().mount(&server).await;
        mock_settle_ok().mount(&server).await;

        let orchestrator = orchestrator_for(&server, MemoryStore::new()).await;
        let id = approved_job(&orchestrator, "25 USDT", Some("@alice")).await;
        orchestrator
            .request_payment(&id, Some(envelope()))
            .await
            .unwrap();

        let err = orchestrator
            .request_payment(&id, Some(envelope()))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::InvalidState(_)));

        // The original settlement reference is untouched.
        let job = orchestrator.engine().get(&id).await.unwrap();
        assert_eq!(job.payment_tx.as_deref(), Some("0xtx123"));
    }
}
