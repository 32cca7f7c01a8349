//! The single authority for validating and applying job state changes.
//!
//! Every operation is one read-modify-write against the document store with
//! no cached state and no version check; two concurrent transitions on the
//! same job race with last-writer-wins. That limitation is accepted, not
//! papered over.

use chrono::Utc;
use serde_json::{Value, json};

use super::job::{Job, JobStatus, JobUpdate, NewJobRequest};
use super::users::UserDirectory;
use crate::error::MarketError;
use crate::store::{DocumentStore, StoreError, merge_fields};

pub const JOBS_COLLECTION: &str = "jobs";

pub struct LifecycleEngine<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> LifecycleEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Post a new job. Title, reward, and poster are required; the job starts
    /// `open` with no worker and both timestamps set to the same instant.
    pub async fn create(&self, request: NewJobRequest) -> Result<Job, MarketError> {
        for (field, value) in [
            ("title", &request.title),
            ("reward", &request.reward),
            ("poster", &request.poster),
        ] {
            if value.trim().is_empty() {
                return Err(MarketError::Validation(format!("{field} is required")));
            }
        }

        let now = Utc::now();
        let mut job = Job {
            id: None,
            title: request.title,
            description: request.description,
            reward: request.reward,
            poster: request.poster,
            poster_address: request.poster_address,
            worker: None,
            worker_address: None,
            status: JobStatus::Open,
            tags: request.tags,
            source_url: request.source_url,
            delivery_proof: None,
            created_at: now,
            updated_at: now,
            payment_tx: None,
            paid_by: None,
        };

        let record = serde_json::to_value(&job).map_err(StoreError::from)?;
        let id = self.store.insert(JOBS_COLLECTION, record).await?;
        job.id = Some(id);

        // First reference to the poster's handle creates their profile. The
        // count bump is a second, non-transactional write; the job record is
        // authoritative if it fails.
        let users = UserDirectory::new(&self.store);
        if let Err(e) = users.record_posting(&job.poster).await {
            eprintln!("warning: failed to record posting for {}: {e}", job.poster);
        }

        Ok(job)
    }

    pub async fn get(&self, job_id: &str) -> Result<Job, MarketError> {
        let record = self
            .store
            .get(JOBS_COLLECTION, job_id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("job {job_id}")))?;
        let mut job: Job = serde_json::from_value(record).map_err(StoreError::from)?;
        job.id = Some(job_id.to_string());
        Ok(job)
    }

    /// Jobs in a given status, newest first.
    pub async fn list(&self, status: JobStatus) -> Result<Vec<Job>, MarketError> {
        let docs = self
            .store
            .query(
                JOBS_COLLECTION,
                "status",
                &json!(status),
                Some("createdAt"),
                Some(50),
            )
            .await?;
        let mut jobs = Vec::with_capacity(docs.len());
        for doc in docs {
            let mut job: Job = serde_json::from_value(doc.body).map_err(StoreError::from)?;
            job.id = Some(doc.id);
            jobs.push(job);
        }
        Ok(jobs)
    }

    /// Apply a requested change to a job.
    ///
    /// A `paid` job is terminal. Requesting `open` is a cancellation and is
    /// only legal from `claimed`, by the poster. Everything else is a
    /// whitelisted field update; forward ordering among claimed/delivered/
    /// approved is intentionally not enforced here.
    pub async fn transition(
        &self,
        job_id: &str,
        update: JobUpdate,
        actor: Option<&str>,
    ) -> Result<Job, MarketError> {
        let current = self.get(job_id).await?;

        if current.status == JobStatus::Paid {
            return Err(MarketError::TerminalState(format!(
                "job {job_id} is paid and can no longer change"
            )));
        }

        if update.status == Some(JobStatus::Open) {
            if current.status != JobStatus::Claimed {
                return Err(MarketError::InvalidTransition(format!(
                    "cannot reopen a {} job",
                    current.status
                )));
            }
            if let Some(actor) = actor
                && actor != current.poster
            {
                return Err(MarketError::Authorization(
                    "only the job poster can cancel a claim".into(),
                ));
            }
            let patch = json!({
                "status": JobStatus::Open,
                "worker": null,
                "workerAddress": null,
                "updatedAt": Utc::now(),
            });
            return self.apply(job_id, current, patch).await;
        }

        let mut patch = serde_json::to_value(&update).map_err(StoreError::from)?;
        merge_fields(&mut patch, &json!({"updatedAt": Utc::now()}));
        self.apply(job_id, current, patch).await
    }

    /// Finalize a settled job. Callers outside the settlement path have no
    /// business invoking this.
    pub async fn mark_paid(
        &self,
        job_id: &str,
        transaction: &str,
        payer: Option<&str>,
    ) -> Result<Job, MarketError> {
        let current = self.get(job_id).await?;
        let patch = json!({
            "status": JobStatus::Paid,
            "paymentTx": transaction,
            "paidBy": payer,
            "updatedAt": Utc::now(),
        });
        self.apply(job_id, current, patch).await
    }

    async fn apply(&self, job_id: &str, current: Job, patch: Value) -> Result<Job, MarketError> {
        self.store
            .update(JOBS_COLLECTION, job_id, patch.clone())
            .await?;
        let mut merged = serde_json::to_value(&current).map_err(StoreError::from)?;
        merge_fields(&mut merged, &patch);
        let mut job: Job = serde_json::from_value(merged).map_err(StoreError::from)?;
        job.id = Some(job_id.to_string());
        Ok(job)
    }
}
