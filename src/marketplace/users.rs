use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::MarketError;
use crate::store::DocumentStore;

pub const USERS_COLLECTION: &str = "users";

/// Reputation granted to the worker each time a job they completed is paid.
pub const REPUTATION_PER_JOB: u32 = 10;

/// A marketplace participant, keyed externally by unique handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub handle: String,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub reputation_score: u32,
    #[serde(default)]
    pub jobs_posted: u32,
    #[serde(default)]
    pub jobs_completed: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    fn fresh(handle: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            handle: handle.to_string(),
            wallet_address: None,
            verified: false,
            reputation_score: 0,
            jobs_posted: 0,
            jobs_completed: 0,
            created_at: now,
            updated_at: None,
        }
    }
}

/// Profile lookups and updates against the document store.
///
/// Profiles are created on first reference to a handle and updated in place
/// afterwards; the core never deletes them.
pub struct UserDirectory<'a, S: DocumentStore> {
    store: &'a S,
}

impl<'a, S: DocumentStore> UserDirectory<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn find_by_handle(&self, handle: &str) -> Result<Option<UserProfile>, MarketError> {
        let docs = self
            .store
            .query(USERS_COLLECTION, "handle", &json!(handle), None, Some(1))
            .await?;
        match docs.into_iter().next() {
            Some(doc) => {
                let mut profile: UserProfile =
                    serde_json::from_value(doc.body).map_err(crate::store::StoreError::from)?;
                profile.id = Some(doc.id);
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    /// Load a profile, creating it on first reference to the handle.
    pub async fn get_or_create(&self, handle: &str) -> Result<UserProfile, MarketError> {
        if let Some(profile) = self.find_by_handle(handle).await? {
            return Ok(profile);
        }
        let mut profile = UserProfile::fresh(handle, Utc::now());
        let record = serde_json::to_value(&profile).map_err(crate::store::StoreError::from)?;
        let id = self.store.insert(USERS_COLLECTION, record).await?;
        profile.id = Some(id);
        Ok(profile)
    }

    /// Count a newly posted job against the poster's profile.
    pub async fn record_posting(&self, handle: &str) -> Result<UserProfile, MarketError> {
        let profile = self.get_or_create(handle).await?;
        let id = profile.id.clone().ok_or_else(|| {
            MarketError::NotFound(format!("user profile for {handle} has no id"))
        })?;
        self.store
            .update(
                USERS_COLLECTION,
                &id,
                json!({
                    "jobsPosted": profile.jobs_posted + 1,
                    "updatedAt": Utc::now(),
                }),
            )
            .await?;
        Ok(UserProfile {
            jobs_posted: profile.jobs_posted + 1,
            ..profile
        })
    }

    /// Apply the completion rule for a paid job: `jobsCompleted += 1` and
    /// `reputationScore += REPUTATION_PER_JOB` for the worker of record.
    pub async fn credit_completion(&self, handle: &str) -> Result<UserProfile, MarketError> {
        let profile = self.get_or_create(handle).await?;
        let id = profile.id.clone().ok_or_else(|| {
            MarketError::NotFound(format!("user profile for {handle} has no id"))
        })?;
        let jobs_completed = profile.jobs_completed + 1;
        let reputation_score = profile.reputation_score + REPUTATION_PER_JOB;
        self.store
            .update(
                USERS_COLLECTION,
                &id,
                json!({
                    "jobsCompleted": jobs_completed,
                    "reputationScore": reputation_score,
                    "updatedAt": Utc::now(),
                }),
            )
            .await?;
        Ok(UserProfile {
            jobs_completed,
            reputation_score,
            ..profile
        })
    }
}
