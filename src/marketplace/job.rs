use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tracks where a job is in its lifecycle.
///
/// The forward path is `open → claimed → delivered → approved → paid`, with a
/// cancellation side transition `claimed → open` and a terminal `disputed`
/// state reachable from any non-terminal state. Entry into `disputed` is an
/// external policy decision; the engine accepts it without further processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Open,
    Claimed,
    Delivered,
    Approved,
    Paid,
    Disputed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Open => write!(f, "open"),
            JobStatus::Claimed => write!(f, "claimed"),
            JobStatus::Delivered => write!(f, "delivered"),
            JobStatus::Approved => write!(f, "approved"),
            JobStatus::Paid => write!(f, "paid"),
            JobStatus::Disputed => write!(f, "disputed"),
        }
    }
}

/// A unit of work posted to the marketplace, tracked through to payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Store-assigned id, injected when the record is read back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Currency-qualified amount string, e.g. "25 USDT".
    pub reward: String,
    pub poster: String,
    #[serde(default)]
    pub poster_address: Option<String>,
    #[serde(default)]
    pub worker: Option<String>,
    #[serde(default)]
    pub worker_address: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub delivery_proof: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Settlement transaction reference; set only when status is `paid`.
    #[serde(default)]
    pub payment_tx: Option<String>,
    #[serde(default)]
    pub paid_by: Option<String>,
}

/// Input for posting a new job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJobRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub reward: String,
    pub poster: String,
    #[serde(default)]
    pub poster_address: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}

/// A requested change to a job. Only these fields may be written through the
/// general transition path; anything else a caller sends is simply not
/// representable here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_proof: Option<String>,
}

impl JobUpdate {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// A reward parsed once at the boundary into amount and currency symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Reward {
    pub amount: f64,
    pub currency: String,
}

impl Reward {
    /// Parse a reward string such as "25 USDT", "$7.50" or "5".
    ///
    /// Returns `None` unless a positive numeric amount is extractable. A
    /// missing currency symbol defaults to USDT, the marketplace's settlement
    /// asset.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let start = trimmed.find(|c: char| c.is_ascii_digit())?;
        let numeric = &trimmed[start..];
        let end = numeric
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(numeric.len());

        let amount: f64 = numeric[..end].parse().ok()?;
        if amount <= 0.0 {
            return None;
        }

        let currency = numeric[end..]
            .split_whitespace()
            .next()
            .map(|s| s.to_uppercase())
            .unwrap_or_else(|| "USDT".to_string());

        Some(Self { amount, currency })
    }
}

impl std::fmt::Display for Reward {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(JobStatus::Open).unwrap(), "open");
        assert_eq!(serde_json::to_value(JobStatus::Paid).unwrap(), "paid");
        assert_eq!(
            serde_json::from_value::<JobStatus>("delivered".into()).unwrap(),
            JobStatus::Delivered
        );
    }

    #[test]
    fn status_display() {
        assert_eq!(JobStatus::Claimed.to_string(), "claimed");
        assert_eq!(JobStatus::Disputed.to_string(), "disputed");
    }

    #[test]
    fn reward_parses_amount_and_currency() {
        let reward = Reward::parse("25 USDT").unwrap();
        assert_eq!(reward.amount, 25.0);
        assert_eq!(reward.currency, "USDT");
    }

    #[test]
    fn reward_parses_dollar_prefix() {
        let reward = Reward::parse("$7.50").unwrap();
        assert_eq!(reward.amount, 7.5);
        assert_eq!(reward.currency, "USDT");
    }

    #[test]
    fn reward_defaults_currency() {
        let reward = Reward::parse("5").unwrap();
        assert_eq!(reward.amount, 5.0);
        assert_eq!(reward.currency, "USDT");
    }

    #[test]
    fn reward_rejects_missing_or_nonpositive_amounts() {
        assert!(Reward::parse("free hugs").is_none());
        assert!(Reward::parse("").is_none());
        assert!(Reward::parse("0 USDT").is_none());
    }

    #[test]
    fn reward_display() {
        assert_eq!(Reward::parse("5 usdt").unwrap().to_string(), "5 USDT");
        assert_eq!(Reward::parse("7.5 USDT").unwrap().to_string(), "7.5 USDT");
    }

    #[test]
    fn job_update_whitelist_has_no_title_field() {
        // Serializing an update never produces fields outside the whitelist.
        let update = JobUpdate {
            status: Some(JobStatus::Claimed),
            worker: Some("@alice".into()),
            worker_address: None,
            delivery_proof: None,
        };
        let value = serde_json::to_value(&update).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["status", "worker"]);
    }

    #[test]
    fn job_serialization_roundtrip() {
        let now = Utc::now();
        let job = Job {
            id: None,
            title: "Translate docs".into(),
            description: "English to Spanish".into(),
            reward: "10 USDT".into(),
            poster: "@bob".into(),
            poster_address: Some("0xabc".into()),
            worker: None,
            worker_address: None,
            status: JobStatus::Open,
            tags: vec!["translation".into()],
            source_url: None,
            delivery_proof: None,
            created_at: now,
            updated_at: now,
            payment_tx: None,
            paid_by: None,
        };

        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["status"], "open");
        assert_eq!(json["posterAddress"], "0xabc");

        let parsed: Job = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.title, "Translate docs");
        assert_eq!(parsed.status, JobStatus::Open);
        assert_eq!(parsed.created_at, now);
    }
}
