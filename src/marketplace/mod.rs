mod engine;
mod job;
mod users;

pub use engine::{JOBS_COLLECTION, LifecycleEngine};
pub use job::{Job, JobStatus, JobUpdate, NewJobRequest, Reward};
pub use users::{REPUTATION_PER_JOB, USERS_COLLECTION, UserDirectory, UserProfile};
