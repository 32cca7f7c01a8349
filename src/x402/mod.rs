pub mod client;
pub mod error;
pub mod networks;
pub mod types;

pub use client::{FacilitatorClient, Settlement};
pub use error::X402Error;
pub use types::{PaymentChallenge, PaymentEnvelope, PaymentRequirements, atomic_amount};
