use thiserror::Error;

use crate::store::StoreError;
use crate::x402::X402Error;

/// Crate-wide error taxonomy.
///
/// Nothing here is retried automatically. State-machine violations mean the
/// caller must re-query current state before retrying; payment failures are
/// safe to retry with a fresh envelope because no state was mutated on that
/// path.
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("authorization error: {0}")]
    Authorization(String),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("terminal state: {0}")]
    TerminalState(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("payment verification failed: {0}")]
    PaymentVerification(String),

    #[error("payment settlement failed: {0}")]
    PaymentSettlement(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<X402Error> for MarketError {
    fn from(err: X402Error) -> Self {
        match err {
            X402Error::Verification { reason } => MarketError::PaymentVerification(reason),
            X402Error::Settlement { reason } => MarketError::PaymentSettlement(reason),
            X402Error::Network(e) => MarketError::Http(e),
        }
    }
}
