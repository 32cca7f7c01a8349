use thiserror::Error;

/// Failures in the two-phase payment exchange with the facilitator.
///
/// The client performs no retries: whichever phase fails is reported upward
/// immediately and the job stays unpaid, so a caller can retry with a fresh
/// envelope.
#[derive(Debug, Error)]
pub enum X402Error {
    /// The facilitator rejected or failed the verify phase.
    #[error("payment verification failed: {reason}")]
    Verification { reason: String },

    /// Verification passed but settlement did not complete.
    #[error("payment settlement failed: {reason}")]
    Settlement { reason: String },

    /// Network-layer failure talking to the facilitator.
    #[error("facilitator network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_display() {
        let err = X402Error::Verification {
            reason: "signature expired".into(),
        };
        assert_eq!(
            err.to_string(),
            "payment verification failed: signature expired"
        );
    }

    #[test]
    fn settlement_display() {
        let err = X402Error::Settlement {
            reason: "insufficient allowance".into(),
        };
        assert_eq!(
            err.to_string(),
            "payment settlement failed: insufficient allowance"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<X402Error>();
    }
}
