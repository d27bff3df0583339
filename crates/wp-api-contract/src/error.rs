//! Error types for event decoding

use thiserror::Error;

/// Errors that can occur while decoding streamed workflow events
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("Invalid {kind} event payload: {source}")]
    Payload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}
