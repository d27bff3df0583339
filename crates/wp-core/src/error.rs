//! Error types for workflow dispatch.

use wp_client_api::ClientApiError;

/// Failure that ends a dispatch run.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("{0}")]
    Client(#[from] ClientApiError),

    #[error("Interrupt limit of {limit} reached at event {event_id}")]
    InterruptLimit { limit: usize, event_id: String },
}

impl DispatchError {
    /// Name of the failure class, as reported by the driver.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Client(inner) => inner.kind_name(),
            Self::InterruptLimit { .. } => "InterruptLimit",
        }
    }
}
