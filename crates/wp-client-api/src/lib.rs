//! Client API trait for the workflow event dispatcher

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;
use wp_api_contract::*;

/// Failure reported by a [`WorkflowApi`] implementation
///
/// `kind` names the transport's own error class so the driver can report
/// it unchanged.
#[derive(Debug, Error)]
pub enum ClientApiError {
    /// The call could not be made or was rejected
    #[error("{message}")]
    Request { kind: &'static str, message: String },
    /// The event stream broke or carried an undecodable event
    #[error("{message}")]
    Stream { kind: &'static str, message: String },
    #[error("unexpected: {0}")]
    Unexpected(String),
}

impl ClientApiError {
    pub fn request(kind: &'static str, message: impl Into<String>) -> Self {
        Self::Request {
            kind,
            message: message.into(),
        }
    }

    pub fn stream(kind: &'static str, message: impl Into<String>) -> Self {
        Self::Stream {
            kind,
            message: message.into(),
        }
    }

    /// Name of the underlying error class, used when reporting failures
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Request { kind, .. } | Self::Stream { kind, .. } => kind,
            Self::Unexpected(_) => "Unexpected",
        }
    }
}

pub type ClientApiResult<T> = Result<T, ClientApiError>;

/// Forward-only sequence of events produced by one remote call
pub type WorkflowEventStream = BoxStream<'static, ClientApiResult<WorkflowEvent>>;

#[async_trait]
pub trait WorkflowApi: Send + Sync {
    /// Start a workflow run and stream its events
    async fn stream(
        &self,
        workflow_id: &str,
        parameters: &WorkflowParameters,
    ) -> ClientApiResult<WorkflowEventStream>;

    /// Continue a paused run and stream the continuation events
    async fn resume(
        &self,
        workflow_id: &str,
        event_id: &str,
        resume_data: &str,
        interrupt_type: i64,
    ) -> ClientApiResult<WorkflowEventStream>;
}
