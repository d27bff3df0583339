//! REST API client for the Coze workflow endpoints
//!
//! This crate provides the HTTP side of the workflow probe: bearer-token
//! authentication, the workspace listing used as a credential check, and
//! SSE streaming of workflow runs and resumes.

pub mod auth;
pub mod client;
pub mod error;
pub mod sse;

pub use auth::*;
pub use client::*;
pub use error::*;

use async_trait::async_trait;
use futures::StreamExt;
use wp_api_contract::*;
use wp_client_api::{ClientApiError, ClientApiResult, WorkflowApi, WorkflowEventStream};

impl From<RestClientError> for ClientApiError {
    fn from(err: RestClientError) -> Self {
        let kind = err.kind_name();
        match err {
            RestClientError::Sse(_) | RestClientError::Contract(_) => {
                ClientApiError::stream(kind, err.to_string())
            }
            _ => ClientApiError::request(kind, err.to_string()),
        }
    }
}

#[async_trait]
impl WorkflowApi for client::RestClient {
    async fn stream(
        &self,
        workflow_id: &str,
        parameters: &WorkflowParameters,
    ) -> ClientApiResult<WorkflowEventStream> {
        let request = StreamRunRequest {
            workflow_id: workflow_id.to_string(),
            parameters: parameters.clone(),
            bot_id: None,
            app_id: None,
        };
        let events = self.stream_run(&request).await?;
        Ok(events.map(|item| item.map_err(ClientApiError::from)).boxed())
    }

    async fn resume(
        &self,
        workflow_id: &str,
        event_id: &str,
        resume_data: &str,
        interrupt_type: i64,
    ) -> ClientApiResult<WorkflowEventStream> {
        let request = StreamResumeRequest {
            workflow_id: workflow_id.to_string(),
            event_id: event_id.to_string(),
            resume_data: resume_data.to_string(),
            interrupt_type,
        };
        let events = self.stream_resume(&request).await?;
        Ok(events.map(|item| item.map_err(ClientApiError::from)).boxed())
    }
}
