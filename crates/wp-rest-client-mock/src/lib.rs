//! Mock workflow client backed by scripted scenarios

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::debug;
use wp_api_contract::*;
use wp_client_api::{ClientApiError, ClientApiResult, WorkflowApi, WorkflowEventStream};

/// One scripted stream item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Step {
    #[serde(rename_all = "camelCase")]
    Message {
        content: String,
        #[serde(default)]
        node_title: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Error {
        error_code: i64,
        error_message: String,
    },
    #[serde(rename_all = "camelCase")]
    Interrupt {
        event_id: String,
        interrupt_type: i64,
        #[serde(default)]
        node_title: String,
    },
    Done,
    Ping,
    Other {
        kind: String,
    },
    /// Ends the stream with a transport failure
    Fail {
        message: String,
    },
}

impl Step {
    pub fn message(content: impl Into<String>) -> Self {
        Self::Message {
            content: content.into(),
            node_title: None,
        }
    }

    pub fn error(error_code: i64, error_message: impl Into<String>) -> Self {
        Self::Error {
            error_code,
            error_message: error_message.into(),
        }
    }

    pub fn interrupt(event_id: impl Into<String>, interrupt_type: i64) -> Self {
        Self::Interrupt {
            event_id: event_id.into(),
            interrupt_type,
            node_title: String::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail {
            message: message.into(),
        }
    }

    fn into_event(self) -> ClientApiResult<WorkflowEvent> {
        match self {
            Step::Message {
                content,
                node_title,
            } => Ok(WorkflowEvent::Message(WorkflowMessage {
                node_title,
                ..WorkflowMessage::text(content)
            })),
            Step::Error {
                error_code,
                error_message,
            } => Ok(WorkflowEvent::Error(WorkflowError::new(error_code, error_message))),
            Step::Interrupt {
                event_id,
                interrupt_type,
                node_title,
            } => Ok(WorkflowEvent::Interrupt(WorkflowInterrupt {
                node_title,
                ..WorkflowInterrupt::new(event_id, interrupt_type)
            })),
            Step::Done => Ok(WorkflowEvent::Done),
            Step::Ping => Ok(WorkflowEvent::Other {
                kind: WorkflowEventKind::Ping.as_str().to_string(),
            }),
            Step::Other { kind } => Ok(WorkflowEvent::Other { kind }),
            Step::Fail { message } => Err(ClientApiError::stream("Stream", message)),
        }
    }
}

/// Initial stream plus the continuation served for each successive resume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub initial: Vec<Step>,
    #[serde(default)]
    pub resumes: Vec<Vec<Step>>,
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scenario: {0}")]
    Json(#[from] serde_json::Error),
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Arguments of one `resume` call, as seen by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeCall {
    pub workflow_id: String,
    pub event_id: String,
    pub resume_data: String,
    pub interrupt_type: i64,
}

pub struct ScriptedClient {
    scenario_name: String,
    initial: Vec<Step>,
    resumes: Mutex<VecDeque<Vec<Step>>>,
    stream_calls: Mutex<Vec<(String, WorkflowParameters)>>,
    resume_calls: Mutex<Vec<ResumeCall>>,
}

impl ScriptedClient {
    pub fn new(initial: Vec<Step>) -> Self {
        Self::from_scenario(Scenario {
            name: "inline".into(),
            initial,
            resumes: Vec::new(),
        })
    }

    pub fn from_scenario(scenario: Scenario) -> Self {
        Self {
            scenario_name: scenario.name,
            initial: scenario.initial,
            resumes: Mutex::new(scenario.resumes.into()),
            stream_calls: Mutex::new(Vec::new()),
            resume_calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue the continuation served by the next unanswered `resume`
    pub fn with_resume(self, steps: Vec<Step>) -> Self {
        lock(&self.resumes).push_back(steps);
        self
    }

    pub fn scenario_name(&self) -> &str {
        &self.scenario_name
    }

    pub fn stream_calls(&self) -> Vec<(String, WorkflowParameters)> {
        lock(&self.stream_calls).clone()
    }

    pub fn resume_calls(&self) -> Vec<ResumeCall> {
        lock(&self.resume_calls).clone()
    }

    fn into_stream(steps: Vec<Step>) -> WorkflowEventStream {
        stream::iter(steps.into_iter().map(Step::into_event)).boxed()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl WorkflowApi for ScriptedClient {
    async fn stream(
        &self,
        workflow_id: &str,
        parameters: &WorkflowParameters,
    ) -> ClientApiResult<WorkflowEventStream> {
        debug!(
            "scenario {}: serving initial stream for {}",
            self.scenario_name, workflow_id
        );
        lock(&self.stream_calls).push((workflow_id.to_string(), parameters.clone()));
        Ok(Self::into_stream(self.initial.clone()))
    }

    async fn resume(
        &self,
        workflow_id: &str,
        event_id: &str,
        resume_data: &str,
        interrupt_type: i64,
    ) -> ClientApiResult<WorkflowEventStream> {
        lock(&self.resume_calls).push(ResumeCall {
            workflow_id: workflow_id.to_string(),
            event_id: event_id.to_string(),
            resume_data: resume_data.to_string(),
            interrupt_type,
        });

        let steps = lock(&self.resumes).pop_front().ok_or_else(|| {
            ClientApiError::Unexpected(format!(
                "scenario {} has no continuation for event {}",
                self.scenario_name, event_id
            ))
        })?;
        debug!(
            "scenario {}: serving continuation for {}",
            self.scenario_name, event_id
        );
        Ok(Self::into_stream(steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[test]
    fn test_bundled_scenario_parses() {
        let scenario =
            Scenario::from_json(include_str!("../scenarios/interrupt_resume.json")).unwrap();

        assert_eq!(scenario.name, "interrupt_resume");
        assert_eq!(scenario.initial.len(), 3);
        assert_eq!(scenario.resumes.len(), 1);
        assert!(matches!(
            &scenario.initial[1],
            Step::Interrupt { interrupt_type: 2, node_title, .. } if node_title == "AskStudent"
        ));
        assert_eq!(scenario.resumes[0][1], Step::Ping);
    }

    #[tokio::test]
    async fn test_initial_stream_replays_steps() {
        let client = ScriptedClient::new(vec![Step::message("hi"), Step::Done]);
        let events: Vec<_> = client
            .stream("wf", &WorkflowParameters::new())
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[1], WorkflowEvent::Done);
        assert_eq!(client.stream_calls()[0].0, "wf");
    }

    #[tokio::test]
    async fn test_resume_without_script_fails() {
        let client = ScriptedClient::new(vec![]);
        let err = client.resume("wf", "e1", "hey", 1).await.err().unwrap();

        assert!(matches!(err, ClientApiError::Unexpected(_)));
        assert_eq!(client.resume_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_fail_step_yields_stream_error() {
        let client = ScriptedClient::new(vec![Step::fail("connection reset")]);
        let mut events = client.stream("wf", &WorkflowParameters::new()).await.unwrap();

        let first = events.next().await.unwrap();
        let err = first.unwrap_err();
        assert!(matches!(&err, ClientApiError::Stream { message, .. } if message == "connection reset"));
        assert_eq!(err.kind_name(), "Stream");
    }
}
