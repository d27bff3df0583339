//! Event and request types for the Coze workflow streaming endpoints

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ContractError;

/// Input parameters passed to a workflow run
pub type WorkflowParameters = serde_json::Map<String, serde_json::Value>;

/// Event kinds the streaming endpoints emit, by their SSE `event:` name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowEventKind {
    Message,
    Error,
    Interrupt,
    Done,
    Ping,
}

impl WorkflowEventKind {
    /// Resolve an SSE event name; `None` for kinds this client does not know
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "Message" => Some(Self::Message),
            "Error" => Some(Self::Error),
            "Interrupt" => Some(Self::Interrupt),
            "Done" => Some(Self::Done),
            "PING" => Some(Self::Ping),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "Message",
            Self::Error => "Error",
            Self::Interrupt => "Interrupt",
            Self::Done => "Done",
            Self::Ping => "PING",
        }
    }
}

/// Token accounting attached to a message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowUsage {
    #[serde(default)]
    pub input_count: i64,
    #[serde(default)]
    pub output_count: i64,
    #[serde(default)]
    pub token_count: i64,
}

/// Payload of a `Message` event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMessage {
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_seq_id: Option<String>,
    #[serde(default)]
    pub node_is_finish: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<HashMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<WorkflowUsage>,
}

impl WorkflowMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Payload of an `Error` event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowError {
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub error_message: String,
}

impl WorkflowError {
    pub fn new(error_code: i64, error_message: impl Into<String>) -> Self {
        Self {
            error_code,
            error_message: error_message.into(),
        }
    }
}

/// Identifies a paused workflow point; echoed back on resume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowInterruptData {
    pub event_id: String,
    #[serde(rename = "type")]
    pub interrupt_type: i64,
}

/// Payload of an `Interrupt` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowInterrupt {
    pub interrupt_data: WorkflowInterruptData,
    #[serde(default)]
    pub node_title: String,
}

impl WorkflowInterrupt {
    pub fn new(event_id: impl Into<String>, interrupt_type: i64) -> Self {
        Self {
            interrupt_data: WorkflowInterruptData {
                event_id: event_id.into(),
                interrupt_type,
            },
            node_title: String::new(),
        }
    }

    pub fn event_id(&self) -> &str {
        &self.interrupt_data.event_id
    }

    pub fn interrupt_type(&self) -> i64 {
        self.interrupt_data.interrupt_type
    }
}

/// A single event read from a workflow stream
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    Message(WorkflowMessage),
    Error(WorkflowError),
    Interrupt(WorkflowInterrupt),
    Done,
    /// Any event kind without a payload model, including keep-alive pings
    Other { kind: String },
}

impl WorkflowEvent {
    /// Build an event from one SSE frame's `event` name and `data` body
    pub fn from_frame(event: &str, data: &str) -> Result<Self, ContractError> {
        let decode_err = |source| ContractError::Payload {
            kind: event.to_string(),
            source,
        };

        match WorkflowEventKind::from_wire(event) {
            Some(WorkflowEventKind::Message) => {
                serde_json::from_str(data).map(Self::Message).map_err(decode_err)
            }
            Some(WorkflowEventKind::Error) => {
                serde_json::from_str(data).map(Self::Error).map_err(decode_err)
            }
            Some(WorkflowEventKind::Interrupt) => {
                serde_json::from_str(data).map(Self::Interrupt).map_err(decode_err)
            }
            Some(WorkflowEventKind::Done) => Ok(Self::Done),
            Some(WorkflowEventKind::Ping) | None => Ok(Self::Other {
                kind: event.to_string(),
            }),
        }
    }

    /// Wire name of this event's kind
    pub fn kind(&self) -> &str {
        match self {
            Self::Message(_) => WorkflowEventKind::Message.as_str(),
            Self::Error(_) => WorkflowEventKind::Error.as_str(),
            Self::Interrupt(_) => WorkflowEventKind::Interrupt.as_str(),
            Self::Done => WorkflowEventKind::Done.as_str(),
            Self::Other { kind } => kind,
        }
    }
}

/// One dispatched event, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ResultRecord {
    Message(WorkflowMessage),
    Error(WorkflowError),
    Interrupt(WorkflowInterrupt),
}

impl ResultRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Error(_) => "error",
            Self::Interrupt(_) => "interrupt",
        }
    }
}

/// Body of `POST /v1/workflow/stream_run`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRunRequest {
    pub workflow_id: String,
    #[serde(default)]
    pub parameters: WorkflowParameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
}

/// Body of `POST /v1/workflow/stream_resume`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamResumeRequest {
    pub workflow_id: String,
    pub event_id: String,
    pub resume_data: String,
    pub interrupt_type: i64,
}
