//! Event dispatch over workflow streams.
//!
//! A run starts with one open stream. Every interrupt pushes its resume
//! continuation on top of the stream that produced it, and the top stream
//! is always drained first, so continuation records land directly after
//! the interrupt record that caused them.

use futures::StreamExt;
use tracing::{debug, info};
use wp_api_contract::{ResultRecord, WorkflowEvent, WorkflowInterrupt, WorkflowParameters};
use wp_client_api::{WorkflowApi, WorkflowEventStream};

use crate::error::DispatchError;
use crate::Result;

/// Resume payload sent when no other is configured.
pub const DEFAULT_RESUME_DATA: &str = "hey";

/// Settings for a dispatch run.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Payload sent with every resume call.
    pub resume_data: String,
    /// Upper bound on resume calls; `None` follows the service indefinitely.
    pub max_interrupts: Option<usize>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            resume_data: DEFAULT_RESUME_DATA.to_string(),
            max_interrupts: None,
        }
    }
}

/// Receives progress as records are produced.
pub trait EventObserver {
    fn on_record(&mut self, _record: &ResultRecord) {}

    fn on_resume(&mut self, _interrupt: &WorkflowInterrupt) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl EventObserver for NoopObserver {}

/// Drives one workflow through its streams and interrupts.
pub struct EventDispatcher<'a, C: WorkflowApi + ?Sized> {
    client: &'a C,
    workflow_id: String,
    config: DispatchConfig,
}

impl<'a, C: WorkflowApi + ?Sized> EventDispatcher<'a, C> {
    pub fn new(client: &'a C, workflow_id: impl Into<String>, config: DispatchConfig) -> Self {
        Self {
            client,
            workflow_id: workflow_id.into(),
            config,
        }
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Start the workflow and dispatch everything it emits.
    pub async fn run(&self, parameters: &WorkflowParameters) -> Result<Vec<ResultRecord>> {
        self.run_with(parameters, &mut NoopObserver).await
    }

    pub async fn run_with<O: EventObserver + ?Sized>(
        &self,
        parameters: &WorkflowParameters,
        observer: &mut O,
    ) -> Result<Vec<ResultRecord>> {
        info!("Starting workflow {}", self.workflow_id);
        let stream = self.client.stream(&self.workflow_id, parameters).await?;
        self.dispatch_with(stream, observer).await
    }

    /// Dispatch an already opened stream.
    pub async fn dispatch(&self, stream: WorkflowEventStream) -> Result<Vec<ResultRecord>> {
        self.dispatch_with(stream, &mut NoopObserver).await
    }

    pub async fn dispatch_with<O: EventObserver + ?Sized>(
        &self,
        stream: WorkflowEventStream,
        observer: &mut O,
    ) -> Result<Vec<ResultRecord>> {
        let mut pending = vec![stream];
        let mut records = Vec::new();
        let mut resumes = 0usize;

        while let Some(current) = pending.last_mut() {
            let Some(event) = current.next().await else {
                pending.pop();
                debug!("Stream exhausted, {} still open", pending.len());
                continue;
            };

            let record = match event? {
                WorkflowEvent::Message(message) => ResultRecord::Message(message),
                WorkflowEvent::Error(error) => ResultRecord::Error(error),
                WorkflowEvent::Interrupt(interrupt) => {
                    if let Some(limit) = self.config.max_interrupts {
                        if resumes >= limit {
                            return Err(DispatchError::InterruptLimit {
                                limit,
                                event_id: interrupt.event_id().to_string(),
                            });
                        }
                    }
                    resumes += 1;

                    let record = ResultRecord::Interrupt(interrupt.clone());
                    observer.on_record(&record);
                    records.push(record);

                    observer.on_resume(&interrupt);
                    info!(
                        "Resuming workflow {} at event {} (type {})",
                        self.workflow_id,
                        interrupt.event_id(),
                        interrupt.interrupt_type()
                    );
                    let continuation = self
                        .client
                        .resume(
                            &self.workflow_id,
                            interrupt.event_id(),
                            &self.config.resume_data,
                            interrupt.interrupt_type(),
                        )
                        .await?;
                    pending.push(continuation);
                    continue;
                }
                other => {
                    debug!("Ignoring {} event", other.kind());
                    continue;
                }
            };

            debug!("Dispatched {} record", record.kind());
            observer.on_record(&record);
            records.push(record);
        }

        info!(
            "Workflow {} finished with {} records after {} resumes",
            self.workflow_id,
            records.len(),
            resumes
        );
        Ok(records)
    }
}
