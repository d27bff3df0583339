//! Workflow event dispatch for the workflow probe.
//!
//! Consumes the event streams produced by a [`WorkflowApi`] client, turns
//! each event into a [`ResultRecord`] and answers interrupts by resuming
//! the workflow and draining the continuation in place.

pub mod dispatcher;
pub mod error;

/// Result type used throughout dispatch.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Failure that ends a dispatch run.
pub use error::DispatchError;

/// Stream dispatch and its configuration.
pub use dispatcher::{
    DispatchConfig, EventDispatcher, EventObserver, NoopObserver, DEFAULT_RESUME_DATA,
};

pub use wp_api_contract::ResultRecord;
pub use wp_client_api::WorkflowApi;
