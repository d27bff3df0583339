//! Workflow probe API contract types
//!
//! This crate defines the streamed workflow event model and the request
//! bodies of the Coze workflow endpoints. These types are shared between
//! the dispatcher, the REST client and the scripted mock client.

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
