//! Typed errors for whole-operation misconfiguration.
//!
//! Per-instance outcomes are never errors — they travel as
//! [`crate::dispatch::CommandResult`] values. Only problems that make the
//! entire operation meaningless before any dispatch happens belong here.

use thiserror::Error;

/// Fatal misconfiguration detected before dispatch.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("No instances resolved. Provide --instances with ids or Name tags.")]
    NoInstances,

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}
