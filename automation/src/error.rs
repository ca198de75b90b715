//! Error taxonomy for the automation engine.
//!
//! The condition evaluator and rule matcher are total functions and never
//! error. Only action execution and collaborator calls can fail, and the
//! runner converts those failures into rule statistics rather than letting
//! them escape to the event caller.

use thiserror::Error;
use uuid::Uuid;

/// Failure talking to the external ticket or rule store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ticket {0} not found")]
    TicketNotFound(Uuid),

    #[error("automation rule {0} not found")]
    RuleNotFound(Uuid),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Failure while applying a single action to a ticket.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("user {0} cannot hold ticket assignments")]
    InvalidAssignee(Uuid),

    #[error("notification delivery failed: {0}")]
    Delivery(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Top-level engine error surfaced to the event dispatcher's caller.
///
/// A missing ticket is fatal for the firing; everything action-level is
/// absorbed into rule statistics before reaching this type.
#[derive(Debug, Error)]
pub enum AutomationError {
    #[error(transparent)]
    Store(#[from] StoreError),
}
