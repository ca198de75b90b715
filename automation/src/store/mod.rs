// Collaborator seams - persistence, notification delivery, user lookup
//
// The engine never talks to a database or a mail transport directly; the
// surrounding service implements these traits. Stores must serialize
// concurrent updates to the same document (per-document locking or
// optimistic version checks) - the engine relies on that, it does not
// provide it.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use triage_shared::{Ticket, User};

use crate::error::StoreError;
use crate::rules::{AutomationRule, RuleFilter};

/// Ticket persistence. Must provide read-your-writes consistency within a
/// single firing.
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Ticket, StoreError>;
    async fn save(&self, ticket: &Ticket) -> Result<(), StoreError>;
}

/// One attempted rule execution, applied atomically by the store so
/// concurrent firings of the same rule never lose counter updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub rule_id: Uuid,
    pub succeeded: bool,
    pub error: Option<String>,
    pub executed_at: DateTime<Utc>,
}

/// Rule persistence. `list_active` returns active rules in ascending
/// `execution_order`, already narrowed to the filter's category/tags
/// scope (rules with an empty scope always match).
#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn list_active(&self, filter: &RuleFilter) -> Result<Vec<AutomationRule>, StoreError>;
    async fn get(&self, id: Uuid) -> Result<AutomationRule, StoreError>;
    async fn record_execution(&self, record: &ExecutionRecord) -> Result<(), StoreError>;
}

/// A constructed notification or email handed to the delivery collaborator.
/// Delivery failure is the sending action's failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub channel: MessageChannel,
    pub recipient: Recipient,
    pub subject: String,
    pub body: String,
    pub ticket_id: Uuid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageChannel {
    Email,
    Notification,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    Address(String),
    UserId(Uuid),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, message: &OutboundMessage) -> Result<(), String>;
}

/// Read-only user/role lookup, used for assignee validation and
/// display-name resolution in snapshots.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
}
