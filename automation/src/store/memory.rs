//! In-memory collaborator implementations.
//!
//! Reference implementations used by the integration tests; embedders can
//! also use them as fakes. Each store serializes access through a single
//! RwLock, which satisfies the per-document atomicity the engine expects.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use triage_shared::{Ticket, User};

use super::{ExecutionRecord, Notifier, OutboundMessage, RuleStore, TicketStore};
use crate::error::StoreError;
use crate::rules::{AutomationRule, RuleFilter};

#[derive(Default, Clone)]
pub struct InMemoryTicketStore {
    tickets: Arc<RwLock<HashMap<Uuid, Ticket>>>,
}

impl InMemoryTicketStore {
    pub async fn insert(&self, ticket: Ticket) {
        self.tickets.write().await.insert(ticket.id, ticket);
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn get(&self, id: Uuid) -> Result<Ticket, StoreError> {
        self.tickets
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::TicketNotFound(id))
    }

    async fn save(&self, ticket: &Ticket) -> Result<(), StoreError> {
        self.tickets
            .write()
            .await
            .insert(ticket.id, ticket.clone());
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryRuleStore {
    rules: Arc<RwLock<HashMap<Uuid, AutomationRule>>>,
}

impl InMemoryRuleStore {
    pub async fn insert(&self, rule: AutomationRule) {
        self.rules.write().await.insert(rule.id, rule);
    }

    pub async fn snapshot(&self, id: Uuid) -> Option<AutomationRule> {
        self.rules.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn list_active(&self, filter: &RuleFilter) -> Result<Vec<AutomationRule>, StoreError> {
        let rules = self.rules.read().await;
        let mut matched: Vec<AutomationRule> = rules
            .values()
            .filter(|r| r.is_active && r.in_scope(filter.category, &filter.tags))
            .cloned()
            .collect();
        matched.sort_by_key(|r| r.execution_order);
        Ok(matched)
    }

    async fn get(&self, id: Uuid) -> Result<AutomationRule, StoreError> {
        self.rules
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::RuleNotFound(id))
    }

    async fn record_execution(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
        let mut rules = self.rules.write().await;
        let rule = rules
            .get_mut(&record.rule_id)
            .ok_or(StoreError::RuleNotFound(record.rule_id))?;
        rule.execution_count += 1;
        if record.succeeded {
            rule.stats.success_count += 1;
            rule.stats.last_executed = Some(record.executed_at);
        } else {
            rule.stats.failure_count += 1;
            rule.stats.last_error = record.error.clone();
        }
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryDirectory {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryDirectory {
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl super::Directory for InMemoryDirectory {
    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }
}

/// Records every message instead of delivering; optionally fails on
/// demand so tests can exercise the failure path.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    pub sent: Arc<RwLock<Vec<OutboundMessage>>>,
    pub fail_with: Arc<RwLock<Option<String>>>,
}

impl RecordingNotifier {
    pub async fn fail_next(&self, error: &str) {
        *self.fail_with.write().await = Some(error.to_string());
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.read().await.len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, message: &OutboundMessage) -> Result<(), String> {
        if let Some(error) = self.fail_with.write().await.take() {
            return Err(error);
        }
        self.sent.write().await.push(message.clone());
        Ok(())
    }
}
