// Automation runner - orchestrates rule evaluation and execution
//
// Per firing: Idle -> Matching -> Executing -> {Succeeded | Failed}.
// Both outcomes are terminal and end in a statistics write; one rule's
// failure never blocks the next rule, and no action error escapes to the
// event caller.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::AutomationConfig;
use crate::error::AutomationError;
use crate::executor::ActionExecutor;
use crate::matcher::{self, MatchReport};
use crate::rules::{AutomationRule, RuleFilter};
use crate::snapshot;
use crate::store::{Directory, ExecutionRecord, Notifier, RuleStore, TicketStore};
use crate::triggers::EventContext;

/// Aggregate result of one event run across all candidate rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub rules_evaluated: usize,
    pub rules_fired: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub executed_rule_ids: Vec<Uuid>,
}

/// Result of an administrative "execute now" request for a single rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub report: MatchReport,
    /// Whether an execution was attempted (the gates all passed).
    pub attempted: bool,
    pub success: bool,
    pub error: Option<String>,
}

pub struct AutomationRunner {
    tickets: Arc<dyn TicketStore>,
    rules: Arc<dyn RuleStore>,
    directory: Arc<dyn Directory>,
    executor: ActionExecutor,
}

impl AutomationRunner {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        rules: Arc<dyn RuleStore>,
        directory: Arc<dyn Directory>,
        notifier: Arc<dyn Notifier>,
        config: AutomationConfig,
    ) -> Self {
        let executor = ActionExecutor::new(
            tickets.clone(),
            notifier,
            directory.clone(),
            config,
        );
        Self {
            tickets,
            rules,
            directory,
            executor,
        }
    }

    /// Runs every in-scope active rule against the ticket for one event.
    ///
    /// A missing ticket is fatal for the firing. A missing rule list means
    /// "no rules to evaluate". Action failures are absorbed into rule
    /// statistics.
    pub async fn run(
        &self,
        ticket_id: Uuid,
        context: &EventContext,
    ) -> Result<RunSummary, AutomationError> {
        let mut ticket = self.tickets.get(ticket_id).await?;

        let filter = RuleFilter::for_ticket(&ticket);
        let mut candidates = match self.rules.list_active(&filter).await {
            Ok(rules) => rules,
            Err(e) => {
                warn!("Failed to load automation rules: {}", e);
                Vec::new()
            }
        };
        candidates.sort_by_key(|r| r.execution_order);

        info!(
            ticket = %ticket_id,
            action = ?context.action,
            candidates = candidates.len(),
            "Processing automation event"
        );

        let mut summary = RunSummary::default();
        let mut view = snapshot::build(&ticket, self.directory.as_ref(), Utc::now()).await;

        for rule in &candidates {
            summary.rules_evaluated += 1;

            let report = matcher::evaluate(rule, &view, context, Utc::now());
            if !report.should_execute {
                debug!(rule = %rule.name, skip = ?report.skip, "Rule skipped");
                continue;
            }

            summary.rules_fired += 1;
            summary.executed_rule_ids.push(rule.id);

            let result = self
                .executor
                .apply_all(&rule.actions, &mut ticket, context, &view)
                .await;

            let record = match &result {
                Ok(_) => {
                    summary.succeeded += 1;
                    info!(rule = %rule.name, ticket = %ticket_id, "Rule executed successfully");
                    ExecutionRecord {
                        rule_id: rule.id,
                        succeeded: true,
                        error: None,
                        executed_at: Utc::now(),
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    error!(rule = %rule.name, ticket = %ticket_id, "Rule execution failed: {}", e);
                    ExecutionRecord {
                        rule_id: rule.id,
                        succeeded: false,
                        error: Some(e.to_string()),
                        executed_at: Utc::now(),
                    }
                }
            };

            if let Err(e) = self.rules.record_execution(&record).await {
                warn!(rule = %rule.name, "Failed to persist rule statistics: {}", e);
            }

            // A failed attempt still counts as this event's terminal rule
            // when stop_on_first_match is set.
            if rule.stop_on_first_match {
                debug!(rule = %rule.name, "Stopping at first match");
                break;
            }

            // Later rules observe earlier rules' mutations.
            view = snapshot::build(&ticket, self.directory.as_ref(), Utc::now()).await;
        }

        Ok(summary)
    }

    /// Dry run of one rule against a ticket: same five gates, no mutation,
    /// no statistics update.
    pub async fn test_rule(
        &self,
        rule: &AutomationRule,
        ticket_id: Uuid,
        context: &EventContext,
    ) -> Result<MatchReport, AutomationError> {
        let ticket = self.tickets.get(ticket_id).await?;
        let view = snapshot::build(&ticket, self.directory.as_ref(), Utc::now()).await;
        Ok(matcher::evaluate(rule, &view, context, Utc::now()))
    }

    /// Administrative "execute now". The same five gates apply; only the
    /// context's action is the synthetic manual value, so event triggers
    /// will not match but sla_breached/time_based rules can fire.
    pub async fn execute_rule(
        &self,
        rule_id: Uuid,
        ticket_id: Uuid,
        user_id: Uuid,
    ) -> Result<RuleOutcome, AutomationError> {
        let rule = self.rules.get(rule_id).await?;
        let mut ticket = self.tickets.get(ticket_id).await?;
        let context = EventContext::manual(user_id);

        let view = snapshot::build(&ticket, self.directory.as_ref(), Utc::now()).await;
        let report = matcher::evaluate(&rule, &view, &context, Utc::now());
        if !report.should_execute {
            return Ok(RuleOutcome {
                report,
                attempted: false,
                success: false,
                error: None,
            });
        }

        let result = self
            .executor
            .apply_all(&rule.actions, &mut ticket, &context, &view)
            .await;
        let (success, error) = match result {
            Ok(_) => (true, None),
            Err(e) => (false, Some(e.to_string())),
        };

        let record = ExecutionRecord {
            rule_id: rule.id,
            succeeded: success,
            error: error.clone(),
            executed_at: Utc::now(),
        };
        if let Err(e) = self.rules.record_execution(&record).await {
            warn!(rule = %rule.name, "Failed to persist rule statistics: {}", e);
        }

        Ok(RuleOutcome {
            report,
            attempted: true,
            success,
            error,
        })
    }
}
