// Rule matching - the pure decision phase of a firing
//
// Five gates, checked in order, all of which must pass: active flag,
// execution-count ceiling, time window, trigger match, condition set.
// No I/O happens here; execution and statistics are separate phases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conditions::Condition;
use crate::rules::AutomationRule;
use crate::sla::SlaStatus;
use crate::triggers::{EventContext, TriggerType};

/// Why a rule was skipped, for the administrative test endpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Inactive,
    ExecutionCeilingReached,
    OutsideTimeWindow,
    TriggerMismatch,
    ConditionsNotMet,
}

/// Outcome of the decision phase for one rule against one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub should_execute: bool,
    pub matches_trigger: bool,
    pub matches_conditions: bool,
    pub skip: Option<SkipReason>,
}

/// Evaluates the five gates. Pure except for reading `now`.
/// `snapshot` is the ticket view built by `snapshot::build`; it carries
/// the `sla_status` the breach trigger gates on.
pub fn evaluate(
    rule: &AutomationRule,
    snapshot: &serde_json::Value,
    context: &EventContext,
    now: DateTime<Utc>,
) -> MatchReport {
    let matches_trigger = trigger_matches(rule, snapshot, context, now);
    let matches_conditions = conditions_match(
        &rule.conditions,
        rule.require_all_conditions,
        snapshot,
    );

    let skip = if !rule.is_active {
        Some(SkipReason::Inactive)
    } else if !rule.under_execution_ceiling() {
        Some(SkipReason::ExecutionCeilingReached)
    } else if rule
        .time_window
        .as_ref()
        .is_some_and(|w| !w.contains(now))
    {
        Some(SkipReason::OutsideTimeWindow)
    } else if !matches_trigger {
        Some(SkipReason::TriggerMismatch)
    } else if !matches_conditions {
        Some(SkipReason::ConditionsNotMet)
    } else {
        None
    };

    MatchReport {
        should_execute: skip.is_none(),
        matches_trigger,
        matches_conditions,
        skip,
    }
}

pub fn should_fire(
    rule: &AutomationRule,
    snapshot: &serde_json::Value,
    context: &EventContext,
    now: DateTime<Utc>,
) -> bool {
    evaluate(rule, snapshot, context, now).should_execute
}

/// Trigger gate: event triggers require their exact event action;
/// sla_breached gates on the snapshot's SLA status; time_based gates on
/// the stored next_execution. Trigger-scoped conditions are ALL-semantics
/// refinements of the trigger itself.
fn trigger_matches(
    rule: &AutomationRule,
    snapshot: &serde_json::Value,
    context: &EventContext,
    now: DateTime<Utc>,
) -> bool {
    let trigger = &rule.trigger;
    let base = match trigger.trigger_type {
        TriggerType::SlaBreached => snapshot_sla_status(snapshot)
            .map(|s| s.is_breached())
            .unwrap_or(false),
        TriggerType::TimeBased => rule
            .stats
            .next_execution
            .map(|due| due <= now)
            .unwrap_or(true),
        _ => trigger.trigger_type.required_action() == Some(context.action),
    };
    base && conditions_match(&trigger.conditions, true, snapshot)
}

fn snapshot_sla_status(snapshot: &serde_json::Value) -> Option<SlaStatus> {
    snapshot
        .get("sla_status")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
}

/// Empty condition sets pass unconditionally.
fn conditions_match(
    conditions: &[Condition],
    require_all: bool,
    snapshot: &serde_json::Value,
) -> bool {
    if conditions.is_empty() {
        return true;
    }
    let check = |c: &Condition| c.matches(snapshot.get(&c.field));
    if require_all {
        conditions.iter().all(check)
    } else {
        conditions.iter().any(check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Action;
    use crate::rules::TimeWindow;
    use crate::triggers::{EventAction, Trigger};
    use chrono::{NaiveTime, TimeZone};
    use serde_json::json;

    fn rule_with_trigger(trigger_type: TriggerType) -> AutomationRule {
        AutomationRule::new(
            "test rule",
            Trigger::new(trigger_type),
            vec![Action::add_tag("touched")],
        )
    }

    fn created_context() -> EventContext {
        EventContext::system(EventAction::TicketCreated)
    }

    fn snapshot() -> serde_json::Value {
        json!({
            "priority": "urgent",
            "status": "open",
            "sla_status": "on_track",
        })
    }

    #[test]
    fn test_inactive_rule_never_fires() {
        let mut rule = rule_with_trigger(TriggerType::TicketCreated);
        rule.is_active = false;
        let report = evaluate(&rule, &snapshot(), &created_context(), Utc::now());
        assert!(!report.should_execute);
        assert_eq!(report.skip, Some(SkipReason::Inactive));
    }

    #[test]
    fn test_execution_ceiling_blocks_firing() {
        let mut rule = rule_with_trigger(TriggerType::TicketCreated);
        rule.max_executions = 3;
        rule.execution_count = 3;
        let report = evaluate(&rule, &snapshot(), &created_context(), Utc::now());
        assert_eq!(report.skip, Some(SkipReason::ExecutionCeilingReached));
    }

    #[test]
    fn test_time_window_gate() {
        let mut rule = rule_with_trigger(TriggerType::TicketCreated);
        rule.time_window = Some(TimeWindow::new(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            "UTC",
        ));
        let evening = Utc.with_ymd_and_hms(2025, 6, 2, 20, 0, 0).unwrap();
        let report = evaluate(&rule, &snapshot(), &created_context(), evening);
        assert_eq!(report.skip, Some(SkipReason::OutsideTimeWindow));

        let noon = Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0).unwrap();
        assert!(should_fire(&rule, &snapshot(), &created_context(), noon));
    }

    #[test]
    fn test_trigger_requires_exact_event_action() {
        let rule = rule_with_trigger(TriggerType::StatusChanged);
        let report = evaluate(&rule, &snapshot(), &created_context(), Utc::now());
        assert_eq!(report.skip, Some(SkipReason::TriggerMismatch));

        let context = EventContext::system(EventAction::StatusChanged);
        assert!(should_fire(&rule, &snapshot(), &context, Utc::now()));
    }

    #[test]
    fn test_manual_action_matches_no_event_trigger() {
        let rule = rule_with_trigger(TriggerType::TicketCreated);
        let context = EventContext::manual(uuid::Uuid::new_v4());
        assert!(!should_fire(&rule, &snapshot(), &context, Utc::now()));
    }

    #[test]
    fn test_sla_breached_trigger_gates_on_status() {
        let rule = rule_with_trigger(TriggerType::SlaBreached);
        let context = EventContext::system(EventAction::TicketUpdated);

        assert!(!should_fire(&rule, &snapshot(), &context, Utc::now()));

        let breached = json!({"sla_status": "response_breached"});
        assert!(should_fire(&rule, &breached, &context, Utc::now()));
        let breached = json!({"sla_status": "resolution_breached"});
        assert!(should_fire(&rule, &breached, &context, Utc::now()));
    }

    #[test]
    fn test_time_based_trigger_gates_on_next_execution() {
        let mut rule = rule_with_trigger(TriggerType::TimeBased);
        let context = EventContext::system(EventAction::TicketUpdated);
        let now = Utc::now();

        // Unset next_execution: due.
        assert!(should_fire(&rule, &snapshot(), &context, now));

        rule.stats.next_execution = Some(now + chrono::Duration::hours(1));
        assert!(!should_fire(&rule, &snapshot(), &context, now));

        rule.stats.next_execution = Some(now - chrono::Duration::hours(1));
        assert!(should_fire(&rule, &snapshot(), &context, now));
    }

    #[test]
    fn test_condition_combination_and_vs_or() {
        let mut rule = rule_with_trigger(TriggerType::TicketCreated);
        rule.conditions = vec![
            Condition::equals("priority", json!("urgent")), // true
            Condition::equals("status", json!("closed")),   // false
        ];

        rule.require_all_conditions = true;
        let report = evaluate(&rule, &snapshot(), &created_context(), Utc::now());
        assert!(!report.should_execute);
        assert_eq!(report.skip, Some(SkipReason::ConditionsNotMet));

        rule.require_all_conditions = false;
        assert!(should_fire(&rule, &snapshot(), &created_context(), Utc::now()));
    }

    #[test]
    fn test_empty_conditions_pass() {
        let rule = rule_with_trigger(TriggerType::TicketCreated);
        let report = evaluate(&rule, &snapshot(), &created_context(), Utc::now());
        assert!(report.should_execute);
        assert!(report.matches_trigger);
        assert!(report.matches_conditions);
    }

    #[test]
    fn test_trigger_scoped_conditions_are_all_semantics() {
        let mut rule = rule_with_trigger(TriggerType::TicketCreated);
        rule.trigger.conditions = vec![
            Condition::equals("priority", json!("urgent")),
            Condition::equals("status", json!("open")),
        ];
        assert!(should_fire(&rule, &snapshot(), &created_context(), Utc::now()));

        rule.trigger.conditions
            .push(Condition::equals("status", json!("closed")));
        let report = evaluate(&rule, &snapshot(), &created_context(), Utc::now());
        assert!(!report.matches_trigger);
    }
}
