// Automation Rule Engine
//
// Event-driven rule engine for the Triage help-desk platform. Observes
// ticket lifecycle events and evaluates user-defined condition/action
// rules against the affected ticket, with SLA deadline tracking feeding
// the trigger side. Persistence, notification delivery, and user lookup
// are collaborator traits supplied by the surrounding service.

pub mod actions;
pub mod conditions;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod matcher;
pub mod rules;
pub mod runner;
pub mod sla;
pub mod snapshot;
pub mod store;
pub mod template;
pub mod triggers;

pub use actions::{Action, ActionOutcome};
pub use conditions::{Condition, ConditionOperator};
pub use config::{AutomationConfig, SlaConfig};
pub use dispatch::EventDispatcher;
pub use error::{ActionError, AutomationError, StoreError};
pub use executor::ActionExecutor;
pub use matcher::{MatchReport, SkipReason};
pub use rules::{AutomationRule, RuleFilter, RuleStats, TimeWindow};
pub use runner::{AutomationRunner, RuleOutcome, RunSummary};
pub use sla::SlaStatus;
pub use store::{
    Directory, ExecutionRecord, MessageChannel, Notifier, OutboundMessage, Recipient, RuleStore,
    TicketStore,
};
pub use triggers::{EventAction, EventContext, Trigger, TriggerType};
