// Triggers - events that make a rule eligible for evaluation

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conditions::Condition;

/// Event category a rule listens for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    TicketCreated,
    TicketUpdated,
    CommentAdded,
    StatusChanged,
    PriorityChanged,
    AssignedChanged,
    TimeBased,
    SlaBreached,
}

/// What actually happened, carried by the firing context. Event triggers
/// match exactly their own action; the synthetic manual/test actions match
/// no event trigger, so administrative runs still pass every gate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    TicketCreated,
    TicketUpdated,
    CommentAdded,
    StatusChanged,
    PriorityChanged,
    AssignedChanged,
    /// Scheduler SLA sweep.
    SlaBreached,
    /// Scheduler time_based sweep.
    TimeBased,
    ManualExecution,
    Test,
}

impl TriggerType {
    /// The event action an event-based trigger requires, if any.
    /// `TimeBased` and `SlaBreached` gate on state instead.
    pub fn required_action(&self) -> Option<EventAction> {
        match self {
            Self::TicketCreated => Some(EventAction::TicketCreated),
            Self::TicketUpdated => Some(EventAction::TicketUpdated),
            Self::CommentAdded => Some(EventAction::CommentAdded),
            Self::StatusChanged => Some(EventAction::StatusChanged),
            Self::PriorityChanged => Some(EventAction::PriorityChanged),
            Self::AssignedChanged => Some(EventAction::AssignedChanged),
            Self::TimeBased | Self::SlaBreached => None,
        }
    }
}

/// The firing context handed to the runner by the event dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventContext {
    pub action: EventAction,
    pub user_id: Option<Uuid>,
}

impl EventContext {
    pub fn new(action: EventAction, user_id: Option<Uuid>) -> Self {
        Self { action, user_id }
    }

    pub fn system(action: EventAction) -> Self {
        Self {
            action,
            user_id: None,
        }
    }

    pub fn manual(user_id: Uuid) -> Self {
        Self {
            action: EventAction::ManualExecution,
            user_id: Some(user_id),
        }
    }

    pub fn test(user_id: Option<Uuid>) -> Self {
        Self {
            action: EventAction::Test,
            user_id,
        }
    }
}

/// A rule's trigger: the event category plus trigger-scoped conditions
/// and an optional schedule expression (consumed by the external
/// scheduler, never by the engine).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub schedule: Option<String>,
}

impl Trigger {
    pub fn new(trigger_type: TriggerType) -> Self {
        Self {
            trigger_type,
            conditions: Vec::new(),
            schedule: None,
        }
    }

    pub fn with_conditions(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions = conditions;
        self
    }
}
