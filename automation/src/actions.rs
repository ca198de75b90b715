// Actions - mutations and side effects applied when a rule fires

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use triage_shared::{TicketPriority, TicketStatus};

/// One action in a rule's action list, parameters typed per variant.
///
/// Serialized with an explicit `type` tag so rule definitions keep the
/// `{type, parameters...}` wire shape; an unknown type is a rule-save
/// deserialization error, not a runtime no-op.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// No-op when `assign_to` is absent.
    AssignTicket {
        #[serde(default)]
        assign_to: Option<Uuid>,
    },
    /// No-op when `status` is absent.
    ChangeStatus {
        #[serde(default)]
        status: Option<TicketStatus>,
    },
    /// No-op when `priority` is absent; otherwise recomputes SLA deadlines.
    ChangePriority {
        #[serde(default)]
        priority: Option<TicketPriority>,
    },
    AddTag { tag: String },
    RemoveTag { tag: String },
    SendEmail {
        /// Explicit recipient address; defaults to the assignee's address.
        #[serde(default)]
        to: Option<String>,
        subject: String,
        body: String,
    },
    SendNotification {
        /// Explicit recipient; defaults to the assignee.
        #[serde(default)]
        recipient: Option<Uuid>,
        title: String,
        message: String,
    },
    EscalateTicket,
    AddComment { comment: String },
    UpdateCustomField {
        name: String,
        value: serde_json::Value,
    },
}

impl Action {
    pub fn assign_ticket(user_id: Uuid) -> Self {
        Self::AssignTicket {
            assign_to: Some(user_id),
        }
    }

    pub fn change_status(status: TicketStatus) -> Self {
        Self::ChangeStatus {
            status: Some(status),
        }
    }

    pub fn change_priority(priority: TicketPriority) -> Self {
        Self::ChangePriority {
            priority: Some(priority),
        }
    }

    pub fn add_tag(tag: &str) -> Self {
        Self::AddTag {
            tag: tag.to_string(),
        }
    }

    pub fn remove_tag(tag: &str) -> Self {
        Self::RemoveTag {
            tag: tag.to_string(),
        }
    }

    pub fn add_comment(comment: &str) -> Self {
        Self::AddComment {
            comment: comment.to_string(),
        }
    }

    pub fn send_email(to: Option<String>, subject: &str, body: &str) -> Self {
        Self::SendEmail {
            to,
            subject: subject.to_string(),
            body: body.to_string(),
        }
    }

    pub fn send_notification(recipient: Option<Uuid>, title: &str, message: &str) -> Self {
        Self::SendNotification {
            recipient,
            title: title.to_string(),
            message: message.to_string(),
        }
    }

    pub fn update_custom_field(name: &str, value: serde_json::Value) -> Self {
        Self::UpdateCustomField {
            name: name.to_string(),
            value,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::AssignTicket { .. } => "assign_ticket",
            Self::ChangeStatus { .. } => "change_status",
            Self::ChangePriority { .. } => "change_priority",
            Self::AddTag { .. } => "add_tag",
            Self::RemoveTag { .. } => "remove_tag",
            Self::SendEmail { .. } => "send_email",
            Self::SendNotification { .. } => "send_notification",
            Self::EscalateTicket => "escalate_ticket",
            Self::AddComment { .. } => "add_comment",
            Self::UpdateCustomField { .. } => "update_custom_field",
        }
    }
}

/// What a single applied action did to the ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    Assigned(Uuid),
    StatusChanged(TicketStatus),
    PriorityChanged(TicketPriority),
    TagAdded { tag: String, added: bool },
    TagRemoved { tag: String },
    EmailQueued { to: String },
    NotificationQueued { recipient: Uuid },
    Escalated,
    CommentAdded(Uuid),
    CustomFieldSet { name: String },
    /// Missing optional parameter or unresolvable recipient.
    Noop,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_wire_shape() {
        let action = Action::assign_ticket(Uuid::nil());
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["type"], "assign_ticket");
        assert_eq!(value["assign_to"], json!(Uuid::nil()));

        let parsed: Action =
            serde_json::from_value(json!({"type": "add_tag", "tag": "vip"})).unwrap();
        assert_eq!(parsed, Action::add_tag("vip"));
    }

    #[test]
    fn test_missing_optional_parameter_deserializes() {
        let parsed: Action = serde_json::from_value(json!({"type": "assign_ticket"})).unwrap();
        assert_eq!(parsed, Action::AssignTicket { assign_to: None });
    }

    #[test]
    fn test_unknown_action_type_rejected() {
        let raw = json!({"type": "reticulate_splines"});
        assert!(serde_json::from_value::<Action>(raw).is_err());
    }
}
