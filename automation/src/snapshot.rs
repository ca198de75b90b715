//! Ticket snapshot construction.
//!
//! Conditions evaluate against a JSON view of the ticket. The whole
//! ticket is serialized first, so unknown field names fall back to a
//! direct property lookup (absent = no value); the logical names used by
//! rule authors are then overlaid, with user references resolved to a
//! display name when the directory knows them, else the raw identifier.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use triage_shared::Ticket;

use crate::sla;
use crate::store::Directory;

pub async fn build(ticket: &Ticket, directory: &dyn Directory, now: DateTime<Utc>) -> Value {
    let mut snapshot = serde_json::to_value(ticket).unwrap_or_else(|_| Value::Object(Default::default()));

    let assigned_to = resolve_user(ticket.assigned_to, directory).await;
    let created_by = resolve_user(Some(ticket.created_by), directory).await;

    if let Value::Object(map) = &mut snapshot {
        map.insert("status".into(), Value::String(ticket.status.as_str().into()));
        map.insert(
            "priority".into(),
            Value::String(ticket.priority.as_str().into()),
        );
        map.insert(
            "category".into(),
            ticket
                .category_id
                .map(|c| Value::String(c.to_string()))
                .unwrap_or(Value::Null),
        );
        map.insert("assigned_to".into(), assigned_to);
        map.insert("created_by".into(), created_by.clone());
        map.insert(
            "sla_status".into(),
            Value::String(sla::status(ticket, now).as_str().into()),
        );
        map.insert(
            "total_time_spent".into(),
            Value::from(ticket.total_minutes_spent),
        );
        map.insert(
            "comments_count".into(),
            Value::from(ticket.comments.len() as u64),
        );
    }

    snapshot
}

async fn resolve_user(id: Option<Uuid>, directory: &dyn Directory) -> Value {
    let Some(id) = id else {
        return Value::Null;
    };
    match directory.user(id).await {
        Ok(Some(user)) => Value::String(user.display_name),
        // Unknown user or lookup failure: fall back to the raw identifier.
        _ => Value::String(id.to_string()),
    }
}
