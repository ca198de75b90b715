use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ticket lifecycle status.
///
/// Snake_case is the canonical wire vocabulary. The legacy `in-progress`
/// spelling still appears in older exports and is accepted on input only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    #[serde(alias = "in-progress")]
    InProgress,
    Pending,
    OnHold,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Pending => "pending",
            Self::OnHold => "on_hold",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Terminal statuses stop the resolution SLA clock.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
    Critical,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    EndUser,
    Agent,
    Supervisor,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
}

impl User {
    /// Only staff roles may hold ticket assignments.
    pub fn can_be_assignee(&self) -> bool {
        self.is_active
            && matches!(
                self.role,
                UserRole::Agent | UserRole::Supervisor | UserRole::Admin
            )
    }
}

/// A ticket comment. Comments are ordered and append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    /// Absent for system-generated comments with no attributable author.
    pub author: Option<Uuid>,
    pub body: String,
    pub internal: bool,
    pub via_automation: bool,
    pub created_at: DateTime<Utc>,
}

/// Name-keyed custom field; names are unique per ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomField {
    pub name: String,
    pub value: serde_json::Value,
}

/// Per-ticket SLA tracking block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaState {
    pub response_due_at: DateTime<Utc>,
    pub resolution_due_at: DateTime<Utc>,
    pub response_breached: bool,
    pub resolution_breached: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub subject: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub category_id: Option<Uuid>,
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub tags: Vec<String>,
    pub comments: Vec<Comment>,
    pub custom_fields: Vec<CustomField>,
    pub sla: Option<SlaState>,
    pub escalated: bool,
    pub escalated_at: Option<DateTime<Utc>>,
    pub escalated_by: Option<Uuid>,
    pub total_minutes_spent: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub first_response_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Ticket {
    pub fn new(
        subject: impl Into<String>,
        description: impl Into<String>,
        priority: TicketPriority,
        created_by: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject: subject.into(),
            description: description.into(),
            status: TicketStatus::Open,
            priority,
            category_id: None,
            created_by,
            assigned_to: None,
            tags: Vec::new(),
            comments: Vec::new(),
            custom_fields: Vec::new(),
            sla: None,
            escalated: false,
            escalated_at: None,
            escalated_by: None,
            total_minutes_spent: 0,
            created_at: Utc::now(),
            updated_at: None,
            first_response_at: None,
            resolved_at: None,
            closed_at: None,
        }
    }

    /// Idempotent tag insert. Returns true if the tag was newly added.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        if self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Removes every occurrence of the tag. No-op if absent.
    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    /// Replaces the value of an existing custom field by name, or appends
    /// a new one. Field names stay unique.
    pub fn upsert_custom_field(&mut self, name: &str, value: serde_json::Value) {
        if let Some(field) = self.custom_fields.iter_mut().find(|f| f.name == name) {
            field.value = value;
        } else {
            self.custom_fields.push(CustomField {
                name: name.to_string(),
                value,
            });
        }
    }

    pub fn push_comment(
        &mut self,
        author: Option<Uuid>,
        body: &str,
        internal: bool,
        via_automation: bool,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.comments.push(Comment {
            id,
            author,
            body: body.to_string(),
            internal,
            via_automation,
            created_at: Utc::now(),
        });
        id
    }

    /// Applies a status change and stamps the lifecycle timestamps.
    /// `resolved_at`, once set, is never cleared.
    pub fn set_status(&mut self, status: TicketStatus) {
        self.status = status;
        let now = Utc::now();
        match status {
            TicketStatus::Resolved if self.resolved_at.is_none() => {
                self.resolved_at = Some(now);
            }
            TicketStatus::Closed if self.closed_at.is_none() => {
                self.closed_at = Some(now);
            }
            _ => {}
        }
        self.updated_at = Some(now);
    }
}
