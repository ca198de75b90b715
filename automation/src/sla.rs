//! SLA deadline computation and breach detection.
//!
//! Deadlines derive from the priority hour tables (or a category override)
//! at ticket creation and are recomputed whenever an automation action
//! changes the priority. Breach detection is a pure query over the stored
//! deadlines; the dispatcher's sweep persists the flags.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use triage_shared::{SlaState, Ticket, TicketPriority};

use crate::config::SlaConfig;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlaStatus {
    OnTrack,
    ResponseBreached,
    ResolutionBreached,
}

impl SlaStatus {
    pub fn is_breached(&self) -> bool {
        !matches!(self, Self::OnTrack)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnTrack => "on_track",
            Self::ResponseBreached => "response_breached",
            Self::ResolutionBreached => "resolution_breached",
        }
    }
}

/// Computes a fresh SLA block for a ticket created (or re-prioritized) at
/// `created_at`. Breach flags start clear.
pub fn compute_deadlines(
    priority: TicketPriority,
    category: Option<Uuid>,
    created_at: DateTime<Utc>,
    config: &SlaConfig,
) -> SlaState {
    let response = config.response_hours_for(priority, category);
    let resolution = config.resolution_hours_for(priority, category);
    SlaState {
        response_due_at: created_at + Duration::hours(response),
        resolution_due_at: created_at + Duration::hours(resolution),
        response_breached: false,
        resolution_breached: false,
    }
}

/// Pure breach query. Response breach takes precedence; the resolution
/// clock stops once the ticket reaches a terminal status. Tickets with no
/// SLA block are always on track.
pub fn status(ticket: &Ticket, now: DateTime<Utc>) -> SlaStatus {
    let Some(sla) = &ticket.sla else {
        return SlaStatus::OnTrack;
    };
    if now > sla.response_due_at && ticket.first_response_at.is_none() {
        return SlaStatus::ResponseBreached;
    }
    if now > sla.resolution_due_at && !ticket.status.is_terminal() {
        return SlaStatus::ResolutionBreached;
    }
    SlaStatus::OnTrack
}

/// Writes the breach flags into the ticket's SLA block and returns the
/// current status. Flags only ever move from clear to set.
pub fn refresh(ticket: &mut Ticket, now: DateTime<Utc>) -> SlaStatus {
    let current = status(ticket, now);
    if let Some(sla) = &mut ticket.sla {
        match current {
            SlaStatus::ResponseBreached => sla.response_breached = true,
            SlaStatus::ResolutionBreached => sla.resolution_breached = true,
            SlaStatus::OnTrack => {}
        }
    }
    current
}
