// Event dispatcher - the boundary the REST layer and scheduler call into

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AutomationError;
use crate::runner::{AutomationRunner, RunSummary};
use crate::sla::{self, SlaStatus};
use crate::store::TicketStore;
use crate::triggers::{EventAction, EventContext};

/// Entry points for ticket lifecycle events. The surrounding service
/// calls one of these after it has persisted the corresponding change;
/// the scheduler calls `sla_check` and `time_tick` periodically.
pub struct EventDispatcher {
    runner: Arc<AutomationRunner>,
    tickets: Arc<dyn TicketStore>,
}

impl EventDispatcher {
    pub fn new(runner: Arc<AutomationRunner>, tickets: Arc<dyn TicketStore>) -> Self {
        Self { runner, tickets }
    }

    pub async fn ticket_created(
        &self,
        ticket_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<RunSummary, AutomationError> {
        self.dispatch(ticket_id, EventAction::TicketCreated, user_id)
            .await
    }

    pub async fn ticket_updated(
        &self,
        ticket_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<RunSummary, AutomationError> {
        self.dispatch(ticket_id, EventAction::TicketUpdated, user_id)
            .await
    }

    pub async fn comment_added(
        &self,
        ticket_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<RunSummary, AutomationError> {
        self.dispatch(ticket_id, EventAction::CommentAdded, user_id)
            .await
    }

    pub async fn status_changed(
        &self,
        ticket_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<RunSummary, AutomationError> {
        self.dispatch(ticket_id, EventAction::StatusChanged, user_id)
            .await
    }

    pub async fn priority_changed(
        &self,
        ticket_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<RunSummary, AutomationError> {
        self.dispatch(ticket_id, EventAction::PriorityChanged, user_id)
            .await
    }

    pub async fn assignment_changed(
        &self,
        ticket_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<RunSummary, AutomationError> {
        self.dispatch(ticket_id, EventAction::AssignedChanged, user_id)
            .await
    }

    /// Scheduler sweep for SLA breaches: refreshes the ticket's breach
    /// flags, persists them, and dispatches a run when breached so
    /// sla_breached rules can fire. On-track tickets cause no run.
    pub async fn sla_check(&self, ticket_id: Uuid) -> Result<Option<RunSummary>, AutomationError> {
        let mut ticket = self.tickets.get(ticket_id).await?;
        let status = sla::refresh(&mut ticket, Utc::now());
        if status == SlaStatus::OnTrack {
            debug!(ticket = %ticket_id, "SLA on track");
            return Ok(None);
        }
        self.tickets.save(&ticket).await?;
        info!(ticket = %ticket_id, status = status.as_str(), "SLA breach detected");
        let summary = self
            .dispatch(ticket_id, EventAction::SlaBreached, None)
            .await?;
        Ok(Some(summary))
    }

    /// Scheduler sweep for time_based rules. The engine only gates on the
    /// stored `next_execution`; advancing the schedule is the scheduler's
    /// responsibility.
    pub async fn time_tick(&self, ticket_id: Uuid) -> Result<RunSummary, AutomationError> {
        self.dispatch(ticket_id, EventAction::TimeBased, None)
            .await
    }

    async fn dispatch(
        &self,
        ticket_id: Uuid,
        action: EventAction,
        user_id: Option<Uuid>,
    ) -> Result<RunSummary, AutomationError> {
        let context = EventContext::new(action, user_id);
        self.runner.run(ticket_id, &context).await
    }
}
