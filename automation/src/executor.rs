// Action execution - applies one rule's actions to a ticket
//
// Each mutating action is followed by one ticket-store write, so external
// observers see the same persistence cadence as the surrounding service.
// A failing action aborts the rest of the rule's action list (fail-fast);
// the runner records that as the firing's failure.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use triage_shared::Ticket;

use crate::actions::{Action, ActionOutcome};
use crate::config::AutomationConfig;
use crate::error::ActionError;
use crate::sla;
use crate::store::{Directory, MessageChannel, Notifier, OutboundMessage, Recipient, TicketStore};
use crate::template;
use crate::triggers::EventContext;

pub struct ActionExecutor {
    tickets: Arc<dyn TicketStore>,
    notifier: Arc<dyn Notifier>,
    directory: Arc<dyn Directory>,
    config: AutomationConfig,
}

impl ActionExecutor {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        notifier: Arc<dyn Notifier>,
        directory: Arc<dyn Directory>,
        config: AutomationConfig,
    ) -> Self {
        Self {
            tickets,
            notifier,
            directory,
            config,
        }
    }

    /// Applies every action in list order, stopping at the first failure.
    /// Returns the outcomes of the actions that ran.
    pub async fn apply_all(
        &self,
        actions: &[Action],
        ticket: &mut Ticket,
        context: &EventContext,
        snapshot: &serde_json::Value,
    ) -> Result<Vec<ActionOutcome>, ActionError> {
        let mut outcomes = Vec::with_capacity(actions.len());
        for action in actions {
            debug!(action = action.kind(), ticket = %ticket.id, "Applying action");
            outcomes.push(self.apply(action, ticket, context, snapshot).await?);
        }
        Ok(outcomes)
    }

    /// Applies a single action, mutating the ticket in place and
    /// persisting it. Missing optional parameters are successful no-ops.
    pub async fn apply(
        &self,
        action: &Action,
        ticket: &mut Ticket,
        context: &EventContext,
        snapshot: &serde_json::Value,
    ) -> Result<ActionOutcome, ActionError> {
        match action {
            Action::AssignTicket { assign_to } => {
                let Some(user_id) = assign_to else {
                    return Ok(ActionOutcome::Noop);
                };
                self.validate_assignee(*user_id).await?;
                ticket.assigned_to = Some(*user_id);
                ticket.updated_at = Some(Utc::now());
                self.tickets.save(ticket).await?;
                Ok(ActionOutcome::Assigned(*user_id))
            }

            Action::ChangeStatus { status } => {
                let Some(status) = status else {
                    return Ok(ActionOutcome::Noop);
                };
                ticket.set_status(*status);
                self.tickets.save(ticket).await?;
                Ok(ActionOutcome::StatusChanged(*status))
            }

            Action::ChangePriority { priority } => {
                let Some(priority) = priority else {
                    return Ok(ActionOutcome::Noop);
                };
                ticket.priority = *priority;
                // Deadlines stay anchored to the creation time.
                ticket.sla = Some(sla::compute_deadlines(
                    *priority,
                    ticket.category_id,
                    ticket.created_at,
                    &self.config.sla,
                ));
                ticket.updated_at = Some(Utc::now());
                self.tickets.save(ticket).await?;
                Ok(ActionOutcome::PriorityChanged(*priority))
            }

            Action::AddTag { tag } => {
                let added = ticket.add_tag(tag);
                ticket.updated_at = Some(Utc::now());
                self.tickets.save(ticket).await?;
                Ok(ActionOutcome::TagAdded {
                    tag: tag.clone(),
                    added,
                })
            }

            Action::RemoveTag { tag } => {
                ticket.remove_tag(tag);
                ticket.updated_at = Some(Utc::now());
                self.tickets.save(ticket).await?;
                Ok(ActionOutcome::TagRemoved { tag: tag.clone() })
            }

            Action::EscalateTicket => {
                ticket.escalated = true;
                ticket.escalated_at = Some(Utc::now());
                ticket.escalated_by = context.user_id;
                ticket.updated_at = Some(Utc::now());
                self.tickets.save(ticket).await?;
                Ok(ActionOutcome::Escalated)
            }

            Action::AddComment { comment } => {
                let author = context.user_id.or(ticket.assigned_to);
                let body = template::render(comment, snapshot);
                let comment_id = ticket.push_comment(author, &body, true, true);
                ticket.updated_at = Some(Utc::now());
                self.tickets.save(ticket).await?;
                Ok(ActionOutcome::CommentAdded(comment_id))
            }

            Action::UpdateCustomField { name, value } => {
                ticket.upsert_custom_field(name, value.clone());
                ticket.updated_at = Some(Utc::now());
                self.tickets.save(ticket).await?;
                Ok(ActionOutcome::CustomFieldSet { name: name.clone() })
            }

            Action::SendEmail { to, subject, body } => {
                let Some(address) = self.resolve_email(to.as_deref(), ticket).await else {
                    warn!(ticket = %ticket.id, "send_email with no resolvable recipient");
                    return Ok(ActionOutcome::Noop);
                };
                let message = OutboundMessage {
                    channel: MessageChannel::Email,
                    recipient: Recipient::Address(address.clone()),
                    subject: template::render(subject, snapshot),
                    body: template::render(body, snapshot),
                    ticket_id: ticket.id,
                };
                self.notifier
                    .deliver(&message)
                    .await
                    .map_err(ActionError::Delivery)?;
                Ok(ActionOutcome::EmailQueued { to: address })
            }

            Action::SendNotification {
                recipient,
                title,
                message,
            } => {
                let Some(user_id) = recipient.or(ticket.assigned_to) else {
                    warn!(ticket = %ticket.id, "send_notification with no resolvable recipient");
                    return Ok(ActionOutcome::Noop);
                };
                let message = OutboundMessage {
                    channel: MessageChannel::Notification,
                    recipient: Recipient::UserId(user_id),
                    subject: template::render(title, snapshot),
                    body: template::render(message, snapshot),
                    ticket_id: ticket.id,
                };
                self.notifier
                    .deliver(&message)
                    .await
                    .map_err(ActionError::Delivery)?;
                Ok(ActionOutcome::NotificationQueued { recipient: user_id })
            }
        }
    }

    async fn validate_assignee(&self, user_id: Uuid) -> Result<(), ActionError> {
        match self.directory.user(user_id).await? {
            Some(user) if user.can_be_assignee() => Ok(()),
            _ => Err(ActionError::InvalidAssignee(user_id)),
        }
    }

    async fn resolve_email(&self, explicit: Option<&str>, ticket: &Ticket) -> Option<String> {
        if let Some(address) = explicit {
            return Some(address.to_string());
        }
        let assignee = ticket.assigned_to?;
        match self.directory.user(assignee).await {
            Ok(Some(user)) => Some(user.email),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{InMemoryDirectory, InMemoryTicketStore, RecordingNotifier};
    use crate::triggers::EventAction;
    use serde_json::json;
    use triage_shared::{TicketPriority, TicketStatus, User, UserRole};

    struct Fixture {
        executor: ActionExecutor,
        tickets: InMemoryTicketStore,
        directory: InMemoryDirectory,
        notifier: RecordingNotifier,
    }

    fn fixture() -> Fixture {
        let tickets = InMemoryTicketStore::default();
        let directory = InMemoryDirectory::default();
        let notifier = RecordingNotifier::default();
        let executor = ActionExecutor::new(
            Arc::new(tickets.clone()),
            Arc::new(notifier.clone()),
            Arc::new(directory.clone()),
            AutomationConfig::default(),
        );
        Fixture {
            executor,
            tickets,
            directory,
            notifier,
        }
    }

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            display_name: "Sam".into(),
            email: "sam@example.com".into(),
            role,
            is_active: true,
        }
    }

    async fn seeded_ticket(f: &Fixture) -> Ticket {
        let ticket = Ticket::new("subject", "body", TicketPriority::Medium, Uuid::new_v4());
        f.tickets.insert(ticket.clone()).await;
        ticket
    }

    fn ctx() -> EventContext {
        EventContext::system(EventAction::TicketCreated)
    }

    #[tokio::test]
    async fn test_assign_requires_staff_role() {
        let f = fixture();
        let agent = user(UserRole::Agent);
        let requester = user(UserRole::EndUser);
        f.directory.insert(agent.clone()).await;
        f.directory.insert(requester.clone()).await;
        let mut ticket = seeded_ticket(&f).await;

        let outcome = f
            .executor
            .apply(&Action::assign_ticket(agent.id), &mut ticket, &ctx(), &json!({}))
            .await
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Assigned(agent.id));
        assert_eq!(ticket.assigned_to, Some(agent.id));

        let err = f
            .executor
            .apply(
                &Action::assign_ticket(requester.id),
                &mut ticket,
                &ctx(),
                &json!({}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidAssignee(id) if id == requester.id));
    }

    #[tokio::test]
    async fn test_assign_without_target_is_noop() {
        let f = fixture();
        let mut ticket = seeded_ticket(&f).await;
        let outcome = f
            .executor
            .apply(
                &Action::AssignTicket { assign_to: None },
                &mut ticket,
                &ctx(),
                &json!({}),
            )
            .await
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Noop);
        assert_eq!(ticket.assigned_to, None);
    }

    #[tokio::test]
    async fn test_priority_change_recomputes_sla() {
        let f = fixture();
        let mut ticket = seeded_ticket(&f).await;
        assert!(ticket.sla.is_none());

        f.executor
            .apply(
                &Action::change_priority(TicketPriority::Critical),
                &mut ticket,
                &ctx(),
                &json!({}),
            )
            .await
            .unwrap();

        let sla = ticket.sla.as_ref().unwrap();
        assert_eq!(
            sla.response_due_at - ticket.created_at,
            chrono::Duration::hours(1)
        );
        assert_eq!(
            sla.resolution_due_at - ticket.created_at,
            chrono::Duration::hours(4)
        );
    }

    #[tokio::test]
    async fn test_add_tag_twice_keeps_one_occurrence() {
        let f = fixture();
        let mut ticket = seeded_ticket(&f).await;
        let action = Action::add_tag("vip");
        f.executor
            .apply(&action, &mut ticket, &ctx(), &json!({}))
            .await
            .unwrap();
        let second = f
            .executor
            .apply(&action, &mut ticket, &ctx(), &json!({}))
            .await
            .unwrap();
        assert_eq!(
            second,
            ActionOutcome::TagAdded {
                tag: "vip".into(),
                added: false
            }
        );
        assert_eq!(ticket.tags, vec!["vip"]);
        // Persisted state matches.
        let stored = f.tickets.get(ticket.id).await.unwrap();
        assert_eq!(stored.tags, vec!["vip"]);
    }

    #[tokio::test]
    async fn test_remove_missing_tag_succeeds() {
        let f = fixture();
        let mut ticket = seeded_ticket(&f).await;
        let outcome = f
            .executor
            .apply(&Action::remove_tag("vip"), &mut ticket, &ctx(), &json!({}))
            .await
            .unwrap();
        assert_eq!(outcome, ActionOutcome::TagRemoved { tag: "vip".into() });
    }

    #[tokio::test]
    async fn test_comment_author_falls_back_to_assignee() {
        let f = fixture();
        let agent = user(UserRole::Agent);
        f.directory.insert(agent.clone()).await;
        let mut ticket = seeded_ticket(&f).await;
        ticket.assigned_to = Some(agent.id);

        let snapshot = json!({"subject": "Printer down"});
        f.executor
            .apply(
                &Action::add_comment("Auto-ack: {{subject}}"),
                &mut ticket,
                &EventContext::system(EventAction::TicketCreated),
                &snapshot,
            )
            .await
            .unwrap();

        let comment = ticket.comments.last().unwrap();
        assert_eq!(comment.author, Some(agent.id));
        assert_eq!(comment.body, "Auto-ack: Printer down");
        assert!(comment.internal);
        assert!(comment.via_automation);
    }

    #[tokio::test]
    async fn test_escalate_records_actor_and_time() {
        let f = fixture();
        let mut ticket = seeded_ticket(&f).await;
        let actor = Uuid::new_v4();
        f.executor
            .apply(
                &Action::EscalateTicket,
                &mut ticket,
                &EventContext::new(EventAction::TicketUpdated, Some(actor)),
                &json!({}),
            )
            .await
            .unwrap();
        assert!(ticket.escalated);
        assert_eq!(ticket.escalated_by, Some(actor));
        assert!(ticket.escalated_at.is_some());
    }

    #[tokio::test]
    async fn test_email_recipient_defaults_to_assignee() {
        let f = fixture();
        let agent = user(UserRole::Agent);
        f.directory.insert(agent.clone()).await;
        let mut ticket = seeded_ticket(&f).await;
        ticket.assigned_to = Some(agent.id);

        f.executor
            .apply(
                &Action::send_email(None, "SLA alert: {{subject}}", "check it"),
                &mut ticket,
                &ctx(),
                &json!({"subject": "Printer down"}),
            )
            .await
            .unwrap();

        let sent = f.notifier.sent.read().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, Recipient::Address("sam@example.com".into()));
        assert_eq!(sent[0].subject, "SLA alert: Printer down");
    }

    #[tokio::test]
    async fn test_delivery_failure_is_action_failure() {
        let f = fixture();
        let mut ticket = seeded_ticket(&f).await;
        f.notifier.fail_next("smtp down").await;

        let err = f
            .executor
            .apply(
                &Action::send_email(Some("ops@example.com".into()), "s", "b"),
                &mut ticket,
                &ctx(),
                &json!({}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Delivery(ref m) if m == "smtp down"));
    }

    #[tokio::test]
    async fn test_apply_all_is_fail_fast() {
        let f = fixture();
        let mut ticket = seeded_ticket(&f).await;
        f.notifier.fail_next("smtp down").await;

        let actions = vec![
            Action::add_tag("first"),
            Action::send_email(Some("ops@example.com".into()), "s", "b"),
            Action::add_tag("never"),
        ];
        let err = f
            .executor
            .apply_all(&actions, &mut ticket, &ctx(), &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Delivery(_)));
        assert!(ticket.tags.contains(&"first".to_string()));
        assert!(!ticket.tags.contains(&"never".to_string()));
    }

    #[tokio::test]
    async fn test_status_resolved_stamps_resolved_at_once() {
        let f = fixture();
        let mut ticket = seeded_ticket(&f).await;
        f.executor
            .apply(
                &Action::change_status(TicketStatus::Resolved),
                &mut ticket,
                &ctx(),
                &json!({}),
            )
            .await
            .unwrap();
        let stamped = ticket.resolved_at;
        assert!(stamped.is_some());

        f.executor
            .apply(
                &Action::change_status(TicketStatus::Open),
                &mut ticket,
                &ctx(),
                &json!({}),
            )
            .await
            .unwrap();
        assert_eq!(ticket.resolved_at, stamped);
    }
}
