// Automation rule model - definition, execution window, statistics

use chrono::{DateTime, FixedOffset, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actions::Action;
use crate::conditions::Condition;
use crate::triggers::Trigger;

/// Sentinel for "no execution ceiling".
pub const UNLIMITED_EXECUTIONS: i64 = -1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub trigger: Trigger,
    /// Top-level condition set, combined per `require_all_conditions`.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Applied in list order to one ticket per firing.
    pub actions: Vec<Action>,
    pub is_active: bool,
    /// Ascending evaluation order across rules.
    pub execution_order: i32,
    /// -1 = unlimited.
    pub max_executions: i64,
    /// Increments only on attempted executions, never on skips.
    pub execution_count: i64,
    /// Advisory; deferral is the external scheduler's job.
    pub delay_minutes: i32,
    #[serde(default)]
    pub time_window: Option<TimeWindow>,
    /// true = AND, false = OR over `conditions`.
    pub require_all_conditions: bool,
    pub stop_on_first_match: bool,
    /// Category scope; empty = all categories.
    #[serde(default)]
    pub categories: Vec<Uuid>,
    /// Tag scope; empty = all tags.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub stats: RuleStats,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl AutomationRule {
    pub fn new(name: &str, trigger: Trigger, actions: Vec<Action>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            trigger,
            conditions: Vec::new(),
            actions,
            is_active: true,
            execution_order: 0,
            max_executions: UNLIMITED_EXECUTIONS,
            execution_count: 0,
            delay_minutes: 0,
            time_window: None,
            require_all_conditions: true,
            stop_on_first_match: false,
            categories: Vec::new(),
            tags: Vec::new(),
            stats: RuleStats::default(),
            created_by: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Whether the execution-count ceiling still allows a firing.
    pub fn under_execution_ceiling(&self) -> bool {
        self.max_executions <= 0 || self.execution_count < self.max_executions
    }

    /// Whether this rule is in scope for a ticket's category and tags.
    /// Empty scope lists match everything.
    pub fn in_scope(&self, category: Option<Uuid>, tags: &[String]) -> bool {
        let category_ok = self.categories.is_empty()
            || category.is_some_and(|c| self.categories.contains(&c));
        let tags_ok =
            self.tags.is_empty() || self.tags.iter().any(|t| tags.iter().any(|x| x == t));
        category_ok && tags_ok
    }
}

/// Execution bookkeeping, mutated only through the rule store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleStats {
    pub success_count: i64,
    pub failure_count: i64,
    pub last_error: Option<String>,
    /// Advances only on successful executions.
    pub last_executed: Option<DateTime<Utc>>,
    /// For time_based triggers; advanced by the external scheduler.
    pub next_execution: Option<DateTime<Utc>>,
}

/// Daily HH:MM execution window in a fixed-offset timezone.
/// Half-open [start, end); an end before the start wraps past midnight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    /// "UTC" or a fixed offset like "+02:00" / "-05:30". Unparseable
    /// values fall back to UTC.
    pub timezone: String,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime, timezone: &str) -> Self {
        Self {
            start,
            end,
            timezone: timezone.to_string(),
        }
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let offset = parse_offset(&self.timezone);
        let local = now.with_timezone(&offset).time();
        if self.start <= self.end {
            local >= self.start && local < self.end
        } else {
            local >= self.start || local < self.end
        }
    }
}

fn parse_offset(timezone: &str) -> FixedOffset {
    let utc = FixedOffset::east_opt(0).expect("zero offset");
    if timezone.is_empty() || timezone.eq_ignore_ascii_case("utc") {
        return utc;
    }
    let (sign, rest) = match timezone.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return utc,
    };
    let mut parts = rest.splitn(2, ':');
    let hours: i32 = parts.next().and_then(|h| h.parse().ok()).unwrap_or(0);
    let minutes: i32 = parts.next().and_then(|m| m.parse().ok()).unwrap_or(0);
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).unwrap_or(utc)
}

/// "HH:MM" serde representation for window boundaries.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Scope filter handed to the rule store when loading candidates.
#[derive(Debug, Clone, Default)]
pub struct RuleFilter {
    pub category: Option<Uuid>,
    pub tags: Vec<String>,
}

impl RuleFilter {
    pub fn for_ticket(ticket: &triage_shared::Ticket) -> Self {
        Self {
            category: ticket.category_id,
            tags: ticket.tags.clone(),
        }
    }
}
