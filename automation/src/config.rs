use std::collections::HashMap;
use std::env;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use triage_shared::TicketPriority;

/// SLA hour tables. The defaults are the platform-wide policy; categories
/// may override both tables (category override beats the priority table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaConfig {
    pub response_hours: HashMap<TicketPriority, i64>,
    pub resolution_hours: HashMap<TicketPriority, i64>,
    #[serde(default)]
    pub category_overrides: HashMap<Uuid, CategorySla>,
}

/// Per-category SLA override, configured by administrators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySla {
    pub response_hours: i64,
    pub resolution_hours: i64,
}

impl Default for SlaConfig {
    fn default() -> Self {
        let response_hours = HashMap::from([
            (TicketPriority::Critical, 1),
            (TicketPriority::Urgent, 2),
            (TicketPriority::High, 4),
            (TicketPriority::Medium, 8),
            (TicketPriority::Low, 24),
        ]);
        let resolution_hours = HashMap::from([
            (TicketPriority::Critical, 4),
            (TicketPriority::Urgent, 8),
            (TicketPriority::High, 24),
            (TicketPriority::Medium, 72),
            (TicketPriority::Low, 168),
        ]);
        Self {
            response_hours,
            resolution_hours,
            category_overrides: HashMap::new(),
        }
    }
}

impl SlaConfig {
    pub fn response_hours_for(&self, priority: TicketPriority, category: Option<Uuid>) -> i64 {
        if let Some(sla) = category.and_then(|c| self.category_overrides.get(&c)) {
            return sla.response_hours;
        }
        self.response_hours.get(&priority).copied().unwrap_or(24)
    }

    pub fn resolution_hours_for(&self, priority: TicketPriority, category: Option<Uuid>) -> i64 {
        if let Some(sla) = category.and_then(|c| self.category_overrides.get(&c)) {
            return sla.resolution_hours;
        }
        self.resolution_hours.get(&priority).copied().unwrap_or(168)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutomationConfig {
    #[serde(default)]
    pub sla: SlaConfig,
}

impl AutomationConfig {
    /// Loads the config, honoring a JSON override in `TRIAGE_SLA_CONFIG`.
    /// Unset or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        match env::var("TRIAGE_SLA_CONFIG") {
            Ok(raw) => match serde_json::from_str::<SlaConfig>(&raw) {
                Ok(sla) => Self { sla },
                Err(e) => {
                    tracing::warn!("Invalid TRIAGE_SLA_CONFIG, using defaults: {}", e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}
