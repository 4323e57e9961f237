use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// A support ticket as seen at the store boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique identifier
    pub id: Uuid,

    /// Human-readable title
    pub title: String,

    /// Detailed description
    pub description: String,

    /// Current status
    pub status: TicketStatus,

    /// Customer email
    pub customer_email: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Category assigned by the AI pipeline
    pub ai_category: Option<String>,

    /// Confidence of the AI category
    pub ai_confidence: Option<f64>,

    /// Priority label assigned by the AI pipeline
    pub ai_priority: Option<String>,

    /// Confidence of the AI priority
    pub priority_confidence: Option<f64>,

    /// When the AI pipeline last analyzed this ticket
    pub last_ai_analysis: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Create a new open ticket
    pub fn new(title: String, description: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            status: TicketStatus::Open,
            customer_email: None,
            created_at: now,
            updated_at: now,
            ai_category: None,
            ai_confidence: None,
            ai_priority: None,
            priority_confidence: None,
            last_ai_analysis: None,
        }
    }

    /// True if this ticket still needs (re-)analysis: no AI category yet,
    /// or the last analysis is older than 24 hours.
    pub fn needs_analysis(&self, now: DateTime<Utc>) -> bool {
        if self.status != TicketStatus::Open {
            return false;
        }
        match (&self.ai_category, self.last_ai_analysis) {
            (None, _) | (_, None) => true,
            (Some(_), Some(analyzed_at)) => now - analyzed_at > chrono::Duration::hours(24),
        }
    }
}

/// Ticket status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

/// AI analysis outcome pushed back into the ticket store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiAnnotation {
    /// Predicted category
    pub category: String,

    /// Confidence of the predicted category
    pub confidence: f64,

    /// Derived priority label
    pub priority: String,

    /// Confidence of the priority label
    pub priority_confidence: f64,

    /// Analysis timestamp
    pub analyzed_at: DateTime<Utc>,
}
