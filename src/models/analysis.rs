use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Request to analyze a single support ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Ticket identifier
    pub ticket_id: Uuid,

    /// Ticket title
    #[serde(default)]
    pub title: String,

    /// Ticket description
    #[serde(default)]
    pub description: String,

    /// Customer email, if known
    pub customer_email: Option<String>,

    /// Category hint supplied by the caller
    pub category: Option<String>,

    /// Sub-category hint supplied by the caller
    pub sub_category: Option<String>,

    /// Ticket creation time
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Comma-separated tag references
    pub tags: Option<String>,

    /// Comma-separated attachment references
    pub attachments: Option<String>,
}

impl AnalysisRequest {
    /// Create a request from bare title/description text
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            ticket_id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            customer_email: None,
            category: None,
            sub_category: None,
            created_at: Utc::now(),
            tags: None,
            attachments: None,
        }
    }

    /// True when neither title nor description carries any text
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.description.trim().is_empty()
    }
}

/// Result of analyzing a single support ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Ticket identifier
    pub ticket_id: Uuid,

    /// Predicted top-level category
    pub predicted_category: String,

    /// Confidence for the predicted category (0.0 - 1.0)
    pub category_confidence: f64,

    /// Predicted sub-category
    pub predicted_sub_category: String,

    /// Confidence for the predicted sub-category (0.0 - 1.0)
    pub sub_category_confidence: f64,

    /// Suggested tags, first-seen order, at most five
    pub suggested_tags: Vec<String>,

    /// Mean of category and sub-category confidence
    pub overall_confidence: f64,

    /// Version tag of the models that produced this result
    pub model_version: String,

    /// When the analysis ran
    pub analysis_timestamp: DateTime<Utc>,

    /// Full category probability distribution
    pub category_probabilities: HashMap<String, f64>,

    /// Full sub-category probability distribution
    pub sub_category_probabilities: HashMap<String, f64>,
}

/// Request to analyze a batch of tickets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Tickets to analyze, in caller order
    pub tickets: Vec<AnalysisRequest>,

    /// Schedule urgent-looking tickets first
    #[serde(default = "default_prioritize")]
    pub prioritize_by_urgency: bool,

    /// Upper bound on tickets processed in one batch
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

impl BatchRequest {
    pub fn new(tickets: Vec<AnalysisRequest>) -> Self {
        Self {
            tickets,
            prioritize_by_urgency: default_prioritize(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

fn default_prioritize() -> bool {
    true
}

fn default_max_batch_size() -> usize {
    100
}

/// Per-item failure captured during batch processing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItemError {
    /// Ticket that failed
    pub ticket_id: Uuid,

    /// Failure description
    pub message: String,
}

/// Result of a batch analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    /// Successful analyses, in input order
    pub results: Vec<AnalysisResult>,

    /// Number of tickets taken into the batch
    pub total_processed: usize,

    /// Number of successful analyses
    pub success_count: usize,

    /// Number of failed analyses
    pub failure_count: usize,

    /// Per-item failures, in input order
    pub errors: Vec<BatchItemError>,

    /// Wall-clock start of the batch
    pub started_at: DateTime<Utc>,

    /// Wall-clock end of the batch
    pub finished_at: DateTime<Utc>,

    /// Batch duration in milliseconds
    pub duration_ms: u64,
}

/// Metadata snapshot for the currently bound models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Version tag of the current models
    pub model_version: String,

    /// When the models were last trained
    pub last_trained: Option<DateTime<Utc>>,

    /// Aggregate accuracy from the last training run
    pub accuracy: f64,

    /// Number of samples in the last training run
    pub training_sample_count: usize,

    /// Artifact directory
    pub model_path: String,

    /// Duration of the last training run in seconds
    pub training_secs: f64,

    /// Per-category accuracy from the last training run
    pub category_accuracies: HashMap<String, f64>,
}
