use crate::error::{AppError, Result};
use crate::ml::features;
use crate::ml::lifecycle::ModelLifecycleManager;
use crate::models::{AnalysisRequest, AnalysisResult};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Keyword groups scanned for tag suggestions; one tag per matching group
const TAG_GROUPS: [(&[&str], &str); 4] = [
    (&["urgent", "critical", "emergency"], "urgent"),
    (&["bug", "error", "crash"], "bug"),
    (&["feature", "request", "enhancement"], "feature-request"),
    (&["billing", "payment", "invoice"], "billing"),
];

/// Maximum suggested tags per ticket
const MAX_TAGS: usize = 5;

/// Produces one analysis result per ticket from the two classifier slots
pub struct TicketAnalyzer {
    lifecycle: Arc<ModelLifecycleManager>,
}

impl TicketAnalyzer {
    pub fn new(lifecycle: Arc<ModelLifecycleManager>) -> Self {
        Self { lifecycle }
    }

    /// Analyze a single ticket.
    ///
    /// Rejects blank input before any model work and reports `ModelNotReady`
    /// while the classifiers are unbound; the caller can retry once
    /// training completes.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        if request.is_blank() {
            return Err(AppError::Validation(
                "at least one of title or description must be provided".to_string(),
            ));
        }

        if !self.lifecycle.is_ready() {
            return Err(AppError::ModelNotReady(
                "classifiers are not trained or loaded yet, retry later".to_string(),
            ));
        }

        // Snapshots: a concurrent hot swap does not affect this call
        let category_model = self.lifecycle.category_slot().snapshot().ok_or_else(|| {
            AppError::ModelNotReady("category classifier unbound".to_string())
        })?;
        let sub_category_model =
            self.lifecycle.sub_category_slot().snapshot().ok_or_else(|| {
                AppError::ModelNotReady("sub-category classifier unbound".to_string())
            })?;

        let record = features::from_request(request);

        // The sub-category model is trained independently and is not
        // conditioned on the predicted category at inference time.
        let (predicted_category, category_scores) = category_model.predict(&record);
        let (predicted_sub_category, sub_category_scores) = sub_category_model.predict(&record);

        let category_confidence = max_score(&category_scores);
        let sub_category_confidence = max_score(&sub_category_scores);

        let suggested_tags =
            suggest_tags(&request.title, &request.description, &predicted_category);

        debug!(
            ticket_id = %request.ticket_id,
            category = %predicted_category,
            confidence = category_confidence,
            "Ticket analyzed"
        );

        Ok(AnalysisResult {
            ticket_id: request.ticket_id,
            category_probabilities: distribution(category_model.labels(), &category_scores),
            sub_category_probabilities: distribution(
                sub_category_model.labels(),
                &sub_category_scores,
            ),
            predicted_category,
            category_confidence,
            predicted_sub_category,
            sub_category_confidence,
            suggested_tags,
            overall_confidence: (category_confidence + sub_category_confidence) / 2.0,
            model_version: category_model.version().to_string(),
            analysis_timestamp: Utc::now(),
        })
    }

    /// Category probability distribution for bare text.
    ///
    /// Empty map while the category classifier is unbound.
    pub fn category_probabilities(&self, text: &str) -> HashMap<String, f64> {
        match self.lifecycle.category_slot().snapshot() {
            Some(model) => {
                let (_, scores) = model.predict(&features::from_text(text, None));
                distribution(model.labels(), &scores)
            }
            None => HashMap::new(),
        }
    }

    /// Sub-category probability distribution for bare text with a category
    /// hint. Empty map while the sub-category classifier is unbound.
    pub fn sub_category_probabilities(&self, text: &str, category: &str) -> HashMap<String, f64> {
        match self.lifecycle.sub_category_slot().snapshot() {
            Some(model) => {
                let (_, scores) = model.predict(&features::from_text(text, Some(category)));
                distribution(model.labels(), &scores)
            }
            None => HashMap::new(),
        }
    }
}

/// Zip a model's carried label list with its score vector.
///
/// The labels travel with the artifact, so the mapping holds regardless of
/// how the external catalog is ordered.
fn distribution(labels: &[String], scores: &[f64]) -> HashMap<String, f64> {
    labels
        .iter()
        .zip(scores)
        .map(|(label, score)| (label.clone(), *score))
        .collect()
}

fn max_score(scores: &[f64]) -> f64 {
    scores.iter().cloned().fold(0.0, f64::max)
}

/// Suggest up to five tags: the lowercased category first, then one tag per
/// keyword group found in the text, deduplicated in first-seen order.
pub fn suggest_tags(title: &str, description: &str, category: &str) -> Vec<String> {
    let text = format!("{} {}", title, description).to_lowercase();

    let mut tags = vec![category.to_lowercase()];

    for (keywords, tag) in TAG_GROUPS {
        if keywords.iter().any(|kw| text.contains(kw)) {
            let tag = tag.to_string();
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }

    tags.truncate(MAX_TAGS);
    tags
}
