use crate::error::Result;
use crate::ml::analyzer::TicketAnalyzer;
use crate::models::{AnalysisRequest, AnalysisResult, BatchItemError, BatchRequest, BatchResult};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Fans a batch out to the single-item analyzer with bounded parallelism.
///
/// Items are tagged with their input index and reassembled in order after
/// the fan-out, so the result sequence matches the request sequence no
/// matter which items finish first. One item's failure never aborts the
/// batch; it becomes an error row instead.
pub struct BatchAnalyzer {
    analyzer: Arc<TicketAnalyzer>,
    max_concurrency: usize,
}

impl BatchAnalyzer {
    pub fn new(analyzer: Arc<TicketAnalyzer>, max_concurrency: usize) -> Self {
        Self {
            analyzer,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Analyze a batch of tickets
    pub async fn analyze_batch(&self, request: BatchRequest) -> BatchResult {
        let started_at = Utc::now();
        let start = Instant::now();

        let limit = request.tickets.len().min(request.max_batch_size);
        let mut items: Vec<(usize, AnalysisRequest)> = request
            .tickets
            .into_iter()
            .take(limit)
            .enumerate()
            .collect();

        // Urgency only changes scheduling order; output order stays input
        // order via the index tags.
        if request.prioritize_by_urgency {
            items.sort_by_key(|(_, ticket)| !looks_urgent(&ticket.title));
        }

        let outcomes: Vec<(usize, Uuid, Result<AnalysisResult>)> = stream::iter(items)
            .map(|(index, ticket)| {
                let analyzer = Arc::clone(&self.analyzer);
                async move {
                    let ticket_id = ticket.ticket_id;
                    let outcome = analyzer.analyze(&ticket).await;
                    (index, ticket_id, outcome)
                }
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        // Reassemble in input order
        let mut ordered: Vec<Option<(Uuid, Result<AnalysisResult>)>> =
            (0..limit).map(|_| None).collect();
        for (index, ticket_id, outcome) in outcomes {
            ordered[index] = Some((ticket_id, outcome));
        }

        let mut results = Vec::new();
        let mut errors = Vec::new();
        for entry in ordered.into_iter().flatten() {
            match entry {
                (_, Ok(result)) => results.push(result),
                (ticket_id, Err(e)) => {
                    warn!(ticket_id = %ticket_id, error = %e, "Batch item failed");
                    errors.push(BatchItemError {
                        ticket_id,
                        message: e.to_string(),
                    });
                }
            }
        }

        let finished_at = Utc::now();
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            total = limit,
            succeeded = results.len(),
            failed = errors.len(),
            duration_ms = duration_ms,
            "Batch analysis complete"
        );

        BatchResult {
            total_processed: limit,
            success_count: results.len(),
            failure_count: errors.len(),
            results,
            errors,
            started_at,
            finished_at,
            duration_ms,
        }
    }
}

fn looks_urgent(title: &str) -> bool {
    let title = title.to_lowercase();
    ["urgent", "critical", "emergency"]
        .iter()
        .any(|kw| title.contains(kw))
}
