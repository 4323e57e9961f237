//! Background worker bridging the ticket store and the analyzer: pulls
//! analysis-pending tickets, classifies them, and pushes the annotations
//! back.

use crate::error::Result;
use crate::ml::{ModelLifecycleManager, TicketAnalyzer};
use crate::models::{AiAnnotation, AnalysisRequest, Ticket};
use crate::state::TicketStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of one sync pass
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncOutcome {
    pub fetched: usize,
    pub analyzed: usize,
    pub failed: usize,
}

/// Periodically analyzes tickets that the store flags as pending
pub struct TicketSyncWorker {
    store: Arc<dyn TicketStore>,
    analyzer: Arc<TicketAnalyzer>,
    lifecycle: Arc<ModelLifecycleManager>,
    interval: Duration,
}

impl TicketSyncWorker {
    pub fn new(
        store: Arc<dyn TicketStore>,
        analyzer: Arc<TicketAnalyzer>,
        lifecycle: Arc<ModelLifecycleManager>,
        interval_secs: u64,
    ) -> Self {
        Self {
            store,
            analyzer,
            lifecycle,
            interval: Duration::from_secs(interval_secs.max(1)),
        }
    }

    /// Run the sync loop until the process shuts down
    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match self.run_once().await {
                Ok(outcome) if outcome.fetched > 0 => {
                    info!(
                        fetched = outcome.fetched,
                        analyzed = outcome.analyzed,
                        failed = outcome.failed,
                        "Ticket sync pass complete"
                    );
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Ticket sync pass failed"),
            }
        }
    }

    /// One pull-analyze-push pass
    pub async fn run_once(&self) -> Result<SyncOutcome> {
        if !self.lifecycle.is_ready() {
            debug!("Skipping ticket sync, classifiers not ready");
            return Ok(SyncOutcome::default());
        }

        let tickets = self.store.tickets_for_analysis().await?;
        let mut outcome = SyncOutcome {
            fetched: tickets.len(),
            ..Default::default()
        };

        for ticket in &tickets {
            match self.analyzer.analyze(&request_for(ticket)).await {
                Ok(result) => {
                    let annotation = AiAnnotation {
                        category: result.predicted_category.clone(),
                        confidence: result.category_confidence,
                        priority: priority_from_tags(&result.suggested_tags).to_string(),
                        priority_confidence: result.overall_confidence,
                        analyzed_at: result.analysis_timestamp,
                    };
                    match self.store.record_analysis(&ticket.id, &annotation).await {
                        Ok(()) => outcome.analyzed += 1,
                        Err(e) => {
                            warn!(ticket_id = %ticket.id, error = %e, "Could not record analysis");
                            outcome.failed += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!(ticket_id = %ticket.id, error = %e, "Ticket analysis failed");
                    outcome.failed += 1;
                }
            }
        }

        Ok(outcome)
    }
}

fn request_for(ticket: &Ticket) -> AnalysisRequest {
    AnalysisRequest {
        ticket_id: ticket.id,
        title: ticket.title.clone(),
        description: ticket.description.clone(),
        customer_email: ticket.customer_email.clone(),
        category: None,
        sub_category: None,
        created_at: ticket.created_at,
        tags: None,
        attachments: None,
    }
}

/// Derive a coarse priority label from the suggested tags
pub fn priority_from_tags(tags: &[String]) -> &'static str {
    if tags.iter().any(|t| t == "urgent") {
        "High"
    } else if tags.iter().any(|t| t == "bug") {
        "Medium"
    } else {
        "Normal"
    }
}
