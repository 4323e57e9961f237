use crate::error::{AppError, Result};
use crate::models::{AiAnnotation, Ticket};
use crate::state::{TicketStore, ANALYSIS_FETCH_LIMIT};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory ticket store (for standalone deployments and testing)
#[derive(Clone)]
pub struct InMemoryTicketStore {
    tickets: Arc<DashMap<Uuid, Ticket>>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self {
            tickets: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryTicketStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn save_ticket(&self, ticket: &Ticket) -> Result<()> {
        self.tickets.insert(ticket.id, ticket.clone());
        tracing::debug!(ticket_id = %ticket.id, "Ticket saved");
        Ok(())
    }

    async fn get_ticket(&self, id: &Uuid) -> Result<Option<Ticket>> {
        Ok(self.tickets.get(id).map(|entry| entry.clone()))
    }

    async fn tickets_for_analysis(&self) -> Result<Vec<Ticket>> {
        let now = Utc::now();

        let mut pending: Vec<Ticket> = self
            .tickets
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|ticket| ticket.needs_analysis(now))
            .collect();

        // Oldest first
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        pending.truncate(ANALYSIS_FETCH_LIMIT);

        Ok(pending)
    }

    async fn record_analysis(&self, ticket_id: &Uuid, annotation: &AiAnnotation) -> Result<()> {
        let mut entry = self
            .tickets
            .get_mut(ticket_id)
            .ok_or_else(|| AppError::NotFound(format!("Ticket {} not found", ticket_id)))?;

        let ticket = entry.value_mut();
        ticket.ai_category = Some(annotation.category.clone());
        ticket.ai_confidence = Some(annotation.confidence);
        ticket.ai_priority = Some(annotation.priority.clone());
        ticket.priority_confidence = Some(annotation.priority_confidence);
        ticket.last_ai_analysis = Some(annotation.analyzed_at);
        ticket.updated_at = Utc::now();

        tracing::debug!(ticket_id = %ticket_id, category = %annotation.category, "AI analysis recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TicketStatus;

    fn open_ticket(title: &str, age_hours: i64) -> Ticket {
        let mut ticket = Ticket::new(title.to_string(), "description".to_string());
        ticket.created_at = Utc::now() - chrono::Duration::hours(age_hours);
        ticket
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let store = InMemoryTicketStore::new();
        let ticket = open_ticket("Login broken", 1);

        store.save_ticket(&ticket).await.unwrap();
        let fetched = store.get_ticket(&ticket.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Login broken");
    }

    #[tokio::test]
    async fn test_tickets_for_analysis_oldest_first() {
        let store = InMemoryTicketStore::new();
        let newer = open_ticket("newer", 1);
        let older = open_ticket("older", 5);
        store.save_ticket(&newer).await.unwrap();
        store.save_ticket(&older).await.unwrap();

        let pending = store.tickets_for_analysis().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].title, "older");
        assert_eq!(pending[1].title, "newer");
    }

    #[tokio::test]
    async fn test_analyzed_tickets_excluded() {
        let store = InMemoryTicketStore::new();

        let mut analyzed = open_ticket("analyzed", 2);
        analyzed.ai_category = Some("Billing".to_string());
        analyzed.last_ai_analysis = Some(Utc::now());
        store.save_ticket(&analyzed).await.unwrap();

        let mut closed = open_ticket("closed", 2);
        closed.status = TicketStatus::Closed;
        store.save_ticket(&closed).await.unwrap();

        store.save_ticket(&open_ticket("pending", 2)).await.unwrap();

        let pending = store.tickets_for_analysis().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].title, "pending");
    }

    #[tokio::test]
    async fn test_record_analysis_updates_ticket() {
        let store = InMemoryTicketStore::new();
        let ticket = open_ticket("Invoice question", 1);
        store.save_ticket(&ticket).await.unwrap();

        let annotation = AiAnnotation {
            category: "Billing".to_string(),
            confidence: 0.91,
            priority: "Normal".to_string(),
            priority_confidence: 0.91,
            analyzed_at: Utc::now(),
        };
        store.record_analysis(&ticket.id, &annotation).await.unwrap();

        let updated = store.get_ticket(&ticket.id).await.unwrap().unwrap();
        assert_eq!(updated.ai_category.as_deref(), Some("Billing"));
        assert_eq!(updated.ai_confidence, Some(0.91));
        assert!(updated.last_ai_analysis.is_some());
    }

    #[tokio::test]
    async fn test_record_analysis_unknown_ticket() {
        let store = InMemoryTicketStore::new();
        let annotation = AiAnnotation {
            category: "Billing".to_string(),
            confidence: 0.5,
            priority: "Normal".to_string(),
            priority_confidence: 0.5,
            analyzed_at: Utc::now(),
        };

        let err = store
            .record_analysis(&Uuid::new_v4(), &annotation)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
