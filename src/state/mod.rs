pub mod memory;

pub use memory::InMemoryTicketStore;

use crate::error::Result;
use crate::models::{AiAnnotation, Ticket};
use async_trait::async_trait;
use uuid::Uuid;

/// Maximum tickets pulled per analysis sweep
pub const ANALYSIS_FETCH_LIMIT: usize = 100;

/// Ticket store collaboration boundary.
///
/// The full CRUD store lives elsewhere; the categorization service only
/// pulls analysis-pending tickets and pushes AI annotations back.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Persist a ticket
    async fn save_ticket(&self, ticket: &Ticket) -> Result<()>;

    /// Fetch a ticket by id
    async fn get_ticket(&self, id: &Uuid) -> Result<Option<Ticket>>;

    /// Up to [`ANALYSIS_FETCH_LIMIT`] open tickets whose AI category is
    /// unset or whose last analysis is older than 24 hours, oldest-created
    /// first
    async fn tickets_for_analysis(&self) -> Result<Vec<Ticket>>;

    /// Persist the AI analysis outcome for a ticket
    async fn record_analysis(&self, ticket_id: &Uuid, annotation: &AiAnnotation) -> Result<()>;
}
