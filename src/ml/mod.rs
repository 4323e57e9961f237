//! Classification pipeline: feature construction, dual-model inference,
//! model lifecycle, and batch orchestration.

pub mod analyzer;
pub mod batch;
pub mod classifier;
pub mod dataset;
pub mod features;
pub mod lifecycle;
pub mod slot;

pub use analyzer::{suggest_tags, TicketAnalyzer};
pub use batch::BatchAnalyzer;
pub use classifier::{ArtifactKind, LoadedModel, ModelArtifact, TrainingMeta};
pub use features::{FeatureRecord, FEATURE_DIM};
pub use lifecycle::{
    LifecycleState, ModelLifecycleManager, CATEGORY_ARTIFACT, SUB_CATEGORY_ARTIFACT,
};
pub use slot::ClassifierSlot;
