use crate::error::{AppError, Result};
use crate::ml::classifier::LoadedModel;
use crate::ml::features::FeatureRecord;
use parking_lot::RwLock;
use std::sync::Arc;

/// Holder for one loaded classification artifact.
///
/// `replace` swaps the whole `Arc` in one store; readers clone the `Arc`
/// under the read lock and keep using their snapshot for the rest of the
/// call, so a hot swap never tears an in-flight prediction and the old
/// model is dropped once the last snapshot goes away.
pub struct ClassifierSlot {
    model: RwLock<Option<Arc<LoadedModel>>>,
}

impl ClassifierSlot {
    /// Create an empty, not-ready slot
    pub fn empty() -> Self {
        Self {
            model: RwLock::new(None),
        }
    }

    /// Atomically bind a new model, unbinding any previous one
    pub fn replace(&self, model: LoadedModel) {
        *self.model.write() = Some(Arc::new(model));
    }

    /// Get a point-in-time reference to the bound model
    pub fn snapshot(&self) -> Option<Arc<LoadedModel>> {
        self.model.read().clone()
    }

    /// True when a model is bound
    pub fn is_ready(&self) -> bool {
        self.model.read().is_some()
    }

    /// Version tag of the bound model, if any
    pub fn version(&self) -> Option<String> {
        self.model.read().as_ref().map(|m| m.version().to_string())
    }

    /// Predict through the bound model
    pub fn predict(&self, features: &FeatureRecord) -> Result<(String, Vec<f64>)> {
        let model = self
            .snapshot()
            .ok_or_else(|| AppError::ModelNotReady("no classifier bound to slot".to_string()))?;
        Ok(model.predict(features))
    }
}

impl Default for ClassifierSlot {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::classifier::{self, ArtifactKind};
    use crate::ml::features;

    fn trained_model(version: &str) -> LoadedModel {
        let rows = [
            ("invoice payment", "Billing"),
            ("refund charge", "Billing"),
            ("crash error", "Bug Report"),
            ("error trace crash", "Bug Report"),
        ];
        let mut records = Vec::new();
        let mut labels = Vec::new();
        for _ in 0..5 {
            for (text, label) in rows {
                records.push(features::from_text(text, None));
                labels.push(label.to_string());
            }
        }
        let artifact = classifier::fit(ArtifactKind::Category, version, &records, &labels).unwrap();
        LoadedModel::new(artifact)
    }

    #[test]
    fn test_empty_slot_not_ready() {
        let slot = ClassifierSlot::empty();
        assert!(!slot.is_ready());
        assert!(slot.snapshot().is_none());
        assert!(slot.version().is_none());
    }

    #[test]
    fn test_predict_on_empty_slot_fails() {
        let slot = ClassifierSlot::empty();
        let input = features::from_text("anything", None);
        let err = slot.predict(&input).unwrap_err();
        assert!(matches!(err, AppError::ModelNotReady(_)));
    }

    #[test]
    fn test_replace_binds_model() {
        let slot = ClassifierSlot::empty();
        slot.replace(trained_model("v1"));

        assert!(slot.is_ready());
        assert_eq!(slot.version().as_deref(), Some("v1"));
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let slot = ClassifierSlot::empty();
        slot.replace(trained_model("v1"));

        let snapshot = slot.snapshot().unwrap();
        slot.replace(trained_model("v2"));

        // The pre-swap snapshot is still usable
        assert_eq!(snapshot.version(), "v1");
        assert_eq!(slot.version().as_deref(), Some("v2"));

        let input = features::from_text("invoice payment", None);
        let (_, scores) = snapshot.predict(&input);
        assert!((scores.iter().sum::<f64>() - 1.0).abs() < 1e-6);
    }
}
