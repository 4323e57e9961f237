use crate::error::{AppError, Result};
use crate::ml::classifier::{self, ArtifactKind, LoadedModel, ModelArtifact};
use crate::ml::dataset::{self, DatasetRecord};
use crate::ml::features::{self, FeatureRecord};
use crate::ml::slot::ClassifierSlot;
use crate::models::ModelInfo;
use chrono::Utc;
use std::path::{Path, PathBuf};
use strum::{Display, EnumString};
use tracing::{debug, error, info, warn};

/// File name of the persisted category artifact
pub const CATEGORY_ARTIFACT: &str = "category_model.json";

/// File name of the persisted sub-category artifact
pub const SUB_CATEGORY_ARTIFACT: &str = "subcategory_model.json";

/// Minimum labeled rows required to attempt a fit
const MIN_TRAINING_ROWS: usize = 4;

/// Lifecycle state of the classifier pair.
///
/// `Failed` records the outcome of the last attempt only; it never blocks a
/// subsequent `train` or `update`, and readiness is always derived from the
/// slots themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, serde::Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LifecycleState {
    Uninitialized,
    Ready,
    Training,
    Failed,
}

/// Owns the two classifier slots and the on-disk artifact directory.
///
/// `train` and `update` serialize on one lifecycle lock so two fits never
/// race to persist the same artifact path; `analyze` callers read slot
/// snapshots concurrently and are never blocked by a running train.
pub struct ModelLifecycleManager {
    model_dir: PathBuf,
    category_slot: ClassifierSlot,
    sub_category_slot: ClassifierSlot,
    state: parking_lot::RwLock<LifecycleState>,
    lifecycle_lock: tokio::sync::Mutex<()>,
}

/// Artifacts produced by one training run, not yet bound to the slots
struct TrainOutcome {
    category: LoadedModel,
    sub_category: LoadedModel,
}

impl ModelLifecycleManager {
    /// Create a manager over the given artifact directory; both slots start
    /// empty
    pub fn new(model_dir: PathBuf) -> Self {
        Self {
            model_dir,
            category_slot: ClassifierSlot::empty(),
            sub_category_slot: ClassifierSlot::empty(),
            state: parking_lot::RwLock::new(LifecycleState::Uninitialized),
            lifecycle_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Slot holding the category classifier
    pub fn category_slot(&self) -> &ClassifierSlot {
        &self.category_slot
    }

    /// Slot holding the sub-category classifier
    pub fn sub_category_slot(&self) -> &ClassifierSlot {
        &self.sub_category_slot
    }

    /// True iff both slots hold a bound model
    pub fn is_ready(&self) -> bool {
        self.category_slot.is_ready() && self.sub_category_slot.is_ready()
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        *self.state.read()
    }

    /// Version tag of the currently bound models
    pub fn version(&self) -> Option<String> {
        self.category_slot
            .version()
            .or_else(|| self.sub_category_slot.version())
    }

    /// Load persisted artifacts at startup.
    ///
    /// Each artifact binds independently; a missing or unreadable file
    /// leaves its slot unready and is logged, never fatal.
    pub async fn load(&self) -> Result<()> {
        for name in [CATEGORY_ARTIFACT, SUB_CATEGORY_ARTIFACT] {
            let path = self.model_dir.join(name);
            if !path.exists() {
                debug!(path = %path.display(), "No persisted artifact, slot stays unready");
                continue;
            }

            let load_path = path.clone();
            let loaded =
                tokio::task::spawn_blocking(move || ModelArtifact::load(&load_path)).await;

            match loaded {
                Ok(Ok(artifact)) => {
                    let kind = artifact.kind;
                    let version = artifact.version.clone();
                    self.bind(LoadedModel::new(artifact));
                    info!(kind = %kind, version = %version, "Artifact loaded");
                }
                Ok(Err(e)) => {
                    warn!(path = %path.display(), error = %e, "Could not load artifact, continuing without it");
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Artifact load task failed, continuing without it");
                }
            }
        }

        if self.is_ready() {
            *self.state.write() = LifecycleState::Ready;
            info!("Both classifiers loaded, model is ready");
        }

        Ok(())
    }

    /// Train both classifiers from a CSV dataset and hot-swap them in.
    ///
    /// All-or-nothing: the slots are replaced only after both fits and both
    /// persists succeed. On failure the previously bound models are left
    /// untouched and readiness reverts to whatever it was before.
    pub async fn train(&self, dataset_path: &Path) -> Result<ModelInfo> {
        let _guard = self.lifecycle_lock.lock().await;

        if !dataset_path.exists() {
            return Err(AppError::DatasetNotFound(
                dataset_path.display().to_string(),
            ));
        }

        let prior_state = self.state();
        *self.state.write() = LifecycleState::Training;
        info!(dataset = %dataset_path.display(), "Training classifiers");

        let path = dataset_path.to_path_buf();
        let dir = self.model_dir.clone();
        let outcome = tokio::task::spawn_blocking(move || train_blocking(&path, &dir))
            .await
            .map_err(|e| AppError::Internal(format!("training task failed: {}", e)))
            .and_then(|r| r);

        match outcome {
            Ok(TrainOutcome {
                category,
                sub_category,
            }) => {
                let version = category.version().to_string();
                self.category_slot.replace(category);
                self.sub_category_slot.replace(sub_category);
                *self.state.write() = LifecycleState::Ready;
                info!(version = %version, "Training complete, classifiers swapped in");
                Ok(self.info())
            }
            Err(e) => {
                *self.state.write() = LifecycleState::Failed;
                error!(
                    error = %e,
                    prior_state = %prior_state,
                    "Training failed; previously bound classifiers left untouched"
                );
                Err(e)
            }
        }
    }

    /// Hot-swap a single slot from a persisted artifact.
    ///
    /// The target slot comes from the artifact's own `kind` tag.
    pub async fn update(&self, artifact_path: &Path) -> Result<ArtifactKind> {
        let _guard = self.lifecycle_lock.lock().await;

        if !artifact_path.exists() {
            return Err(AppError::ArtifactNotFound(
                artifact_path.display().to_string(),
            ));
        }

        let prior_state = self.state();
        *self.state.write() = LifecycleState::Training;

        let path = artifact_path.to_path_buf();
        let loaded = tokio::task::spawn_blocking(move || ModelArtifact::load(&path))
            .await
            .map_err(|e| AppError::Internal(format!("artifact load task failed: {}", e)))
            .and_then(|r| r);

        match loaded {
            Ok(artifact) => {
                let kind = artifact.kind;
                let version = artifact.version.clone();
                self.bind(LoadedModel::new(artifact));
                *self.state.write() = if self.is_ready() {
                    LifecycleState::Ready
                } else {
                    prior_state
                };
                info!(kind = %kind, version = %version, "Artifact swapped in");
                Ok(kind)
            }
            Err(e) => {
                *self.state.write() = LifecycleState::Failed;
                error!(error = %e, "Artifact update failed; bound classifiers left untouched");
                Err(e)
            }
        }
    }

    /// Evaluate the category classifier against a labeled dataset.
    ///
    /// Returns the fraction of exact category matches, or 0.0 when the
    /// category slot is unready; callers check readiness separately.
    pub async fn evaluate(&self, dataset_path: &Path) -> Result<f64> {
        if !dataset_path.exists() {
            return Err(AppError::DatasetNotFound(
                dataset_path.display().to_string(),
            ));
        }

        let Some(model) = self.category_slot.snapshot() else {
            warn!("Evaluate requested with no category classifier bound");
            return Ok(0.0);
        };

        let path = dataset_path.to_path_buf();
        let accuracy = tokio::task::spawn_blocking(move || evaluate_blocking(&path, &model))
            .await
            .map_err(|e| AppError::Internal(format!("evaluation task failed: {}", e)))
            .and_then(|r| r)?;

        info!(dataset = %dataset_path.display(), accuracy = accuracy, "Evaluation complete");
        Ok(accuracy)
    }

    /// Metadata snapshot reflecting the most recent successful training run
    pub fn info(&self) -> ModelInfo {
        let category = self.category_slot.snapshot();
        let sub_category = self.sub_category_slot.snapshot();

        match category {
            Some(model) => {
                let meta = model.meta();
                let sub_secs = sub_category
                    .as_ref()
                    .map(|m| m.meta().training_secs)
                    .unwrap_or(0.0);

                ModelInfo {
                    model_version: model.version().to_string(),
                    last_trained: Some(meta.trained_at),
                    accuracy: meta.accuracy,
                    training_sample_count: meta.n_samples,
                    model_path: self.model_dir.display().to_string(),
                    training_secs: meta.training_secs + sub_secs,
                    category_accuracies: meta.per_label_accuracy.clone(),
                }
            }
            None => ModelInfo {
                model_version: "uninitialized".to_string(),
                last_trained: None,
                accuracy: 0.0,
                training_sample_count: 0,
                model_path: self.model_dir.display().to_string(),
                training_secs: 0.0,
                category_accuracies: Default::default(),
            },
        }
    }

    fn bind(&self, model: LoadedModel) {
        match model.kind() {
            ArtifactKind::Category => self.category_slot.replace(model),
            ArtifactKind::SubCategory => self.sub_category_slot.replace(model),
        }
    }
}

/// Parse, featurize, fit both classifiers, and persist both artifacts.
///
/// Runs on the blocking pool; returns the fitted models without touching
/// the live slots.
fn train_blocking(dataset_path: &Path, model_dir: &Path) -> Result<TrainOutcome> {
    let rows = dataset::read_dataset(dataset_path)?;

    // Features are engineered once per row; both classifiers fit from the
    // same matrix. The sub-category model is not conditioned on the
    // category label: each row pairs full text with its sub-category.
    let records: Vec<FeatureRecord> = rows.iter().map(featurize_row).collect();

    let (cat_records, cat_labels) = labeled_subset(&records, &rows, |r| &r.category);
    let (sub_records, sub_labels) = labeled_subset(&records, &rows, |r| &r.sub_category);

    if cat_records.len() < MIN_TRAINING_ROWS || sub_records.len() < MIN_TRAINING_ROWS {
        return Err(AppError::Fit(format!(
            "dataset has too few labeled rows (category: {}, sub-category: {}, need {})",
            cat_records.len(),
            sub_records.len(),
            MIN_TRAINING_ROWS
        )));
    }

    let version = Utc::now().format("%Y%m%d%H%M%S").to_string();

    let category = classifier::fit(ArtifactKind::Category, &version, &cat_records, &cat_labels)?;
    let sub_category = classifier::fit(
        ArtifactKind::SubCategory,
        &version,
        &sub_records,
        &sub_labels,
    )?;

    // Persist both before anything becomes visible to inference callers
    category.save(&model_dir.join(CATEGORY_ARTIFACT))?;
    sub_category.save(&model_dir.join(SUB_CATEGORY_ARTIFACT))?;

    debug!(
        version = %version,
        category_accuracy = category.meta.accuracy,
        sub_category_accuracy = sub_category.meta.accuracy,
        "Both artifacts fitted and persisted"
    );

    Ok(TrainOutcome {
        category: LoadedModel::new(category),
        sub_category: LoadedModel::new(sub_category),
    })
}

fn featurize_row(row: &DatasetRecord) -> FeatureRecord {
    features::build(
        &row.title,
        &row.description,
        non_empty(&row.customer_email),
        non_empty(&row.category),
        non_empty(&row.tags),
        non_empty(&row.attachments),
    )
}

fn non_empty(s: &str) -> Option<&str> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn labeled_subset<'a>(
    records: &[FeatureRecord],
    rows: &'a [DatasetRecord],
    label: impl Fn(&'a DatasetRecord) -> &'a String,
) -> (Vec<FeatureRecord>, Vec<String>) {
    let mut subset_records = Vec::new();
    let mut subset_labels = Vec::new();
    for (record, row) in records.iter().zip(rows) {
        let value = label(row);
        if !value.trim().is_empty() {
            subset_records.push(record.clone());
            subset_labels.push(value.trim().to_string());
        }
    }
    (subset_records, subset_labels)
}

fn evaluate_blocking(dataset_path: &Path, model: &LoadedModel) -> Result<f64> {
    let rows = dataset::read_dataset(dataset_path)?;

    let mut total = 0usize;
    let mut correct = 0usize;
    for row in &rows {
        if row.category.trim().is_empty() {
            continue;
        }
        total += 1;
        let (predicted, _) = model.predict(&featurize_row(row));
        if predicted == row.category.trim() {
            correct += 1;
        }
    }

    if total == 0 {
        return Ok(0.0);
    }
    Ok(correct as f64 / total as f64)
}
