use crate::error::{AppError, Result};
use crate::ml::features::{FeatureRecord, FEATURE_DIM};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use strum::{Display, EnumString};

/// Which classifier slot an artifact targets.
///
/// Carried inside the artifact itself so `update` never has to guess from
/// file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArtifactKind {
    Category,
    SubCategory,
}

/// Training metadata persisted alongside the fitted weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingMeta {
    /// When the fit completed
    pub trained_at: DateTime<Utc>,

    /// Number of labeled samples used
    pub n_samples: usize,

    /// Fit duration in seconds
    pub training_secs: f64,

    /// Accuracy on the training set
    pub accuracy: f64,

    /// Per-label accuracy on the training set
    pub per_label_accuracy: HashMap<String, f64>,
}

/// A persisted, loadable classification model.
///
/// `labels` is the label-to-index mapping for the weight rows: row `i`
/// scores `labels[i]`. Distributions are always built from this list, never
/// from positional alignment with an external catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Target slot
    pub kind: ArtifactKind,

    /// Version tag shared by all artifacts of one training run
    pub version: String,

    /// Ordered labels; index-aligned with `weights` rows
    pub labels: Vec<String>,

    /// Coefficients (n_labels × FEATURE_DIM)
    pub weights: Array2<f64>,

    /// Intercepts (n_labels)
    pub intercepts: Array1<f64>,

    /// Training metadata
    pub meta: TrainingMeta,
}

impl ModelArtifact {
    /// Persist the artifact as JSON, writing to a temp file first so a
    /// crashed write never leaves a torn artifact behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Persist(format!("create {}: {}", parent.display(), e)))?;
        }

        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec(self)
            .map_err(|e| AppError::Persist(format!("encode artifact: {}", e)))?;
        std::fs::write(&tmp, json)
            .map_err(|e| AppError::Persist(format!("write {}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, path)
            .map_err(|e| AppError::Persist(format!("rename to {}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Load an artifact from disk
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| AppError::ArtifactNotFound(format!("{}: {}", path.display(), e)))?;
        let artifact: ModelArtifact = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::Serialization(format!("{}: {}", path.display(), e)))?;

        if artifact.labels.is_empty() || artifact.weights.nrows() != artifact.labels.len() {
            return Err(AppError::Serialization(format!(
                "{}: label/weight shape mismatch",
                path.display()
            )));
        }

        Ok(artifact)
    }
}

/// An artifact bound for inference.
///
/// Held behind an `Arc` inside a classifier slot; in-flight callers keep
/// their snapshot alive across a hot swap.
#[derive(Debug)]
pub struct LoadedModel {
    artifact: ModelArtifact,
}

impl LoadedModel {
    pub fn new(artifact: ModelArtifact) -> Self {
        Self { artifact }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.artifact.kind
    }

    pub fn version(&self) -> &str {
        &self.artifact.version
    }

    pub fn labels(&self) -> &[String] {
        &self.artifact.labels
    }

    pub fn meta(&self) -> &TrainingMeta {
        &self.artifact.meta
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    /// Predict a label and its full score vector for one feature record.
    ///
    /// Scores are a softmax over the fitted coefficients: non-negative,
    /// summing to 1, index-aligned with `labels()`. The predicted label is
    /// the argmax, so its score is also the confidence.
    pub fn predict(&self, features: &FeatureRecord) -> (String, Vec<f64>) {
        let scores = self.scores(features.values());

        let best = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);

        (self.artifact.labels[best].clone(), scores)
    }

    fn scores(&self, x: &[f64]) -> Vec<f64> {
        let w = &self.artifact.weights;
        let b = &self.artifact.intercepts;
        let n_labels = self.artifact.labels.len();

        let mut logits = vec![0.0; n_labels];
        for (i, logit) in logits.iter_mut().enumerate() {
            let mut z = b[i];
            for (j, xj) in x.iter().enumerate().take(w.ncols()) {
                z += w[[i, j]] * xj;
            }
            *logit = z;
        }

        softmax(&logits)
    }
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Fit a multiclass classifier from engineered features.
///
/// Labels are collected in first-seen order and encoded as dense indices
/// 0..k-1; smartcore orders classes ascending, so weight row `i` maps back
/// to `labels[i]`.
pub fn fit(
    kind: ArtifactKind,
    version: &str,
    records: &[FeatureRecord],
    labels: &[String],
) -> Result<ModelArtifact> {
    if records.len() != labels.len() {
        return Err(AppError::Fit(format!(
            "feature/label count mismatch: {} vs {}",
            records.len(),
            labels.len()
        )));
    }
    if records.is_empty() {
        return Err(AppError::Fit(format!("no labeled samples for {} model", kind)));
    }

    // Encode labels as dense indices, first-seen order
    let mut label_list: Vec<String> = Vec::new();
    let mut label_index: HashMap<&str, usize> = HashMap::new();
    let mut y: Vec<i32> = Vec::with_capacity(labels.len());
    for label in labels {
        let idx = *label_index.entry(label.as_str()).or_insert_with(|| {
            label_list.push(label.clone());
            label_list.len() - 1
        });
        y.push(idx as i32);
    }

    if label_list.len() < 2 {
        return Err(AppError::Fit(format!(
            "{} model needs at least two distinct labels, got {}",
            kind,
            label_list.len()
        )));
    }

    let start = Instant::now();

    let data: Vec<f64> = records
        .iter()
        .flat_map(|r| r.values().iter().copied())
        .collect();
    let x = DenseMatrix::new(records.len(), FEATURE_DIM, data, false);

    let model = LogisticRegression::fit(&x, &y, LogisticRegressionParameters::default())
        .map_err(|e| AppError::Fit(format!("{} model: {}", kind, e)))?;

    let (weights, intercepts) = extract_coefficients(&model, label_list.len());

    let mut artifact = ModelArtifact {
        kind,
        version: version.to_string(),
        labels: label_list,
        weights,
        intercepts,
        meta: TrainingMeta {
            trained_at: Utc::now(),
            n_samples: records.len(),
            training_secs: start.elapsed().as_secs_f64(),
            accuracy: 0.0,
            per_label_accuracy: HashMap::new(),
        },
    };

    let (accuracy, per_label) = training_metrics(&artifact, records, labels);
    artifact.meta.accuracy = accuracy;
    artifact.meta.per_label_accuracy = per_label;

    Ok(artifact)
}

/// Copy the fitted coefficients out of the smartcore model.
///
/// Binary fits produce a single hyperplane; it is expanded to the
/// equivalent two-row softmax form so inference is uniform across class
/// counts.
fn extract_coefficients(
    model: &LogisticRegression<f64, i32, DenseMatrix<f64>, Vec<i32>>,
    n_labels: usize,
) -> (Array2<f64>, Array1<f64>) {
    let coef = model.coefficients();
    let intercept = model.intercept();
    let (rows, cols) = coef.shape();

    if n_labels == 2 && rows == 1 {
        let mut weights = Array2::zeros((2, cols));
        let mut intercepts = Array1::zeros(2);
        for j in 0..cols {
            weights[[1, j]] = *coef.get((0, j));
        }
        intercepts[1] = *intercept.get((0, 0));
        return (weights, intercepts);
    }

    let mut weights = Array2::zeros((rows, cols));
    let mut intercepts = Array1::zeros(rows);
    for i in 0..rows {
        for j in 0..cols {
            weights[[i, j]] = *coef.get((i, j));
        }
        intercepts[i] = *intercept.get((i, 0));
    }
    (weights, intercepts)
}

/// Accuracy and per-label accuracy on the training set
fn training_metrics(
    artifact: &ModelArtifact,
    records: &[FeatureRecord],
    labels: &[String],
) -> (f64, HashMap<String, f64>) {
    let model = LoadedModel::new(artifact.clone());

    let mut correct = 0usize;
    let mut per_label_total: HashMap<&str, usize> = HashMap::new();
    let mut per_label_correct: HashMap<&str, usize> = HashMap::new();

    for (record, truth) in records.iter().zip(labels) {
        let (predicted, _) = model.predict(record);
        *per_label_total.entry(truth.as_str()).or_insert(0) += 1;
        if predicted == *truth {
            correct += 1;
            *per_label_correct.entry(truth.as_str()).or_insert(0) += 1;
        }
    }

    let accuracy = correct as f64 / records.len() as f64;
    let per_label = per_label_total
        .into_iter()
        .map(|(label, total)| {
            let hit = per_label_correct.get(label).copied().unwrap_or(0);
            (label.to_string(), hit as f64 / total as f64)
        })
        .collect();

    (accuracy, per_label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::features;

    fn sample_training_set() -> (Vec<FeatureRecord>, Vec<String>) {
        let rows = [
            ("payment failed on invoice", "Billing"),
            ("refund for double invoice charge", "Billing"),
            ("subscription pricing question", "Billing"),
            ("application crash with error trace", "Bug Report"),
            ("crash on startup error dialog", "Bug Report"),
            ("critical error crash loop", "Bug Report"),
            ("cannot login to my account", "Account"),
            ("password reset for account login", "Account"),
            ("account profile permissions broken", "Account"),
        ];

        let mut records = Vec::new();
        let mut labels = Vec::new();
        for _ in 0..4 {
            for (text, label) in rows {
                records.push(features::from_text(text, None));
                labels.push(label.to_string());
            }
        }
        (records, labels)
    }

    #[test]
    fn test_fit_produces_aligned_artifact() {
        let (records, labels) = sample_training_set();
        let artifact = fit(ArtifactKind::Category, "test-1", &records, &labels).unwrap();

        assert_eq!(artifact.kind, ArtifactKind::Category);
        assert_eq!(artifact.labels.len(), 3);
        assert_eq!(artifact.weights.nrows(), 3);
        assert_eq!(artifact.weights.ncols(), FEATURE_DIM);
        assert_eq!(artifact.intercepts.len(), 3);
        assert!(artifact.meta.accuracy >= 0.0 && artifact.meta.accuracy <= 1.0);
        assert_eq!(artifact.meta.n_samples, records.len());
    }

    #[test]
    fn test_scores_sum_to_one_and_argmax_matches() {
        let (records, labels) = sample_training_set();
        let artifact = fit(ArtifactKind::Category, "test-1", &records, &labels).unwrap();
        let model = LoadedModel::new(artifact);

        let input = features::from_text("invoice payment problem", None);
        let (predicted, scores) = model.predict(&input);

        let sum: f64 = scores.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(scores.iter().all(|s| *s >= 0.0 && *s <= 1.0));

        let argmax = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap()
            .0;
        assert_eq!(model.labels()[argmax], predicted);
    }

    #[test]
    fn test_fit_rejects_single_label() {
        let records = vec![
            features::from_text("one", None),
            features::from_text("two", None),
        ];
        let labels = vec!["Billing".to_string(), "Billing".to_string()];

        let err = fit(ArtifactKind::Category, "v", &records, &labels).unwrap_err();
        assert!(matches!(err, AppError::Fit(_)));
    }

    #[test]
    fn test_fit_rejects_mismatched_lengths() {
        let records = vec![features::from_text("one", None)];
        let labels = vec!["A".to_string(), "B".to_string()];

        let err = fit(ArtifactKind::Category, "v", &records, &labels).unwrap_err();
        assert!(matches!(err, AppError::Fit(_)));
    }

    #[test]
    fn test_artifact_save_load_round_trip() {
        let (records, labels) = sample_training_set();
        let artifact = fit(ArtifactKind::SubCategory, "test-2", &records, &labels).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subcategory_model.json");
        artifact.save(&path).unwrap();

        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded.kind, ArtifactKind::SubCategory);
        assert_eq!(loaded.version, "test-2");
        assert_eq!(loaded.labels, artifact.labels);

        // Predictions must survive the round trip exactly
        let input = features::from_text("crash error on login", None);
        let before = LoadedModel::new(artifact).predict(&input);
        let after = LoadedModel::new(loaded).predict(&input);
        assert_eq!(before.0, after.0);
        for (a, b) in before.1.iter().zip(after.1.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_load_missing_artifact() {
        let err = ModelArtifact::load(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, AppError::ArtifactNotFound(_)));
    }
}
