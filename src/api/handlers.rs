use crate::api::AppState;
use crate::catalog;
use crate::error::{AppError, Result};
use crate::models::{AnalysisRequest, AnalysisResult, BatchRequest, BatchResult, ModelInfo};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Health check endpoint
pub async fn health_check() -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Analyze a single ticket
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResult>> {
    let result = state.analyzer.analyze(&request).await?;
    Ok(Json(result))
}

/// Analyze a batch of tickets
pub async fn analyze_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResult>> {
    if request.tickets.is_empty() {
        return Err(AppError::Validation(
            "at least one ticket must be provided for batch analysis".to_string(),
        ));
    }
    if request.tickets.len() > request.max_batch_size {
        return Err(AppError::Validation(format!(
            "batch size cannot exceed {} tickets",
            request.max_batch_size
        )));
    }

    let result = state.batch.analyze_batch(request).await;
    Ok(Json(result))
}

/// Train both classifiers from a dataset on disk
pub async fn train(
    State(state): State<AppState>,
    Json(request): Json<TrainRequest>,
) -> Result<Json<TrainResponse>> {
    request.validate()?;

    match state
        .lifecycle
        .train(std::path::Path::new(&request.training_data_path))
        .await
    {
        Ok(info) => Ok(Json(TrainResponse {
            success: true,
            message: "Model training completed successfully".to_string(),
            model_version: Some(info.model_version),
        })),
        // Missing dataset is a caller mistake, surfaced as its own condition
        Err(e @ AppError::DatasetNotFound(_)) => Err(e),
        // Fit/persist failures are recovered into a boolean result
        Err(e) => Ok(Json(TrainResponse {
            success: false,
            message: e.to_string(),
            model_version: None,
        })),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct TrainRequest {
    #[validate(length(min = 1))]
    pub training_data_path: String,
}

#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub success: bool,
    pub message: String,
    pub model_version: Option<String>,
}

/// Hot-swap one classifier from a persisted artifact
pub async fn update(
    State(state): State<AppState>,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<UpdateResponse>> {
    request.validate()?;

    match state
        .lifecycle
        .update(std::path::Path::new(&request.artifact_path))
        .await
    {
        Ok(kind) => Ok(Json(UpdateResponse {
            success: true,
            message: format!("{} model updated successfully", kind),
        })),
        Err(e @ AppError::ArtifactNotFound(_)) => Err(e),
        Err(e) => Ok(Json(UpdateResponse {
            success: false,
            message: e.to_string(),
        })),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRequest {
    #[validate(length(min = 1))]
    pub artifact_path: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub success: bool,
    pub message: String,
}

/// Metadata for the currently bound models
pub async fn model_info(State(state): State<AppState>) -> Result<Json<ModelInfo>> {
    Ok(Json(state.lifecycle.info()))
}

/// Evaluate the category classifier against a labeled dataset
pub async fn evaluate(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<EvaluationResponse>> {
    request.validate()?;

    let accuracy = state
        .lifecycle
        .evaluate(std::path::Path::new(&request.test_data_path))
        .await?;

    Ok(Json(EvaluationResponse {
        accuracy,
        evaluated_at: Utc::now(),
        test_data_path: request.test_data_path,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct EvaluateRequest {
    #[validate(length(min = 1))]
    pub test_data_path: String,
}

#[derive(Debug, Serialize)]
pub struct EvaluationResponse {
    pub accuracy: f64,
    pub evaluated_at: DateTime<Utc>,
    pub test_data_path: String,
}

/// Available top-level categories
pub async fn categories() -> Result<Json<Vec<String>>> {
    Ok(Json(catalog::categories()))
}

/// Sub-categories for one category
pub async fn sub_categories(Path(category): Path<String>) -> Result<Json<Vec<String>>> {
    if category.trim().is_empty() {
        return Err(AppError::Validation("category is required".to_string()));
    }
    Ok(Json(catalog::sub_categories(&category)))
}

/// Readiness of the classifier pair
pub async fn ready(State(state): State<AppState>) -> Result<Json<ReadyResponse>> {
    Ok(Json(ReadyResponse {
        is_ready: state.lifecycle.is_ready(),
        state: state.lifecycle.state().to_string(),
        checked_at: Utc::now(),
    }))
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub is_ready: bool,
    pub state: String,
    pub checked_at: DateTime<Utc>,
}

/// Category probability distribution for bare text
pub async fn category_probabilities(
    State(state): State<AppState>,
    Json(request): Json<TextRequest>,
) -> Result<Json<HashMap<String, f64>>> {
    request.validate()?;
    Ok(Json(state.analyzer.category_probabilities(&request.text)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct TextRequest {
    #[validate(length(min = 1))]
    pub text: String,
}

/// Sub-category probability distribution for text plus a category
pub async fn sub_category_probabilities(
    State(state): State<AppState>,
    Json(request): Json<SubCategoryTextRequest>,
) -> Result<Json<HashMap<String, f64>>> {
    request.validate()?;
    Ok(Json(
        state
            .analyzer
            .sub_category_probabilities(&request.text, &request.category),
    ))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubCategoryTextRequest {
    #[validate(length(min = 1))]
    pub text: String,
    #[validate(length(min = 1))]
    pub category: String,
}
